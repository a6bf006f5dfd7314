//! Ratewarden - Per-Client Sliding-Window Rate Limiting
//!
//! This crate implements a sliding-window log rate limiter keyed by client
//! identity, together with an HTTP middleware that sits in front of a request
//! pipeline and rejects excess traffic with `429 Too Many Requests`.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
