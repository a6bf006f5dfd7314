//! HTTP adapter: derives client keys from connections and turns rate limit
//! decisions into pipeline continuation or `429` responses.

mod middleware;
mod server;

pub use middleware::{
    client_key, enforce_rate_limit, with_rate_limit, TOO_MANY_REQUESTS_BODY, UNKNOWN_CLIENT,
};
pub use server::HttpServer;
