//! Axum middleware that applies the rate limiter to inbound requests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tracing::instrument;

use crate::ratelimit::{Decision, RateLimiterBackend};

/// Key used when the peer address is not available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Body of the `429` response.
pub const TOO_MANY_REQUESTS_BODY: &str = "Too many requests";

/// Derive the rate limit key for a request from its peer IP address.
pub fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Admit the request to the next stage or answer `429 Too Many Requests`.
#[instrument(skip_all, fields(method = %req.method(), path = %req.uri().path()))]
pub async fn enforce_rate_limit<R: RateLimiterBackend + 'static>(
    State(limiter): State<Arc<R>>,
    req: Request,
    next: Next,
) -> Response {
    let key = client_key(&req);

    match limiter.decide(&key, Instant::now()) {
        Decision::Admit => next.run(req).await,
        Decision::Reject => {
            (StatusCode::TOO_MANY_REQUESTS, TOO_MANY_REQUESTS_BODY).into_response()
        }
    }
}

/// Put every route of `router` behind the rate limiter.
pub fn with_rate_limit<S, R>(router: Router<S>, limiter: Arc<R>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    R: RateLimiterBackend + 'static,
{
    router.layer(middleware::from_fn_with_state(
        limiter,
        enforce_rate_limit::<R>,
    ))
}
