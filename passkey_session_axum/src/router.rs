//! Combined router for the passkey and session endpoints

use axum::Router;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use passkey_session::PASSKEY_ROUTE_PREFIX;

/// Build the full authentication router:
/// - `{PASSKEY_ROUTE_PREFIX}/register/…`, `…/authenticate/…`, `…/list`,
///   `…/delete`
/// - `/session/create`
pub fn passkey_session_router() -> Router {
    passkey_session_router_no_trace().layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same router without the HTTP tracing middleware, for applications that
/// install their own.
pub fn passkey_session_router_no_trace() -> Router {
    Router::new()
        .nest(PASSKEY_ROUTE_PREFIX.as_str(), super::passkey::router())
        .nest("/session", super::session::router())
}
