//! Route configuration and setup.

use crate::api_doc;
use crate::constants::{API_PREFIX, OPENAPI_JSON_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use streamdrop_core::Config;
use streamdrop_infra::{request_id_middleware, security_headers_middleware, SecurityHeaders};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    crate::error::set_production_mode(config.is_production());

    let http_concurrency_limit = config.http_concurrency_limit();
    tracing::info!(
        http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let max_body = usize::try_from(config.max_ingest_size_bytes()).unwrap_or(usize::MAX);

    Router::new()
        .merge(stream_routes())
        .merge(ingest_routes())
        .route("/health", get(handlers::health::health_check))
        .route(
            OPENAPI_JSON_PATH,
            get(|| async { Json(api_doc::get_openapi_spec()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_JSON_PATH).path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(DefaultBodyLimit::disable())
        .layer(setup_cors())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            SecurityHeaders::for_environment(config.is_production()),
            security_headers_middleware,
        ))
        .with_state(state)
}

fn stream_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/watch/{token}", get(handlers::watch::watch_page))
        .route("/stream/{token}", get(handlers::stream::stream_media))
}

fn ingest_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/ingest/url", API_PREFIX),
            post(handlers::ingest::ingest_url),
        )
        .route(
            &format!("{}/ingest/upload", API_PREFIX),
            post(handlers::ingest::ingest_upload),
        )
}

// Players on other origins need to read range headers.
fn setup_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::CONTENT_LENGTH,
        ])
}
