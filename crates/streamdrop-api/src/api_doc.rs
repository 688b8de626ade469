//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::handlers;
use streamdrop_core::models;
use streamdrop_infra::ErrorResponse;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Streamdrop API",
        version = "0.1.0",
        description = "Ephemeral media links. Ingest a video by URL or upload, get back a tokenized watch link that streams with byte-range support and expires after a fixed lifetime."
    ),
    paths(
        handlers::ingest::ingest_url,
        handlers::ingest::ingest_upload,
        handlers::watch::watch_page,
        handlers::stream::stream_media,
        handlers::health::health_check,
    ),
    components(schemas(
        models::IngestUrlRequest,
        models::IngestResponse,
        handlers::health::HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "ingest", description = "Turn a file into a watch link"),
        (name = "stream", description = "Player page and byte-range streaming"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_public_routes() {
        let spec = get_openapi_spec();
        for path in [
            "/api/v0/ingest/url",
            "/api/v0/ingest/upload",
            "/watch/{token}",
            "/stream/{token}",
            "/health",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
