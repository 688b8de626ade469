use axum::http::{HeaderName, HeaderValue};
use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest caller-supplied request ID we propagate; longer ones are replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID extension type
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Tags every request with an ID, reusing a caller-supplied `X-Request-ID` when it is
/// sane, and echoes it on the response. The ID is stored in request extensions and
/// recorded on a tracing span around the rest of the stack.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri()
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), header_value);
    }

    response
}

/// Extract request ID from request extensions
pub fn get_request_id(request: &Request) -> Option<String> {
    request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Extension, Router};
    use axum_test::TestServer;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(RequestId(id)): Extension<RequestId>| async move { id }),
            )
            .layer(middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_generates_id_when_missing() {
        let server = TestServer::new(app()).unwrap();

        let res = server.get("/").await;
        let header = res.header("x-request-id");
        let id = header.to_str().unwrap();

        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(res.text(), id);
    }

    #[tokio::test]
    async fn test_propagates_caller_id() {
        let server = TestServer::new(app()).unwrap();

        let res = server
            .get("/")
            .add_header("X-Request-ID", "trace-123")
            .await;

        assert_eq!(res.header("x-request-id"), "trace-123");
        assert_eq!(res.text(), "trace-123");
    }

    #[tokio::test]
    async fn test_replaces_oversized_caller_id() {
        let server = TestServer::new(app()).unwrap();
        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);

        let res = server.get("/").add_header("X-Request-ID", long.as_str()).await;

        assert_ne!(res.header("x-request-id"), long.as_str());
    }
}
