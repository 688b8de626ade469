//! HTTP ingestion: remote URL fetch and raw-body upload.

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap},
    Json,
};
use futures::TryStreamExt;
use serde::Deserialize;
use std::sync::Arc;
use streamdrop_core::models::{IngestResponse, IngestUrlRequest};
use streamdrop_infra::ErrorResponse;
use tokio_util::io::StreamReader;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadQuery {
    /// Identifier of the uploading user
    pub owner_id: String,
    /// Original file name, shown on the player page
    pub file_name: Option<String>,
}

/// Fetch a remote media file and return its watch link.
#[utoipa::path(
    post,
    path = "/api/v0/ingest/url",
    tag = "ingest",
    request_body = IngestUrlRequest,
    responses(
        (status = 200, description = "File stored and registered", body = IngestResponse),
        (status = 400, description = "Invalid or disallowed URL", body = ErrorResponse),
        (status = 409, description = "User already has an ingestion running", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 422, description = "Source unreachable or not a video", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(owner_id = %request.owner_id, url = %request.url, operation = "ingest_url")
)]
pub async fn ingest_url(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<IngestUrlRequest>,
) -> Result<Json<IngestResponse>, HttpAppError> {
    let outcome = state
        .ingest
        .ingest_url(&request.owner_id, &request.url)
        .await?;

    Ok(Json(IngestResponse::from(outcome)))
}

/// Store the request body as a media file and return its watch link.
#[utoipa::path(
    post,
    path = "/api/v0/ingest/upload",
    tag = "ingest",
    params(UploadQuery),
    request_body(content = Vec<u8>, description = "Raw media bytes", content_type = "video/mp4"),
    responses(
        (status = 200, description = "File stored and registered", body = IngestResponse),
        (status = 400, description = "Missing owner", body = ErrorResponse),
        (status = 409, description = "User already has an ingestion running", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Body is not video or audio", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, query, headers, body),
    fields(owner_id = %query.owner_id, operation = "ingest_upload")
)]
pub async fn ingest_upload(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<IngestResponse>, HttpAppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();
    let declared_len = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let reader = StreamReader::new(stream);

    let outcome = state
        .ingest
        .ingest_upload(
            &query.owner_id,
            query.file_name,
            &content_type,
            Box::pin(reader),
            declared_len,
        )
        .await?;

    Ok(Json(IngestResponse::from(outcome)))
}
