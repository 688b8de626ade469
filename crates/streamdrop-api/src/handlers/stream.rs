//! Byte-range streaming of registered files.

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::range::{select_range, RangeSelection};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use futures::StreamExt;
use std::sync::Arc;
use streamdrop_core::{AppError, Token};
use streamdrop_infra::ErrorResponse;
use streamdrop_storage::StorageError;

/// Stream a registered file, honouring single byte-range requests.
#[utoipa::path(
    get,
    path = "/stream/{token}",
    tag = "stream",
    params(
        ("token" = String, Path, description = "Access token from the watch link"),
        ("Range" = Option<String>, Header, description = "Single byte range, e.g. bytes=0-1023")
    ),
    responses(
        (status = 200, description = "Whole file"),
        (status = 206, description = "Requested byte range"),
        (status = 404, description = "Unknown or expired token", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse),
        (status = 500, description = "File could not be read", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers), fields(operation = "stream_media"))]
pub async fn stream_media(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let not_found = || AppError::NotFound("Video not found".to_string());

    let token = Token::parse(&token).ok_or_else(not_found)?;
    let media = state.registry.resolve(&token).await.ok_or_else(not_found)?;

    // The sweep may have removed the file since the lookup.
    let file = state.storage.open(&media.file_path).await.map_err(|e| match e {
        StorageError::NotFound(_) => not_found(),
        other => {
            tracing::error!(error = %other, token = %token, "Failed to open media file");
            AppError::TransferFailure(other.to_string())
        }
    })?;

    let total = file.len();
    let range_header = headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or_default());
    let selection = select_range(range_header, total)?;

    let (status, span) = match selection {
        RangeSelection::Full => (StatusCode::OK, None),
        RangeSelection::Partial(range) => (StatusCode::PARTIAL_CONTENT, Some(range)),
    };
    let (start, length) = span
        .map(|range| (range.start, range.len()))
        .unwrap_or((0, total));

    let stream = file.into_stream(start, length).await.map_err(|e| {
        tracing::error!(error = %e, token = %token, "Failed to prepare media stream");
        AppError::TransferFailure(e.to_string())
    })?;

    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    tracing::debug!(
        token = %token,
        status = status.as_u16(),
        start,
        length,
        total,
        "Streaming media"
    );

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, media.content_type.as_str())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, length)
        .header(header::CACHE_CONTROL, "private, no-transform");
    if let Some(range) = span {
        builder = builder.header(header::CONTENT_RANGE, range.content_range(total));
    }

    let response = builder.body(Body::from_stream(body_stream)).map_err(|e| {
        tracing::error!(error = %e, "Failed to build response");
        HttpAppError::from(AppError::Internal(e.to_string()))
    })?;

    Ok(response)
}

