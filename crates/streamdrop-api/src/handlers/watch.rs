//! HTML player page.

use crate::state::AppState;
use crate::utils::html::{player_page, NOT_FOUND_PAGE};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use streamdrop_core::Token;

/// Player page for a token.
#[utoipa::path(
    get,
    path = "/watch/{token}",
    tag = "stream",
    params(("token" = String, Path, description = "Access token from the watch link")),
    responses(
        (status = 200, description = "HTML player page"),
        (status = 404, description = "HTML not-found page for unknown or expired tokens")
    )
)]
#[tracing::instrument(skip(state), fields(operation = "watch_page"))]
pub async fn watch_page(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Response {
    let Some(token) = Token::parse(&token) else {
        return not_found();
    };
    let Some(media) = state.registry.resolve(&token).await else {
        return not_found();
    };

    let file_exists = tokio::fs::metadata(&media.file_path)
        .await
        .is_ok_and(|metadata| metadata.is_file());
    if !file_exists {
        tracing::debug!(token = %token, "Registered file is gone");
        return not_found();
    }

    let file_name = media
        .file_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| token.to_string());

    Html(player_page(
        &file_name,
        &state.links.stream_url(&token),
        &media.content_type,
    ))
    .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
}
