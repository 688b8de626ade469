use crate::models::Token;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub token: Token,
    pub watch_url: String,
    pub stream_url: String,
    pub expires_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub content_type: String,
    pub file_name: String,
}

/// Request body for ingesting a remote file.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngestUrlRequest {
    /// Identifier of the requesting user; at most one ingestion per user runs at a time
    pub owner_id: String,
    /// Direct http(s) link to a video or audio file
    pub url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngestResponse {
    pub token: String,
    /// Player page to hand back to the user
    pub watch_url: String,
    pub stream_url: String,
    pub expires_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub content_type: String,
    pub file_name: String,
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self {
            token: outcome.token.to_string(),
            watch_url: outcome.watch_url,
            stream_url: outcome.stream_url,
            expires_at: outcome.expires_at,
            size_bytes: outcome.size_bytes,
            content_type: outcome.content_type,
            file_name: outcome.file_name,
        }
    }
}
