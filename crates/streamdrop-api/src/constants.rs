//! API constants

/// Versioned prefix for the JSON API. Player and stream routes live at the root.
pub const API_PREFIX: &str = "/api/v0";

pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";

pub const SERVICE_NAME: &str = "streamdrop";

pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
