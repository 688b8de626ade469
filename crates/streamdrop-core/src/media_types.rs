//! Content type helpers for ingested media.

/// Content type registered when a source does not say what it is.
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Extension used when the content type does not map to a known one.
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Normalize MIME type by stripping parameters and case (e.g. "Video/MP4; codecs=avc1" -> "video/mp4").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// True for content types the player can stream (video or audio).
pub fn is_streamable(content_type: &str) -> bool {
    let normalized = normalize_mime_type(content_type);
    normalized.starts_with("video/") || normalized.starts_with("audio/")
}

/// Content types accepted from remote URLs: media types, plus untyped binary bodies
/// that many file hosts serve.
pub fn is_accepted_remote_type(content_type: &str) -> bool {
    is_streamable(content_type) || normalize_mime_type(content_type) == "application/octet-stream"
}

/// Content type to register for a remote body. Untyped binaries are assumed to be mp4.
pub fn registered_content_type(content_type: &str) -> String {
    let normalized = normalize_mime_type(content_type);
    if normalized == "application/octet-stream" || normalized.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        normalized
    }
}

/// File extension (without dot) for a content type.
pub fn extension_for(content_type: &str) -> &'static str {
    match normalize_mime_type(content_type).as_str() {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/x-matroska" => "mkv",
        "video/quicktime" => "mov",
        "video/x-msvideo" => "avi",
        "video/mpeg" => "mpeg",
        "video/ogg" => "ogv",
        "video/mp2t" => "ts",
        "video/3gpp" => "3gp",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        "audio/aac" => "aac",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/webm" => "weba",
        "audio/flac" => "flac",
        _ => DEFAULT_EXTENSION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_parameters() {
        assert_eq!(normalize_mime_type("Video/MP4; codecs=avc1"), "video/mp4");
        assert_eq!(normalize_mime_type("audio/ogg"), "audio/ogg");
    }

    #[test]
    fn test_streamable_types() {
        assert!(is_streamable("video/webm"));
        assert!(is_streamable("audio/mpeg"));
        assert!(!is_streamable("application/octet-stream"));
        assert!(!is_streamable("text/html"));
    }

    #[test]
    fn test_remote_accepts_octet_stream_and_registers_as_mp4() {
        assert!(is_accepted_remote_type("application/octet-stream"));
        assert!(!is_accepted_remote_type("text/html; charset=utf-8"));
        assert_eq!(
            registered_content_type("application/octet-stream"),
            "video/mp4"
        );
        assert_eq!(registered_content_type("video/webm"), "video/webm");
    }

    #[test]
    fn test_extension_for_unknown_defaults_to_mp4() {
        assert_eq!(extension_for("video/x-matroska"), "mkv");
        assert_eq!(extension_for("video/x-unknown"), "mp4");
    }
}
