//! Public link construction.

use crate::models::Token;

/// Builds the viewer-facing URLs for a token from the configured public origin.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Player page: `{base}/watch/{token}`
    pub fn watch_url(&self, token: &Token) -> String {
        format!("{}/watch/{}", self.base_url, token)
    }

    /// Raw byte stream: `{base}/stream/{token}`
    pub fn stream_url(&self, token: &Token) -> String {
        format!("{}/stream/{}", self.base_url, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_use_base_url_without_double_slash() {
        let links = LinkBuilder::new("https://media.example.com/");
        let token = Token::parse("AAAAAAAAAAAAAAAAAAAAAA").unwrap();

        assert_eq!(
            links.watch_url(&token),
            "https://media.example.com/watch/AAAAAAAAAAAAAAAAAAAAAA"
        );
        assert_eq!(
            links.stream_url(&token),
            "https://media.example.com/stream/AAAAAAAAAAAAAAAAAAAAAA"
        );
    }
}
