use crate::models::Token;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// A registered media file.
///
/// The entry owns the file at `file_path`: once registered, only the registry
/// (through expiry or purge) deletes it.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub token: Token,
    pub file_path: PathBuf,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub content_type: String,
}

impl RegistryEntry {
    /// True once the entry is strictly older than `ttl` at `now`.
    ///
    /// An entry whose age equals `ttl` exactly is still live.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return false;
        };
        now.signed_duration_since(self.created_at) > ttl
    }

    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// What the HTTP layer needs to serve a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub file_path: PathBuf,
    pub content_type: String,
}

impl From<&RegistryEntry> for ResolvedMedia {
    fn from(entry: &RegistryEntry) -> Self {
        Self {
            file_path: entry.file_path.clone(),
            content_type: entry.content_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_created_at(created_at: DateTime<Utc>) -> RegistryEntry {
        RegistryEntry {
            token: Token::generate(),
            file_path: PathBuf::from("storage/a.mp4"),
            owner_id: "7".to_string(),
            created_at,
            content_type: "video/mp4".to_string(),
        }
    }

    #[test]
    fn test_expiry_is_strictly_greater_than_ttl() {
        let created = Utc::now();
        let entry = entry_created_at(created);
        let ttl = Duration::from_secs(60);

        assert!(!entry.is_expired(ttl, created + chrono::Duration::seconds(59)));
        assert!(!entry.is_expired(ttl, created + chrono::Duration::seconds(60)));
        assert!(entry.is_expired(ttl, created + chrono::Duration::milliseconds(60_001)));
    }

    #[test]
    fn test_clock_going_backwards_never_expires() {
        let created = Utc::now();
        let entry = entry_created_at(created);
        assert!(!entry.is_expired(Duration::from_secs(1), created - chrono::Duration::hours(1)));
    }

    #[test]
    fn test_expires_at() {
        let created = Utc::now();
        let entry = entry_created_at(created);
        assert_eq!(
            entry.expires_at(Duration::from_secs(3600)),
            created + chrono::Duration::hours(1)
        );
    }
}
