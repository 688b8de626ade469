//! Opaque access tokens.
//!
//! A token is 16 bytes from the thread-local CSPRNG, encoded as unpadded URL-safe
//! base64 (22 characters). Tokens are the only handle a viewer ever sees, so they
//! must not be guessable from other tokens or from upload order.

use base64::Engine;
use rand::RngCore;
use std::fmt;

/// Number of random bytes behind each token.
pub const TOKEN_BYTES: usize = 16;

/// Length of the encoded form of a token.
pub const TOKEN_ENCODED_LEN: usize = 22;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

impl Token {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Token(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Accept a token received from a client.
    ///
    /// Returns `None` for strings that could never have been issued, so lookups of
    /// garbage input short-circuit without touching the registry.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == TOKEN_ENCODED_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        well_formed.then(|| Token(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
