//! API key handling with secure memory.
//!
//! Uses the `secrecy` crate so generation and speech credentials never end
//! up in logs, debug output, or error messages.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// An API key that won't be logged or displayed.
pub struct ApiKey(SecretBox<str>);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the key for use in a request header or query string.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the wrapped key is blank.
    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_in_debug_or_display() {
        let key = ApiKey::new("AIza-super-secret");
        assert!(!format!("{:?}", key).contains("AIza"));
        assert_eq!(format!("{}", key), "[REDACTED]");
    }

    #[test]
    fn test_expose_and_blank() {
        assert_eq!(ApiKey::new("sk-123").expose(), "sk-123");
        assert!(ApiKey::new("  ").is_empty());
        assert!(!ApiKey::from("sk-123").is_empty());
    }
}
