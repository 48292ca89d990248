//! Secret handling
//!
//! The completion API key is read from the environment only and held in
//! `SecretString` so it never reaches a log line through `Debug` or `Display`.
//!
//! `scrub` removes credential-shaped substrings from free text. Upstream
//! error bodies can echo a partial key back, so relay errors pass through it
//! before being logged.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Environment variable holding the completion API key
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// `Debug` and `Display` always print `[REDACTED]`. Use `unsecure()` at
/// the single point where the raw value goes on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw underlying string
    pub fn unsecure(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Regex patterns for detecting common secret formats.
/// These are compiled once and reused.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Patterns match:
/// - OpenAI API keys: sk-[a-zA-Z0-9]{20,}
/// - Bearer tokens: Bearer\s+[^\s]{20,}
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"sk-[a-zA-Z0-9\-_]{20,}").expect("Invalid OpenAI pattern"),
            Regex::new(r"Bearer\s+[^\s]{20,}").expect("Invalid Bearer pattern"),
        ]
    })
}

/// Replace anything that looks like a credential with `[REDACTED]`
pub fn scrub(text: &str) -> String {
    let mut result = text.to_string();

    for pattern in get_secret_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }

    result
}

/// Read a secret from the environment. Empty values count as unset.
pub fn from_env(var: &str) -> Option<SecretString> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_redacted() {
        let secret = SecretString::new("sk-very-secret");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(secret.unsecure(), "sk-very-secret");
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_scrub_openai_key() {
        let text = "Incorrect API key provided: sk-proj-1234567890abcdefghijklmnop";
        let scrubbed = scrub(text);
        assert!(!scrubbed.contains("sk-proj"));
        assert!(scrubbed.contains("[REDACTED]"));
    }

    #[test]
    fn test_scrub_bearer_token() {
        let scrubbed = scrub("header was Bearer abcdefghijklmnopqrstuvwxyz0123");
        assert_eq!(scrubbed, "header was [REDACTED]");
    }

    #[test]
    fn test_scrub_leaves_plain_text() {
        let text = "Network error: connection refused";
        assert_eq!(scrub(text), text);
    }

    #[test]
    fn test_from_env_missing() {
        assert!(from_env("BOOKWORM_TEST_DEFINITELY_UNSET_VAR").is_none());
    }
}
