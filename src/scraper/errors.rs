// Error types for the upstream seam and the client glue
//
// Normalization has no error type of its own: every normalization failure
// ends up in a record's `diagnostic` field instead.

use std::path::PathBuf;

use super::diagnostics::status_codes;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScrapeError {
    /// The platform refused the request (HTTP 403, verification wall)
    #[error(
        "Request was refused by the platform (HTTP 403).\n\
         What you can do:\n\
         1) Refresh the cookie from a logged-in browser\n\
         2) Switch proxy / network\n\
         3) Wait and try again later"
    )]
    Forbidden(String),

    /// Cookie missing, expired, or not logged in
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// Too many requests (429 or equivalent)
    #[error("Rate limited by the platform: {0}")]
    RateLimited(String),

    /// Network-level timeout reported by the upstream library
    #[error("Network timeout: the platform is not responding")]
    NetworkTimeout,

    /// An upstream call exceeded the configured time budget
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    /// Upstream answered with data we could not decode
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Config file could not be read, parsed or written
    #[error("Config error at {}: {detail}", path.display())]
    Config { path: PathBuf, detail: String },

    /// Config is readable but unusable
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Any other upstream failure, with details
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ScrapeError {
    /// Worth trying again later without changing anything
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::NetworkTimeout | Self::Timeout { .. }
        )
    }
}

// Upstream libraries report failures as plain text; classify what we can
impl From<String> for ScrapeError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();
        let codes = status_codes(&s);
        let status = |code: u16| codes.contains(&code);

        if status(403) || lower.contains("forbidden") {
            return Self::Forbidden(s);
        }

        if status(429)
            || lower.contains("rate limit")
            || lower.contains("too many requests")
        {
            return Self::RateLimited(s);
        }

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout;
        }

        if status(401)
            || lower.contains("unauthorized")
            || lower.contains("cookie")
            || lower.contains("login")
            || lower.contains("not logged in")
        {
            return Self::AuthRequired(s);
        }

        if lower.contains("json") || lower.contains("parse") || lower.contains("decode") {
            return Self::ParseError(s);
        }

        Self::Upstream(s)
    }
}

impl From<&str> for ScrapeError {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(e.to_string())
    }
}
