// Common data models for the scraper
//
// RawPayload is what the upstream library hands us; CanonicalRecord is the
// stable shape every consumer gets back from the normalizer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::platform::Platform;

/// Id used when the payload carries none
pub const UNKNOWN_ID: &str = "unknown";

/// Id used when field extraction failed
pub const ERROR_ID: &str = "error";

/// Loosely-typed upstream value, classified before any field access
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Structured record (the normal case)
    Mapping(Map<String, Value>),
    /// Bare text instead of a record
    Text(String),
    /// Anything else: null, lists of field names, numbers...
    Other(Value),
}

impl RawPayload {
    /// Short name of the shape, for logs
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Mapping(_) => "mapping",
            Self::Text(_) => "text",
            Self::Other(Value::Null) => "null",
            Self::Other(Value::Array(_)) => "array",
            Self::Other(_) => "scalar",
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Mapping(map) => Value::Object(map),
            Self::Text(text) => Value::String(text),
            Self::Other(value) => value,
        }
    }
}

impl From<Value> for RawPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(map),
            Value::String(text) => Self::Text(text),
            other => Self::Other(other),
        }
    }
}

impl From<Map<String, Value>> for RawPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Mapping(map)
    }
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Post author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub unique_id: String,
    pub display_name: String,
    pub avatar_url: String,
    pub follower_count: u64,
    pub following_count: u64,
}

/// Engagement counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub play_count: u64,
}

/// Attached video / image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub play_url: String,
    pub cover_url: String,
    pub width: u64,
    pub height: u64,
    pub duration_secs: u64,
}

/// Background track (Douyin)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Music {
    pub title: String,
    pub author: String,
    pub play_url: String,
}

/// Which anomaly produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Upstream returned bare text instead of a record
    StringFallback,
    /// Upstream returned neither a mapping nor a string
    UnknownShape,
    /// Extraction failed on an otherwise well-typed mapping
    NormalizationError,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StringFallback => "string_fallback",
            Self::UnknownShape => "unknown_shape",
            Self::NormalizationError => "normalization_error",
        }
    }
}

/// Provenance of an anomalous record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Short human-readable note
    pub message: String,
    /// The payload exactly as received
    pub raw: Value,
    /// Captured failure text (normalization errors only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Normalized post, every field guaranteed present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub platform: Platform,
    pub id: String,
    pub description: String,
    pub author: Author,
    /// Epoch seconds, 0 when unknown
    pub created_at: i64,
    pub statistics: Statistics,
    pub media: Media,
    pub music: Music,
    pub tags: Vec<String>,
    pub links: Vec<String>,
    pub media_keys: Vec<String>,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
}

impl CanonicalRecord {
    /// Fully defaulted record carrying only an id and a description
    pub fn placeholder(platform: Platform, id: &str, description: String) -> Self {
        Self {
            platform,
            id: id.to_string(),
            description,
            author: Author::default(),
            created_at: 0,
            statistics: Statistics::default(),
            media: Media::default(),
            music: Music::default(),
            tags: Vec::new(),
            links: Vec::new(),
            media_keys: Vec::new(),
            source_url: platform.source_url(id),
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }

    /// No anomaly was recorded while building this record
    pub fn is_clean(&self) -> bool {
        self.diagnostic.is_none()
    }

    pub fn diagnostic_kind(&self) -> Option<DiagnosticKind> {
        self.diagnostic.as_ref().map(|d| d.kind)
    }
}
