// Failure diagnostics - identifies why an upstream call went wrong
//
// Analyzes upstream error messages and session cookies to determine:
// - Type of failure (403, expired cookie, rate limit, proxy, etc.)
// - Recommended action for the user
// - Whether a retry with different settings might help

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::platform::Platform;

lazy_static! {
    static ref STATUS_CODE: Regex = Regex::new(r"\b([45]\d{2})\b").unwrap();
    static ref FIELD_NAME: Regex = Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap();
}

const TWITTER_CRITICAL_COOKIES: &[&str] = &["auth_token", "ct0", "guest_id", "twid"];
const TWITTER_OPTIONAL_COOKIES: &[&str] =
    &["personalization_id", "guest_id_marketing", "guest_id_ads"];
const DOUYIN_CRITICAL_COOKIES: &[&str] =
    &["sessionid", "sid_guard", "uid_tt", "sid_tt", "ssid_ucp_v1"];
const DOUYIN_OPTIONAL_COOKIES: &[&str] = &["ttwid", "odin_tt", "passport_csrf_token", "msToken"];

const AUTH_TOKEN_LEN: usize = 40;
const MIN_CT0_LEN: usize = 100;

/// Reasons why an upstream call might fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// HTTP 403 or a verification wall
    Forbidden,

    /// No cookie or not logged in
    AuthRequired,

    /// Cookie present but no longer accepted
    CookieExpired,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Network timeout (soft IP block or dead route)
    NetworkTimeout,

    /// Proxy refused or failed the connection
    ProxyError,

    /// Post or user deleted / never existed
    NotFound,

    /// Upstream answered with a list of field names instead of data
    FieldListResponse,

    /// Generic/unknown failure
    Unknown,
}

impl FailureReason {
    /// Check if this reason is retryable with different settings
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Forbidden
                | Self::CookieExpired
                | Self::RateLimited
                | Self::NetworkTimeout
                | Self::ProxyError
                | Self::FieldListResponse
        )
    }

    /// Check if a fresh cookie might help
    pub fn cookies_might_help(&self) -> bool {
        matches!(
            self,
            Self::Forbidden | Self::AuthRequired | Self::CookieExpired | Self::FieldListResponse
        )
    }

    /// Check if a (different) proxy might help
    pub fn proxy_might_help(&self) -> bool {
        matches!(
            self,
            Self::Forbidden | Self::RateLimited | Self::NetworkTimeout | Self::ProxyError
        )
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Forbidden => "Access denied (HTTP 403)",
            Self::AuthRequired => "Login cookie required",
            Self::CookieExpired => "Cookie expired or revoked",
            Self::RateLimited => "Rate limited by the platform",
            Self::NetworkTimeout => "Network timeout (possible IP throttling)",
            Self::ProxyError => "Proxy connection failed",
            Self::NotFound => "Content not found",
            Self::FieldListResponse => "Upstream returned field names instead of data",
            Self::Unknown => "Unknown failure",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Forbidden => "Refresh the cookie from a logged-in browser or switch network",
            Self::AuthRequired => "Set the platform cookie in the config file or environment",
            Self::CookieExpired => "Log in again in the browser and copy a fresh cookie",
            Self::RateLimited => "Wait a few minutes before the next request",
            Self::NetworkTimeout => "Check the connection or route through a proxy",
            Self::ProxyError => "Check that the proxy is running and the URL is correct",
            Self::NotFound => "Check the user or post id",
            Self::FieldListResponse => "The session is probably rejected; refresh the cookie",
            Self::Unknown => "Check the upstream library output for details",
        }
    }
}

/// Detailed diagnostics information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDiagnostics {
    /// Primary failure reason
    pub reason: FailureReason,

    /// HTTP status found in the message, if any
    pub status_code: Option<u16>,

    /// Additional context from error message
    pub context: Option<String>,

    pub recommend_cookies: bool,
    pub recommend_proxy: bool,

    /// Severity level (1-5, 5 being most severe)
    pub severity: u8,

    /// Raw error patterns that matched
    pub matched_patterns: Vec<String>,
}

impl FailureDiagnostics {
    pub fn new(reason: FailureReason, context: Option<String>) -> Self {
        let severity = match reason {
            FailureReason::NotFound => 5, // Nothing to fetch
            FailureReason::AuthRequired => 4,
            FailureReason::CookieExpired => 4,
            FailureReason::Forbidden => 3,
            FailureReason::FieldListResponse => 3,
            FailureReason::ProxyError => 2,
            FailureReason::RateLimited => 2,
            FailureReason::NetworkTimeout => 1,
            FailureReason::Unknown => 1,
        };

        Self {
            reason,
            status_code: None,
            context,
            recommend_cookies: reason.cookies_might_help(),
            recommend_proxy: reason.proxy_might_help(),
            severity,
            matched_patterns: Vec::new(),
        }
    }

    pub fn with_status_code(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.matched_patterns = patterns;
        self
    }
}

/// Analyze error message and return failure reason
pub fn diagnose_error(error: &str) -> Option<FailureReason> {
    let lower = error.to_lowercase();
    let codes = status_codes(error);
    let status = |code: u16| codes.contains(&code);

    // Proxy first: proxy failures often also mention timeouts
    if lower.contains("proxy")
        || lower.contains("socks")
        || lower.contains("tunnel")
        || status(407)
    {
        return Some(FailureReason::ProxyError);
    }

    if lower.contains("cookie expired")
        || lower.contains("session expired")
        || lower.contains("token expired")
        || lower.contains("invalid cookie")
    {
        return Some(FailureReason::CookieExpired);
    }

    if status(401)
        || lower.contains("unauthorized")
        || lower.contains("not logged in")
        || lower.contains("login required")
        || lower.contains("cookie")
    {
        return Some(FailureReason::AuthRequired);
    }

    if status(429) || lower.contains("rate limit") || lower.contains("too many requests") {
        return Some(FailureReason::RateLimited);
    }

    if status(403)
        || lower.contains("forbidden")
        || lower.contains("captcha")
        || lower.contains("verify")
    {
        return Some(FailureReason::Forbidden);
    }

    if status(404)
        || lower.contains("not found")
        || lower.contains("deleted")
        || lower.contains("does not exist")
    {
        return Some(FailureReason::NotFound);
    }

    if lower.contains("field names") || lower.contains("field list") {
        return Some(FailureReason::FieldListResponse);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("connection reset")
        || lower.contains("network unreachable")
    {
        return Some(FailureReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(FailureReason::Unknown);
    }

    None
}

/// First 4xx/5xx status code mentioned in the message
pub fn extract_status_code(error: &str) -> Option<u16> {
    status_codes(error).into_iter().next()
}

/// Every standalone 4xx/5xx code in the message; digits inside longer ids do not count
pub fn status_codes(error: &str) -> Vec<u16> {
    STATUS_CODE
        .captures_iter(error)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// The message names `code` as a standalone status
pub fn mentions_status(error: &str, code: u16) -> bool {
    status_codes(error).contains(&code)
}

/// Full diagnostic analysis of an error
pub fn analyze_error(error: &str) -> FailureDiagnostics {
    let reason = diagnose_error(error).unwrap_or(FailureReason::Unknown);

    // First line that says something concrete
    let context = error
        .lines()
        .find(|line| {
            let l = line.trim().to_lowercase();
            l.starts_with("error")
                || l.contains("forbidden")
                || l.contains("cookie")
                || l.contains("proxy")
                || l.contains("status")
        })
        .map(|s| s.trim().to_string());

    FailureDiagnostics::new(reason, context)
        .with_status_code(extract_status_code(error))
        .with_patterns(extract_patterns(error))
}

/// Extract matched patterns from error message
fn extract_patterns(error: &str) -> Vec<String> {
    let codes = status_codes(error);
    let statuses = [401u16, 403, 404, 429]
        .into_iter()
        .filter(|code| codes.contains(code))
        .map(|code| code.to_string());

    let patterns = [
        "forbidden",
        "unauthorized",
        "cookie",
        "login",
        "expired",
        "rate limit",
        "timeout",
        "timed out",
        "proxy",
        "socks",
        "captcha",
        "not found",
    ];

    let lower = error.to_lowercase();

    statuses
        .chain(
            patterns
                .iter()
                .filter(|p| lower.contains(*p))
                .map(|p| p.to_string()),
        )
        .collect()
}

/// True for a non-empty array of bare snake_case field names, the shape the
/// upstream library returns when the session is rejected
pub fn is_field_name_list(value: &Value) -> bool {
    match value {
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .all(|item| item.as_str().is_some_and(|s| FIELD_NAME.is_match(s))),
        _ => false,
    }
}

/// Result of checking a cookie header for the fields a platform needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieReport {
    pub component_count: usize,
    pub total_length: usize,
    pub missing_critical: Vec<String>,
    pub missing_optional: Vec<String>,
    pub warnings: Vec<String>,
}

impl CookieReport {
    /// Every critical field is present
    pub fn is_usable(&self) -> bool {
        self.component_count > 0 && self.missing_critical.is_empty()
    }
}

/// Check a `k=v; k2=v2` cookie header against the platform's session fields
pub fn analyze_cookie(platform: Platform, cookie: &str) -> CookieReport {
    let pairs: Vec<(&str, &str)> = cookie
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then_some((key, value.trim()))
        })
        .collect();

    let value_of = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    };
    let missing = |names: &[&str]| -> Vec<String> {
        names
            .iter()
            .copied()
            .filter(|name| value_of(*name).map_or(true, str::is_empty))
            .map(str::to_string)
            .collect()
    };

    let (critical, optional) = match platform {
        Platform::Twitter => (TWITTER_CRITICAL_COOKIES, TWITTER_OPTIONAL_COOKIES),
        Platform::Douyin => (DOUYIN_CRITICAL_COOKIES, DOUYIN_OPTIONAL_COOKIES),
    };

    let mut warnings = Vec::new();
    if platform == Platform::Twitter {
        if let Some(token) = value_of("auth_token").filter(|v| !v.is_empty()) {
            if token.len() != AUTH_TOKEN_LEN {
                warnings.push(format!(
                    "auth_token is {} chars, expected {}",
                    token.len(),
                    AUTH_TOKEN_LEN
                ));
            }
        }
        if let Some(ct0) = value_of("ct0").filter(|v| !v.is_empty()) {
            if ct0.len() < MIN_CT0_LEN {
                warnings.push(format!(
                    "ct0 is {} chars, a logged-in ct0 is usually at least {}",
                    ct0.len(),
                    MIN_CT0_LEN
                ));
            }
        }
    }

    CookieReport {
        component_count: pairs.len(),
        total_length: cookie.len(),
        missing_critical: missing(critical),
        missing_optional: missing(optional),
        warnings,
    }
}
