// Client configuration: per-platform defaults, JSON file overlay, env overrides
//
// Credentials and proxies live here and are handed to the client explicitly.
// The normalizer never sees any of it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::errors::ScrapeError;
use super::platform::Platform;

const DOUYIN_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0.1 Mobile/15E148 Safari/604.1";
const TWITTER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0";

/// Shown instead of the cookie when a config is printed or saved
pub const REDACTED: &str = "[redacted]";

/// Per-scheme proxy URLs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(rename = "http://", default)]
    pub http: Option<String>,
    #[serde(rename = "https://", default)]
    pub https: Option<String>,
}

impl ProxyConfig {
    /// HTTPS proxy if set, otherwise HTTP
    pub fn preferred(&self) -> Option<&str> {
        self.https.as_deref().or(self.http.as_deref())
    }
}

/// Configuration handed to the upstream library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub proxies: ProxyConfig,
    #[serde(default)]
    pub cookie: String,
    /// Per upstream call, 0 disables the limit
    #[serde(alias = "timeout")]
    pub timeout_seconds: u32,
    pub page_size: u32,
}

impl ClientConfig {
    pub fn defaults_for(platform: Platform) -> Self {
        let (user_agent, referer) = match platform {
            Platform::Douyin => (DOUYIN_USER_AGENT, "https://www.douyin.com/"),
            Platform::Twitter => (TWITTER_USER_AGENT, "https://www.x.com/"),
        };

        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), user_agent.to_string());
        headers.insert("Referer".to_string(), referer.to_string());
        headers.insert(
            "Accept".to_string(),
            "application/json, text/plain, */*".to_string(),
        );
        headers.insert(
            "Accept-Language".to_string(),
            "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
        );
        headers.insert(
            "Accept-Encoding".to_string(),
            "gzip, deflate, br".to_string(),
        );
        headers.insert("Connection".to_string(), "keep-alive".to_string());
        headers.insert("Sec-Fetch-Dest".to_string(), "empty".to_string());
        headers.insert("Sec-Fetch-Mode".to_string(), "cors".to_string());
        headers.insert("Sec-Fetch-Site".to_string(), "same-origin".to_string());
        if platform == Platform::Twitter {
            headers.insert("DNT".to_string(), "1".to_string());
        }

        Self {
            headers,
            proxies: ProxyConfig::default(),
            cookie: String::new(),
            timeout_seconds: 30,
            page_size: 20,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = cookie.into();
        self
    }

    /// Route both schemes through one proxy
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxies.http = proxy.clone();
        self.proxies.https = proxy;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get("User-Agent")
            .map(String::as_str)
            .filter(|ua| !ua.trim().is_empty())
    }

    /// Headers plus `Cookie` when one is set
    pub fn request_headers(&self) -> BTreeMap<String, String> {
        let mut headers = self.headers.clone();
        if !self.cookie.is_empty() {
            headers.insert("Cookie".to_string(), self.cookie.clone());
        }
        headers
    }

    /// Defaults overlaid with the JSON file at `path`, if it exists
    pub fn load(platform: Platform, path: &Path) -> Result<Self, ScrapeError> {
        let defaults = Self::defaults_for(platform);

        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(defaults);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ScrapeError::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let mut overlay: Value = serde_json::from_str(&content).map_err(|e| ScrapeError::Config {
            path: path.to_path_buf(),
            detail: format!("Invalid JSON: {}", e),
        })?;
        let Some(overlay_map) = overlay.as_object_mut() else {
            return Err(ScrapeError::Config {
                path: path.to_path_buf(),
                detail: "top-level value must be an object".to_string(),
            });
        };
        // Older files use `timeout`; keep a single key so the merged object deserializes
        if let Some(timeout) = overlay_map.remove("timeout") {
            overlay_map.entry("timeout_seconds").or_insert(timeout);
        }

        let mut merged = serde_json::to_value(&defaults).map_err(|e| ScrapeError::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        merge_json(&mut merged, overlay);

        let config = serde_json::from_value(merged).map_err(|e| ScrapeError::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        info!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self, platform: Platform) -> Vec<&'static str> {
        self.apply_env_with(platform, |key| std::env::var(key).ok())
    }

    /// Apply overrides from an environment-style lookup; returns the keys that took effect
    pub fn apply_env_with<F>(&mut self, platform: Platform, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cookie_key = platform.cookie_env_var();
        if let Some(cookie) = get(cookie_key) {
            self.cookie = cookie;
            applied.push(cookie_key);
        }

        for key in ["HTTP_PROXY", "http_proxy"] {
            if let Some(proxy) = get(key) {
                self.proxies.http = Some(proxy);
                applied.push(key);
                break;
            }
        }

        for key in ["HTTPS_PROXY", "https_proxy"] {
            if let Some(proxy) = get(key) {
                self.proxies.https = Some(proxy);
                applied.push(key);
                break;
            }
        }

        if platform == Platform::Twitter {
            if let Some(ua) = get("TWITTER_USER_AGENT") {
                self.headers.insert("User-Agent".to_string(), ua);
                applied.push("TWITTER_USER_AGENT");
            }
        }

        if !applied.is_empty() {
            // Values stay out of the log, they may hold credentials
            info!(%platform, keys = ?applied, "applied environment overrides");
        }
        applied
    }

    pub fn validate(&self, platform: Platform) -> Result<(), ScrapeError> {
        if self.user_agent().is_none() {
            return Err(ScrapeError::InvalidConfig(
                "missing User-Agent header".to_string(),
            ));
        }

        if self.cookie.trim().is_empty() {
            if platform.requires_cookie() {
                return Err(ScrapeError::InvalidConfig(format!(
                    "{} requires a cookie; set {} or the `cookie` field",
                    platform,
                    platform.cookie_env_var()
                )));
            }
            debug!(%platform, "no cookie set, only public content is reachable");
        }

        if self.page_size == 0 {
            warn!(%platform, "page_size is 0, the client will request single items");
        }

        Ok(())
    }

    /// Copy that is safe to print or persist
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.cookie.is_empty() {
            copy.cookie = REDACTED.to_string();
        }
        copy
    }

    /// Write as pretty JSON with the cookie redacted
    pub fn save(&self, path: &Path) -> Result<(), ScrapeError> {
        let to_config_err = |detail: String| ScrapeError::Config {
            path: path.to_path_buf(),
            detail,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| to_config_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.redacted())
            .map_err(|e| to_config_err(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| to_config_err(e.to_string()))?;

        info!(path = %path.display(), "config saved");
        Ok(())
    }
}

/// `<config dir>/social-scraper/<platform>.json`
pub fn default_config_path(platform: Platform) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("social-scraper")
        .join(format!("{}.json", platform.as_str()))
}

/// Objects merge key by key, any other overlay value replaces the base
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    if existing.is_object() && value.is_object() {
                        merge_json(existing, value);
                        continue;
                    }
                }
                base_map.insert(key, value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}
