// Helper functions shared by the normalizer, client and diagnostics

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::config::ClientConfig;
use super::platform::Platform;

/// Connectivity check result for UI / log display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityReport {
    pub platform: Platform,
    pub url: String,
    pub proxy: Option<String>,
    pub reachable: bool,
    pub status: Option<u16>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

/// Cut `text` to at most `max` chars without splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Pick a proxy from environment-style lookups, HTTPS first
pub fn proxy_from_env_with<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    ["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"]
        .iter()
        .filter_map(|key| lookup(key))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Proxy from the process environment
pub fn proxy_from_env() -> Option<String> {
    proxy_from_env_with(|key| std::env::var(key).ok())
}

/// Check that the platform's landing page answers through the configured proxy
pub async fn probe_platform(platform: Platform, config: &ClientConfig) -> ConnectivityReport {
    let url = platform.home_url().to_string();
    let proxy = config.proxies.preferred().map(str::to_string);
    let mut report = ConnectivityReport {
        platform,
        url: url.clone(),
        proxy: proxy.clone(),
        reachable: false,
        status: None,
        latency_ms: None,
        error: None,
    };

    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds.max(1) as u64));

    if let Some(user_agent) = config.user_agent() {
        builder = builder.user_agent(user_agent.to_string());
    }

    if let Some(proxy_url) = proxy.as_deref() {
        match reqwest::Proxy::all(proxy_url) {
            Ok(p) => builder = builder.proxy(p),
            Err(e) => {
                warn!(proxy = proxy_url, error = %e, "invalid proxy URL");
                report.error = Some(format!("Invalid proxy URL {}: {}", proxy_url, e));
                return report;
            }
        }
    }

    let client = match builder.build() {
        Ok(c) => c,
        Err(e) => {
            report.error = Some(format!("Failed to build HTTP client: {}", e));
            return report;
        }
    };

    debug!(%platform, url = %url, proxy = ?proxy, "probing connectivity");
    let started = Instant::now();

    match client.get(&url).send().await {
        Ok(response) => {
            let status = response.status();
            report.status = Some(status.as_u16());
            report.latency_ms = Some(started.elapsed().as_millis() as u64);
            // Anything but a 5xx means the host answered; 403s are a cookie problem, not a network one
            report.reachable = !status.is_server_error();
            debug!(%platform, status = status.as_u16(), "probe finished");
        }
        Err(e) => {
            warn!(%platform, error = %e, "probe failed");
            report.error = Some(e.to_string());
        }
    }

    report
}
