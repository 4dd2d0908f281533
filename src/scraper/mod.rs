// Scraper module - platform clients and the response normalizer

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod models;
pub mod normalizer;
pub mod platform;
pub mod traits;
pub mod utils;

pub use client::PlatformClient;
pub use config::{default_config_path, ClientConfig, ProxyConfig};
pub use diagnostics::{analyze_cookie, analyze_error, diagnose_error, CookieReport, FailureReason};
pub use errors::ScrapeError;
pub use models::{
    Author, CanonicalRecord, Diagnostic, DiagnosticKind, Media, Music, RawPayload, Statistics,
};
pub use normalizer::{normalize, normalize_all, BatchSummary};
pub use platform::Platform;
pub use traits::{Page, Upstream};
