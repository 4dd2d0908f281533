pub mod scraper;

pub use scraper::{
    normalize, normalize_all, BatchSummary, CanonicalRecord, ClientConfig, Diagnostic,
    DiagnosticKind, Page, Platform, PlatformClient, RawPayload, ScrapeError, Upstream,
};
