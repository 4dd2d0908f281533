// Upstream trait and page type
//
// The upstream is the third-party scraping library that actually talks to
// the platform. It hands back loosely-typed JSON and may return anything:
// records, bare strings, lists of field names, null.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ScrapeError;

/// One page of a user's posts as the upstream returned it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Raw items, not yet classified
    pub items: Vec<Value>,
    /// Cursor for the next page
    pub next_cursor: Option<String>,
    /// Upstream claims more items exist
    pub has_more: bool,
}

impl Page {
    pub fn last(items: Vec<Value>) -> Self {
        Self {
            items,
            next_cursor: None,
            has_more: false,
        }
    }

    pub fn with_cursor(items: Vec<Value>, cursor: impl Into<String>) -> Self {
        Self {
            items,
            next_cursor: Some(cursor.into()),
            has_more: true,
        }
    }
}

/// Trait for upstream scraping libraries
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Name of the upstream (for logging)
    fn name(&self) -> &'static str;

    /// Fetch one page of a user's posts
    async fn fetch_page(
        &self,
        user_ref: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Page, ScrapeError>;

    /// Fetch a user's profile
    async fn fetch_user_profile(&self, user_ref: &str) -> Result<Value, ScrapeError>;

    /// Fetch a single post
    async fn fetch_item_detail(&self, item_id: &str) -> Result<Value, ScrapeError>;
}
