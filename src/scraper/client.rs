// Platform client - pagination and timeouts around an Upstream
//
// The client owns the config and the upstream for one platform. It never
// interprets item contents; that is the normalizer's job.

use futures::stream::{self, Stream};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::config::ClientConfig;
use super::diagnostics::{diagnose_error, is_field_name_list};
use super::errors::ScrapeError;
use super::models::CanonicalRecord;
use super::normalizer::{normalize_all, BatchSummary};
use super::platform::Platform;
use super::traits::Upstream;

/// Douyin wraps post lists as `{"aweme_list": [...]}`
const ITEM_LIST_KEY: &str = "aweme_list";

pub struct PlatformClient {
    platform: Platform,
    config: ClientConfig,
    upstream: Box<dyn Upstream>,
}

impl PlatformClient {
    pub fn new(platform: Platform, config: ClientConfig, upstream: Box<dyn Upstream>) -> Self {
        Self {
            platform,
            config,
            upstream,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Collect up to `max_items` raw items, following cursors page by page
    pub async fn fetch_user_items(
        &self,
        user_ref: &str,
        max_items: usize,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Vec<Value>, ScrapeError> {
        let mut pager = Pager::new(self.page_size(page_size), cursor);
        let mut items = Vec::new();

        while items.len() < max_items {
            match pager.next_batch(self, user_ref).await? {
                Some(batch) => items.extend(batch),
                None => break,
            }
        }

        items.truncate(max_items);
        info!(
            platform = %self.platform,
            user = user_ref,
            pages = pager.pages,
            items = items.len(),
            "fetched user items"
        );
        Ok(items)
    }

    /// Same paging rules as `fetch_user_items`, but yields items as pages
    /// arrive. The next page is only requested once the current one is
    /// drained, so dropping the stream early stops fetching. An upstream
    /// error is yielded once and ends the stream.
    pub fn stream_user_items<'a>(
        &'a self,
        user_ref: &'a str,
        max_items: usize,
        page_size: u32,
        cursor: Option<&str>,
    ) -> impl Stream<Item = Result<Value, ScrapeError>> + 'a {
        let state = StreamState {
            pager: Pager::new(self.page_size(page_size), cursor),
            buffered: VecDeque::new(),
            yielded: 0,
        };

        stream::unfold(state, move |mut state| async move {
            loop {
                if state.yielded >= max_items {
                    return None;
                }
                if let Some(item) = state.buffered.pop_front() {
                    state.yielded += 1;
                    return Some((Ok(item), state));
                }
                match state.pager.next_batch(self, user_ref).await {
                    Ok(Some(batch)) => state.buffered.extend(batch),
                    Ok(None) => return None,
                    Err(e) => {
                        // Stop here; the pager is already marked exhausted
                        state.yielded = max_items;
                        return Some((Err(e), state));
                    }
                }
            }
        })
    }

    /// Profile object; an array response yields its first element
    pub async fn fetch_user_profile(&self, user_ref: &str) -> Result<Value, ScrapeError> {
        let value = self
            .call("fetch_user_profile", self.upstream.fetch_user_profile(user_ref))
            .await?;
        Ok(first_or_self(value))
    }

    /// Single post; an array response yields its first element
    pub async fn fetch_item_detail(&self, item_id: &str) -> Result<Value, ScrapeError> {
        let value = self
            .call("fetch_item_detail", self.upstream.fetch_item_detail(item_id))
            .await?;
        Ok(first_or_self(value))
    }

    /// Fetch user items and normalize every one of them
    pub async fn fetch_normalized(
        &self,
        user_ref: &str,
        max_items: usize,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Vec<CanonicalRecord>, ScrapeError> {
        let items = self
            .fetch_user_items(user_ref, max_items, page_size, cursor)
            .await?;
        let records = normalize_all(items, self.platform);

        let summary = BatchSummary::from_records(&records);
        if summary.anomalies() > 0 {
            warn!(
                platform = %self.platform,
                processed = summary.processed,
                string_fallback = summary.string_fallback,
                unknown_shape = summary.unknown_shape,
                normalization_error = summary.normalization_error,
                "batch contained anomalous items"
            );
        }
        Ok(records)
    }

    /// Requested page size, or the configured one for 0
    fn page_size(&self, requested: u32) -> u32 {
        match requested {
            0 => self.config.page_size.max(1),
            n => n,
        }
    }

    /// Run one upstream call under the configured time limit
    async fn call<T, F>(&self, operation: &'static str, fut: F) -> Result<T, ScrapeError>
    where
        F: Future<Output = Result<T, ScrapeError>>,
    {
        let seconds = u64::from(self.config.timeout_seconds);
        let result = if seconds == 0 {
            fut.await
        } else {
            match timeout(Duration::from_secs(seconds), fut).await {
                Ok(result) => result,
                Err(_) => Err(ScrapeError::Timeout { operation, seconds }),
            }
        };

        if let Err(e) = &result {
            let message = e.to_string();
            warn!(
                platform = %self.platform,
                upstream = self.upstream.name(),
                operation,
                reason = ?diagnose_error(&message),
                error = %message,
                "upstream call failed"
            );
        }
        result
    }
}

struct StreamState {
    pager: Pager,
    buffered: VecDeque<Value>,
    yielded: usize,
}

/// Cursor bookkeeping shared by the collecting and streaming fetches
struct Pager {
    page_size: u32,
    cursor: Option<String>,
    pages: usize,
    exhausted: bool,
}

impl Pager {
    fn new(page_size: u32, cursor: Option<&str>) -> Self {
        Self {
            page_size,
            cursor: cursor.map(str::to_string),
            pages: 0,
            exhausted: false,
        }
    }

    /// Flattened items of the next page; `None` once paging is over
    async fn next_batch(
        &mut self,
        client: &PlatformClient,
        user_ref: &str,
    ) -> Result<Option<Vec<Value>>, ScrapeError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = client
            .call(
                "fetch_page",
                client
                    .upstream
                    .fetch_page(user_ref, self.page_size, self.cursor.as_deref()),
            )
            .await;
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                self.exhausted = true;
                return Err(e);
            }
        };
        self.pages += 1;

        debug!(
            platform = %client.platform,
            upstream = client.upstream.name(),
            page = self.pages,
            items = page.items.len(),
            has_more = page.has_more,
            "fetched page"
        );

        if page.items.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        match page.next_cursor {
            _ if !page.has_more => self.exhausted = true,
            Some(next) if self.cursor.as_deref() == Some(next.as_str()) => {
                warn!(platform = %client.platform, cursor = %next, "cursor did not advance, stopping");
                self.exhausted = true;
            }
            Some(next) => self.cursor = Some(next),
            None => self.exhausted = true,
        }

        let mut items = Vec::with_capacity(page.items.len());
        for item in page.items {
            flatten_item(item, &mut items);
        }
        Ok(Some(items))
    }
}

/// Unpack one page item into zero or more items for the normalizer
fn flatten_item(item: Value, out: &mut Vec<Value>) {
    match item {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => flatten_item(parsed, out),
            // Plain text stays text so it ends up as a string fallback
            _ => out.push(Value::String(text)),
        },
        Value::Object(mut map) => match map.remove(ITEM_LIST_KEY) {
            Some(Value::Array(list)) => out.extend(list),
            Some(other) => {
                map.insert(ITEM_LIST_KEY.to_string(), other);
                out.push(Value::Object(map));
            }
            None => out.push(Value::Object(map)),
        },
        value => {
            if is_field_name_list(&value) {
                warn!(fields = %value, "upstream returned field names instead of data");
            }
            out.push(value);
        }
    }
}

fn first_or_self(value: Value) -> Value {
    match value {
        Value::Array(items) => items
            .into_iter()
            .next()
            .unwrap_or_else(|| Value::Object(Map::new())),
        other => other,
    }
}
