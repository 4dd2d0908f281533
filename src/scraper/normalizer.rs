// Response normalizer
//
// Maps whatever the upstream library returned for one post onto a
// CanonicalRecord. The payload is classified first (mapping / text / other),
// then every field is pulled through an independent null-safe path lookup.
// Normalization never fails: anomalies land in the record's `diagnostic`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::models::{
    Author, CanonicalRecord, Diagnostic, DiagnosticKind, Media, Music, RawPayload, Statistics,
    ERROR_ID, UNKNOWN_ID,
};
use super::platform::{DurationUnit, FieldPaths, ListRule, Platform, PlatformTemplate, Seg};
use super::utils::truncate_chars;

/// Longest description built from a fallback payload
pub const MAX_FALLBACK_DESCRIPTION_CHARS: usize = 100;

/// Longest description built from an extraction error
pub const MAX_ERROR_DESCRIPTION_CHARS: usize = 50;

// e.g. "Wed Oct 10 20:19:24 +0000 2018"
const TWITTER_DATE_FORMAT: &str = "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]";

#[derive(Debug, thiserror::Error)]
enum ExtractError {
    #[error("id field holds {0}, expected a string or number")]
    InvalidId(&'static str),

    #[error("extraction panicked: {0}")]
    Panicked(String),
}

/// Normalize one upstream payload. Deterministic, never fails.
///
/// A panic during field extraction yields a `NormalizationError` record; the
/// panic hook still reports it (stderr by default) before it is caught.
pub fn normalize(raw: impl Into<RawPayload>, platform: Platform) -> CanonicalRecord {
    match raw.into() {
        RawPayload::Mapping(map) => normalize_mapping(Value::Object(map), platform),
        RawPayload::Text(text) => string_fallback(text, platform),
        RawPayload::Other(value) => unknown_shape(value, platform),
    }
}

/// Normalize a batch; one bad payload never stops the rest
pub fn normalize_all<I>(items: I, platform: Platform) -> Vec<CanonicalRecord>
where
    I: IntoIterator,
    I::Item: Into<RawPayload>,
{
    items
        .into_iter()
        .map(|item| normalize(item, platform))
        .collect()
}

/// Walk `path` from `root`; `None` on the first missing key, bad index or non-container
pub fn lookup<'a>(root: &'a Value, path: &[Seg]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, seg| match (seg, current) {
        (Seg::Key(key), Value::Object(map)) => map.get(*key),
        (Seg::Index(idx), Value::Array(items)) => items.get(*idx),
        _ => None,
    })
}

fn normalize_mapping(root: Value, platform: Platform) -> CanonicalRecord {
    let template = platform.template();
    guarded(root, platform, |root| extract(root, platform, template))
}

// Panics are caught and turned into error records, but the process-wide
// panic hook still runs first; callers that want that output in their logs
// install a hook forwarding to `tracing`.
fn guarded<F>(root: Value, platform: Platform, extract_fn: F) -> CanonicalRecord
where
    F: FnOnce(&Value) -> Result<CanonicalRecord, ExtractError>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| extract_fn(&root)))
        .unwrap_or_else(|payload| Err(ExtractError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(record) => record,
        Err(e) => normalization_error(root, e, platform),
    }
}

fn extract(
    root: &Value,
    platform: Platform,
    t: &PlatformTemplate,
) -> Result<CanonicalRecord, ExtractError> {
    let id = extract_id(root, t.id)?;
    let source_url = platform.source_url(&id);

    let duration = count_field(root, t.duration);
    let duration_secs = match t.duration_unit {
        DurationUnit::Seconds => duration,
        DurationUnit::Millis => duration / 1000,
    };

    Ok(CanonicalRecord {
        platform,
        id,
        description: text_field(root, t.description),
        author: Author {
            unique_id: text_field(root, t.author_unique_id),
            display_name: text_field(root, t.author_display_name),
            avatar_url: text_field(root, t.author_avatar_url),
            follower_count: count_field(root, t.author_follower_count),
            following_count: count_field(root, t.author_following_count),
        },
        created_at: timestamp_field(root, t.created_at),
        statistics: Statistics {
            like_count: count_field(root, t.like_count),
            comment_count: count_field(root, t.comment_count),
            share_count: count_field(root, t.share_count),
            play_count: count_field(root, t.play_count),
        },
        media: Media {
            play_url: text_field(root, t.play_url),
            cover_url: text_field(root, t.cover_url),
            width: count_field(root, t.width),
            height: count_field(root, t.height),
            duration_secs,
        },
        music: Music {
            title: text_field(root, t.music_title),
            author: text_field(root, t.music_author),
            play_url: text_field(root, t.music_play_url),
        },
        tags: list_field(root, t.tags.as_ref()),
        links: list_field(root, t.links.as_ref()),
        media_keys: list_field(root, t.media_keys.as_ref()),
        source_url,
        diagnostic: None,
    })
}

fn string_fallback(text: String, platform: Platform) -> CanonicalRecord {
    debug!(%platform, chars = text.chars().count(), "bare text payload, using string fallback");

    let description = truncate_chars(&text, MAX_FALLBACK_DESCRIPTION_CHARS);
    CanonicalRecord::placeholder(platform, UNKNOWN_ID, description).with_diagnostic(Diagnostic {
        kind: DiagnosticKind::StringFallback,
        message: "upstream returned text instead of a record".to_string(),
        raw: Value::String(text),
        error: None,
    })
}

fn unknown_shape(value: Value, platform: Platform) -> CanonicalRecord {
    let kind_name = json_type_name(&value);
    debug!(%platform, shape = kind_name, "unrecognized payload shape");

    let rendered = match &value {
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let description = truncate_chars(&rendered, MAX_FALLBACK_DESCRIPTION_CHARS);

    CanonicalRecord::placeholder(platform, UNKNOWN_ID, description).with_diagnostic(Diagnostic {
        kind: DiagnosticKind::UnknownShape,
        message: format!("upstream returned {} instead of a record", kind_name),
        raw: value,
        error: None,
    })
}

fn normalization_error(root: Value, error: ExtractError, platform: Platform) -> CanonicalRecord {
    let error = error.to_string();
    warn!(%platform, error = %error, "field extraction failed, emitting error record");

    let description = truncate_chars(&error, MAX_ERROR_DESCRIPTION_CHARS);
    CanonicalRecord::placeholder(platform, ERROR_ID, description).with_diagnostic(Diagnostic {
        kind: DiagnosticKind::NormalizationError,
        message: "field extraction failed".to_string(),
        raw: root,
        error: Some(error),
    })
}

fn extract_id(root: &Value, paths: FieldPaths) -> Result<String, ExtractError> {
    for path in paths {
        match lookup(root, path) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.trim().is_empty() => continue,
            Some(Value::String(s)) => return Ok(s.clone()),
            Some(Value::Number(n)) => return Ok(n.to_string()),
            // A container id cannot form a source URL
            Some(other) => return Err(ExtractError::InvalidId(json_type_name(other))),
        }
    }
    Ok(UNKNOWN_ID.to_string())
}

fn text_field(root: &Value, paths: FieldPaths) -> String {
    paths
        .iter()
        .find_map(|path| lookup(root, path).and_then(as_text))
        .unwrap_or_default()
}

fn count_field(root: &Value, paths: FieldPaths) -> u64 {
    paths
        .iter()
        .find_map(|path| lookup(root, path).and_then(as_count))
        .unwrap_or(0)
}

fn timestamp_field(root: &Value, paths: FieldPaths) -> i64 {
    paths
        .iter()
        .find_map(|path| lookup(root, path).and_then(as_timestamp))
        .unwrap_or(0)
}

fn list_field(root: &Value, rule: Option<&ListRule>) -> Vec<String> {
    let Some(rule) = rule else {
        return Vec::new();
    };
    let Some(Value::Array(entries)) = lookup(root, rule.list) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| matches_discriminant(entry, rule.discriminant))
        .filter_map(|entry| match entry_text(entry, rule.value_keys) {
            Some(text) => Some(text),
            // A matched hashtag entry counts even without a name
            None if rule.discriminant.is_some() => Some(String::new()),
            None => None,
        })
        .collect()
}

fn matches_discriminant(entry: &Value, discriminant: Option<(&str, i64)>) -> bool {
    match discriminant {
        None => true,
        Some((key, expected)) => entry.get(key).and_then(Value::as_i64) == Some(expected),
    }
}

fn entry_text(entry: &Value, keys: &[&str]) -> Option<String> {
    if keys.is_empty() {
        return entry.as_str().filter(|s| !s.is_empty()).map(str::to_string);
    }
    keys.iter()
        .find_map(|key| entry.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .map(str::to_string)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            // Remaining integers are negative
            .or_else(|| n.as_i64().map(|_| 0))
            .or_else(|| {
                n.as_f64()
                    .map(|f| if f.is_finite() && f > 0.0 { f as u64 } else { 0 })
            }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .map(|secs| secs.max(0)),
        Value::String(s) => parse_timestamp(s.trim()),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<i64>() {
        return Some(secs.max(0));
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt.unix_timestamp().max(0));
    }
    let format = time::format_description::parse(TWITTER_DATE_FORMAT).ok()?;
    OffsetDateTime::parse(s, &format)
        .ok()
        .map(|dt| dt.unix_timestamp().max(0))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Anomaly counts over a batch of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Every record, anomalous ones included
    pub processed: usize,
    pub clean: usize,
    pub string_fallback: usize,
    pub unknown_shape: usize,
    pub normalization_error: usize,
}

impl BatchSummary {
    pub fn from_records(records: &[CanonicalRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.record(record);
        }
        summary
    }

    pub fn record(&mut self, record: &CanonicalRecord) {
        self.processed += 1;
        match record.diagnostic_kind() {
            None => self.clean += 1,
            Some(DiagnosticKind::StringFallback) => self.string_fallback += 1,
            Some(DiagnosticKind::UnknownShape) => self.unknown_shape += 1,
            Some(DiagnosticKind::NormalizationError) => self.normalization_error += 1,
        }
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        match kind {
            DiagnosticKind::StringFallback => self.string_fallback,
            DiagnosticKind::UnknownShape => self.unknown_shape,
            DiagnosticKind::NormalizationError => self.normalization_error,
        }
    }

    pub fn anomalies(&self) -> usize {
        self.processed - self.clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn douyin_full() -> Value {
        json!({
            "aweme_id": "7301234567890",
            "desc": "周末做饭 #food",
            "create_time": 1700000000,
            "author": {
                "unique_id": "chef_li",
                "nickname": "李师傅",
                "avatar_larger": {"url_list": ["https://p3.douyinpic.com/avatar.jpeg"]},
                "follower_count": 12000,
                "following_count": 35
            },
            "statistics": {
                "digg_count": 880,
                "comment_count": 42,
                "share_count": 7,
                "play_count": 15000
            },
            "video": {
                "play_addr": {"url_list": ["https://v.douyin.com/play.mp4", "https://backup/play.mp4"]},
                "cover": {"url_list": ["https://p3.douyinpic.com/cover.jpeg"]},
                "duration": 15300,
                "width": 1080,
                "height": 1920
            },
            "music": {
                "title": "原声",
                "author": "李师傅",
                "play_url": {"url_list": ["https://sf.douyin.com/music.mp3"]}
            },
            "text_extra": [
                {"type": 1, "hashtag_name": "food"},
                {"type": 0, "user_id": "42"},
                {"type": 1, "hashtag_name": "cooking"}
            ]
        })
    }

    #[test]
    fn test_scenario_partial_statistics() {
        let record = normalize(
            json!({"aweme_id": "123", "statistics": {"digg_count": 50}}),
            Platform::Douyin,
        );
        assert_eq!(record.id, "123");
        assert_eq!(record.statistics.like_count, 50);
        assert_eq!(record.statistics.comment_count, 0);
        assert_eq!(record.author.display_name, "");
        assert!(record.diagnostic.is_none());
        assert_eq!(record.source_url, "https://www.douyin.com/video/123");
    }

    #[test]
    fn test_scenario_string_fallback() {
        let record = normalize("raw fallback text", Platform::Douyin);
        assert_eq!(record.id, UNKNOWN_ID);
        assert_eq!(record.description, "raw fallback text");
        let diagnostic = record.diagnostic.unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::StringFallback);
        assert_eq!(diagnostic.raw, json!("raw fallback text"));
        assert!(diagnostic.error.is_none());
    }

    #[test]
    fn test_scenario_field_name_list() {
        let record = normalize(json!(["aweme_id", "desc", "statistics"]), Platform::Douyin);
        assert_eq!(record.id, UNKNOWN_ID);
        assert_eq!(record.diagnostic_kind(), Some(DiagnosticKind::UnknownShape));
        assert_eq!(record.description, r#"["aweme_id","desc","statistics"]"#);
    }

    #[test]
    fn test_scenario_hashtag_filter() {
        let record = normalize(
            json!({"text_extra": [
                {"type": 1, "hashtag_name": "food"},
                {"type": 2, "hashtag_name": "other"}
            ]}),
            Platform::Douyin,
        );
        assert_eq!(record.tags, vec!["food".to_string()]);
        assert_eq!(record.id, UNKNOWN_ID);
    }

    #[test]
    fn test_scenario_null() {
        let record = normalize(Value::Null, Platform::Douyin);
        assert_eq!(record.id, UNKNOWN_ID);
        assert_eq!(record.description, "");
        assert_eq!(record.statistics, Statistics::default());
        assert_eq!(record.author, Author::default());
        assert_eq!(record.media, Media::default());
        assert!(record.tags.is_empty());
        let diagnostic = record.diagnostic.unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::UnknownShape);
        assert_eq!(diagnostic.raw, Value::Null);
    }

    #[test]
    fn test_complete_douyin_payload() {
        let record = normalize(douyin_full(), Platform::Douyin);

        assert!(record.is_clean());
        assert_eq!(record.id, "7301234567890");
        assert_eq!(record.description, "周末做饭 #food");
        assert_eq!(record.created_at, 1700000000);
        assert_eq!(
            record.author,
            Author {
                unique_id: "chef_li".to_string(),
                display_name: "李师傅".to_string(),
                avatar_url: "https://p3.douyinpic.com/avatar.jpeg".to_string(),
                follower_count: 12000,
                following_count: 35,
            }
        );
        assert_eq!(
            record.statistics,
            Statistics {
                like_count: 880,
                comment_count: 42,
                share_count: 7,
                play_count: 15000,
            }
        );
        assert_eq!(record.media.play_url, "https://v.douyin.com/play.mp4");
        assert_eq!(record.media.cover_url, "https://p3.douyinpic.com/cover.jpeg");
        assert_eq!((record.media.width, record.media.height), (1080, 1920));
        // 15300 ms
        assert_eq!(record.media.duration_secs, 15);
        assert_eq!(record.music.title, "原声");
        assert_eq!(record.music.play_url, "https://sf.douyin.com/music.mp3");
        assert_eq!(record.tags, vec!["food", "cooking"]);
        assert!(record.links.is_empty());
        assert_eq!(
            record.source_url,
            "https://www.douyin.com/video/7301234567890"
        );
    }

    #[test]
    fn test_missing_subsets_default_independently() {
        let mut payload = douyin_full();
        let obj = payload.as_object_mut().unwrap();
        obj.remove("music");
        obj["author"].as_object_mut().unwrap().remove("nickname");
        obj["statistics"].as_object_mut().unwrap().remove("share_count");
        obj["video"].as_object_mut().unwrap().remove("cover");

        let record = normalize(payload, Platform::Douyin);
        assert!(record.is_clean());
        assert_eq!(record.author.display_name, "");
        assert_eq!(record.author.unique_id, "chef_li");
        assert_eq!(record.statistics.share_count, 0);
        assert_eq!(record.statistics.like_count, 880);
        assert_eq!(record.media.cover_url, "");
        assert_eq!(record.media.play_url, "https://v.douyin.com/play.mp4");
        assert_eq!(record.music, Music::default());
    }

    #[test]
    fn test_non_container_intermediates_default() {
        let record = normalize(
            json!({
                "aweme_id": "1",
                "author": "not-an-object",
                "statistics": [1, 2, 3],
                "video": {"play_addr": {"url_list": "oops"}, "width": "wide"},
                "text_extra": "none"
            }),
            Platform::Douyin,
        );
        assert!(record.is_clean());
        assert_eq!(record.author, Author::default());
        assert_eq!(record.statistics, Statistics::default());
        assert_eq!(record.media.play_url, "");
        assert_eq!(record.media.width, 0);
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_avatar_falls_back_to_thumb() {
        let record = normalize(
            json!({"author": {
                "avatar_larger": {"url_list": []},
                "avatar_thumb": {"url_list": ["https://thumb.jpeg"]}
            }}),
            Platform::Douyin,
        );
        assert_eq!(record.author.avatar_url, "https://thumb.jpeg");
    }

    #[test]
    fn test_number_coercion() {
        let record = normalize(
            json!({
                "aweme_id": 7301234567890u64,
                "statistics": {
                    "digg_count": -5,
                    "comment_count": 12.9,
                    "share_count": "31",
                    "play_count": "many"
                }
            }),
            Platform::Douyin,
        );
        assert_eq!(record.id, "7301234567890");
        assert_eq!(record.statistics.like_count, 0);
        assert_eq!(record.statistics.comment_count, 12);
        assert_eq!(record.statistics.share_count, 31);
        assert_eq!(record.statistics.play_count, 0);
    }

    #[test]
    fn test_hashtag_entries_tolerate_junk() {
        let record = normalize(
            json!({"text_extra": [
                "food",
                null,
                {"type": "1", "hashtag_name": "stringly"},
                {"type": 1},
                {"type": 1, "hashtag_name": ""},
                {"type": 1, "hashtag_name": "kept"}
            ]}),
            Platform::Douyin,
        );
        // Matched entries without a name still count
        assert_eq!(record.tags, vec!["", "", "kept"]);
    }

    #[test]
    fn test_nameless_hashtag_kept_in_order() {
        let record = normalize(
            json!({"text_extra": [{"type": 1}, {"type": 1, "hashtag_name": "food"}]}),
            Platform::Douyin,
        );
        assert_eq!(record.tags, vec!["", "food"]);

        // Undiscriminated lists still skip nameless entries
        let record = normalize(
            json!({"entities": {"hashtags": [{"indices": [0, 4]}, {"tag": "rust"}]}}),
            Platform::Twitter,
        );
        assert_eq!(record.tags, vec!["rust"]);
    }

    #[test]
    fn test_panic_becomes_normalization_error() {
        let raw = json!({"aweme_id": "1"});
        let record = guarded(raw.clone(), Platform::Douyin, |_| panic!("boom"));

        assert_eq!(record.id, ERROR_ID);
        assert_eq!(record.description, "extraction panicked: boom");
        let diagnostic = record.diagnostic.unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::NormalizationError);
        assert_eq!(diagnostic.raw, raw);
        assert_eq!(diagnostic.error.as_deref(), Some("extraction panicked: boom"));
    }

    #[test]
    fn test_panic_message_formats() {
        let owned = panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(owned.as_ref()), "code 7");
        let other = panic::catch_unwind(|| std::panic::panic_any(42u8)).unwrap_err();
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_long_string_truncated() {
        let text = "x".repeat(250);
        let record = normalize(text.clone(), Platform::Twitter);
        assert_eq!(record.description.chars().count(), MAX_FALLBACK_DESCRIPTION_CHARS);
        // Diagnostic keeps the full original
        assert_eq!(record.diagnostic.unwrap().raw, Value::String(text));
    }

    #[test]
    fn test_multibyte_string_truncated_on_char_boundary() {
        let text = "抖".repeat(150);
        let record = normalize(text, Platform::Douyin);
        assert_eq!(record.description.chars().count(), 100);
        assert!(record.description.chars().all(|c| c == '抖'));
    }

    #[test]
    fn test_scalars_are_unknown_shape() {
        for raw in [json!(42), json!(true), json!([]), json!([{"aweme_id": "1"}])] {
            let record = normalize(raw.clone(), Platform::Douyin);
            assert_eq!(record.id, UNKNOWN_ID);
            assert_eq!(record.diagnostic_kind(), Some(DiagnosticKind::UnknownShape));
            assert_eq!(record.diagnostic.unwrap().raw, raw);
        }
    }

    #[test]
    fn test_container_id_is_normalization_error() {
        let raw = json!({"aweme_id": {"nested": 1}, "desc": "x"});
        let record = normalize(raw.clone(), Platform::Douyin);

        assert_eq!(record.id, ERROR_ID);
        assert_eq!(record.source_url, "https://www.douyin.com/video/error");
        assert!(record.description.chars().count() <= MAX_ERROR_DESCRIPTION_CHARS);
        assert_eq!(record.statistics, Statistics::default());

        let diagnostic = record.diagnostic.unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::NormalizationError);
        assert_eq!(diagnostic.raw, raw);
        assert_eq!(
            diagnostic.error.as_deref(),
            Some("id field holds an object, expected a string or number")
        );
    }

    #[test]
    fn test_empty_id_falls_through_to_unknown() {
        let record = normalize(json!({"aweme_id": "  "}), Platform::Douyin);
        assert_eq!(record.id, UNKNOWN_ID);
        assert!(record.is_clean());
    }

    #[test]
    fn test_deterministic() {
        let inputs = [douyin_full(), json!("text"), json!(null), json!({"aweme_id": []})];
        for input in inputs {
            let a = normalize(input.clone(), Platform::Douyin);
            let b = normalize(input, Platform::Douyin);
            assert_eq!(a, b);
            assert_eq!(
                serde_json::to_string(&a).unwrap(),
                serde_json::to_string(&b).unwrap()
            );
        }
    }

    #[test]
    fn test_twitter_v2_payload() {
        let record = normalize(
            json!({
                "id": "1712345678901234567",
                "text": "shipping today #rustlang #release",
                "created_at": "2023-01-02T03:04:05+08:00",
                "author": {
                    "username": "ferris",
                    "name": "Ferris",
                    "profile_image_url": "https://pbs.twimg.com/ferris.jpg",
                    "public_metrics": {"followers_count": 5000, "following_count": 12}
                },
                "public_metrics": {
                    "like_count": 300,
                    "reply_count": 20,
                    "retweet_count": 45,
                    "impression_count": 90000
                },
                "entities": {
                    "hashtags": [{"tag": "rustlang"}, {"tag": "release"}],
                    "urls": [{"url": "https://t.co/x", "expanded_url": "https://blog.rust-lang.org"}]
                },
                "attachments": {"media_keys": ["3_1", "3_2"]}
            }),
            Platform::Twitter,
        );

        assert!(record.is_clean());
        assert_eq!(record.id, "1712345678901234567");
        assert_eq!(record.created_at, 1672599845);
        assert_eq!(record.author.unique_id, "ferris");
        assert_eq!(record.author.follower_count, 5000);
        assert_eq!(record.statistics.like_count, 300);
        assert_eq!(record.statistics.comment_count, 20);
        assert_eq!(record.statistics.share_count, 45);
        assert_eq!(record.statistics.play_count, 90000);
        assert_eq!(record.tags, vec!["rustlang", "release"]);
        assert_eq!(record.links, vec!["https://blog.rust-lang.org"]);
        assert_eq!(record.media_keys, vec!["3_1", "3_2"]);
        assert_eq!(record.source_url, "https://x.com/i/status/1712345678901234567");
    }

    #[test]
    fn test_twitter_legacy_payload() {
        let record = normalize(
            json!({
                "id_str": "1050118621198921728",
                "full_text": "hello",
                "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                "user": {"screen_name": "jack", "name": "Jack", "followers_count": 10, "friends_count": 2},
                "favorite_count": 5,
                "retweet_count": 1,
                "views": {"count": "1234"},
                "entities": {"hashtags": [{"text": "legacy"}], "urls": [{"url": "https://t.co/y"}]},
                "extended_entities": {"media": [{
                    "media_url_https": "https://pbs.twimg.com/thumb.jpg",
                    "original_info": {"width": 1280, "height": 720},
                    "video_info": {"duration_millis": 30033, "variants": [{"url": "https://video.twimg.com/v.mp4"}]}
                }]}
            }),
            Platform::Twitter,
        );

        assert!(record.is_clean());
        assert_eq!(record.id, "1050118621198921728");
        assert_eq!(record.description, "hello");
        assert_eq!(record.created_at, 1539202764);
        assert_eq!(record.author.unique_id, "jack");
        assert_eq!(record.author.following_count, 2);
        assert_eq!(record.statistics.like_count, 5);
        assert_eq!(record.statistics.comment_count, 0);
        assert_eq!(record.statistics.play_count, 1234);
        assert_eq!(record.tags, vec!["legacy"]);
        assert_eq!(record.links, vec!["https://t.co/y"]);
        assert_eq!(record.media.play_url, "https://video.twimg.com/v.mp4");
        assert_eq!(record.media.cover_url, "https://pbs.twimg.com/thumb.jpg");
        assert_eq!(record.media.duration_secs, 30);
        assert_eq!((record.media.width, record.media.height), (1280, 720));
    }

    #[test]
    fn test_unparseable_timestamp_is_zero() {
        let record = normalize(
            json!({"id": "1", "created_at": "last tuesday"}),
            Platform::Twitter,
        );
        assert_eq!(record.created_at, 0);
        let record = normalize(json!({"create_time": "1700000000"}), Platform::Douyin);
        assert_eq!(record.created_at, 1700000000);
    }

    #[test]
    fn test_lookup_short_circuits() {
        let root = json!({"a": {"b": [10, {"c": "deep"}]}});
        assert_eq!(
            lookup(&root, &[Seg::Key("a"), Seg::Key("b"), Seg::Index(1), Seg::Key("c")]),
            Some(&json!("deep"))
        );
        assert_eq!(lookup(&root, &[Seg::Key("a"), Seg::Key("x"), Seg::Key("c")]), None);
        assert_eq!(lookup(&root, &[Seg::Key("a"), Seg::Index(0)]), None);
        assert_eq!(lookup(&root, &[Seg::Key("a"), Seg::Key("b"), Seg::Index(9)]), None);
    }

    #[test]
    fn test_batch_summary() {
        let records = normalize_all(
            vec![
                douyin_full(),
                json!("text"),
                json!(null),
                json!(["aweme_id"]),
                json!({"aweme_id": [1]}),
                json!({"aweme_id": "2"}),
            ],
            Platform::Douyin,
        );
        let summary = BatchSummary::from_records(&records);
        assert_eq!(summary.processed, 6);
        assert_eq!(summary.clean, 2);
        assert_eq!(summary.count(DiagnosticKind::StringFallback), 1);
        assert_eq!(summary.count(DiagnosticKind::UnknownShape), 2);
        assert_eq!(summary.count(DiagnosticKind::NormalizationError), 1);
        assert_eq!(summary.anomalies(), 4);
    }
}
