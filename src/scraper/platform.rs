// Platform kinds and their field templates
//
// Each platform describes where the normalizer finds every canonical field
// inside an upstream payload. A field may list several candidate paths; the
// first one that yields a usable value wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a nested lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seg {
    /// Object member
    Key(&'static str),
    /// Array element
    Index(usize),
}

use Seg::{Index, Key};

/// Path from the payload root to a value
pub type FieldPath = &'static [Seg];

/// Candidate paths for one field, tried in order
pub type FieldPaths = &'static [FieldPath];

/// Rule for pulling a list of strings out of an array of entries
#[derive(Debug, Clone, Copy)]
pub struct ListRule {
    /// Where the array lives
    pub list: FieldPath,
    /// Entry must carry `key == value` to be kept
    pub discriminant: Option<(&'static str, i64)>,
    /// Keys holding the string inside each entry. Empty: the entry itself is the string.
    pub value_keys: &'static [&'static str],
}

/// Unit the upstream uses for media duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Seconds,
    Millis,
}

/// Field layout of one platform's payloads
#[derive(Debug)]
pub struct PlatformTemplate {
    pub id: FieldPaths,
    pub description: FieldPaths,

    pub author_unique_id: FieldPaths,
    pub author_display_name: FieldPaths,
    pub author_avatar_url: FieldPaths,
    pub author_follower_count: FieldPaths,
    pub author_following_count: FieldPaths,

    pub created_at: FieldPaths,

    pub like_count: FieldPaths,
    pub comment_count: FieldPaths,
    pub share_count: FieldPaths,
    pub play_count: FieldPaths,

    pub play_url: FieldPaths,
    pub cover_url: FieldPaths,
    pub width: FieldPaths,
    pub height: FieldPaths,
    pub duration: FieldPaths,
    pub duration_unit: DurationUnit,

    pub music_title: FieldPaths,
    pub music_author: FieldPaths,
    pub music_play_url: FieldPaths,

    pub tags: Option<ListRule>,
    pub links: Option<ListRule>,
    pub media_keys: Option<ListRule>,

    /// Post URL, `{id}` is replaced by the record id
    pub url_template: &'static str,
}

/// Douyin hashtag entries in `text_extra` carry `type == 1`
pub const DOUYIN_HASHTAG_TYPE: i64 = 1;

static DOUYIN: PlatformTemplate = PlatformTemplate {
    id: &[&[Key("aweme_id")]],
    description: &[&[Key("desc")]],

    author_unique_id: &[&[Key("author"), Key("unique_id")]],
    author_display_name: &[&[Key("author"), Key("nickname")]],
    author_avatar_url: &[
        &[Key("author"), Key("avatar_larger"), Key("url_list"), Index(0)],
        &[Key("author"), Key("avatar_thumb"), Key("url_list"), Index(0)],
    ],
    author_follower_count: &[&[Key("author"), Key("follower_count")]],
    author_following_count: &[&[Key("author"), Key("following_count")]],

    created_at: &[&[Key("create_time")]],

    like_count: &[&[Key("statistics"), Key("digg_count")]],
    comment_count: &[&[Key("statistics"), Key("comment_count")]],
    share_count: &[&[Key("statistics"), Key("share_count")]],
    play_count: &[&[Key("statistics"), Key("play_count")]],

    play_url: &[&[Key("video"), Key("play_addr"), Key("url_list"), Index(0)]],
    cover_url: &[&[Key("video"), Key("cover"), Key("url_list"), Index(0)]],
    width: &[&[Key("video"), Key("width")]],
    height: &[&[Key("video"), Key("height")]],
    duration: &[&[Key("video"), Key("duration")], &[Key("duration")]],
    duration_unit: DurationUnit::Millis,

    music_title: &[&[Key("music"), Key("title")]],
    music_author: &[&[Key("music"), Key("author")]],
    music_play_url: &[&[Key("music"), Key("play_url"), Key("url_list"), Index(0)]],

    tags: Some(ListRule {
        list: &[Key("text_extra")],
        discriminant: Some(("type", DOUYIN_HASHTAG_TYPE)),
        value_keys: &["hashtag_name"],
    }),
    links: None,
    media_keys: None,

    url_template: "https://www.douyin.com/video/{id}",
};

// v2 API shape first, legacy (v1.1 / GraphQL `legacy`) shape as fallback
static TWITTER: PlatformTemplate = PlatformTemplate {
    id: &[&[Key("id")], &[Key("id_str")], &[Key("tweet_id")], &[Key("rest_id")]],
    description: &[&[Key("text")], &[Key("full_text")], &[Key("tweet_text")]],

    author_unique_id: &[
        &[Key("author"), Key("username")],
        &[Key("user"), Key("screen_name")],
    ],
    author_display_name: &[&[Key("author"), Key("name")], &[Key("user"), Key("name")]],
    author_avatar_url: &[
        &[Key("author"), Key("profile_image_url")],
        &[Key("user"), Key("profile_image_url_https")],
    ],
    author_follower_count: &[
        &[Key("author"), Key("public_metrics"), Key("followers_count")],
        &[Key("user"), Key("followers_count")],
    ],
    author_following_count: &[
        &[Key("author"), Key("public_metrics"), Key("following_count")],
        &[Key("user"), Key("friends_count")],
    ],

    created_at: &[&[Key("created_at")]],

    like_count: &[&[Key("public_metrics"), Key("like_count")], &[Key("favorite_count")]],
    comment_count: &[&[Key("public_metrics"), Key("reply_count")], &[Key("reply_count")]],
    share_count: &[&[Key("public_metrics"), Key("retweet_count")], &[Key("retweet_count")]],
    play_count: &[
        &[Key("public_metrics"), Key("impression_count")],
        &[Key("views"), Key("count")],
    ],

    play_url: &[&[
        Key("extended_entities"),
        Key("media"),
        Index(0),
        Key("video_info"),
        Key("variants"),
        Index(0),
        Key("url"),
    ]],
    cover_url: &[&[Key("extended_entities"), Key("media"), Index(0), Key("media_url_https")]],
    width: &[&[
        Key("extended_entities"),
        Key("media"),
        Index(0),
        Key("original_info"),
        Key("width"),
    ]],
    height: &[&[
        Key("extended_entities"),
        Key("media"),
        Index(0),
        Key("original_info"),
        Key("height"),
    ]],
    duration: &[&[
        Key("extended_entities"),
        Key("media"),
        Index(0),
        Key("video_info"),
        Key("duration_millis"),
    ]],
    duration_unit: DurationUnit::Millis,

    music_title: &[],
    music_author: &[],
    music_play_url: &[],

    tags: Some(ListRule {
        list: &[Key("entities"), Key("hashtags")],
        discriminant: None,
        value_keys: &["tag", "text"],
    }),
    links: Some(ListRule {
        list: &[Key("entities"), Key("urls")],
        discriminant: None,
        value_keys: &["expanded_url", "url"],
    }),
    media_keys: Some(ListRule {
        list: &[Key("attachments"), Key("media_keys")],
        discriminant: None,
        value_keys: &[],
    }),

    url_template: "https://x.com/i/status/{id}",
};

/// Supported social-media sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Douyin short videos
    Douyin,
    /// Twitter / X posts
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Douyin, Platform::Twitter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Douyin => "douyin",
            Self::Twitter => "twitter",
        }
    }

    pub fn template(&self) -> &'static PlatformTemplate {
        match self {
            Self::Douyin => &DOUYIN,
            Self::Twitter => &TWITTER,
        }
    }

    /// Canonical post URL for an id
    pub fn source_url(&self, id: &str) -> String {
        self.template().url_template.replace("{id}", id)
    }

    /// Landing page used for connectivity checks
    pub fn home_url(&self) -> &'static str {
        match self {
            Self::Douyin => "https://www.douyin.com/",
            Self::Twitter => "https://x.com/",
        }
    }

    /// Environment variable holding the session cookie
    pub fn cookie_env_var(&self) -> &'static str {
        match self {
            Self::Douyin => "DOUYIN_COOKIE",
            Self::Twitter => "TWITTER_COOKIE",
        }
    }

    /// Whether fetching works at all without a logged-in cookie
    pub fn requires_cookie(&self) -> bool {
        matches!(self, Self::Twitter)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "douyin" | "dy" | "tiktok-cn" => Ok(Self::Douyin),
            "twitter" | "x" | "tw" => Ok(Self::Twitter),
            other => Err(format!("Unknown platform: {}", other)),
        }
    }
}
