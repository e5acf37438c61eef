//! Unified post model.
//!
//! Both the authenticated conversation-detail payload and the guest
//! result-by-id payload normalize into these types. Everything here is
//! built once by [`crate::normalize`] and never mutated afterwards.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// A half-open `[start, end)` range of character offsets into a post's
/// `full_text`.
///
/// Offsets count Unicode scalar values, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of characters covered by the range.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the range fits inside a text of `char_len` characters.
    #[must_use]
    pub const fn fits(&self, char_len: usize) -> bool {
        self.start <= self.end && self.end <= char_len
    }

    /// Slice `text` by character offsets.
    ///
    /// Out-of-bounds ends are clamped to the end of `text`.
    #[must_use]
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        let byte_offset = |chars: usize| {
            text.char_indices()
                .nth(chars)
                .map_or(text.len(), |(offset, _)| offset)
        };
        let start = byte_offset(self.start);
        let end = byte_offset(self.end.max(self.start));
        &text[start..end]
    }
}

impl From<[usize; 2]> for TextRange {
    fn from([start, end]: [usize; 2]) -> Self {
        Self::new(start, end)
    }
}

/// A captured post, optionally carrying its first level of replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: u64,
    pub created_at: DateTime<FixedOffset>,
    pub full_text: String,
    pub display_text_range: TextRange,
    pub lang: String,
    /// `None` when the payload did not say either way.
    pub possibly_sensitive: Option<bool>,
    pub statistics: PostStatistics,
    pub status: PostStatus,
    pub entities: EntityBundle,
    /// Replies in thread order. Only populated one level deep: replies
    /// never carry threads of their own.
    pub conversation_threads: Vec<Post>,
    pub author: Author,
}

impl Post {
    /// The user-facing text, without leading mentions or trailing media links.
    #[must_use]
    pub fn text(&self) -> &str {
        self.display_text_range.slice(&self.full_text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostStatistics {
    /// Absent for posts that predate view counting.
    pub views_count: Option<u64>,
    pub bookmark_count: u64,
    pub favourite_count: u64,
    pub quote_count: u64,
    pub reply_count: u64,
    pub retweet_count: u64,
}

/// Flags relative to the viewing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostStatus {
    pub bookmarked: bool,
    pub favourited: bool,
    pub retweeted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub screen_name: String,
    pub location: String,
    pub description: String,
    pub protected: bool,
    pub verified: bool,
    pub created_at: DateTime<FixedOffset>,
    pub statistics: AuthorStatistics,
    pub relationship: ViewerRelationship,
    pub pinned_post_ids: Vec<u64>,
    /// Full-resolution avatar URL.
    pub profile_image: String,
    pub profile_banner: Option<String>,
}

impl Author {
    /// The `@screen_name` form.
    #[must_use]
    pub fn handle(&self) -> String {
        format!("@{}", self.screen_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthorStatistics {
    pub followers_count: u64,
    pub friends_count: u64,
    pub listed_count: u64,
    pub favourites_count: u64,
    pub statuses_count: u64,
}

/// Relationship between the author and the viewing account.
///
/// Guest sessions omit these, so every flag is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewerRelationship {
    pub followed_by: Option<bool>,
    pub following: Option<bool>,
    pub can_dm: Option<bool>,
}

/// Annotations attached to a post's `full_text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityBundle {
    pub hashtags: Vec<Hashtag>,
    pub media: Vec<Media>,
    pub symbols: Vec<Symbol>,
    pub timestamps: Vec<Timestamp>,
    pub urls: Vec<Link>,
    pub user_mentions: Vec<UserMention>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hashtag {
    pub indices: TextRange,
    pub text: String,
}

/// Photo or video attachment. Animated GIFs are not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Media {
    Photo {
        indices: TextRange,
        url: String,
        expanded_url: String,
    },
    Video {
        indices: TextRange,
        /// Last listed (highest quality) variant.
        url: String,
        expanded_url: String,
    },
}

impl Media {
    #[must_use]
    pub const fn indices(&self) -> TextRange {
        match self {
            Self::Photo { indices, .. } | Self::Video { indices, .. } => *indices,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Photo { url, .. } | Self::Video { url, .. } => url,
        }
    }
}

/// Cashtag such as `$TSLA`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub indices: TextRange,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    pub indices: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub indices: TextRange,
    pub display_url: String,
    pub expanded_url: String,
    /// The shortened `t.co` form as it appears in the text.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMention {
    pub id: u64,
    pub name: String,
    pub screen_name: String,
    pub indices: TextRange,
}
