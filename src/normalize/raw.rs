//! Wire shapes of the GraphQL payloads.
//!
//! Only the fields the normalizer reads are declared; serde ignores the rest.
//! `Option` fields may be missing from the payload, everything else is
//! required and a missing key fails deserialization.

use serde::Deserialize;
use serde_json::Value;

/// `TweetDetail` response (authenticated).
#[derive(Debug, Deserialize)]
pub struct FullDocument {
    pub data: FullData,
}

#[derive(Debug, Deserialize)]
pub struct FullData {
    pub threaded_conversation_with_injections_v2: Conversation,
}

#[derive(Debug, Deserialize)]
pub struct Conversation {
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Deserialize)]
pub struct Instruction {
    #[serde(rename = "type")]
    pub kind: String,
    /// Only present on `TimelineAddEntries`.
    #[serde(default)]
    pub entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default)]
    pub entry_id: Option<String>,
    pub content: EntryContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryContent {
    pub entry_type: String,
    /// Set on `TimelineTimelineItem` entries.
    #[serde(default)]
    pub item_content: Option<ItemContent>,
    /// Set on `TimelineTimelineModule` entries.
    #[serde(default)]
    pub items: Vec<ModuleItem>,
}

#[derive(Debug, Deserialize)]
pub struct ModuleItem {
    pub item: ModuleItemBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleItemBody {
    pub item_content: ItemContent,
}

#[derive(Debug, Deserialize)]
pub struct ItemContent {
    /// Cursor and user items carry no tweet.
    #[serde(default)]
    pub tweet_results: Option<TweetResults>,
}

/// Tweet results are kept as raw JSON so a schema failure can be reported
/// against the entry it came from.
#[derive(Debug, Deserialize)]
pub struct TweetResults {
    pub result: Value,
}

/// `TweetResultByRestId` response (guest).
#[derive(Debug, Deserialize)]
pub struct GuestDocument {
    pub data: GuestData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestData {
    pub tweet_result: TweetResults,
}

#[derive(Debug, Deserialize)]
pub struct Tweet {
    pub legacy: TweetLegacy,
    pub core: TweetCore,
    #[serde(default)]
    pub views: Option<Views>,
}

#[derive(Debug, Deserialize)]
pub struct Views {
    /// Stringified integer; missing while the count is hidden.
    #[serde(default)]
    pub count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TweetCore {
    pub user_results: UserResults,
}

#[derive(Debug, Deserialize)]
pub struct UserResults {
    pub result: User,
}

#[derive(Debug, Deserialize)]
pub struct TweetLegacy {
    pub id_str: String,
    pub created_at: String,
    pub full_text: String,
    pub display_text_range: [usize; 2],
    pub lang: String,
    pub possibly_sensitive: Option<bool>,
    pub bookmark_count: u64,
    pub favorite_count: u64,
    pub quote_count: u64,
    pub reply_count: u64,
    pub retweet_count: u64,
    pub bookmarked: bool,
    pub favorited: bool,
    pub retweeted: bool,
    pub entities: Entities,
}

/// Every category is omitted by the API when it has no members.
#[derive(Debug, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub hashtags: Vec<TaggedText>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub symbols: Vec<TaggedText>,
    #[serde(default)]
    pub timestamps: Vec<Timestamp>,
    #[serde(default)]
    pub urls: Vec<Link>,
    #[serde(default)]
    pub user_mentions: Vec<UserMention>,
}

/// Hashtags and symbols share one shape.
#[derive(Debug, Deserialize)]
pub struct TaggedText {
    pub indices: [usize; 2],
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Media {
    Photo {
        indices: [usize; 2],
        media_url_https: String,
        expanded_url: String,
    },
    Video {
        indices: [usize; 2],
        expanded_url: String,
        video_info: VideoInfo,
    },
    AnimatedGif,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    pub variants: Vec<VideoVariant>,
}

#[derive(Debug, Deserialize)]
pub struct VideoVariant {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Timestamp {
    pub indices: [usize; 2],
}

#[derive(Debug, Deserialize)]
pub struct Link {
    pub indices: [usize; 2],
    pub display_url: String,
    pub expanded_url: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UserMention {
    pub id_str: String,
    pub name: String,
    pub screen_name: String,
    pub indices: [usize; 2],
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub rest_id: String,
    pub legacy: UserLegacy,
}

#[derive(Debug, Deserialize)]
pub struct UserLegacy {
    pub name: String,
    pub screen_name: String,
    pub location: String,
    pub description: String,
    /// Only sent for protected accounts.
    #[serde(default)]
    pub protected: bool,
    pub verified: bool,
    pub created_at: String,
    pub followers_count: u64,
    pub friends_count: u64,
    pub listed_count: u64,
    pub favourites_count: u64,
    pub statuses_count: u64,
    pub followed_by: Option<bool>,
    pub following: Option<bool>,
    pub can_dm: Option<bool>,
    pub pinned_tweet_ids_str: Vec<String>,
    pub profile_image_url_https: String,
    pub profile_banner_url: Option<String>,
}
