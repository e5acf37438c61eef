//! Schema normalization.
//!
//! Maps the two GraphQL payload shapes onto [`crate::model::Post`]:
//!
//! - **full** (`TweetDetail`, authenticated): a timeline whose
//!   `TimelineAddEntries` instruction holds the root post followed by
//!   reply modules.
//! - **guest** (`TweetResultByRestId`): a single post without thread context.
//!
//! Everything here is pure. A payload that lacks a required field or breaks
//! the instruction layout yields a [`NormalizeError`]; nothing is silently
//! defaulted except entity categories, which the API omits when empty.

mod raw;
mod tweet;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::model::Post;

pub use tweet::full_resolution_image_url;

/// Instruction type that carries the visible conversation.
pub const ADD_ENTRIES_INSTRUCTION: &str = "TimelineAddEntries";

/// Entry type wrapping one reply branch.
pub const MODULE_ENTRY_TYPE: &str = "TimelineTimelineModule";

/// Format of `created_at` on posts and users, e.g.
/// `Wed Oct 10 20:19:24 +0000 2018`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unexpected payload shape at {context}: {source}")]
    Schema {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("conversation has no TimelineAddEntries instruction")]
    MissingAddEntries,
    #[error("TimelineAddEntries instruction has no entries")]
    MissingRootEntry,
    #[error("entry {entry_id} carries no tweet")]
    MissingTweet { entry_id: String },
    #[error("invalid numeric id {value:?} in {field}: {source}")]
    InvalidId {
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("invalid count {value:?} in {field}")]
    InvalidCount { field: &'static str, value: String },
    #[error("invalid timestamp {value:?} in {field}: {source}")]
    InvalidTimestamp {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("display range {start}..{end} exceeds text of {len} characters")]
    DisplayRangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("video entity has no variants")]
    EmptyVideoVariants,
}

impl NormalizeError {
    fn schema(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Schema {
            context: context.into(),
            source,
        }
    }
}

/// Normalize an authenticated `TweetDetail` document.
///
/// The first entry of the first `TimelineAddEntries` instruction is the root
/// post. Each later `TimelineTimelineModule` entry contributes its first item
/// as one element of `conversation_threads`, in document order. Other entry
/// kinds (cursors, promoted content) are skipped.
///
/// # Errors
///
/// Returns an error if the instruction is missing, has no entries, or any
/// post it references fails to normalize.
pub fn normalize_full(document: &Value) -> Result<Post, NormalizeError> {
    let document = raw::FullDocument::deserialize(document)
        .map_err(|e| NormalizeError::schema("data.threaded_conversation_with_injections_v2", e))?;

    let instruction = document
        .data
        .threaded_conversation_with_injections_v2
        .instructions
        .into_iter()
        .find(|ins| ins.kind == ADD_ENTRIES_INSTRUCTION)
        .ok_or(NormalizeError::MissingAddEntries)?;

    let mut entries = instruction.entries.into_iter().enumerate();
    let (_, root_entry) = entries.next().ok_or(NormalizeError::MissingRootEntry)?;

    let root_id = entry_label(&root_entry, 0);
    let root_result = root_entry
        .content
        .item_content
        .and_then(|content| content.tweet_results)
        .ok_or_else(|| NormalizeError::MissingTweet {
            entry_id: root_id.clone(),
        })?;
    let mut post = tweet::map_tweet(&root_result.result, &root_id)?;

    for (index, entry) in entries {
        if entry.content.entry_type != MODULE_ENTRY_TYPE {
            continue;
        }
        let entry_id = entry_label(&entry, index);
        let reply = entry
            .content
            .items
            .into_iter()
            .next()
            .and_then(|item| item.item.item_content.tweet_results)
            .ok_or_else(|| NormalizeError::MissingTweet {
                entry_id: entry_id.clone(),
            })?;
        post.conversation_threads
            .push(tweet::map_tweet(&reply.result, &entry_id)?);
    }

    debug!(
        post_id = post.id,
        replies = post.conversation_threads.len(),
        "Normalized conversation"
    );

    Ok(post)
}

/// Normalize a guest `TweetResultByRestId` document.
///
/// # Errors
///
/// Returns an error if `data.tweetResult.result` is missing or does not
/// normalize.
pub fn normalize_guest(document: &Value) -> Result<Post, NormalizeError> {
    let document = raw::GuestDocument::deserialize(document)
        .map_err(|e| NormalizeError::schema("data.tweetResult", e))?;
    tweet::map_tweet(&document.data.tweet_result.result, "data.tweetResult.result")
}

fn entry_label(entry: &raw::Entry, index: usize) -> String {
    entry
        .entry_id
        .clone()
        .unwrap_or_else(|| format!("entries[{index}]"))
}
