//! Tweet result to [`Post`] mapping shared by both payload shapes.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;

use super::raw;
use super::{NormalizeError, TIMESTAMP_FORMAT};
use crate::model::{
    Author, AuthorStatistics, EntityBundle, Hashtag, Link, Media, Post, PostStatistics,
    PostStatus, Symbol, TextRange, Timestamp, UserMention, ViewerRelationship,
};

/// Suffix marking the 48x48 avatar thumbnail.
const THUMBNAIL_SUFFIX: &str = "_normal";

/// Strip the thumbnail marker from a profile image URL.
///
/// `https://pbs.twimg.com/profile_images/1/a_normal.jpg` becomes
/// `https://pbs.twimg.com/profile_images/1/a.jpg`. Only a marker directly
/// before the file extension is removed, so applying it twice is the same as
/// applying it once.
#[must_use]
pub fn full_resolution_image_url(url: &str) -> String {
    let name_start = url.rfind('/').map_or(0, |i| i + 1);
    let (dir, name) = url.split_at(name_start);
    let (mut stem, extension) = name.rfind('.').map_or((name, ""), |i| name.split_at(i));
    while let Some(rest) = stem.strip_suffix(THUMBNAIL_SUFFIX) {
        stem = rest;
    }
    format!("{dir}{stem}{extension}")
}

/// Map one `tweet_results.result` object. `location` names the entry in
/// error messages.
pub(super) fn map_tweet(result: &Value, location: &str) -> Result<Post, NormalizeError> {
    let tweet = raw::Tweet::deserialize(result)
        .map_err(|e| NormalizeError::schema(location, e))?;
    let legacy = tweet.legacy;

    let display_text_range = TextRange::from(legacy.display_text_range);
    let text_len = legacy.full_text.chars().count();
    if !display_text_range.fits(text_len) {
        return Err(NormalizeError::DisplayRangeOutOfBounds {
            start: display_text_range.start,
            end: display_text_range.end,
            len: text_len,
        });
    }

    let views_count = tweet
        .views
        .and_then(|views| views.count)
        .map(|count| {
            count.parse::<u64>().map_err(|_| NormalizeError::InvalidCount {
                field: "views.count",
                value: count,
            })
        })
        .transpose()?;

    Ok(Post {
        id: parse_id("legacy.id_str", &legacy.id_str)?,
        created_at: parse_timestamp("legacy.created_at", &legacy.created_at)?,
        display_text_range,
        full_text: legacy.full_text,
        lang: legacy.lang,
        possibly_sensitive: legacy.possibly_sensitive,
        statistics: PostStatistics {
            views_count,
            bookmark_count: legacy.bookmark_count,
            favourite_count: legacy.favorite_count,
            quote_count: legacy.quote_count,
            reply_count: legacy.reply_count,
            retweet_count: legacy.retweet_count,
        },
        status: PostStatus {
            bookmarked: legacy.bookmarked,
            favourited: legacy.favorited,
            retweeted: legacy.retweeted,
        },
        entities: map_entities(legacy.entities)?,
        conversation_threads: Vec::new(),
        author: map_user(tweet.core.user_results.result)?,
    })
}

fn map_entities(entities: raw::Entities) -> Result<EntityBundle, NormalizeError> {
    let mut media = Vec::with_capacity(entities.media.len());
    for entity in entities.media {
        match entity {
            raw::Media::Photo {
                indices,
                media_url_https,
                expanded_url,
            } => media.push(Media::Photo {
                indices: indices.into(),
                url: media_url_https,
                expanded_url,
            }),
            raw::Media::Video {
                indices,
                expanded_url,
                video_info,
            } => {
                let best = video_info
                    .variants
                    .into_iter()
                    .last()
                    .ok_or(NormalizeError::EmptyVideoVariants)?;
                media.push(Media::Video {
                    indices: indices.into(),
                    url: best.url,
                    expanded_url,
                });
            }
            raw::Media::AnimatedGif | raw::Media::Unknown => {}
        }
    }

    let user_mentions = entities
        .user_mentions
        .into_iter()
        .map(|mention| {
            Ok(UserMention {
                id: parse_id("entities.user_mentions.id_str", &mention.id_str)?,
                name: mention.name,
                screen_name: mention.screen_name,
                indices: mention.indices.into(),
            })
        })
        .collect::<Result<Vec<_>, NormalizeError>>()?;

    Ok(EntityBundle {
        hashtags: entities
            .hashtags
            .into_iter()
            .map(|tag| Hashtag {
                indices: tag.indices.into(),
                text: tag.text,
            })
            .collect(),
        media,
        symbols: entities
            .symbols
            .into_iter()
            .map(|symbol| Symbol {
                indices: symbol.indices.into(),
                text: symbol.text,
            })
            .collect(),
        timestamps: entities
            .timestamps
            .into_iter()
            .map(|ts| Timestamp {
                indices: ts.indices.into(),
            })
            .collect(),
        urls: entities
            .urls
            .into_iter()
            .map(|link| Link {
                indices: link.indices.into(),
                display_url: link.display_url,
                expanded_url: link.expanded_url,
                url: link.url,
            })
            .collect(),
        user_mentions,
    })
}

fn map_user(user: raw::User) -> Result<Author, NormalizeError> {
    let legacy = user.legacy;

    let pinned_post_ids = legacy
        .pinned_tweet_ids_str
        .iter()
        .map(|id| parse_id("legacy.pinned_tweet_ids_str", id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Author {
        id: parse_id("core.user_results.result.rest_id", &user.rest_id)?,
        name: legacy.name,
        screen_name: legacy.screen_name,
        location: legacy.location,
        description: legacy.description,
        protected: legacy.protected,
        verified: legacy.verified,
        created_at: parse_timestamp("user.legacy.created_at", &legacy.created_at)?,
        statistics: AuthorStatistics {
            followers_count: legacy.followers_count,
            friends_count: legacy.friends_count,
            listed_count: legacy.listed_count,
            favourites_count: legacy.favourites_count,
            statuses_count: legacy.statuses_count,
        },
        relationship: ViewerRelationship {
            followed_by: legacy.followed_by,
            following: legacy.following,
            can_dm: legacy.can_dm,
        },
        pinned_post_ids,
        profile_image: full_resolution_image_url(&legacy.profile_image_url_https),
        profile_banner: legacy.profile_banner_url,
    })
}

fn parse_id(field: &'static str, value: &str) -> Result<u64, NormalizeError> {
    value.parse().map_err(|source| NormalizeError::InvalidId {
        field,
        value: value.to_string(),
        source,
    })
}

fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> Result<DateTime<FixedOffset>, NormalizeError> {
    DateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| {
        NormalizeError::InvalidTimestamp {
            field,
            value: value.to_string(),
            source,
        }
    })
}
