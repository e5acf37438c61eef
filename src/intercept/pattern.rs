use regex::Regex;
use serde::Serialize;

/// Authenticated conversation endpoint. The path segment after `graphql/` is
/// an operation hash that changes between deployments.
static TWEET_DETAIL_PATTERN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^https://x\.com/i/api/graphql/[^/?]+/TweetDetail(\?.*)?$").unwrap()
});

/// Guest lookup endpoint.
static TWEET_BY_ID_PATTERN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^https://api\.x\.com/graphql/[^/?]+/TweetResultByRestId(\?.*)?$").unwrap()
});

/// Which payload shape a response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// `TweetDetail`, served to logged-in sessions.
    Full,
    /// `TweetResultByRestId`, served to guests.
    Guest,
}

impl PayloadShape {
    /// Classify a response URL. Query strings are ignored.
    #[must_use]
    pub fn classify(url: &str) -> Option<Self> {
        if TWEET_DETAIL_PATTERN.is_match(url) {
            Some(Self::Full)
        } else if TWEET_BY_ID_PATTERN.is_match(url) {
            Some(Self::Guest)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Guest => "guest",
        }
    }
}

impl std::fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
