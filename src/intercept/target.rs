use regex::Regex;
use url::Url;

/// Pattern to extract the status ID from a post URL.
static STATUS_ID_PATTERN: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"/status/(\d+)").unwrap());

/// Hosts that serve the same posts as `x.com`.
const X_HOST_ALIASES: &[&str] = &[
    "twitter.com",
    "www.twitter.com",
    "mobile.twitter.com",
    "www.x.com",
    "mobile.x.com",
];

/// Rewrite a post URL onto `x.com`.
///
/// The interception patterns only match responses issued by `x.com`
/// pages, so twitter.com and mobile links are moved there first. Anything
/// that is not an http(s) URL is returned unchanged.
#[must_use]
pub fn canonical_status_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return url.to_string();
    }

    let host = parsed.host_str().map(str::to_lowercase);
    if let Some(host) = host {
        if X_HOST_ALIASES.contains(&host.as_str()) || host == "x.com" {
            let _ = parsed.set_scheme("https");
            let _ = parsed.set_host(Some("x.com"));
            let _ = parsed.set_port(None);
        }
    }

    parsed.to_string()
}

/// Extract the numeric status ID from a post URL.
///
/// Post URLs have the form `https://x.com/{user}/status/{id}` or
/// `https://x.com/i/status/{id}`.
#[must_use]
pub fn status_id(url: &str) -> Option<u64> {
    STATUS_ID_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
