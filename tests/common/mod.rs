//! Shared fixtures and an in-memory browser session for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;
use tweet_capture::session::{
    InterceptedResponse, ResponseStream, Session, SessionCookie, SessionPage,
};

pub const TWEET_DETAIL_JSON: &str = include_str!("../fixtures/tweet_detail.json");
pub const TWEET_RESULT_JSON: &str = include_str!("../fixtures/tweet_result_by_rest_id.json");

pub const TWEET_DETAIL_URL: &str =
    "https://x.com/i/api/graphql/nBS-WpgA6ZG0CyNHD517JQ/TweetDetail?variables=%7B%22focalTweetId%22%3A%221700000000000000000%22%7D";
pub const TWEET_RESULT_URL: &str =
    "https://api.x.com/graphql/Xl5pC_lBk_gcO2ItU39DQw/TweetResultByRestId?variables=%7B%22tweetId%22%3A%22123%22%7D";

pub fn fixture(json: &str) -> serde_json::Value {
    serde_json::from_str(json).expect("fixture is valid JSON")
}

/// A response the fake page will emit.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub url: String,
    /// `Err` simulates a body that cannot be read.
    pub body: Result<Vec<u8>, String>,
}

impl ScriptedResponse {
    pub fn ok(url: &str, body: &str) -> Self {
        Self {
            url: url.to_string(),
            body: Ok(body.as_bytes().to_vec()),
        }
    }

    pub fn unreadable(url: &str) -> Self {
        Self {
            url: url.to_string(),
            body: Err("No resource with given identifier found".to_string()),
        }
    }

    /// Page chrome that never matches either endpoint.
    pub fn noise() -> Vec<Self> {
        vec![
            Self::ok("https://x.com/i/status/123", "<html></html>"),
            Self::ok("https://abs.twimg.com/responsive-web/client-web/main.js", "0"),
            Self::ok(
                "https://x.com/i/api/graphql/abc/UserByScreenName?variables=%7B%7D",
                "{}",
            ),
        ]
    }
}

struct ScriptedBody {
    url: String,
    body: Result<Vec<u8>, String>,
}

#[async_trait]
impl InterceptedResponse for ScriptedBody {
    fn url(&self) -> &str {
        &self.url
    }

    async fn body(&self) -> Result<Vec<u8>> {
        self.body.clone().map_err(anyhow::Error::msg)
    }
}

/// Fake session that serves one script to guests and another once the
/// `auth_token` cookie is present, like x.com does.
pub struct MockSession {
    guest_script: Vec<ScriptedResponse>,
    auth_script: Vec<ScriptedResponse>,
    /// Keep the stream open after the script runs out, like a live page.
    keep_open: bool,
    fail_navigation: bool,
    /// Deliver the script even though navigation reports failure.
    load_before_failing: bool,
    cookies: Mutex<Vec<SessionCookie>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockSession {
    pub fn new(script: Vec<ScriptedResponse>) -> Self {
        Self {
            guest_script: script.clone(),
            auth_script: script,
            keep_open: false,
            fail_navigation: false,
            load_before_failing: false,
            cookies: Mutex::new(Vec::new()),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serves the guest payload without cookies and the full one with them.
    pub fn x_like() -> Self {
        let mut guest = ScriptedResponse::noise();
        guest.push(ScriptedResponse::ok(TWEET_RESULT_URL, TWEET_RESULT_JSON));
        let mut auth = ScriptedResponse::noise();
        auth.push(ScriptedResponse::ok(TWEET_DETAIL_URL, TWEET_DETAIL_JSON));
        Self {
            guest_script: guest,
            auth_script: auth,
            ..Self::new(Vec::new())
        }
    }

    pub fn keep_open(mut self) -> Self {
        self.keep_open = true;
        self
    }

    pub fn fail_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Navigation errors out (e.g. a load timeout) after the page already
    /// received its responses.
    pub fn fail_navigation_after_load(mut self) -> Self {
        self.fail_navigation = true;
        self.load_before_failing = true;
        self
    }

    /// Page lifecycle calls in order, e.g. `["new_page", "subscribe", "goto ...", "close"]`.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn record(&self, event: impl Into<String>) {
        self.log.lock().unwrap().push(event.into());
    }

    fn is_authenticated(&self) -> bool {
        self.cookies
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.name == "auth_token")
    }
}

#[async_trait]
impl Session for MockSession {
    async fn add_cookies(&self, cookies: &[SessionCookie]) -> Result<()> {
        self.cookies.lock().unwrap().extend_from_slice(cookies);
        self.record(format!("add_cookies {}", cookies.len()));
        Ok(())
    }

    async fn new_page(&self) -> Result<Box<dyn SessionPage>> {
        self.record("new_page");
        let script = if self.is_authenticated() {
            self.auth_script.clone()
        } else {
            self.guest_script.clone()
        };
        Ok(Box::new(MockPage {
            script,
            keep_open: self.keep_open,
            fail_navigation: self.fail_navigation,
            load_before_failing: self.load_before_failing,
            navigated: Arc::new(Notify::new()),
            log: Arc::clone(&self.log),
        }))
    }
}

struct MockPage {
    script: Vec<ScriptedResponse>,
    keep_open: bool,
    fail_navigation: bool,
    load_before_failing: bool,
    navigated: Arc<Notify>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockPage {
    fn record(&self, event: impl Into<String>) {
        self.log.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl SessionPage for MockPage {
    async fn responses(&self) -> Result<ResponseStream> {
        self.record("subscribe");
        let navigated = Arc::clone(&self.navigated);
        let script = self.script.clone();
        let keep_open = self.keep_open;

        let stream = async_stream::stream! {
            // Nothing is requested until the page starts loading.
            navigated.notified().await;
            for scripted in script {
                let response: Box<dyn InterceptedResponse> = Box::new(ScriptedBody {
                    url: scripted.url,
                    body: scripted.body,
                });
                yield response;
            }
            if keep_open {
                std::future::pending::<()>().await;
            }
        };
        Ok(Box::pin(stream))
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.record(format!("goto {url}"));
        if self.fail_navigation {
            if self.load_before_failing {
                self.navigated.notify_one();
                anyhow::bail!("Request timed out.");
            }
            anyhow::bail!("net::ERR_NAME_NOT_RESOLVED");
        }
        self.navigated.notify_one();
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.record("close");
        Ok(())
    }
}
