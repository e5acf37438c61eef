//! Browser session abstraction.
//!
//! The coordinator only needs a handful of page operations: open a page,
//! subscribe to its responses, navigate, close. These traits describe that
//! surface so the capture logic can run against Chromium
//! ([`chromium::ChromiumSession`]) or an in-memory fake in tests.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Domain the authorization cookies are scoped to.
pub const X_COOKIE_DOMAIN: &str = ".x.com";

/// Responses observed on a page, in arrival order.
///
/// The stream ends when the page goes away.
pub type ResponseStream = BoxStream<'static, Box<dyn InterceptedResponse>>;

/// A browser session that pages can be opened in.
///
/// A session may serve several sequential captures; it is not owned by any
/// one of them.
#[async_trait]
pub trait Session: Send + Sync {
    /// Add cookies to the session. They apply to every page opened after
    /// this call.
    async fn add_cookies(&self, cookies: &[SessionCookie]) -> Result<()>;

    /// Open a fresh blank page.
    async fn new_page(&self) -> Result<Box<dyn SessionPage>>;
}

/// A single page (tab) within a session.
#[async_trait]
pub trait SessionPage: Send + Sync {
    /// Start observing responses. Responses that arrive before this call
    /// are not reported.
    async fn responses(&self) -> Result<ResponseStream>;

    /// Navigate to `url` and wait for the load to finish.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Close the page. Any open response stream ends.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A network response seen by a page.
#[async_trait]
pub trait InterceptedResponse: Send + Sync {
    fn url(&self) -> &str;

    /// Read the full response body.
    async fn body(&self) -> Result<Vec<u8>>;
}

/// A cookie to inject into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

impl SessionCookie {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            secure: true,
            http_only: false,
        }
    }

    /// The three cookies that make x.com serve the authenticated
    /// conversation payload instead of the guest one.
    #[must_use]
    pub fn x_auth(auth_token: &str, ct0: &str, auth_multi: &str) -> Vec<Self> {
        vec![
            Self {
                http_only: true,
                ..Self::new("auth_token", auth_token, X_COOKIE_DOMAIN)
            },
            Self::new("ct0", ct0, X_COOKIE_DOMAIN),
            Self::new("auth_multi", auth_multi, X_COOKIE_DOMAIN),
        ]
    }
}
