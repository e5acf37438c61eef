//! Response interception.
//!
//! A [`Coordinator`] owns one capture attempt: it opens a page, subscribes
//! to the page's responses, navigates to the post, and keeps the body of the
//! first response that hits either GraphQL endpoint. The attempt resolves
//! exactly once, including when that body turns out to be unreadable.

mod pattern;
mod state;
mod target;

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{FutureExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::model::Post;
use crate::normalize::{normalize_full, normalize_guest, NormalizeError};
use crate::session::{ResponseStream, Session, SessionPage};

pub use pattern::PayloadShape;
pub use state::CaptureState;
pub use target::{canonical_status_url, status_id};

/// One extraction attempt against one post URL.
///
/// The session is borrowed and may serve other coordinators afterwards;
/// the page this coordinator opens is closed before [`Coordinator::run`]
/// returns.
pub struct Coordinator<'s> {
    session: &'s dyn Session,
    url: String,
    state: CaptureState,
}

impl<'s> Coordinator<'s> {
    #[must_use]
    pub fn new(session: &'s dyn Session, url: &str) -> Self {
        Self {
            session,
            url: canonical_status_url(url),
            state: CaptureState::Idle,
        }
    }

    /// The URL that will be navigated to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Numeric status ID of the target URL, if it has one.
    #[must_use]
    pub fn status_id(&self) -> Option<u64> {
        status_id(&self.url)
    }

    /// Current state of the attempt. After `run` this tells a response that
    /// never matched (`ClosedUnresolved`) apart from one that matched but
    /// could not be read (`Resolved` with no payload).
    #[must_use]
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Navigate and wait until a matching response has been captured or the
    /// page stops producing responses.
    ///
    /// There is no internal timeout. Use [`Coordinator::run_with_timeout`]
    /// to bound the wait. Dropping the returned future before it completes
    /// also ends the attempt: the state becomes `ClosedUnresolved` and the
    /// page is closed on a background task.
    ///
    /// Returns whether a payload of either shape was captured.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be opened or subscribed to.
    /// Navigation failures and pages that never issue a matching request are
    /// not errors; they yield `Ok(false)`.
    pub async fn run(&mut self) -> Result<bool> {
        self.run_until(std::future::pending()).await
    }

    /// Like [`Coordinator::run`], but gives up after `timeout`, closing the
    /// page and leaving the attempt `ClosedUnresolved`.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be opened or subscribed to.
    pub async fn run_with_timeout(&mut self, timeout: Duration) -> Result<bool> {
        self.run_until(tokio::time::sleep(timeout)).await
    }

    async fn run_until(&mut self, deadline: impl std::future::Future<Output = ()>) -> Result<bool> {
        if self.state != CaptureState::Idle {
            anyhow::bail!("capture for {} has already run", self.url);
        }

        let page = self
            .session
            .new_page()
            .await
            .context("Failed to open capture page")?;
        let mut attempt = Attempt {
            state: &mut self.state,
            page: Some(page),
        };
        let Some(page) = attempt.page.as_deref() else {
            anyhow::bail!("capture page for {} is already closed", self.url);
        };

        // Subscribe before navigating so no response can slip past.
        let responses = match page.responses().await {
            Ok(responses) => responses,
            Err(e) => {
                attempt.finish().await;
                return Err(e.context("Failed to subscribe to page responses"));
            }
        };
        attempt.state.arm();
        debug!(url = %self.url, "Capture armed");

        {
            let navigation = page.goto(&self.url);
            let watch = watch(&mut *attempt.state, responses);
            tokio::pin!(navigation, watch, deadline);
            let mut navigated = false;

            loop {
                tokio::select! {
                    biased;

                    () = &mut watch => break,
                    result = &mut navigation, if !navigated => {
                        navigated = true;
                        if let Err(e) = result {
                            // Responses the page received before failing still count.
                            if (&mut watch).now_or_never().is_none() {
                                warn!(url = %self.url, error = %e, "Navigation failed before capture");
                            }
                            break;
                        }
                        debug!(url = %self.url, "Navigation finished, waiting for capture");
                    }
                    () = &mut deadline => {
                        warn!(url = %self.url, "Capture timed out");
                        break;
                    }
                }
            }
        }

        attempt.finish().await;
        drop(attempt);

        let captured = self.state.captured().is_some();
        info!(
            url = %self.url,
            post_id = ?self.status_id(),
            captured,
            "Capture finished"
        );
        Ok(captured)
    }

    /// Normalize the captured payload.
    ///
    /// Returns `Ok(None)` when nothing was captured, including before `run`
    /// has completed.
    ///
    /// # Errors
    ///
    /// Returns an error if a payload was captured but does not match its
    /// expected shape.
    pub fn extract(&self) -> Result<Option<Post>, NormalizeError> {
        let Some((shape, document)) = self.state.captured() else {
            return Ok(None);
        };

        let post = match shape {
            PayloadShape::Full => normalize_full(document),
            PayloadShape::Guest => normalize_guest(document),
        };

        post.map(Some).map_err(|e| {
            error!(
                url = %self.url,
                shape = %shape,
                error = %e,
                "Captured payload did not normalize; the response schema may have changed"
            );
            e
        })
    }

    /// [`Coordinator::run`] followed by [`Coordinator::extract`].
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be opened or the captured payload
    /// does not normalize.
    pub async fn run_and_extract(&mut self) -> Result<Option<Post>> {
        self.run().await?;
        Ok(self.extract()?)
    }
}

/// Consume responses until the first match. Returns once the state is
/// terminal or the stream ends.
async fn watch(state: &mut CaptureState, mut responses: ResponseStream) {
    while let Some(response) = responses.next().await {
        let Some(shape) = PayloadShape::classify(response.url()) else {
            continue;
        };
        debug!(url = %response.url(), %shape, "Matched GraphQL response");

        let payload = match response.body().await {
            Ok(body) => match serde_json::from_slice(&body) {
                Ok(document) => Some(document),
                Err(e) => {
                    warn!(url = %response.url(), error = %e, "Matched response is not JSON");
                    None
                }
            },
            Err(e) => {
                warn!(url = %response.url(), error = %e, "Failed to read matched response");
                None
            }
        };

        state.resolve(shape, payload);
        return;
    }
    debug!("Response stream ended without a match");
    state.close();
}

/// The page and state of a running capture.
///
/// Dropping it, including when the `run` future is cancelled, leaves the
/// state terminal and closes the page on a spawned task.
struct Attempt<'a> {
    state: &'a mut CaptureState,
    page: Option<Box<dyn SessionPage>>,
}

impl Attempt<'_> {
    /// Give up waiting and close the page.
    async fn finish(&mut self) {
        self.state.close();
        if let Some(page) = self.page.take() {
            close_page(page).await;
        }
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        self.state.close();
        if let Some(page) = self.page.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    debug!("Capture cancelled, closing page in the background");
                    handle.spawn(close_page(page));
                }
                Err(_) => warn!("Capture cancelled outside a runtime; page left open"),
            }
        }
    }
}

async fn close_page(page: Box<dyn SessionPage>) {
    if let Err(e) = page.close().await {
        warn!("Failed to close page: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoSession;

    #[async_trait::async_trait]
    impl Session for NoSession {
        async fn add_cookies(&self, _cookies: &[crate::session::SessionCookie]) -> Result<()> {
            Ok(())
        }

        async fn new_page(&self) -> Result<Box<dyn SessionPage>> {
            anyhow::bail!("no browser")
        }
    }

    #[test]
    fn test_new_canonicalizes_url() {
        let session = NoSession;
        let coordinator = Coordinator::new(&session, "https://twitter.com/a/status/9");
        assert_eq!(coordinator.url(), "https://x.com/a/status/9");
        assert_eq!(coordinator.state(), &CaptureState::Idle);
    }

    #[test]
    fn test_extract_before_run_is_none() {
        let session = NoSession;
        let coordinator = Coordinator::new(&session, "https://x.com/i/status/1");
        assert!(coordinator.extract().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_page_open_failure_is_an_error() {
        let session = NoSession;
        let mut coordinator = Coordinator::new(&session, "https://x.com/i/status/1");
        assert!(coordinator.run().await.is_err());
        assert_eq!(coordinator.state(), &CaptureState::Idle);
    }
}
