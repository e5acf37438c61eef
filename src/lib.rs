//! Tweet capture library.
//!
//! Drives a browser to an X/Twitter post, intercepts the GraphQL response
//! the page itself requests, and normalizes it into a [`model::Post`] with
//! its first level of replies.
//!
//! ```no_run
//! # async fn example() -> anyhow::Result<()> {
//! use tweet_capture::config::Config;
//! use tweet_capture::intercept::Coordinator;
//! use tweet_capture::session::chromium::{BrowserSettings, ChromiumSession};
//! use tweet_capture::session::Session;
//!
//! let config = Config::load()?;
//! config.validate()?;
//!
//! let session = ChromiumSession::launch(&BrowserSettings::from(&config)).await?;
//! session.add_cookies(&config.auth_cookies()).await?;
//!
//! let mut coordinator = Coordinator::new(&session, "https://x.com/i/status/20");
//! if coordinator.run_with_timeout(config.capture_timeout).await? {
//!     if let Some(post) = coordinator.extract()? {
//!         println!("{}: {}", post.author.handle(), post.text());
//!     }
//! }
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod intercept;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod session;
