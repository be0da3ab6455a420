//! Home feed pagination.
//!
//! - [`FeedSession`] - the {Idle, Loading, Exhausted} state machine holding
//!   the lead article and the accumulated list
//! - [`SentinelObserver`] - turns "the end-of-list marker is on screen"
//!   into at most one load per state change
//! - [`FeedController`] - async driver for callers that just want pages
//!
//! # Example
//!
//! ```ignore
//! use newsdesk::feed::{FeedController, FeedSettings};
//!
//! let mut feed = FeedController::new(api, FeedSettings::default());
//! feed.load_initial().await;
//! for _ in 0..3 {
//!     if !feed.load_more().await {
//!         break;
//!     }
//! }
//! println!("{} articles", feed.session().articles().len());
//! ```

mod controller;
mod sentinel;
mod session;

pub use controller::FeedController;
pub use sentinel::{visible_ratio, SentinelObserver, DEFAULT_THRESHOLD};
pub use session::{FeedSession, FeedSettings, InitialRequest, PageRequest, Phase};
