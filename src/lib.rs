//! Client library for a paginated news API.
//!
//! The crate is split along the seams of the reader:
//!
//! - [`api`] - the [`api::NewsApi`] trait and its reqwest implementation
//! - [`feed`] - home feed pagination as an explicit state machine
//! - [`detail`] - single-article loading with related-article assembly
//! - [`storage`] - persisted "saved" and "read" shelves
//! - [`config`] - TOML configuration
//! - [`util`] - rate limiting and text helpers
//!
//! The `newsdesk` binary layers a terminal UI on top of these modules.

pub mod api;
pub mod config;
pub mod detail;
pub mod feed;
pub mod storage;
pub mod util;
