//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling per view
//! - `events` - Background task event processing
//! - `helpers` - Task spawning and shared shelf actions
//! - `render` - View rendering dispatch
//! - `home` - Home feed with lead article and pagination sentinel
//! - `reader` - Article reader with related articles
//! - `shelf` - Saved / read lists
//! - `search` - Title search
//! - `status` - Status bar widget

mod events;
mod helpers;
mod home;
mod input;
mod loop_runner;
mod reader;
mod render;
mod search;
mod shelf;
mod status;

pub use loop_runner::{run, Action};
