//! Utility functions for common operations.
//!
//! - **Rate limiting**: [`Debouncer`] and [`Throttle`] for event-driven callbacks
//! - **Text processing**: HTML reduction, title keyword extraction and
//!   Unicode-aware truncation for terminal rendering

mod ratelimit;
mod text;

pub use ratelimit::{Debouncer, Throttle};
pub use text::{describe, html_to_text, significant_words, strip_control_chars, truncate_to_width};
