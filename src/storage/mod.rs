//! Local persistence for the "saved" and "read" shelves.
//!
//! - [`ArticleListStore`] - key-value seam: whole article lists in, out
//! - [`Database`] - SQLite implementation used by the binary
//! - [`MemoryStore`] - in-process implementation used by tests
//! - [`Shelves`] - toggle/remove/clear semantics plus change notifications

mod schema;
mod shelves;
mod store;
mod types;

pub use schema::Database;
pub use shelves::Shelves;
pub use store::{ArticleListStore, MemoryStore};
pub use types::{DatabaseError, ShelfEvent, ShelfKind, StoreError};
