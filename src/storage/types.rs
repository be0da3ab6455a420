use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of newsdesk appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Map lock-related SQLite failures to [`DatabaseError::InstanceLocked`].
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY, SQLITE_LOCKED and SQLITE_CANTOPEN all surface as one of these.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

/// Errors from reading or writing a persisted article list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Failed to encode article list: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(DatabaseError::from_sqlx(err))
    }
}

// ============================================================================
// Shelves
// ============================================================================

/// One of the two independently persisted article lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShelfKind {
    Saved,
    Read,
}

impl ShelfKind {
    pub const ALL: [ShelfKind; 2] = [ShelfKind::Saved, ShelfKind::Read];

    /// Key the list is persisted under.
    pub fn storage_key(self) -> &'static str {
        match self {
            ShelfKind::Saved => "savedNews",
            ShelfKind::Read => "readNews",
        }
    }

    /// Name of the change notification published after every mutation.
    pub fn event_name(self) -> &'static str {
        match self {
            ShelfKind::Saved => "savedNewsUpdated",
            ShelfKind::Read => "readNewsUpdated",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShelfKind::Saved => "Saved",
            ShelfKind::Read => "Read",
        }
    }
}

/// Published on every shelf mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShelfEvent {
    pub kind: ShelfKind,
    /// Number of entries on the shelf after the mutation.
    pub count: usize,
}
