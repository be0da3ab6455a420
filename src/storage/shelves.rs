use tokio::sync::broadcast;

use crate::api::Article;

use super::store::ArticleListStore;
use super::types::{ShelfEvent, ShelfKind, StoreError};

const EVENT_CAPACITY: usize = 16;

/// The "saved" and "read" shelves.
///
/// Each shelf is a newest-first list of full article snapshots, unique by
/// identifier, persisted through an [`ArticleListStore`]. Every mutation
/// writes the whole list back immediately and publishes a [`ShelfEvent`]
/// to subscribers, so counters elsewhere in the UI can refresh without
/// being wired to the code that changed the shelf.
pub struct Shelves<S> {
    store: S,
    events: broadcast::Sender<ShelfEvent>,
}

impl<S: ArticleListStore> Shelves<S> {
    pub fn new(store: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, events }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receive a [`ShelfEvent`] after every mutation from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ShelfEvent> {
        self.events.subscribe()
    }

    /// Shelf contents, newest first.
    pub async fn list(&self, kind: ShelfKind) -> Result<Vec<Article>, StoreError> {
        self.store.get(kind.storage_key()).await
    }

    pub async fn count(&self, kind: ShelfKind) -> Result<usize, StoreError> {
        Ok(self.list(kind).await?.len())
    }

    pub async fn contains(&self, kind: ShelfKind, id: &str) -> Result<bool, StoreError> {
        Ok(self.list(kind).await?.iter().any(|a| a.id == id))
    }

    /// Put `article` on the shelf if absent, take it off if present.
    ///
    /// Returns whether the article is on the shelf afterwards.
    pub async fn toggle(&self, kind: ShelfKind, article: &Article) -> Result<bool, StoreError> {
        let mut list = self.list(kind).await?;
        let present = list.iter().any(|a| a.id == article.id);

        if present {
            list.retain(|a| a.id != article.id);
        } else {
            list.insert(0, article.clone());
        }

        self.write(kind, &list).await?;
        tracing::debug!(
            shelf = kind.storage_key(),
            id = %article.id,
            on_shelf = !present,
            "Shelf toggled"
        );
        Ok(!present)
    }

    /// Take the article with `id` off the shelf. Returns false if it was not there.
    pub async fn remove(&self, kind: ShelfKind, id: &str) -> Result<bool, StoreError> {
        let mut list = self.list(kind).await?;
        let before = list.len();
        list.retain(|a| a.id != id);
        if list.len() == before {
            return Ok(false);
        }
        self.write(kind, &list).await?;
        Ok(true)
    }

    /// Empty the shelf.
    pub async fn clear(&self, kind: ShelfKind) -> Result<(), StoreError> {
        self.write(kind, &[]).await?;
        tracing::info!(shelf = kind.storage_key(), "Shelf cleared");
        Ok(())
    }

    async fn write(&self, kind: ShelfKind, list: &[Article]) -> Result<(), StoreError> {
        self.store.put(kind.storage_key(), list).await?;
        let event = ShelfEvent {
            kind,
            count: list.len(),
        };
        // No receivers is fine: nobody is showing a counter.
        if self.events.send(event).is_err() {
            tracing::trace!(event = kind.event_name(), "No shelf subscribers");
        }
        Ok(())
    }
}
