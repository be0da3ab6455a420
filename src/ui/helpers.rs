//! Helper functions for UI operations.
//!
//! Background task spawning for feed pages, article details and searches,
//! plus the shelf actions shared between the reader and the shelf views.

use crate::app::{App, AppEvent, ReaderState, View};
use futures::FutureExt;
use newsdesk::api::{Article, NewsApi, NewsQuery};
use newsdesk::detail::DetailLoader;
use newsdesk::storage::ShelfKind;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Task names carried by [`AppEvent::TaskPanicked`].
pub(super) const TASK_FEED: &str = "feed_load";
pub(super) const TASK_DETAIL: &str = "detail_load";
pub(super) const TASK_SEARCH: &str = "search";

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of a panicking background task silently disappearing, the panic
/// message comes back as `Err(String)` so the UI can recover.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Run `work` on a background task, reporting its event or its panic.
fn spawn_reporting<F>(
    task: &'static str,
    event_tx: &mpsc::Sender<AppEvent>,
    work: F,
) -> tokio::task::JoinHandle<()>
where
    F: std::future::Future<Output = AppEvent> + Send + 'static,
{
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(work).await {
            Ok(event) => event,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task,
                    error: panic_msg,
                }
            }
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(task, error = %e, "Channel send failed (receiver dropped)");
        }
    })
}

/// Fetch the lead article and first page, if the feed is not already loading.
pub(super) fn spawn_initial_feed(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(request) = app.feed.begin_initial() else {
        return;
    };
    let api = app.api.clone();
    tracing::debug!(generation = request.first_page.generation, "Spawning initial feed load");

    app.feed_handle = Some(spawn_reporting(TASK_FEED, event_tx, async move {
        let lead_query = request.lead.query();
        let page_query = request.first_page.query();
        let (lead, first_page) = tokio::join!(api.list(&lead_query), api.list(&page_query));
        AppEvent::FeedInitialLoaded {
            request,
            lead,
            first_page,
        }
    }));
}

/// Fetch the next page, if the session allows it.
pub(super) fn spawn_next_page(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(request) = app.feed.begin_load() else {
        return;
    };
    let api = app.api.clone();
    tracing::debug!(page = request.page, "Sentinel visible, loading next page");

    app.feed_handle = Some(spawn_reporting(TASK_FEED, event_tx, async move {
        let result = api.list(&request.query()).await;
        AppEvent::FeedPageLoaded { request, result }
    }));
}

/// Open `article_id` in the reader and fetch it with its related set.
pub(super) fn open_article(app: &mut App, article_id: &str, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.open_reader(article_id);
    spawn_detail_load(app, article_id.to_string(), generation, event_tx);
}

/// Retry the reader's article after a failure.
pub(super) fn retry_article(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let id = match &app.reader {
        ReaderState::Failed { id, .. } | ReaderState::Missing { id } => id.clone(),
        _ => return,
    };
    app.reader = ReaderState::Loading { id: id.clone() };
    app.reader_generation = app.reader_generation.wrapping_add(1);
    let generation = app.reader_generation;
    spawn_detail_load(app, id, generation, event_tx);
}

fn spawn_detail_load(
    app: &mut App,
    id: String,
    generation: u64,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    if let Some(handle) = app.reader_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous detail load task");
    }
    let api = app.api.clone();
    let settings = app.related_settings;

    app.reader_handle = Some(spawn_reporting(TASK_DETAIL, event_tx, async move {
        let mut loader = DetailLoader::new(api, StdRng::from_os_rng(), settings);
        let result = loader.load(&id).await;
        AppEvent::DetailLoaded {
            id,
            generation,
            result,
        }
    }));
}

/// Search titles for `query`, superseding any search in flight.
pub(super) fn spawn_search(app: &mut App, query: String, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(handle) = app.search_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous search task");
    }

    app.search_generation = app.search_generation.wrapping_add(1);
    let generation = app.search_generation;
    app.search_in_flight = true;

    let api = app.api.clone();
    let limit = app.search_limit;
    tracing::debug!(query = %query, generation, "Spawning search task");

    app.search_handle = Some(spawn_reporting(TASK_SEARCH, event_tx, async move {
        let results = api.list(&NewsQuery::by_title(query.as_str(), limit)).await;
        AppEvent::SearchCompleted {
            query,
            generation,
            results,
        }
    }));
}

/// Toggle the reader's article on `kind` and report the outcome.
pub(super) async fn toggle_reader_shelf(app: &mut App, kind: ShelfKind) {
    let Some(article) = app.reader_article().cloned() else {
        return;
    };
    match app.shelves.toggle(kind, &article).await {
        Ok(on) => {
            app.reader_marks.set(kind, on);
            let msg = match (kind, on) {
                (ShelfKind::Saved, true) => "Saved",
                (ShelfKind::Saved, false) => "Removed from saved",
                (ShelfKind::Read, true) => "Marked as read",
                (ShelfKind::Read, false) => "Marked as unread",
            };
            app.set_status(msg);
        }
        Err(e) => {
            tracing::error!(shelf = kind.storage_key(), id = %article.id, error = %e, "Failed to update shelf");
            app.set_status(format!("Failed to update {} list: {}", kind.label(), e));
        }
    }
}

/// Copy the reader article's public link. Only a successful copy is
/// reported; failures are logged.
pub(super) fn copy_reader_link(app: &mut App) {
    let Some(link) = app.reader_article().map(|a| a.link(&app.site_base_url)) else {
        return;
    };
    match app.clipboard.set_text(&link) {
        Ok(()) => {
            tracing::debug!(link = %link, "Copied article link");
            app.set_status("Link copied");
        }
        Err(e) => tracing::warn!(link = %link, error = %e, "Failed to copy article link"),
    }
}

/// Switch to a shelf view and load its contents.
pub(super) async fn open_shelf(app: &mut App, kind: ShelfKind) {
    app.navigate(View::Shelf(kind));
    app.shelf_selected = 0;
    reload_shelf(app, kind).await;
}

/// Re-read a shelf from the store into the shelf view.
pub(super) async fn reload_shelf(app: &mut App, kind: ShelfKind) {
    match app.shelves.list(kind).await {
        Ok(items) => app.set_shelf_items(items),
        Err(e) => {
            tracing::error!(shelf = kind.storage_key(), error = %e, "Failed to load shelf");
            app.set_shelf_items(Vec::new());
            app.set_status(format!("Failed to load {} list", kind.label()));
        }
    }
}

/// Refresh both shelf counters from the store.
pub(super) async fn refresh_shelf_counts(app: &mut App) {
    for kind in ShelfKind::ALL {
        match app.shelves.count(kind).await {
            Ok(count) => match kind {
                ShelfKind::Saved => app.saved_count = count,
                ShelfKind::Read => app.read_count = count,
            },
            Err(e) => tracing::warn!(shelf = kind.storage_key(), error = %e, "Failed to count shelf"),
        }
    }
}

/// Article selected in the current list view, if any.
pub(super) fn selected_article(app: &App) -> Option<&Article> {
    match app.view {
        View::Home => app.selected_home_article(),
        View::Shelf(_) => app.shelf_items.get(app.shelf_selected),
        View::Search => app.search_results.get(app.search_selected),
        View::Reader => None,
    }
}
