//! Input handling for the TUI.
//!
//! This module processes keyboard input and dispatches to the appropriate
//! handler based on the current view.

use crate::app::{App, AppEvent, ConfirmAction, ReaderState, View};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use newsdesk::storage::ShelfKind;
use tokio::sync::mpsc;

use super::helpers::{
    copy_reader_link, open_article, open_shelf, retry_article, selected_article,
    spawn_initial_feed, spawn_next_page, spawn_search, toggle_reader_shelf,
};
use super::Action;

/// Maximum search query length accepted from the keyboard.
pub(super) const MAX_SEARCH_LENGTH: usize = 256;

/// Lines moved by page up / page down in the reader.
const PAGE_LINES: usize = 20;

/// Main input dispatch function.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(Action::Quit);
    }

    // Confirmation dialog captures all keys while visible
    if app.pending_confirm.is_some() {
        return handle_confirm_input(app, code).await;
    }

    match app.view {
        View::Home => handle_home_input(app, code, event_tx).await,
        View::Reader => handle_reader_input(app, code, modifiers, event_tx).await,
        View::Shelf(kind) => handle_shelf_input(app, kind, code, event_tx).await,
        View::Search => handle_search_input(app, code, event_tx),
    }
}

async fn handle_home_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Enter => open_selected(app, event_tx),
        KeyCode::Char('r') => handle_refresh(app, event_tx),
        KeyCode::Char('/') => enter_search(app),
        KeyCode::Char('S') => open_shelf(app, ShelfKind::Saved).await,
        KeyCode::Char('R') => open_shelf(app, ShelfKind::Read).await,
        _ => {}
    }
    Ok(Action::Continue)
}

/// Reload the feed, or retry the failed page load.
///
/// Throttled so holding the key cannot flood the API.
fn handle_refresh(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if !app.refresh_throttle.try_acquire() {
        tracing::debug!("Refresh throttled");
        return;
    }

    if app.feed.last_error().is_some() && app.home_len() > 0 {
        // A page load failed: ask for the same page again
        app.feed.clear_error();
        spawn_next_page(app, event_tx);
        app.set_status("Retrying...");
        return;
    }

    app.reset_feed();
    spawn_initial_feed(app, event_tx);
    app.set_status("Reloading news...");
}

fn open_selected(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(id) = selected_article(app).map(|a| a.id.clone()) else {
        return;
    };
    open_article(app, &id, event_tx);
}

fn enter_search(app: &mut App) {
    app.navigate(View::Search);
    app.search_input.clear();
    app.search_debounce.reset(String::new());
    app.search_results.clear();
    app.search_selected = 0;
}

async fn handle_reader_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => {
            app.back();
        }
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(PAGE_LINES);
            app.clamp_reader_scroll();
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(PAGE_LINES)
        }
        KeyCode::PageDown | KeyCode::Char(' ') => {
            app.scroll_down(PAGE_LINES);
            app.clamp_reader_scroll();
        }
        KeyCode::PageUp => app.scroll_up(PAGE_LINES),
        KeyCode::Char('s') => toggle_reader_shelf(app, ShelfKind::Saved).await,
        KeyCode::Char('m') => toggle_reader_shelf(app, ShelfKind::Read).await,
        KeyCode::Char('c') => copy_reader_link(app),
        KeyCode::Char('r') => {
            if matches!(
                app.reader,
                ReaderState::Failed { .. } | ReaderState::Missing { .. }
            ) {
                retry_article(app, event_tx);
            }
        }
        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as usize) - ('1' as usize);
            let related = app.related().get(index).map(|a| a.id.clone());
            if let Some(id) = related {
                open_related(app, &id, event_tx);
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Open a related article in place of the current one.
///
/// The current reader entry is replaced rather than stacked, so "back"
/// returns to the list the reader was entered from.
fn open_related(app: &mut App, id: &str, event_tx: &mpsc::Sender<AppEvent>) {
    app.back();
    open_article(app, id, event_tx);
}

async fn handle_shelf_input(
    app: &mut App,
    kind: ShelfKind,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => {
            app.back();
        }
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Enter => open_selected(app, event_tx),
        KeyCode::Char('d') | KeyCode::Delete => {
            let Some(id) = app.shelf_items.get(app.shelf_selected).map(|a| a.id.clone()) else {
                return Ok(Action::Continue);
            };
            match app.shelves.remove(kind, &id).await {
                Ok(true) => {
                    let mut items = std::mem::take(&mut app.shelf_items);
                    items.retain(|a| a.id != id);
                    app.set_shelf_items(items);
                    app.set_status("Removed");
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(shelf = kind.storage_key(), id = %id, error = %e, "Failed to remove entry");
                    app.set_status(format!("Failed to remove: {}", e));
                }
            }
        }
        KeyCode::Char('C') => {
            if app.shelf_items.is_empty() {
                app.set_status(format!("{} list is already empty", kind.label()));
            } else {
                app.pending_confirm = Some(ConfirmAction::ClearShelf(kind));
            }
        }
        KeyCode::Char('S') => open_shelf(app, ShelfKind::Saved).await,
        KeyCode::Char('R') => open_shelf(app, ShelfKind::Read).await,
        _ => {}
    }
    Ok(Action::Continue)
}

async fn handle_confirm_input(app: &mut App, code: KeyCode) -> Result<Action> {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(ConfirmAction::ClearShelf(kind)) = app.pending_confirm.take() {
                match app.shelves.clear(kind).await {
                    Ok(()) => {
                        if app.view == View::Shelf(kind) {
                            app.set_shelf_items(Vec::new());
                        }
                        app.set_status(format!("{} list cleared", kind.label()));
                    }
                    Err(e) => {
                        tracing::error!(shelf = kind.storage_key(), error = %e, "Failed to clear shelf");
                        app.set_status(format!("Failed to clear: {}", e));
                    }
                }
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_confirm = None;
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Search view: typing edits the query, arrows move through results.
fn handle_search_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Esc => {
            if let Some(handle) = app.search_handle.take() {
                handle.abort();
            }
            app.search_in_flight = false;
            app.back();
        }
        KeyCode::Down => app.nav_down(),
        KeyCode::Up => app.nav_up(),
        KeyCode::Enter => {
            // Skip the debounce when the query has not been sent yet
            if app.search_debounce.is_pending() {
                let query = app.search_input.trim().to_string();
                app.search_debounce.reset(app.search_input.clone());
                if !query.is_empty() {
                    spawn_search(app, query, event_tx);
                }
            } else {
                open_selected(app, event_tx);
            }
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            app.search_debounce.push(app.search_input.clone());
        }
        KeyCode::Char(c) => {
            if app.search_input.chars().count() >= MAX_SEARCH_LENGTH {
                app.set_status(format!(
                    "Search query at max length ({} chars)",
                    MAX_SEARCH_LENGTH
                ));
                return Ok(Action::Continue);
            }
            app.search_input.push(c);
            app.search_debounce.push(app.search_input.clone());
        }
        _ => {}
    }
    Ok(Action::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::Clipboard;
    use newsdesk::api::{ApiError, Article, HttpNewsApi};
    use newsdesk::config::Config;
    use newsdesk::detail::ArticleDetail;
    use newsdesk::storage::{Database, Shelves};
    use std::sync::{Arc, Mutex};

    /// Records copied text; refuses every write when `fail` is set.
    struct FakeClipboard {
        copied: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Clipboard for FakeClipboard {
        fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("no display");
            }
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn fake_clipboard(app: &mut App, fail: bool) -> Arc<Mutex<Vec<String>>> {
        let copied = Arc::new(Mutex::new(Vec::new()));
        app.clipboard = Box::new(FakeClipboard {
            copied: copied.clone(),
            fail,
        });
        copied
    }

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let api = HttpNewsApi::new("http://127.0.0.1:9/api").unwrap();
        App::new(Arc::new(api), Arc::new(Shelves::new(db)), &Config::default())
    }

    fn channel() -> (mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        mpsc::channel(8)
    }

    async fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).await.unwrap()
    }

    fn loaded_reader(app: &mut App, article: Article) {
        let generation = app.open_reader(&article.id);
        assert!(generation > 0);
        app.reader = ReaderState::Loaded {
            detail: ArticleDetail {
                article,
                related: vec![Article::new("rel", "Related")],
            },
            description: String::new(),
            body: Vec::new(),
        };
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx).await, Action::Quit));
    }

    #[tokio::test]
    async fn test_reader_save_toggle_round_trip() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        loaded_reader(&mut app, Article::new("a", "Headline"));

        press(&mut app, KeyCode::Char('s'), &tx).await;
        assert!(app.reader_marks.saved);
        assert!(app.shelves.contains(ShelfKind::Saved, "a").await.unwrap());

        press(&mut app, KeyCode::Char('s'), &tx).await;
        assert!(!app.reader_marks.saved);
        assert_eq!(app.shelves.count(ShelfKind::Saved).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reader_mark_read() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        loaded_reader(&mut app, Article::new("a", "Headline"));

        press(&mut app, KeyCode::Char('m'), &tx).await;
        assert!(app.reader_marks.read);
        assert!(!app.reader_marks.saved);
        assert!(app.shelves.contains(ShelfKind::Read, "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_copy_link_reports_success() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        let copied = fake_clipboard(&mut app, false);
        loaded_reader(&mut app, Article::new("a1", "Headline"));

        press(&mut app, KeyCode::Char('c'), &tx).await;
        assert_eq!(
            *copied.lock().unwrap(),
            vec!["https://www.fact-news.info/news/a1".to_string()]
        );
        let status = app.status_message.as_ref().map(|(m, _)| m.to_string());
        assert_eq!(status.as_deref(), Some("Link copied"));
    }

    #[tokio::test]
    async fn test_copy_link_failure_shows_no_confirmation() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        let copied = fake_clipboard(&mut app, true);
        loaded_reader(&mut app, Article::new("a1", "Headline"));

        press(&mut app, KeyCode::Char('c'), &tx).await;
        assert!(copied.lock().unwrap().is_empty());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_copy_link_needs_loaded_article() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        let copied = fake_clipboard(&mut app, false);
        app.open_reader("a1");

        press(&mut app, KeyCode::Char('c'), &tx).await;
        assert!(copied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_after_failed_page_requests_same_page() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        let first_page: Vec<Article> = (0..15)
            .map(|i| Article::new(format!("a{}", i), "t"))
            .collect();
        let request = app.feed.begin_initial().unwrap();
        app.feed
            .finish_initial(request, Ok(vec![Article::new("lead", "Lead")]), Ok(first_page));
        let request = app.feed.begin_load().unwrap();
        app.feed.finish_load(request, Err(ApiError::Timeout));

        press(&mut app, KeyCode::Char('r'), &tx).await;
        assert!(app.feed.is_loading());
        assert!(app.feed.last_error().is_none());
        assert_eq!(app.home_len(), 16);
        assert_eq!(app.feed.page(), 1);
    }

    #[tokio::test]
    async fn test_related_replaces_reader_entry() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        loaded_reader(&mut app, Article::new("a", "Headline"));

        press(&mut app, KeyCode::Char('1'), &tx).await;
        assert!(matches!(&app.reader, ReaderState::Loading { id } if id == "rel"));
        assert_eq!(app.history, vec![View::Home]);
    }

    #[tokio::test]
    async fn test_shelf_remove_and_confirmed_clear() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        for id in ["a", "b", "c"] {
            app.shelves
                .toggle(ShelfKind::Saved, &Article::new(id, id))
                .await
                .unwrap();
        }

        press(&mut app, KeyCode::Char('S'), &tx).await;
        assert_eq!(app.view, View::Shelf(ShelfKind::Saved));
        assert_eq!(app.shelf_items.len(), 3);

        press(&mut app, KeyCode::Char('d'), &tx).await;
        assert_eq!(app.shelf_items.len(), 2);
        assert!(!app.shelves.contains(ShelfKind::Saved, "c").await.unwrap());

        press(&mut app, KeyCode::Char('C'), &tx).await;
        assert_eq!(
            app.pending_confirm,
            Some(ConfirmAction::ClearShelf(ShelfKind::Saved))
        );
        press(&mut app, KeyCode::Char('n'), &tx).await;
        assert_eq!(app.shelves.count(ShelfKind::Saved).await.unwrap(), 2);

        press(&mut app, KeyCode::Char('C'), &tx).await;
        press(&mut app, KeyCode::Char('y'), &tx).await;
        assert!(app.pending_confirm.is_none());
        assert!(app.shelf_items.is_empty());
        assert_eq!(app.shelves.count(ShelfKind::Saved).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_typing_is_debounced() {
        let mut app = test_app().await;
        let (tx, _rx) = channel();
        press(&mut app, KeyCode::Char('/'), &tx).await;
        assert_eq!(app.view, View::Search);

        press(&mut app, KeyCode::Char('q'), &tx).await;
        press(&mut app, KeyCode::Char('x'), &tx).await;
        assert_eq!(app.search_input, "qx");
        assert!(app.search_debounce.is_pending());
        assert_eq!(app.search_generation, 0, "nothing sent before the delay");

        press(&mut app, KeyCode::Esc, &tx).await;
        assert_eq!(app.view, View::Home);
    }
}
