use crate::clipboard::{Clipboard, SystemClipboard};
use newsdesk::api::{ApiError, Article, HttpNewsApi};
use newsdesk::config::Config;
use newsdesk::detail::{ArticleDetail, RelatedSettings};
use newsdesk::feed::{visible_ratio, FeedSession, InitialRequest, PageRequest, SentinelObserver};
use newsdesk::storage::{Database, ShelfEvent, ShelfKind, Shelves};
use newsdesk::util::{Debouncer, Throttle};
use ratatui::text::Line;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

/// Maximum scroll offset for the reader view (ratatui u16 limit).
pub const MAX_SCROLL: usize = u16::MAX as usize;

/// How long a status message stays in the status bar.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Lines above the body in the reader: title, byline, blank.
const READER_HEADER_LINES: usize = 3;

// ============================================================================
// View and Content Enums
// ============================================================================

/// Current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Reader,
    Shelf(ShelfKind),
    Search,
}

/// Article reader loading state.
#[derive(Debug, Clone)]
pub enum ReaderState {
    Idle,
    Loading {
        id: String,
    },
    Loaded {
        detail: ArticleDetail,
        /// Description shown above the body; derived from the body when the
        /// article carries none.
        description: String,
        /// Body reduced to plain text, cached for rendering.
        body: Vec<Line<'static>>,
    },
    Missing {
        id: String,
    },
    Failed {
        id: String,
        error: String,
    },
}

/// Whether the article open in the reader is on each shelf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShelfMarks {
    pub saved: bool,
    pub read: bool,
}

impl ShelfMarks {
    pub fn get(&self, kind: ShelfKind) -> bool {
        match kind {
            ShelfKind::Saved => self.saved,
            ShelfKind::Read => self.read,
        }
    }

    pub fn set(&mut self, kind: ShelfKind, on: bool) {
        match kind {
            ShelfKind::Saved => self.saved = on,
            ShelfKind::Read => self.read = on,
        }
    }
}

/// Pending confirmation for destructive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    ClearShelf(ShelfKind),
}

/// Events from background tasks
pub enum AppEvent {
    /// Lead article and first page, joined.
    FeedInitialLoaded {
        request: InitialRequest,
        lead: Result<Vec<Article>, ApiError>,
        first_page: Result<Vec<Article>, ApiError>,
    },
    /// A page started by the end-of-feed sentinel.
    FeedPageLoaded {
        request: PageRequest,
        result: Result<Vec<Article>, ApiError>,
    },
    /// Article plus related set for the reader.
    ///
    /// `generation` is the reader generation at spawn time; results for an
    /// article the user has already left are dropped.
    DetailLoaded {
        id: String,
        generation: u64,
        result: Result<Option<ArticleDetail>, ApiError>,
    },
    /// Title search results.
    SearchCompleted {
        query: String,
        generation: u64,
        results: Result<Vec<Article>, ApiError>,
    },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub api: Arc<HttpNewsApi>,
    pub shelves: Arc<Shelves<Database>>,
    pub related_settings: RelatedSettings,
    /// `limit` sent with title searches.
    pub search_limit: u32,
    /// Site that article links point at.
    pub site_base_url: String,
    pub clipboard: Box<dyn Clipboard>,

    pub view: View,
    /// Views to return to with "back", most recent last.
    pub history: Vec<View>,

    // Home feed
    pub feed: FeedSession,
    pub sentinel: SentinelObserver,
    /// Selected row: 0 is the lead article when there is one.
    pub home_selected: usize,
    /// First visible row.
    pub home_offset: usize,
    /// Rows available for the list, updated during rendering.
    pub home_visible_rows: usize,
    pub feed_handle: Option<tokio::task::JoinHandle<()>>,
    pub refresh_throttle: Throttle,

    // Reader
    pub reader: ReaderState,
    pub reader_marks: ShelfMarks,
    /// Incremented on every article open; see [`AppEvent::DetailLoaded`].
    pub reader_generation: u64,
    pub reader_handle: Option<tokio::task::JoinHandle<()>>,
    pub scroll_offset: usize,
    pub reader_visible_lines: usize,
    pub reader_viewport_width: usize,

    // Shelves
    pub shelf_items: Vec<Article>,
    pub shelf_selected: usize,
    pub saved_count: usize,
    pub read_count: usize,
    pub shelf_events: broadcast::Receiver<ShelfEvent>,
    pub pending_confirm: Option<ConfirmAction>,

    // Search
    pub search_input: String,
    pub search_debounce: Debouncer<String>,
    pub search_results: Vec<Article>,
    pub search_selected: usize,
    pub search_generation: u64,
    pub search_handle: Option<tokio::task::JoinHandle<()>>,
    pub search_in_flight: bool,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Dirty flag to skip unnecessary frame renders
    pub needs_redraw: bool,
    /// Current frame of the loading spinner animation.
    pub spinner_frame: usize,
}

impl App {
    pub fn new(api: Arc<HttpNewsApi>, shelves: Arc<Shelves<Database>>, config: &Config) -> Self {
        let shelf_events = shelves.subscribe();
        Self {
            api,
            shelves,
            related_settings: config.related_settings(),
            search_limit: config.search_limit,
            site_base_url: config.site_base_url.clone(),
            clipboard: Box::new(SystemClipboard::default()),
            view: View::Home,
            history: Vec::new(),
            feed: FeedSession::new(config.feed_settings()),
            sentinel: SentinelObserver::new(config.sentinel_threshold),
            home_selected: 0,
            home_offset: 0,
            home_visible_rows: 0,
            feed_handle: None,
            refresh_throttle: Throttle::new(config.refresh_throttle()),
            reader: ReaderState::Idle,
            reader_marks: ShelfMarks::default(),
            reader_generation: 0,
            reader_handle: None,
            scroll_offset: 0,
            reader_visible_lines: 0,
            reader_viewport_width: 0,
            shelf_items: Vec::new(),
            shelf_selected: 0,
            saved_count: 0,
            read_count: 0,
            shelf_events,
            pending_confirm: None,
            search_input: String::new(),
            search_debounce: Debouncer::new(String::new(), config.search_debounce()),
            search_results: Vec::new(),
            search_selected: 0,
            search_generation: 0,
            search_handle: None,
            search_in_flight: false,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Home feed
    // ------------------------------------------------------------------------

    /// Number of article rows on the home view (lead included).
    pub fn home_len(&self) -> usize {
        usize::from(self.feed.lead().is_some()) + self.feed.articles().len()
    }

    /// Article shown at home row `index`.
    pub fn home_article(&self, index: usize) -> Option<&Article> {
        match self.feed.lead() {
            Some(lead) if index == 0 => Some(lead),
            Some(_) => self.feed.articles().get(index - 1),
            None => self.feed.articles().get(index),
        }
    }

    pub fn selected_home_article(&self) -> Option<&Article> {
        self.home_article(self.home_selected)
    }

    /// Fraction of the sentinel row (the row after the last article) that
    /// is inside the visible window.
    pub fn sentinel_ratio(&self) -> f32 {
        if self.home_visible_rows == 0 {
            return 0.0;
        }
        let sentinel = self.home_len();
        visible_ratio(
            self.home_offset..self.home_offset + self.home_visible_rows,
            sentinel..sentinel + 1,
        )
    }

    /// Scroll so the selection and the row after it are visible.
    pub fn ensure_home_visible(&mut self) {
        let visible = self.home_visible_rows.max(1);
        if self.home_selected < self.home_offset {
            self.home_offset = self.home_selected;
        }
        let bottom = (self.home_selected + 1).min(self.home_len());
        if bottom >= self.home_offset + visible {
            self.home_offset = bottom + 1 - visible;
        }
    }

    /// Start the home feed over. In-flight results are ignored.
    pub fn reset_feed(&mut self) {
        if let Some(handle) = self.feed_handle.take() {
            handle.abort();
            tracing::debug!("Aborted feed task on reset");
        }
        self.feed.reset();
        self.sentinel.detach();
        self.home_selected = 0;
        self.home_offset = 0;
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Switch to `view`, remembering the current one for [`back`](Self::back).
    pub fn navigate(&mut self, view: View) {
        if self.view == view {
            return;
        }
        if self.view == View::Reader {
            self.leave_reader();
        }
        self.history.push(self.view);
        self.view = view;
    }

    /// Return to the previous view. Returns false when already at the root.
    pub fn back(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        if self.view == View::Reader {
            self.leave_reader();
        }
        self.view = previous;
        true
    }

    pub fn nav_up(&mut self) {
        match self.view {
            View::Home => {
                self.home_selected = self.home_selected.saturating_sub(1);
                self.ensure_home_visible();
            }
            View::Shelf(_) => self.shelf_selected = self.shelf_selected.saturating_sub(1),
            View::Search => self.search_selected = self.search_selected.saturating_sub(1),
            View::Reader => self.scroll_up(1),
        }
    }

    pub fn nav_down(&mut self) {
        match self.view {
            View::Home => {
                if self.home_selected + 1 < self.home_len() {
                    self.home_selected += 1;
                }
                self.ensure_home_visible();
            }
            View::Shelf(_) => {
                if self.shelf_selected + 1 < self.shelf_items.len() {
                    self.shelf_selected += 1;
                }
            }
            View::Search => {
                if self.search_selected + 1 < self.search_results.len() {
                    self.search_selected += 1;
                }
            }
            View::Reader => {
                self.scroll_down(1);
                self.clamp_reader_scroll();
            }
        }
    }

    // ------------------------------------------------------------------------
    // Reader
    // ------------------------------------------------------------------------

    /// Enter the reader for `id`. Returns the generation the detail load
    /// must carry.
    pub fn open_reader(&mut self, id: &str) -> u64 {
        self.navigate(View::Reader);
        self.reader_generation = self.reader_generation.wrapping_add(1);
        self.reader = ReaderState::Loading { id: id.to_string() };
        self.reader_marks = ShelfMarks::default();
        self.scroll_offset = 0;
        self.reader_generation
    }

    fn leave_reader(&mut self) {
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
            tracing::debug!("Aborted detail load task on reader exit");
        }
        self.reader = ReaderState::Idle;
        self.scroll_offset = 0;
    }

    /// The article open in the reader, once loaded.
    pub fn reader_article(&self) -> Option<&Article> {
        match &self.reader {
            ReaderState::Loaded { detail, .. } => Some(&detail.article),
            _ => None,
        }
    }

    pub fn related(&self) -> &[Article] {
        match &self.reader {
            ReaderState::Loaded { detail, .. } => &detail.related,
            _ => &[],
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    /// Clamp scroll offset so the last line cannot scroll past the viewport.
    pub fn clamp_scroll(&mut self, content_lines: usize, visible_lines: usize) {
        let max_scroll = content_lines.saturating_sub(visible_lines);
        self.scroll_offset = self.scroll_offset.min(max_scroll).min(MAX_SCROLL);
    }

    /// Display lines in the reader, accounting for wrapping at the last
    /// rendered width.
    pub fn reader_content_lines(&self) -> usize {
        let width = self.reader_viewport_width.max(1);
        let body = match &self.reader {
            ReaderState::Loaded {
                body, description, ..
            } => {
                let description_lines = description.width().max(1).div_ceil(width) + 1;
                let related_lines = self.related().len() + 2;
                description_lines
                    + body
                        .iter()
                        .map(|line| wrapped_line_count(line, width))
                        .sum::<usize>()
                    + related_lines
            }
            _ => 1,
        };
        READER_HEADER_LINES + body
    }

    pub fn clamp_reader_scroll(&mut self) {
        let content_lines = self.reader_content_lines();
        self.clamp_scroll(content_lines, self.reader_visible_lines);
    }

    // ------------------------------------------------------------------------
    // Shelves
    // ------------------------------------------------------------------------

    pub fn shelf_count(&self, kind: ShelfKind) -> usize {
        match kind {
            ShelfKind::Saved => self.saved_count,
            ShelfKind::Read => self.read_count,
        }
    }

    /// Apply a shelf change notification. Returns true when the open shelf
    /// view shows the changed shelf and needs reloading.
    pub fn apply_shelf_event(&mut self, event: ShelfEvent) -> bool {
        match event.kind {
            ShelfKind::Saved => self.saved_count = event.count,
            ShelfKind::Read => self.read_count = event.count,
        }
        self.view == View::Shelf(event.kind)
    }

    pub fn set_shelf_items(&mut self, items: Vec<Article>) {
        self.shelf_items = items;
        self.shelf_selected = self
            .shelf_selected
            .min(self.shelf_items.len().saturating_sub(1));
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Whether anything on screen is waiting on the network.
    pub fn is_busy(&self) -> bool {
        match self.view {
            View::Home => self.feed.is_loading(),
            View::Reader => matches!(self.reader, ReaderState::Loading { .. }),
            View::Search => self.search_in_flight,
            View::Shelf(_) => false,
        }
    }
}

/// How many display lines a single Line occupies after wrapping.
fn wrapped_line_count(line: &Line<'_>, viewport_width: usize) -> usize {
    let width = viewport_width.max(1);
    let line_width: usize = line.spans.iter().map(|s| s.content.width()).sum();
    if line_width == 0 {
        1
    } else {
        line_width.div_ceil(width)
    }
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort all in-flight async tasks on App drop.
impl Drop for App {
    fn drop(&mut self) {
        for handle in [
            self.feed_handle.take(),
            self.reader_handle.take(),
            self.search_handle.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk::feed::FeedSettings;
    use tokio::time;

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let api = HttpNewsApi::new("http://127.0.0.1:9/api").unwrap();
        App::new(Arc::new(api), Arc::new(Shelves::new(db)), &Config::default())
    }

    fn page(prefix: &str, n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| Article::new(format!("{}{}", prefix, i), format!("Story {}", i)))
            .collect()
    }

    fn load_home(app: &mut App, lead: usize, first: usize) {
        let req = app.feed.begin_initial().unwrap();
        app.feed
            .finish_initial(req, Ok(page("lead", lead)), Ok(page("a", first)));
    }

    #[tokio::test]
    async fn test_nav_empty_home() {
        let mut app = test_app().await;
        app.nav_down();
        assert_eq!(app.home_selected, 0);
        assert!(app.selected_home_article().is_none());
    }

    #[tokio::test]
    async fn test_home_rows_put_lead_first() {
        let mut app = test_app().await;
        load_home(&mut app, 1, 15);
        assert_eq!(app.home_len(), 16);
        assert_eq!(app.home_article(0).map(|a| a.id.as_str()), Some("lead0"));
        assert_eq!(app.home_article(1).map(|a| a.id.as_str()), Some("a0"));
        assert!(app.home_article(16).is_none());
    }

    #[tokio::test]
    async fn test_sentinel_visible_only_near_end() {
        let mut app = test_app().await;
        load_home(&mut app, 1, 15);
        app.home_visible_rows = 10;
        assert_eq!(app.sentinel_ratio(), 0.0);

        for _ in 0..15 {
            app.nav_down();
        }
        assert_eq!(app.home_selected, 15);
        assert_eq!(app.sentinel_ratio(), 1.0);
    }

    #[tokio::test]
    async fn test_short_feed_shows_sentinel_immediately() {
        let mut app = test_app().await;
        load_home(&mut app, 0, 3);
        app.home_visible_rows = 10;
        assert_eq!(app.sentinel_ratio(), 1.0);
    }

    #[tokio::test]
    async fn test_back_returns_to_previous_view() {
        let mut app = test_app().await;
        app.navigate(View::Shelf(ShelfKind::Saved));
        app.open_reader("x");
        assert_eq!(app.view, View::Reader);

        assert!(app.back());
        assert_eq!(app.view, View::Shelf(ShelfKind::Saved));
        assert!(matches!(app.reader, ReaderState::Idle));
        assert!(app.back());
        assert_eq!(app.view, View::Home);
        assert!(!app.back());
    }

    #[tokio::test]
    async fn test_open_reader_bumps_generation() {
        let mut app = test_app().await;
        let first = app.open_reader("a");
        app.back();
        let second = app.open_reader("b");
        assert_ne!(first, second);
        assert!(matches!(&app.reader, ReaderState::Loading { id } if id == "b"));
    }

    #[tokio::test]
    async fn test_reset_feed_clears_selection() {
        let mut app = test_app().await;
        load_home(&mut app, 1, 15);
        app.home_visible_rows = 5;
        for _ in 0..8 {
            app.nav_down();
        }
        app.reset_feed();
        assert_eq!((app.home_selected, app.home_offset), (0, 0));
        assert_eq!(app.home_len(), 0);
        assert_eq!(app.feed.generation(), 1);
    }

    #[tokio::test]
    async fn test_shelf_event_updates_count() {
        let mut app = test_app().await;
        let reload = app.apply_shelf_event(ShelfEvent {
            kind: ShelfKind::Read,
            count: 4,
        });
        assert!(!reload);
        assert_eq!(app.shelf_count(ShelfKind::Read), 4);

        app.navigate(View::Shelf(ShelfKind::Saved));
        assert!(app.apply_shelf_event(ShelfEvent {
            kind: ShelfKind::Saved,
            count: 1,
        }));
    }

    #[tokio::test]
    async fn test_clamp_scroll_exceeds_max() {
        let mut app = test_app().await;
        app.scroll_offset = 100;
        app.clamp_scroll(30, 10);
        assert_eq!(app.scroll_offset, 20);
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        let mut app = test_app().await;
        time::pause();
        app.set_status("Saved");
        time::advance(Duration::from_millis(2900)).await;
        assert!(!app.clear_expired_status());
        time::advance(Duration::from_millis(200)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_feed_settings_come_from_config() {
        let app = test_app().await;
        assert_eq!(*app.feed.settings(), FeedSettings::default());
    }
}
