use std::ops::Range;

use super::session::{FeedSession, Phase};

/// Default fraction of the sentinel that must be on screen to trigger a load.
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// Fraction of `sentinel` (a row span) that lies inside `viewport`.
pub fn visible_ratio(viewport: Range<usize>, sentinel: Range<usize>) -> f32 {
    let height = sentinel.end.saturating_sub(sentinel.start);
    if height == 0 {
        return 0.0;
    }
    let start = viewport.start.max(sentinel.start);
    let end = viewport.end.min(sentinel.end);
    end.saturating_sub(start) as f32 / height as f32
}

/// The pieces of session state whose change re-attaches the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Watched {
    has_more: bool,
    loading: bool,
    page: u32,
    len: usize,
    generation: u64,
    settled: u64,
}

impl Watched {
    fn of(session: &FeedSession) -> Self {
        Self {
            has_more: session.has_more(),
            loading: session.is_loading(),
            page: session.page(),
            len: session.articles().len(),
            generation: session.generation(),
            settled: session.settled_loads(),
        }
    }
}

/// Decides when the end-of-feed sentinel should trigger a page load.
///
/// The observer is attached whenever the watched session state changes and
/// the session can load (first page applied, more pages, nothing in
/// flight). A failed load counts as a change too, since loading flips back
/// off, so a still-visible sentinel asks for the same page again. It fires
/// at most once per attachment: after firing it stays detached until the
/// session state changes again, so the same scroll position cannot queue a
/// second load of the same page.
#[derive(Debug, Clone)]
pub struct SentinelObserver {
    threshold: f32,
    watched: Option<Watched>,
    attached: bool,
}

impl Default for SentinelObserver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl SentinelObserver {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            watched: None,
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Re-evaluate against the current session and sentinel visibility.
    ///
    /// Returns true when the caller should start the next page load.
    pub fn observe(&mut self, session: &FeedSession, ratio: f32) -> bool {
        let watched = Watched::of(session);
        if self.watched != Some(watched) {
            // Tear down the previous observer and attach a fresh one if loading is possible
            self.watched = Some(watched);
            self.attached = session.phase() == Phase::Idle;
        }

        if !self.attached || ratio < self.threshold || ratio <= 0.0 {
            return false;
        }
        self.attached = false;
        true
    }

    /// Force re-attachment on the next [`observe`](Self::observe), e.g. after
    /// the user asked to retry a failed load.
    pub fn detach(&mut self) {
        self.watched = None;
        self.attached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, Article};
    use crate::feed::FeedSettings;

    fn page(n: usize) -> Vec<Article> {
        (0..n).map(|i| Article::new(i.to_string(), "t")).collect()
    }

    fn loaded(first: usize) -> FeedSession {
        let mut session = FeedSession::new(FeedSettings::default());
        let req = session.begin_initial().unwrap();
        session.finish_initial(req, Ok(page(1)), Ok(page(first)));
        session
    }

    #[test]
    fn test_visible_ratio() {
        assert_eq!(visible_ratio(0..10, 12..13), 0.0);
        assert_eq!(visible_ratio(0..10, 9..10), 1.0);
        assert_eq!(visible_ratio(0..10, 5..15), 0.5);
        assert_eq!(visible_ratio(0..10, 3..3), 0.0);
    }

    #[test]
    fn test_fires_once_per_state() {
        let session = loaded(15);
        let mut observer = SentinelObserver::default();
        assert!(observer.observe(&session, 1.0));
        // Same scroll position, same state: no second trigger
        assert!(!observer.observe(&session, 1.0));
    }

    #[test]
    fn test_below_threshold_does_not_fire() {
        let session = loaded(15);
        let mut observer = SentinelObserver::new(0.1);
        assert!(!observer.observe(&session, 0.05));
        assert!(observer.observe(&session, 0.1));
    }

    #[test]
    fn test_reattaches_after_page_arrives() {
        let mut session = loaded(15);
        let mut observer = SentinelObserver::default();
        assert!(observer.observe(&session, 1.0));

        let req = session.begin_load().unwrap();
        assert!(!observer.observe(&session, 1.0), "no trigger while loading");

        session.finish_load(req, Ok(page(15)));
        assert!(observer.observe(&session, 1.0));
    }

    #[test]
    fn test_never_fires_when_exhausted() {
        let session = loaded(5);
        let mut observer = SentinelObserver::default();
        assert!(!observer.observe(&session, 1.0));
        assert!(!observer.is_attached());
    }

    #[test]
    fn test_failed_load_rearms() {
        let mut session = loaded(15);
        let mut observer = SentinelObserver::default();
        assert!(observer.observe(&session, 1.0));
        let req = session.begin_load().unwrap();
        assert!(!observer.observe(&session, 1.0));
        session.finish_load(req, Err(ApiError::Timeout));

        assert!(session.last_error().is_some());
        assert!(observer.observe(&session, 1.0));
        assert_eq!(session.begin_load().map(|r| r.page), Some(2));
    }

    #[test]
    fn test_failure_between_observations_rearms() {
        let mut session = loaded(15);
        let mut observer = SentinelObserver::default();
        assert!(observer.observe(&session, 1.0));

        // The load starts and fails without the observer ever seeing it in flight.
        let req = session.begin_load().unwrap();
        session.finish_load(req, Err(ApiError::Timeout));
        assert!(observer.observe(&session, 1.0));
    }

    #[test]
    fn test_unloaded_session_never_fires() {
        let mut session = FeedSession::new(FeedSettings::default());
        let mut observer = SentinelObserver::default();
        assert!(!observer.observe(&session, 1.0));

        let req = session.begin_initial().unwrap();
        session.finish_initial(req, Err(ApiError::Timeout), Ok(page(15)));
        assert!(!observer.observe(&session, 1.0));
        assert!(!observer.is_attached());
    }
}
