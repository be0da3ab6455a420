use crate::api::{ApiError, Article, NewsQuery};

/// Tunables for home feed pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSettings {
    /// Articles requested per page.
    pub page_size: u32,
    /// Articles requested for the lead slot.
    pub lead_size: u32,
    /// A page with fewer articles than this is taken to mean the source is
    /// exhausted. Independent of `page_size`.
    pub exhaust_threshold: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: 15,
            lead_size: 1,
            exhaust_threshold: 6,
        }
    }
}

/// Where the feed is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No first page has been applied yet; only the initial load may start.
    Unloaded,
    /// More pages may exist and nothing is in flight.
    Idle,
    /// A request is in flight; further loads are refused.
    Loading,
    /// The source is exhausted. Terminal for the session.
    Exhausted,
}

/// A page fetch handed out by [`FeedSession::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    /// Session generation the request belongs to; results for an older
    /// generation are discarded.
    pub generation: u64,
}

impl PageRequest {
    pub fn query(&self) -> NewsQuery {
        NewsQuery::page(self.page, self.limit)
    }
}

/// The pair of requests issued when the feed is first shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialRequest {
    pub lead: PageRequest,
    pub first_page: PageRequest,
}

/// Home feed state: the lead article, the accumulated list and the
/// pagination phase.
///
/// The session is a plain state machine with no I/O. Callers ask it for the
/// next request, perform the fetch however they like, and hand the result
/// back. Because [`begin_load`](Self::begin_load) refuses while a request is
/// in flight, two page fetches can never race.
#[derive(Debug, Clone)]
pub struct FeedSession {
    settings: FeedSettings,
    lead: Option<Article>,
    articles: Vec<Article>,
    page: u32,
    phase: Phase,
    generation: u64,
    /// Loads applied to this session, successful or not.
    settled: u64,
    last_error: Option<String>,
}

impl FeedSession {
    pub fn new(settings: FeedSettings) -> Self {
        Self {
            settings,
            lead: None,
            articles: Vec::new(),
            page: 1,
            phase: Phase::Unloaded,
            generation: 0,
            settled: 0,
            last_error: None,
        }
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub fn lead(&self) -> Option<&Article> {
        self.lead.as_ref()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Last successfully loaded page number (starts at 1).
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_more(&self) -> bool {
        self.phase != Phase::Exhausted
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of initial and page loads whose results have been applied.
    /// Changes on every settled load, including failures that leave the
    /// list untouched.
    pub fn settled_loads(&self) -> u64 {
        self.settled
    }

    /// Message of the most recent failed load, cleared by the next success
    /// or by [`clear_error`](Self::clear_error).
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Drop everything and start a fresh session. In-flight results from
    /// the previous session will be ignored.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::new(self.settings);
        self.generation = generation;
    }

    /// Start the initial load: lead article plus the first page, both at
    /// page 1. Returns `None` unless the session is [`Phase::Unloaded`];
    /// call [`reset`](Self::reset) to reload a populated feed.
    pub fn begin_initial(&mut self) -> Option<InitialRequest> {
        if self.phase != Phase::Unloaded {
            return None;
        }
        self.phase = Phase::Loading;
        Some(InitialRequest {
            lead: PageRequest {
                page: 1,
                limit: self.settings.lead_size,
                generation: self.generation,
            },
            first_page: PageRequest {
                page: 1,
                limit: self.settings.page_size,
                generation: self.generation,
            },
        })
    }

    /// Apply the joined results of the initial load.
    ///
    /// Both requests must succeed for anything to change; a failure of
    /// either is logged and leaves the feed empty and unloaded, so the
    /// next step is another initial load rather than page 2.
    pub fn finish_initial(
        &mut self,
        request: InitialRequest,
        lead: Result<Vec<Article>, ApiError>,
        first_page: Result<Vec<Article>, ApiError>,
    ) {
        if request.first_page.generation != self.generation || self.phase != Phase::Loading {
            tracing::debug!(
                generation = request.first_page.generation,
                current = self.generation,
                "Discarding stale initial feed load"
            );
            return;
        }

        self.settled += 1;
        match (lead, first_page) {
            (Ok(lead), Ok(articles)) => {
                self.lead = lead.into_iter().next();
                self.page = 1;
                self.last_error = None;
                self.phase = if articles.len() < self.settings.exhaust_threshold {
                    Phase::Exhausted
                } else {
                    Phase::Idle
                };
                tracing::info!(
                    articles = articles.len(),
                    has_more = self.has_more(),
                    "Home feed loaded"
                );
                self.articles = articles;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Error fetching home feed");
                self.last_error = Some(e.to_string());
                self.phase = Phase::Unloaded;
            }
        }
    }

    /// The single transition driven by "the sentinel is visible".
    ///
    /// From `Idle`, moves to `Loading` and returns the request for the next
    /// page. From any other phase, returns `None`: in particular nothing
    /// past page 1 is requested before page 1 has been applied.
    pub fn begin_load(&mut self) -> Option<PageRequest> {
        if self.phase != Phase::Idle {
            return None;
        }
        self.phase = Phase::Loading;
        Some(PageRequest {
            page: self.page + 1,
            limit: self.settings.page_size,
            generation: self.generation,
        })
    }

    /// Apply the result of a page fetch started by [`begin_load`](Self::begin_load).
    ///
    /// - non-empty: appended as-is, page advances, exhausted if short
    /// - empty: exhausted, list untouched
    /// - error: logged, list untouched
    ///
    /// The loading state is cleared in every case.
    pub fn finish_load(&mut self, request: PageRequest, result: Result<Vec<Article>, ApiError>) {
        if request.generation != self.generation || self.phase != Phase::Loading {
            tracing::debug!(
                page = request.page,
                generation = request.generation,
                current = self.generation,
                "Discarding stale page load"
            );
            return;
        }

        self.settled += 1;
        match result {
            Ok(articles) if articles.is_empty() => {
                tracing::info!(page = request.page, "Empty page, feed exhausted");
                self.last_error = None;
                self.phase = Phase::Exhausted;
            }
            Ok(articles) => {
                let short = articles.len() < self.settings.exhaust_threshold;
                tracing::debug!(
                    page = request.page,
                    received = articles.len(),
                    total = self.articles.len() + articles.len(),
                    "Page appended"
                );
                self.articles.extend(articles);
                self.page = request.page;
                self.last_error = None;
                self.phase = if short { Phase::Exhausted } else { Phase::Idle };
            }
            Err(e) => {
                tracing::error!(page = request.page, error = %e, "Error loading more news");
                self.last_error = Some(e.to_string());
                self.phase = Phase::Idle;
            }
        }
    }
}
