use crate::api::NewsApi;

use super::session::{FeedSession, FeedSettings, Phase};

/// Drives a [`FeedSession`] against a [`NewsApi`].
///
/// This is the straight-line async form of pagination, used by the
/// non-interactive commands and tests. The terminal UI drives the session
/// directly so that fetches run on background tasks.
pub struct FeedController<A> {
    api: A,
    session: FeedSession,
}

impl<A: NewsApi> FeedController<A> {
    pub fn new(api: A, settings: FeedSettings) -> Self {
        Self {
            api,
            session: FeedSession::new(settings),
        }
    }

    pub fn session(&self) -> &FeedSession {
        &self.session
    }

    /// Fetch the lead article and the first page concurrently.
    pub async fn load_initial(&mut self) {
        let Some(request) = self.session.begin_initial() else {
            return;
        };
        let lead_query = request.lead.query();
        let page_query = request.first_page.query();
        let (lead, first_page) =
            tokio::join!(self.api.list(&lead_query), self.api.list(&page_query));
        self.session.finish_initial(request, lead, first_page);
    }

    /// Load the next page if the session allows it.
    ///
    /// A session whose initial load never succeeded gets that load retried
    /// instead, so page 1 is never skipped. Returns false without touching
    /// the network when the feed is exhausted or a load is already in
    /// flight.
    pub async fn load_more(&mut self) -> bool {
        if self.session.phase() == Phase::Unloaded {
            self.load_initial().await;
            return true;
        }
        let Some(request) = self.session.begin_load() else {
            return false;
        };
        let result = self.api.list(&request.query()).await;
        self.session.finish_load(request, result);
        true
    }
}
