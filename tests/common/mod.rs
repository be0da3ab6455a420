//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use newsdesk::api::{ApiError, Article, NewsApi, NewsQuery};

/// An in-process news service over a fixed corpus.
///
/// Paged requests slice the corpus, title requests match case-insensitively
/// on the title and category requests match exactly. Every query is
/// recorded so tests can assert on what went over the "wire".
#[derive(Default)]
pub struct FakeNews {
    corpus: Vec<Article>,
    failing_pages: Mutex<HashSet<u32>>,
    queries: Mutex<Vec<NewsQuery>>,
}

impl FakeNews {
    pub fn new(corpus: Vec<Article>) -> Self {
        Self {
            corpus,
            ..Self::default()
        }
    }

    /// Corpus of `n` articles with ids `n0`, `n1`, ...
    pub fn numbered(n: usize) -> Self {
        Self::new((0..n).map(|i| Article::new(format!("n{}", i), format!("Story {}", i))).collect())
    }

    /// Make requests for `page` fail with a server error until cleared.
    pub fn fail_page(&self, page: u32) {
        self.failing_pages.lock().unwrap().insert(page);
    }

    pub fn heal_page(&self, page: u32) {
        self.failing_pages.lock().unwrap().remove(&page);
    }

    pub fn queries(&self) -> Vec<NewsQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Number of paged (home feed) requests seen so far.
    pub fn page_requests(&self) -> usize {
        self.queries().iter().filter(|q| q.page.is_some()).count()
    }
}

impl NewsApi for FakeNews {
    async fn list(&self, query: &NewsQuery) -> Result<Vec<Article>, ApiError> {
        self.queries.lock().unwrap().push(query.clone());
        let limit = query.limit as usize;

        if let Some(title) = &query.title {
            let needle = title.to_lowercase();
            return Ok(self
                .corpus
                .iter()
                .filter(|a| a.title.to_lowercase().contains(&needle))
                .take(limit)
                .cloned()
                .collect());
        }
        if let Some(category) = &query.category {
            return Ok(self
                .corpus
                .iter()
                .filter(|a| &a.category == category)
                .take(limit)
                .cloned()
                .collect());
        }

        let page = query.page.unwrap_or(1);
        if self.failing_pages.lock().unwrap().contains(&page) {
            return Err(ApiError::HttpStatus(503));
        }
        let start = (page as usize - 1) * limit;
        Ok(self.corpus.iter().skip(start).take(limit).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Article>, ApiError> {
        Ok(self.corpus.iter().find(|a| a.id == id).cloned())
    }
}
