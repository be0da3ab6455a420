//! Remote news API access.
//!
//! The API is a black-box JSON service with two endpoints:
//!
//! - `GET /news?limit=&page=[&category=][&title=]` returns `{ "news": [..] }`
//! - `GET /news/{id}` returns `{ "news": {..} }`
//!
//! Everything above this module talks to the service through the
//! [`NewsApi`] trait so that pagination and related-article logic can be
//! exercised against scripted fakes.
//!
//! # Example
//!
//! ```ignore
//! use newsdesk::api::{HttpNewsApi, NewsApi, NewsQuery};
//!
//! let api = HttpNewsApi::new("https://news.example.com/api")?;
//! let first_page = api.list(&NewsQuery::page(1, 15)).await?;
//! ```

mod client;
mod types;

use std::future::Future;
use std::sync::Arc;

pub use client::{ApiError, HttpNewsApi};
pub use types::{Article, NewsQuery};

/// Read access to the remote news service.
pub trait NewsApi: Send + Sync {
    /// Fetch a list of articles matching `query`.
    fn list(
        &self,
        query: &NewsQuery,
    ) -> impl Future<Output = Result<Vec<Article>, ApiError>> + Send;

    /// Fetch a single article by identifier. `Ok(None)` means the service
    /// answered successfully but had no article under that identifier.
    fn get(&self, id: &str) -> impl Future<Output = Result<Option<Article>, ApiError>> + Send;
}

impl<T: NewsApi> NewsApi for Arc<T> {
    fn list(
        &self,
        query: &NewsQuery,
    ) -> impl Future<Output = Result<Vec<Article>, ApiError>> + Send {
        (**self).list(query)
    }

    fn get(&self, id: &str) -> impl Future<Output = Result<Option<Article>, ApiError>> + Send {
        (**self).get(id)
    }
}

impl<T: NewsApi> NewsApi for &T {
    fn list(
        &self,
        query: &NewsQuery,
    ) -> impl Future<Output = Result<Vec<Article>, ApiError>> + Send {
        (**self).list(query)
    }

    fn get(&self, id: &str) -> impl Future<Output = Result<Option<Article>, ApiError>> + Send {
        (**self).get(id)
    }
}
