//! Article detail loading and related-article assembly.
//!
//! Related articles are gathered in two phases:
//!
//! 1. **Title search**: the first significant word of the title (longer
//!    than three characters) is used as a `title=` search.
//! 2. **Category fill**: if fewer than three were found, articles from the
//!    same category are shuffled and appended, skipping identifiers already
//!    present.
//!
//! The result is cut to three entries, title matches first. Failures while
//! assembling related articles never affect the primary article.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::api::{ApiError, Article, NewsApi, NewsQuery};
use crate::util::significant_words;

/// Tunables for related-article assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedSettings {
    /// Maximum number of related articles returned.
    pub limit: usize,
    /// `limit` sent with the title search and the category fetch.
    pub search_limit: u32,
    /// Significant title words considered.
    pub max_words: usize,
}

impl Default for RelatedSettings {
    fn default() -> Self {
        Self {
            limit: 3,
            search_limit: 10,
            max_words: 3,
        }
    }
}

/// A loaded article together with its related set.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDetail {
    pub article: Article,
    pub related: Vec<Article>,
}

/// Loads single articles and their related sets.
///
/// The random source used for the category shuffle is injected, so a
/// seeded generator gives reproducible ordering.
pub struct DetailLoader<A, R> {
    api: A,
    rng: R,
    settings: RelatedSettings,
}

impl<A: NewsApi, R: Rng + Send> DetailLoader<A, R> {
    pub fn new(api: A, rng: R, settings: RelatedSettings) -> Self {
        Self { api, rng, settings }
    }

    /// Fetch the article with `id` and assemble its related set.
    ///
    /// `Ok(None)` means the service has no such article.
    pub async fn load(&mut self, id: &str) -> Result<Option<ArticleDetail>, ApiError> {
        let Some(article) = self.api.get(id).await? else {
            tracing::info!(id = %id, "Article not found");
            return Ok(None);
        };
        let related = self.related_for(&article).await;
        Ok(Some(ArticleDetail { article, related }))
    }

    /// Related articles for `article`; empty if anything goes wrong.
    pub async fn related_for(&mut self, article: &Article) -> Vec<Article> {
        match self.assemble_related(article).await {
            Ok(related) => related,
            Err(e) => {
                tracing::error!(id = %article.id, error = %e, "Failed to fetch related news");
                Vec::new()
            }
        }
    }

    async fn assemble_related(&mut self, article: &Article) -> Result<Vec<Article>, ApiError> {
        let limit = self.settings.limit;
        let words = significant_words(&article.title, self.settings.max_words);

        let mut related: Vec<Article> = Vec::new();
        if let Some(keyword) = words.first() {
            let query = NewsQuery::by_title(keyword.as_str(), self.settings.search_limit);
            related = self
                .api
                .list(&query)
                .await?
                .into_iter()
                .filter(|a| a.id != article.id)
                .collect();
            tracing::debug!(keyword = %keyword, found = related.len(), "Related by title");
        }

        if related.len() < limit {
            let query = NewsQuery::by_category(article.category.as_str(), self.settings.search_limit);
            let mut same_category: Vec<Article> = self
                .api
                .list(&query)
                .await?
                .into_iter()
                .filter(|a| a.id != article.id)
                .collect();
            same_category.shuffle(&mut self.rng);

            let mut seen: HashSet<String> = related.iter().map(|a| a.id.clone()).collect();
            for candidate in same_category {
                if seen.insert(candidate.id.clone()) {
                    related.push(candidate);
                }
            }
        }

        related.truncate(limit);
        Ok(related)
    }
}
