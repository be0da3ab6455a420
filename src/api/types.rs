use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::util::describe;

/// Characters of body text used when an article has no description.
const SUMMARY_CHARS: usize = 160;

/// A news article as delivered by the API.
///
/// `id` is the only equality key used anywhere in the crate: feed lists,
/// related sets and shelves all compare articles by identifier. Fields the
/// reader does not know about are kept in `extra` so that a persisted
/// snapshot round-trips the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: String,
    /// Publication date exactly as the service sent it.
    #[serde(default)]
    pub date: String,
    /// Rich-text (HTML) body.
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Article {
    /// Build an article with just an identifier and a title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            category: String::new(),
            date: String::new(),
            body: String::new(),
            image: None,
            description: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Parse `date` leniently: RFC 3339 first, then a bare `YYYY-MM-DD`.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.date) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(self.date.get(..10)?, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// Long-form date for the reader ("March 4, 2025"), falling back to the
    /// raw string when it cannot be parsed.
    pub fn display_date(&self) -> String {
        match self.published() {
            Some(dt) => dt.format("%B %-d, %Y").to_string(),
            None => self.date.clone(),
        }
    }

    /// Public page for this article on the news site at `site_base`.
    pub fn link(&self, site_base: &str) -> String {
        format!("{}/news/{}", site_base.trim_end_matches('/'), self.id)
    }

    /// The article's description, or the opening of its body as plain
    /// text when the service sent none.
    pub fn summary(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => describe(&self.body, SUMMARY_CHARS),
        }
    }
}

/// Query parameters for `GET /news`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsQuery {
    pub limit: u32,
    /// 1-based page number; omitted from the request when `None`.
    pub page: Option<u32>,
    pub category: Option<String>,
    /// Keyword matched against article titles.
    pub title: Option<String>,
}

impl NewsQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            limit,
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn by_title(keyword: impl Into<String>, limit: u32) -> Self {
        Self {
            limit,
            title: Some(keyword.into()),
            ..Self::default()
        }
    }

    pub fn by_category(category: impl Into<String>, limit: u32) -> Self {
        Self {
            limit,
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Query pairs in wire order.
    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(title) = &self.title {
            pairs.push(("title", title.clone()));
        }
        pairs
    }
}

/// `{ "news": [..] }`
#[derive(Debug, Deserialize)]
pub(crate) struct NewsList {
    #[serde(default)]
    pub news: Vec<Article>,
}

/// `{ "news": {..} }`, where `news` may be null.
#[derive(Debug, Deserialize)]
pub(crate) struct NewsItem {
    #[serde(default)]
    pub news: Option<Article>,
}
