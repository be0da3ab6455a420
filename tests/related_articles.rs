//! Article detail loading with related-article assembly.

mod common;

use std::collections::HashSet;

use common::FakeNews;
use newsdesk::api::Article;
use newsdesk::detail::{DetailLoader, RelatedSettings};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn story(id: &str, title: &str, category: &str) -> Article {
    Article::new(id, title).with_category(category)
}

fn corpus() -> Vec<Article> {
    vec![
        story("cur", "Markets rally into the weekend", "economy"),
        story("m1", "Markets slip on rate fears", "economy"),
        story("e1", "Jobs report beats forecasts", "economy"),
        story("e2", "Housing starts fall", "economy"),
        story("e3", "Retail sales steady", "economy"),
        story("s1", "Derby ends level", "sports"),
        story("s2", "Markets for season tickets open", "sports"),
    ]
}

async fn related_ids(api: &FakeNews, id: &str, seed: u64) -> Vec<String> {
    let mut loader = DetailLoader::new(api, StdRng::seed_from_u64(seed), RelatedSettings::default());
    let detail = loader.load(id).await.unwrap().unwrap();
    detail.related.into_iter().map(|a| a.id).collect()
}

#[tokio::test]
async fn test_related_mixes_title_and_category_matches() {
    let api = FakeNews::new(corpus());
    let mut loader = DetailLoader::new(&api, StdRng::seed_from_u64(3), RelatedSettings::default());

    let detail = loader.load("cur").await.unwrap().unwrap();
    let related: Vec<&str> = detail.related.iter().map(|a| a.id.as_str()).collect();

    assert_eq!(related.len(), 3);
    // Title matches come first, in service order.
    assert_eq!(&related[..2], &["m1", "s2"]);
    assert!(["e1", "e2", "e3"].contains(&related[2]));
    assert!(!related.contains(&"cur"));

    let unique: HashSet<&str> = related.iter().copied().collect();
    assert_eq!(unique.len(), related.len());

    let queries = api.queries();
    assert_eq!(queries[0].title.as_deref(), Some("markets"));
    assert_eq!(queries[1].category.as_deref(), Some("economy"));
}

#[tokio::test]
async fn test_title_without_keywords_uses_category_only() {
    let mut articles = corpus();
    articles[0].title = "Up and on".into();
    let api = FakeNews::new(articles);

    let first = related_ids(&api, "cur", 11).await;
    let again = related_ids(&api, "cur", 11).await;
    assert_eq!(first, again);
    assert_eq!(first.len(), 3);
    assert!(first.iter().all(|id| id != "cur"));
    assert!(first.iter().all(|id| id.starts_with('m') || id.starts_with('e')));
    assert!(api.queries().iter().all(|q| q.title.is_none()));
}

#[tokio::test]
async fn test_related_limit_is_configurable() {
    let api = FakeNews::new(corpus());
    let settings = RelatedSettings {
        limit: 5,
        ..RelatedSettings::default()
    };
    let mut loader = DetailLoader::new(&api, StdRng::seed_from_u64(5), settings);

    let detail = loader.load("cur").await.unwrap().unwrap();
    assert_eq!(detail.related.len(), 5);
}

#[tokio::test]
async fn test_unknown_article_is_none() {
    let api = FakeNews::new(corpus());
    let mut loader = DetailLoader::new(&api, StdRng::seed_from_u64(1), RelatedSettings::default());
    assert!(loader.load("missing").await.unwrap().is_none());
    assert!(api.queries().is_empty());
}
