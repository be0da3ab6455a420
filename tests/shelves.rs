//! Saved/read shelves over the SQLite store.
//!
//! Each test opens its own in-memory database for isolation.

use newsdesk::api::Article;
use newsdesk::storage::{ArticleListStore, Database, ShelfEvent, ShelfKind, Shelves};
use pretty_assertions::assert_eq;

async fn shelves() -> Shelves<Database> {
    Shelves::new(Database::open(":memory:").await.unwrap())
}

fn ids(list: &[Article]) -> Vec<&str> {
    list.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn test_toggle_twice_restores_shelf() {
    let shelves = shelves().await;
    let a = Article::new("a", "First");
    let b = Article::new("b", "Second");
    shelves.toggle(ShelfKind::Saved, &a).await.unwrap();
    let before = shelves.list(ShelfKind::Saved).await.unwrap();

    assert!(shelves.toggle(ShelfKind::Saved, &b).await.unwrap());
    assert!(!shelves.toggle(ShelfKind::Saved, &b).await.unwrap());

    assert_eq!(shelves.list(ShelfKind::Saved).await.unwrap(), before);
}

#[tokio::test]
async fn test_newest_first_and_unique() {
    let shelves = shelves().await;
    for id in ["a", "b", "c"] {
        shelves
            .toggle(ShelfKind::Read, &Article::new(id, id))
            .await
            .unwrap();
    }
    assert_eq!(ids(&shelves.list(ShelfKind::Read).await.unwrap()), vec!["c", "b", "a"]);

    // Re-adding after removal moves the article to the front.
    shelves.toggle(ShelfKind::Read, &Article::new("a", "a")).await.unwrap();
    shelves.toggle(ShelfKind::Read, &Article::new("a", "a")).await.unwrap();
    assert_eq!(ids(&shelves.list(ShelfKind::Read).await.unwrap()), vec!["a", "c", "b"]);
}

#[tokio::test]
async fn test_shelves_are_independent() {
    let shelves = shelves().await;
    let a = Article::new("a", "First");
    shelves.toggle(ShelfKind::Saved, &a).await.unwrap();

    assert!(shelves.contains(ShelfKind::Saved, "a").await.unwrap());
    assert!(!shelves.contains(ShelfKind::Read, "a").await.unwrap());

    shelves.clear(ShelfKind::Read).await.unwrap();
    assert_eq!(shelves.count(ShelfKind::Saved).await.unwrap(), 1);
}

#[tokio::test]
async fn test_snapshot_survives_in_store() {
    let shelves = shelves().await;
    let mut article = Article::new("a", "Full record");
    article.author = "Desk".into();
    article.body = "<p>Body</p>".into();
    article
        .extra
        .insert("views".into(), serde_json::Value::from(7));
    shelves.toggle(ShelfKind::Saved, &article).await.unwrap();

    let stored = shelves.store().get("savedNews").await.unwrap();
    assert_eq!(stored, vec![article]);
}

#[tokio::test]
async fn test_every_mutation_notifies() {
    let shelves = shelves().await;
    let mut events = shelves.subscribe();
    let a = Article::new("a", "First");

    shelves.toggle(ShelfKind::Saved, &a).await.unwrap();
    shelves.toggle(ShelfKind::Read, &a).await.unwrap();
    assert!(shelves.remove(ShelfKind::Saved, "a").await.unwrap());
    // Removing an absent article changes nothing and stays silent.
    assert!(!shelves.remove(ShelfKind::Saved, "a").await.unwrap());
    shelves.clear(ShelfKind::Read).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            ShelfEvent { kind: ShelfKind::Saved, count: 1 },
            ShelfEvent { kind: ShelfKind::Read, count: 1 },
            ShelfEvent { kind: ShelfKind::Saved, count: 0 },
            ShelfEvent { kind: ShelfKind::Read, count: 0 },
        ]
    );
}
