//! Application event handling.
//!
//! Applies background task results (feed pages, article details, search
//! results) to the application state.

use crate::app::{App, AppEvent, ReaderState, ShelfMarks, View};
use newsdesk::api::ApiError;
use newsdesk::detail::ArticleDetail;
use newsdesk::storage::ShelfKind;
use newsdesk::util::{html_to_text, strip_control_chars};
use ratatui::text::Line;

use super::helpers::{TASK_DETAIL, TASK_FEED, TASK_SEARCH};

/// Handle application events from background tasks.
pub(super) async fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::FeedInitialLoaded {
            request,
            lead,
            first_page,
        } => {
            app.feed_handle = None;
            let failed = lead.is_err() || first_page.is_err();
            app.feed.finish_initial(request, lead, first_page);
            if failed && request.first_page.generation == app.feed.generation() {
                app.set_status("Failed to load news. Press r to retry");
            }
            app.ensure_home_visible();
        }
        AppEvent::FeedPageLoaded { request, result } => {
            app.feed_handle = None;
            let failed = result.is_err();
            app.feed.finish_load(request, result);
            if failed && request.generation == app.feed.generation() {
                app.set_status("Failed to load more news. Press r to retry");
            }
        }
        AppEvent::DetailLoaded {
            id,
            generation,
            result,
        } => handle_detail_loaded(app, id, generation, result).await,
        AppEvent::SearchCompleted {
            query,
            generation,
            results,
        } => {
            if generation != app.search_generation {
                tracing::debug!(
                    query = %query,
                    generation,
                    current = app.search_generation,
                    "Discarding stale search results"
                );
                return;
            }
            app.search_handle = None;
            app.search_in_flight = false;
            match results {
                Ok(articles) => {
                    tracing::debug!(query = %query, results = articles.len(), "Search completed");
                    app.search_results = articles;
                    app.search_selected = 0;
                }
                Err(e) => {
                    tracing::error!(query = %query, error = %e, "Search failed");
                    app.set_status(format!("Search failed: {}", e));
                }
            }
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Task panicked");
            match task {
                TASK_FEED => {
                    app.feed_handle = None;
                    app.reset_feed();
                    app.set_status("Feed load crashed. Press r to reload");
                }
                TASK_DETAIL => {
                    app.reader_handle = None;
                    let loading = match &app.reader {
                        ReaderState::Loading { id } => Some(id.clone()),
                        _ => None,
                    };
                    if let Some(id) = loading {
                        app.reader = ReaderState::Failed {
                            id,
                            error: error.clone(),
                        };
                    }
                    app.set_status(format!("Internal error: {}", error));
                }
                TASK_SEARCH => {
                    app.search_handle = None;
                    app.search_in_flight = false;
                    app.set_status(format!("Internal error: {}", error));
                }
                _ => app.set_status(format!("Internal error: {}", error)),
            }
        }
    }
}

async fn handle_detail_loaded(
    app: &mut App,
    id: String,
    generation: u64,
    result: Result<Option<ArticleDetail>, ApiError>,
) {
    if generation != app.reader_generation || app.view != View::Reader {
        tracing::debug!(
            id = %id,
            generation,
            current = app.reader_generation,
            "Discarding stale article load"
        );
        return;
    }
    app.reader_handle = None;

    match result {
        Ok(Some(detail)) => {
            app.reader_marks = shelf_marks(app, &detail.article.id).await;
            let description = strip_control_chars(&detail.article.summary()).into_owned();
            let body = render_body(&detail.article.body);
            tracing::debug!(id = %id, related = detail.related.len(), "Article loaded");
            app.reader = ReaderState::Loaded {
                detail,
                description,
                body,
            };
            app.scroll_offset = 0;
        }
        Ok(None) => {
            app.reader = ReaderState::Missing { id };
        }
        Err(e) => {
            tracing::error!(id = %id, error = %e, "Error fetching news detail");
            app.reader = ReaderState::Failed {
                id,
                error: e.to_string(),
            };
        }
    }
}

/// Look up which shelves hold `id`. Lookup failures count as "not on shelf".
async fn shelf_marks(app: &App, id: &str) -> ShelfMarks {
    let mut marks = ShelfMarks::default();
    for kind in ShelfKind::ALL {
        match app.shelves.contains(kind, id).await {
            Ok(on) => marks.set(kind, on),
            Err(e) => {
                tracing::warn!(shelf = kind.storage_key(), error = %e, "Failed to read shelf state")
            }
        }
    }
    marks
}

/// Reduce an HTML body to owned plain-text lines for the reader.
pub(super) fn render_body(body_html: &str) -> Vec<Line<'static>> {
    let text = html_to_text(body_html);
    if text.trim().is_empty() {
        return vec![Line::from("(This article has no body.)")];
    }
    text.lines()
        .map(|line| Line::from(strip_control_chars(line).into_owned()))
        .collect()
}
