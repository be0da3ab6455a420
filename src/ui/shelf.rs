use crate::app::App;
use newsdesk::api::Article;
use newsdesk::storage::ShelfKind;
use newsdesk::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render a saved/read shelf.
pub fn render(f: &mut Frame, app: &App, kind: ShelfKind, area: Rect) {
    let title = format!(" {} ({}) ", kind.label(), app.shelf_items.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    if app.shelf_items.is_empty() {
        let empty = match kind {
            ShelfKind::Saved => "No saved news. Press s in the reader to save an article.",
            ShelfKind::Read => "No read news. Press m in the reader to mark an article as read.",
        };
        f.render_widget(List::new([ListItem::new(empty)]).block(block), area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .shelf_items
        .iter()
        .map(|article| ListItem::new(entry_line(article, width)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default().with_selected(Some(app.shelf_selected));
    f.render_stateful_widget(list, area, &mut state);
}

/// One list row: title then category and date. Shared with search results.
pub(super) fn entry_line(article: &Article, width: usize) -> Line<'static> {
    let meta = format!("  {} · {}", article.category, article.display_date());
    let title_width = width.saturating_sub(meta.chars().count());
    let title = strip_control_chars(&article.title);
    Line::from(vec![
        Span::raw(truncate_to_width(&title, title_width).into_owned()),
        Span::styled(meta, Style::default().fg(Color::DarkGray)),
    ])
}
