use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::shelf::entry_line;
use super::status::spinner;

/// Render the title search view: query box above the result list.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let query = Paragraph::new(format!("> {}_", app.search_input)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Search by title "),
    );
    f.render_widget(query, chunks[0]);

    let title = if app.search_in_flight {
        format!(" {} Searching... ", spinner(app.spinner_frame))
    } else {
        format!(" Results ({}) ", app.search_results.len())
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if app.search_results.is_empty() {
        let hint = if app.search_input.trim().is_empty() {
            "Start typing to search"
        } else if app.search_in_flight || app.search_debounce.is_pending() {
            ""
        } else {
            "No news found"
        };
        f.render_widget(List::new([ListItem::new(hint)]).block(block), chunks[1]);
        return;
    }

    let width = chunks[1].width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .search_results
        .iter()
        .map(|article| ListItem::new(entry_line(article, width)))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default().with_selected(Some(app.search_selected));
    f.render_stateful_widget(list, chunks[1], &mut state);
}
