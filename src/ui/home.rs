use crate::app::App;
use newsdesk::api::Article;
use newsdesk::feed::Phase;
use newsdesk::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::status::spinner;

/// Render the home feed: lead article, paginated list, end-of-feed sentinel.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    app.home_visible_rows = area.height.saturating_sub(2) as usize;
    app.ensure_home_visible();

    let inner_width = area.width.saturating_sub(2) as usize;
    let total = app.home_len();
    let end = (app.home_offset + app.home_visible_rows).min(total + 1);

    let mut lines: Vec<Line> = Vec::with_capacity(app.home_visible_rows);
    for row in app.home_offset..end {
        if row == total {
            lines.push(sentinel_line(app));
            continue;
        }
        let Some(article) = app.home_article(row) else {
            continue;
        };
        let is_lead = row == 0 && app.feed.lead().is_some();
        lines.push(article_line(
            article,
            is_lead,
            row == app.home_selected,
            inner_width,
        ));
    }

    let title = format!(
        " News  [saved {}] [read {}] ",
        app.saved_count, app.read_count
    );
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );
    f.render_widget(paragraph, area);
}

fn article_line(article: &Article, is_lead: bool, selected: bool, width: usize) -> Line<'static> {
    let marker = if is_lead { "▶ " } else { "  " };
    let meta = format!("  {} · {}", article.category, article.display_date());
    let title_width = width
        .saturating_sub(marker.width())
        .saturating_sub(meta.width());
    let title = strip_control_chars(&article.title);
    let title = truncate_to_width(&title, title_width).into_owned();

    let title_style = match (selected, is_lead) {
        (true, _) => Style::default().bg(Color::DarkGray).fg(Color::White),
        (false, true) => Style::default().add_modifier(Modifier::BOLD),
        (false, false) => Style::default(),
    };

    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(title, title_style),
        Span::styled(meta, Style::default().fg(Color::DarkGray)),
    ])
}

/// The row after the last article. Its visibility drives pagination.
fn sentinel_line(app: &App) -> Line<'static> {
    let (text, color) = match (app.feed.phase(), app.feed.last_error()) {
        (Phase::Loading, _) => (
            format!("  {} Loading...", spinner(app.spinner_frame)),
            Color::Yellow,
        ),
        (_, Some(err)) => (
            format!("  Failed to load news ({}). Press r to retry", err),
            Color::Red,
        ),
        (Phase::Exhausted, None) if app.home_len() == 0 => ("  No news".to_string(), Color::DarkGray),
        (Phase::Exhausted, None) => ("  No more news".to_string(), Color::DarkGray),
        (Phase::Idle | Phase::Unloaded, None) => ("  ···".to_string(), Color::DarkGray),
    };
    Line::from(Span::styled(text, Style::default().fg(color)))
}
