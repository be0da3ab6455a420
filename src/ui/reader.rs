use crate::app::{App, ReaderState, MAX_SCROLL};
use newsdesk::util::strip_control_chars;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::status::spinner;

/// Render the article reader view
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    // Viewport size for scroll clamping (minus borders)
    app.reader_visible_lines = area.height.saturating_sub(2) as usize;
    app.reader_viewport_width = area.width.saturating_sub(2) as usize;
    app.clamp_reader_scroll();

    let lines: Vec<Line> = match &app.reader {
        ReaderState::Idle => vec![Line::from("No article selected")],
        ReaderState::Loading { .. } => vec![Line::from(format!(
            "{} Loading...",
            spinner(app.spinner_frame)
        ))],
        ReaderState::Missing { .. } => vec![
            Line::from(Span::styled(
                "News not found",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("The article may have been removed. Press b to go back."),
        ],
        ReaderState::Failed { error, .. } => vec![
            Line::from(Span::styled(
                "Failed to load news. Please try again.",
                Style::default().fg(Color::Red),
            )),
            Line::from(""),
            Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from("Press r to retry or b to go back."),
        ],
        ReaderState::Loaded {
            detail,
            description,
            body,
        } => {
            let article = &detail.article;
            let mut byline = vec![article.display_date()];
            if !article.author.is_empty() {
                byline.push(strip_control_chars(&article.author).into_owned());
            }
            if !article.category.is_empty() {
                byline.push(strip_control_chars(&article.category).into_owned());
            }

            let mut marks = Vec::new();
            if app.reader_marks.saved {
                marks.push(Span::styled(" [saved]", Style::default().fg(Color::Yellow)));
            }
            if app.reader_marks.read {
                marks.push(Span::styled(" [read]", Style::default().fg(Color::Green)));
            }

            let mut title = vec![Span::styled(
                strip_control_chars(&article.title).into_owned(),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            title.extend(marks);

            let mut lines = vec![
                Line::from(title),
                Line::from(Span::styled(
                    byline.join(" · "),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    description.clone(),
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
                Line::from(""),
            ];
            lines.extend(body.iter().cloned());
            lines.push(Line::from(""));

            if detail.related.is_empty() {
                lines.push(Line::from(Span::styled(
                    "No related news",
                    Style::default().fg(Color::DarkGray),
                )));
            } else {
                lines.push(Line::from(Span::styled(
                    "Related news",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                for (i, related) in detail.related.iter().enumerate() {
                    lines.push(Line::from(vec![
                        Span::styled(format!(" {} ", i + 1), Style::default().fg(Color::Cyan)),
                        Span::raw(strip_control_chars(&related.title).into_owned()),
                    ]));
                }
            }
            lines
        }
    };

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Article "))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset.min(MAX_SCROLL) as u16, 0));

    f.render_widget(paragraph, area);
}
