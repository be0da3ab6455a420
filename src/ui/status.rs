use crate::app::{App, View};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Spinner glyph for animation frame `frame`.
pub fn spinner(frame: usize) -> char {
    SPINNER[frame % SPINNER.len()]
}

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        match app.view {
            View::Home => Cow::Borrowed(
                "[j/k]move [Enter]open [r]eload [/]search [S]aved [R]ead [q]uit",
            ),
            View::Reader => Cow::Borrowed(
                "[b]ack [j/k]scroll [s]ave [m]ark read [c]opy link [1-3]related [r]etry [q]uit",
            ),
            View::Shelf(_) => Cow::Borrowed(
                "[b]ack [j/k]move [Enter]open [d]elete [C]lear all [S]aved [R]ead [q]uit",
            ),
            View::Search => Cow::Borrowed("Type to search | Up/Down select | Enter open | Esc back"),
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
