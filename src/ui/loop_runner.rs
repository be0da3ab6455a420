//! Main event loop for the TUI.
//!
//! This module contains the core event loop that multiplexes terminal input,
//! background task events, and periodic ticks.

use crate::app::{App, AppEvent, View};
use anyhow::Result;
use crossterm::{
    event::{Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::helpers::{
    refresh_shelf_counts, reload_shelf, spawn_initial_feed, spawn_next_page, spawn_search,
};
use super::input::handle_input;
use super::render::render;

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Number of frames in the loading spinner animation.
pub(super) const SPINNER_FRAMES: usize = 10;

/// Runs the TUI application event loop.
///
/// Uses `tokio::select!` to multiplex:
/// - **Signals**: SIGTERM / SIGINT shut down gracefully
/// - **Terminal input**: Key presses from crossterm's async event stream
/// - **Background tasks**: Feed pages, article details and searches via `AppEvent`
/// - **Periodic tick**: 250ms timer driving the sentinel, the search debounce,
///   shelf notifications and status expiry
///
/// Installs a panic hook that restores terminal state before unwinding.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    refresh_shelf_counts(app).await;
    spawn_initial_feed(app, &event_tx);

    loop {
        // Only render when state has changed
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        if app.clear_expired_status() {
            app.needs_redraw = true;
        }

        // Drain pending app events before handling more input
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            handle_app_event(app, event).await;
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind != KeyEventKind::Release => {
                        app.needs_redraw = true;
                        match handle_input(app, key.code, key.modifiers, &event_tx).await {
                            Ok(Action::Quit) => break,
                            Ok(Action::Continue) => {}
                            Err(e) => app.set_status(format!("Error: {}", e)),
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                    Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                    None => break,
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event).await;
            }

            _ = tick_interval.tick() => {
                handle_tick(app, &event_tx).await;
            }
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

/// Periodic work: spinner, debounced search, sentinel check, shelf updates.
async fn handle_tick(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.is_busy() {
        app.spinner_frame = (app.spinner_frame + 1) % SPINNER_FRAMES;
        app.needs_redraw = true;
    }

    if app.view == View::Search {
        if let Some(query) = app.search_debounce.poll().cloned() {
            app.needs_redraw = true;
            let query = query.trim().to_string();
            if query.is_empty() {
                if let Some(handle) = app.search_handle.take() {
                    handle.abort();
                }
                app.search_in_flight = false;
                app.search_results.clear();
                app.search_selected = 0;
            } else {
                spawn_search(app, query, event_tx);
            }
        }
    }

    // The sentinel only exists while the home list is on screen
    if app.view == View::Home && app.home_visible_rows > 0 {
        let ratio = app.sentinel_ratio();
        if app.sentinel.observe(&app.feed, ratio) {
            spawn_next_page(app, event_tx);
            app.needs_redraw = true;
        }
    }

    drain_shelf_events(app).await;
}

async fn drain_shelf_events(app: &mut App) {
    let mut reload = None;
    loop {
        match app.shelf_events.try_recv() {
            Ok(event) => {
                tracing::debug!(event = event.kind.event_name(), count = event.count, "Shelf updated");
                app.needs_redraw = true;
                if app.apply_shelf_event(event) {
                    reload = Some(event.kind);
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Shelf notifications lagged, recounting");
                refresh_shelf_counts(app).await;
                if let View::Shelf(kind) = app.view {
                    reload = Some(kind);
                }
            }
            Err(_) => break,
        }
    }
    if let Some(kind) = reload {
        reload_shelf(app, kind).await;
    }
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state.
fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
