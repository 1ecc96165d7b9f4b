pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::ThemeColors;

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::dashboard::{Payload, Ticket};
use crate::records::Division;
use crate::source::{AthleteListEntry, StatsClient, TransportError};

type FetchTask = (Ticket, JoinHandle<Result<Payload, TransportError>>);
type AthletesTask = (Division, JoinHandle<Result<Vec<AthleteListEntry>, TransportError>>);

pub async fn run_tui(mut app: App, client: StatsClient) -> anyhow::Result<()> {
    // Buffer log output while TUI is active to prevent it corrupting the display
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();

    let refresh_secs = app.config.auto_refresh_interval;
    let mut events = EventHandler::new(250, refresh_secs); // 250ms tick, N-second refresh

    // Superseded fetches keep running; the tracker discards their results
    let mut in_flight: Vec<FetchTask> = Vec::new();
    let mut athletes_task: Option<AthletesTask> = None;

    let result: anyhow::Result<()> = loop {
        // Start whatever the app queued since the last pass
        if let Some(ticket) = app.take_request() {
            let client = client.clone();
            let key = ticket.key.clone();
            let handle = tokio::spawn(async move { crate::fetch::fetch_payload(&client, &key).await });
            in_flight.push((ticket, handle));
        }
        if let Some(division) = app.take_athletes_request() {
            let client = client.clone();
            let event_id = app.subject.event_id;
            let handle = tokio::spawn(async move { client.fetch_event_athletes(event_id, division).await });
            athletes_task = Some((division, handle));
        }

        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &mut app)) {
            break Err(e.into());
        }

        match events.next().await {
            Event::Key(key) => {
                app.last_interaction = std::time::Instant::now();
                handle_key_event(&mut app, key);
            }
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Refresh => {
                // Skip auto refresh while the user is mid-interaction or a fetch is running
                let idle = app.last_interaction.elapsed() >= Duration::from_secs(10);
                if idle && app.input_mode == app::InputMode::Normal && !app.is_loading() {
                    app.refresh();
                }
            }
        }

        // Collect finished fetches in issue order
        let mut i = 0;
        while i < in_flight.len() {
            if in_flight[i].1.is_finished() {
                let (ticket, handle) = in_flight.remove(i);
                match handle.await {
                    Ok(result) => app.complete_fetch(ticket, result),
                    Err(e) => {
                        warn!("fetch task failed: {}", e);
                        app.tracker.accept(&ticket);
                        app.show_flash(format!("Error: refresh task failed: {}", e));
                    }
                }
            } else {
                i += 1;
            }
        }

        if athletes_task.as_ref().is_some_and(|(_, h)| h.is_finished()) {
            if let Some((division, handle)) = athletes_task.take() {
                match handle.await {
                    Ok(result) => app.complete_athletes(division, result),
                    Err(e) => warn!("athlete list task failed: {}", e),
                }
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    for (_, handle) in in_flight {
        handle.abort();
    }

    // Restore terminal
    ratatui::restore();

    // Flush buffered log lines now that the terminal is restored
    for line in crate::stderr_buffer::drain() {
        eprintln!("{}", line);
    }

    result
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    if app.input_mode == app::InputMode::Help {
        // Any key exits help
        app.dismiss_help();
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.should_quit = true,

        // Filter level focus
        KeyCode::Tab | KeyCode::Right => app.focus_next(),
        KeyCode::BackTab | KeyCode::Left => app.focus_previous(),

        // Option at the focused level
        KeyCode::Char('j') | KeyCode::Down => app.cycle_option(true),
        KeyCode::Char('k') | KeyCode::Up => app.cycle_option(false),

        KeyCode::Char('c') => app.clear_filters(),
        KeyCode::Char('t') => app.toggle_ties(),

        // Move-type table rows
        KeyCode::Char('n') => app.next_row(),
        KeyCode::Char('p') => app.previous_row(),

        // Subject
        KeyCode::Char('d') => app.toggle_division(),
        KeyCode::Char(']') => app.cycle_athlete(true),
        KeyCode::Char('[') => app.cycle_athlete(false),
        KeyCode::Char('e') => app.show_event(),

        KeyCode::Char('r') => {
            app.refresh();
            app.show_flash("Refreshing...".to_string());
        }

        KeyCode::Char('?') => app.show_help(),

        _ => {}
    }
}
