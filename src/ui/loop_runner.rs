//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, adapter completions and a periodic tick. Every
//! adapter event is applied here, so the adapter is only touched from this
//! loop.

use super::input::handle_input;
use super::render::{layout, render};
use super::screen::{Screen, ScreenObserver};
use crate::adapter::{AdapterEvent, PostListAdapter};
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
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Result of handling a key press event.
pub enum Action {
    Continue,
    Quit,
}

/// Runs the post list until the user quits or a termination signal arrives.
///
/// Registers a [`ScreenObserver`] on the adapter, then loops:
/// - bind visible rows (issuing image requests for newly visible ones)
/// - draw if anything changed
/// - wait for a key, an adapter event, a signal, or the 250ms tick
///
/// Installs a panic hook that restores the terminal before unwinding.
pub async fn run(
    adapter: &mut PostListAdapter,
    mut event_rx: mpsc::Receiver<AdapterEvent>,
) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let observer = ScreenObserver::default();
    adapter.add_observer(observer.clone());

    let mut terminal = setup_terminal()?;
    let mut screen = Screen::new();
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    let result = loop {
        let size = match terminal.size() {
            Ok(size) => size,
            Err(e) => break Err(e.into()),
        };
        let (list_area, _) = layout(ratatui::layout::Rect::new(0, 0, size.width, size.height));
        screen.capacity = Screen::capacity_for(list_area.height);
        screen.bind_visible(adapter);

        if screen.needs_redraw {
            if let Err(e) = terminal.draw(|f| render(f, &screen, &*adapter)) {
                break Err(e.into());
            }
            screen.needs_redraw = false;
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
                tracing::info!("Received SIGTERM, shutting down");
                break Ok(());
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down");
                break Ok(());
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Action::Quit = handle_input(&mut screen, adapter, key.code, key.modifiers) {
                            break Ok(());
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => screen.needs_redraw = true,
                    Some(Err(e)) => break Err(e.into()),
                    None => break Ok(()),
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                adapter.handle_event(event);
                // Drain whatever else is queued before redrawing
                while let Ok(event) = event_rx.try_recv() {
                    adapter.handle_event(event);
                }
                screen.apply_signals(observer.take());
            }

            _ = tick_interval.tick() => {
                if screen.clear_expired_status() {
                    screen.needs_redraw = true;
                }
            }
        }
    };

    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
