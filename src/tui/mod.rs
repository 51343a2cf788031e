//! # TUI Adapter
//!
//! The ratatui-specific layer: terminal setup, the event loop, rendering and
//! the components themselves. Orchestration (focus, pages, the event bus)
//! lives in [`crate::core`] and knows nothing about drawing.
//!
//! ## Event loop
//!
//! Each turn the loop
//! 1. draws if anything changed,
//! 2. waits up to [`IDLE_POLL`] for terminal input, then drains whatever
//!    else is pending,
//! 3. drains messages from background tasks (store results, closed input
//!    bars) and applies them in order.
//!
//! Background work never touches components. It posts a [`UiMessage`] over a
//! `std::sync::mpsc` channel and the loop applies it on this thread.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

pub mod component;
pub mod components;
pub mod dispatch;
pub mod editor;
pub mod event;
pub mod history;
pub mod message;
pub mod tasks;
pub mod ui;

use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};

use crate::core::{App, AppError, guard};
use crate::store::DocumentStore;
use crate::tui::components::input_bar::listener;
use crate::tui::dispatch::{Flow, Screen};
use crate::tui::event::{poll_event_immediate, poll_event_timeout};
use crate::tui::message::UiMessage;

/// Longest wait for input before background messages are checked.
const IDLE_POLL: Duration = Duration::from_millis(100);
/// How often the header's server status is refreshed.
const STATUS_INTERVAL: Duration = Duration::from_secs(5);

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // The keyboard protocol is harmlessly ignored by terminals that don't
        // support it.
        execute!(
            stdout(),
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(app: App, store: Arc<dyn DocumentStore>) -> Result<(), AppError> {
    let (tx, rx) = mpsc::channel();
    let mut screen = Screen::new(app, Arc::clone(&store), tx.clone())?;

    // One listener task per input bar.
    for bar in [&screen.query_bar, &screen.filter_bar] {
        let (terminator_tx, terminator_rx) = listener::channel();
        let mut bar = bar.borrow_mut();
        bar.attach(terminator_tx);
        listener::spawn_listener(bar.gate(), terminator_rx, tx.clone());
    }
    let status_poll = tasks::spawn_status_poll(Arc::clone(&store), tx.clone(), STATUS_INTERVAL);
    screen.load_databases();
    drop(tx);

    let mut terminal = ratatui::init();
    guard::install_panic_hook();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let result = event_loop(&mut terminal, &mut screen, &rx);

    status_poll.abort();
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    screen: &mut Screen,
    rx: &mpsc::Receiver<UiMessage>,
) -> Result<(), AppError> {
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            terminal
                .draw(|f| screen.draw(f))
                .map_err(AppError::Terminal)?;
            needs_redraw = false;
        }

        let first_event = poll_event_timeout(IDLE_POLL).unwrap_or_else(|e| {
            warn!("Failed to read terminal event: {}", e);
            None
        });
        if first_event.is_some() {
            needs_redraw = true;
        }

        let pending = std::iter::from_fn(|| poll_event_immediate().ok().flatten());
        for event in first_event.into_iter().chain(pending) {
            match screen.handle_input(&event) {
                Flow::Continue => {}
                Flow::Quit => return Ok(()),
                Flow::Edit(request) => {
                    let result = editor::edit_document(terminal, request.original.as_ref());
                    screen.finish_edit(request, result);
                    needs_redraw = true;
                }
            }
        }

        while let Ok(message) = rx.try_recv() {
            debug!("Event loop received: {:?}", message);
            screen.handle_message(message);
            needs_redraw = true;
        }
    }
}
