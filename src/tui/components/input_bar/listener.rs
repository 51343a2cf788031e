//! Waits for the key that closes an input bar.
//!
//! The bar forwards Enter and Esc as [`Terminator`]s over an unbounded
//! channel. A spawned task owns the receiving end: on each terminator it
//! disables the bar under the bar's lock and posts the outcome to the UI
//! loop, which restores focus and hands accepted text to the requester.

use std::sync::mpsc;

use log::{debug, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

use super::gate::InputGate;
use crate::tui::message::{InputOutcome, UiMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Accept(String),
    Cancel,
}

pub fn channel() -> (UnboundedSender<Terminator>, UnboundedReceiver<Terminator>) {
    unbounded_channel()
}

pub fn spawn_listener(
    gate: InputGate,
    keys: UnboundedReceiver<Terminator>,
    ui: mpsc::Sender<UiMessage>,
) -> JoinHandle<()> {
    tokio::spawn(listen(gate, keys, ui))
}

pub async fn listen(
    gate: InputGate,
    mut keys: UnboundedReceiver<Terminator>,
    ui: mpsc::Sender<UiMessage>,
) {
    while let Some(key) = keys.recv().await {
        let Some(request) = gate.disable() else {
            debug!("{} already closed, ignoring {:?}", gate.id(), key);
            continue;
        };
        let outcome = match key {
            Terminator::Accept(text) => InputOutcome::Accepted(text),
            Terminator::Cancel => InputOutcome::Cancelled,
        };
        let message = UiMessage::InputClosed {
            bar: gate.id().clone(),
            outcome,
            request: Some(request),
        };
        if ui.send(message).is_err() {
            warn!("UI loop gone, stopping {} listener", gate.id());
            return;
        }
    }
    debug!("{} listener stopped", gate.id());
}
