//! Messages posted to the UI loop from background tasks.
//!
//! Anything that happens off the UI thread (store calls, the input-bar
//! listener) reports back through a `std::sync::mpsc` channel of
//! [`UiMessage`]s. The loop drains the channel between input events and
//! applies each message in order.

use crate::core::{ComponentId, DataChange, PageRequest};
use crate::store::StoreError;

/// How an input bar was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Enter: the text goes to whoever opened the bar.
    Accepted(String),
    /// Esc: the bar closes and nothing else happens.
    Cancelled,
}

#[derive(Debug)]
pub enum UiMessage {
    /// A store call succeeded. Broadcast as `DataChanged`.
    Data(DataChange),
    /// A store call failed. Shown by the component that asked for it.
    Failed {
        requester: ComponentId,
        error: StoreError,
    },
    /// An input bar's listener saw a terminating key and disabled the bar.
    /// `request` is the page transition the disable produced, if any.
    InputClosed {
        bar: ComponentId,
        outcome: InputOutcome,
        request: Option<PageRequest>,
    },
}
