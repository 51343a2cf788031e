//! Panic boundaries.
//!
//! [`isolate`] runs a closure and turns a panic into an `Err` carrying the
//! panic message. The panic hook installed by [`install_panic_hook`] only
//! lets a panic through to the previous hook (which restores the terminal
//! before the process dies) when it happens on the UI thread outside such a
//! boundary. Everything else is logged: a panicking tokio task is caught by
//! the runtime and must not tear down the terminal under a live UI loop.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe, catch_unwind};
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use log::error;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// The thread that installed the hook.
static UI_THREAD: OnceLock<ThreadId> = OnceLock::new();

/// Decrements the boundary depth even when the closure unwinds.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        DEPTH.with(|d| d.set(d.get() + 1));
        Self
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Run `f`, catching any panic it raises.
pub fn isolate<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    let _depth = DepthGuard::enter();
    catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

/// Whether the current thread is inside an [`isolate`] call.
pub fn is_isolated() -> bool {
    DEPTH.with(|d| d.get() > 0)
}

/// Whether a panic on the current thread ends the process. With no UI
/// thread recorded every uncaught panic does.
fn is_fatal(ui_thread: Option<&ThreadId>) -> bool {
    !is_isolated() && ui_thread.is_none_or(|ui| *ui == thread::current().id())
}

/// Chain a hook in front of the current one. The calling thread becomes the
/// UI thread.
pub fn install_panic_hook() {
    let _ = UI_THREAD.set(thread::current().id());
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if is_fatal(UI_THREAD.get()) {
            error!("panic: {info}");
            previous(info);
        } else {
            error!("panic (contained): {info}");
        }
    }));
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolate_passes_values_through() {
        assert_eq!(isolate(|| 41 + 1), Ok(42));
    }

    #[test]
    fn test_isolate_catches_panics_with_message() {
        let result: Result<(), String> = isolate(|| panic!("boom {}", 7));
        assert_eq!(result, Err("boom 7".to_string()));
        assert!(!is_isolated());
    }

    #[test]
    fn test_only_uncaught_ui_thread_panics_are_fatal() {
        let ui = thread::current().id();
        assert!(is_fatal(Some(&ui)));
        assert!(is_fatal(None));
        assert_eq!(isolate(|| is_fatal(Some(&ui))), Ok(false));

        let on_worker = thread::spawn(move || is_fatal(Some(&ui))).join().unwrap();
        assert!(!on_worker);
    }

    #[test]
    fn test_depth_tracks_nesting() {
        assert!(!is_isolated());
        let inner = isolate(|| isolate(is_isolated));
        assert_eq!(inner, Ok(Ok(true)));
        assert!(!is_isolated());
    }
}
