//! Editing documents in `$EDITOR`.
//!
//! The document is written as pretty JSON to a scratch file, the terminal
//! leaves raw mode and the alternate screen while the editor runs, and the
//! file is read back once it exits. An empty or unchanged file means the
//! edit was abandoned.

use std::fs;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::process::Command;

use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{info, warn};
use ratatui::DefaultTerminal;
use serde_json::Value;

use crate::core::AppError;
use crate::store::Document;

/// `$VISUAL`, then `$EDITOR`, then `vi`.
pub fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Open `document` (or an empty object) in the editor and return what was
/// saved, or `None` when nothing changed.
pub fn edit_document(
    terminal: &mut DefaultTerminal,
    document: Option<&Document>,
) -> Result<Option<Document>, AppError> {
    let original = match document {
        Some(document) => serde_json::to_string_pretty(document)
            .map_err(|e| AppError::Editor(io::Error::new(io::ErrorKind::InvalidData, e)))?,
        None => "{\n}".to_string(),
    };
    let path = scratch_path();
    fs::write(&path, &original).map_err(AppError::Editor)?;

    let status = suspended(terminal, || run_editor(&path));
    let result = status.and_then(|()| read_back(&path, &original));
    if let Err(e) = fs::remove_file(&path) {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
    result.map_err(AppError::Editor)
}

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("mongui-{}.json", uuid::Uuid::new_v4()))
}

fn run_editor(path: &Path) -> io::Result<()> {
    let command = editor_command();
    let mut parts = command.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    info!("Launching editor: {} {}", command, path.display());
    let status = Command::new(program).args(parts).arg(path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("{program} exited with {status}")))
    }
}

/// Run `f` with the terminal handed back to the shell.
fn suspended<T>(
    terminal: &mut DefaultTerminal,
    f: impl FnOnce() -> io::Result<T>,
) -> io::Result<T> {
    execute!(
        stdout(),
        PopKeyboardEnhancementFlags,
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    disable_raw_mode()?;

    let result = f();

    enable_raw_mode()?;
    execute!(
        stdout(),
        EnterAlternateScreen,
        EnableBracketedPaste,
        PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    )?;
    terminal.clear()?;
    result
}

/// Parse the edited file. Blank or untouched text yields `None`.
pub fn read_back(path: &Path, original: &str) -> io::Result<Option<Document>> {
    let edited = fs::read_to_string(path)?;
    if edited.trim().is_empty() || edited.trim() == original.trim() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(&edited) {
        Ok(Value::Object(document)) => Ok(Some(document)),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "document must be a JSON object",
        )),
        Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
    }
}
