//! Query history.
//!
//! One entry per line in `history.txt` under the config directory, oldest
//! first. Recording an entry that already exists moves it to the end, and
//! the oldest entries are dropped once the file holds more than
//! `history_limit` lines.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

pub struct History {
    path: PathBuf,
    limit: usize,
    entries: Vec<String>,
}

impl History {
    /// Read the history file. A missing or unreadable file starts empty.
    pub fn load(path: impl Into<PathBuf>, limit: usize) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => contents
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Failed to read history {}: {}", path.display(), e);
                Vec::new()
            }
        };
        let mut history = Self {
            path,
            limit,
            entries,
        };
        history.enforce_limit();
        history
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `text` and persist. Blank text is ignored.
    pub fn record(&mut self, text: &str) -> io::Result<()> {
        let text = text.trim();
        if text.is_empty() || text.contains('\n') {
            return Ok(());
        }
        self.entries.retain(|entry| entry != text);
        self.entries.push(text.to_string());
        self.enforce_limit();
        debug!("Recorded history entry ({} total)", self.entries.len());
        self.save()
    }

    pub fn clear(&mut self) -> io::Result<()> {
        self.entries.clear();
        self.save()
    }

    fn enforce_limit(&mut self) {
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }

    fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut contents = self.entries.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = History::load(dir.path().join("history.txt"), 5);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn test_record_deduplicates_and_moves_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let mut history = History::load(&path, 5);
        history.record(r#"{"a": 1}"#).unwrap();
        history.record(r#"{"b": 2}"#).unwrap();
        history.record(r#"  {"a": 1} "#).unwrap();
        history.record("   ").unwrap();

        assert_eq!(history.entries(), [r#"{"b": 2}"#, r#"{"a": 1}"#]);
        let reloaded = History::load(&path, 5);
        assert_eq!(reloaded.entries(), history.entries());
    }

    #[test]
    fn test_oldest_entries_are_dropped_beyond_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let mut history = History::load(&path, 2);
        for query in ["one", "two", "three"] {
            history.record(query).unwrap();
        }
        assert_eq!(history.entries(), ["two", "three"]);
    }

    #[test]
    fn test_oversized_file_is_trimmed_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        fs::write(&path, "a\nb\n\nc\nd\n").unwrap();
        let history = History::load(&path, 3);
        assert_eq!(history.entries(), ["b", "c", "d"]);
    }

    #[test]
    fn test_clear_empties_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let mut history = History::load(&path, 3);
        history.record("x").unwrap();
        history.clear().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
