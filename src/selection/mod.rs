//! File selection for upload
//!
//! [`SelectionState`] owns everything the upload form needs to know about
//! the chosen files: the retained entries, their duplicate keys, whether a
//! duplicate was seen, and the state of the action button. It has no
//! knowledge of where files come from; callers feed it [`Entry`] values
//! built from command-line paths, a file dialog, or tests.
//!
//! # Rules
//!
//! - Only names ending in `.csv` (any case) are retained. Others are
//!   dropped without error.
//! - A file is identified by `name_size_modified`. Re-adding a known file
//!   raises the duplicate indicator and changes nothing else.
//! - Directories are expanded only when `recursive` is set, otherwise they
//!   are skipped.
//! - The key set and the entry list always have the same members.

pub mod submit;
pub mod traverse;

pub use submit::{HttpUploader, Uploader, FIELD_NAME};
pub use traverse::Entry;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_ACTION_LABEL: &str = "Analisar Arquivos";
pub const BUSY_ACTION_LABEL: &str = "Analisando...";

/// `.csv` suffix, any case.
pub fn is_csv_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".csv")
}

/// A file offered for selection, before any rule is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub source: PathBuf,
    pub name: String,
    pub size: u64,
    /// Last modification, milliseconds since the Unix epoch
    pub modified: i64,
}

impl FileCandidate {
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let modified = metadata
            .modified()
            .map(|t| DateTime::<Utc>::from(t).timestamp_millis())
            .unwrap_or(0);

        Ok(Self {
            source: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size: metadata.len(),
            modified,
        })
    }

    pub fn is_csv(&self) -> bool {
        is_csv_name(&self.name)
    }

    pub fn duplicate_key(&self) -> String {
        format!("{}_{}_{}", self.name, self.size, self.modified)
    }
}

/// A retained file and the path it will be uploaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub key: String,
    /// Parent directories joined with `/`, then the file name
    pub path: String,
    pub file: FileCandidate,
}

/// One visible line of the file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub key: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionControl {
    pub label: String,
    pub enabled: bool,
}

impl Default for ActionControl {
    fn default() -> Self {
        Self {
            label: DEFAULT_ACTION_LABEL.to_string(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    entries: Vec<SelectedFile>,
    keys: HashSet<String>,
    duplicate_warning: bool,
    action: ActionControl,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the selection rules to a batch. Returns how many files were
    /// retained.
    pub fn accept<I>(&mut self, entries: I, recursive: bool) -> usize
    where
        I: IntoIterator<Item = Entry>,
    {
        let before = self.entries.len();

        for entry in entries {
            match entry {
                Entry::File(file) => self.accept_file(file, ""),
                Entry::Directory(dir) if recursive => {
                    for (prefix, file) in traverse::expand(&dir) {
                        self.accept_file(file, &prefix);
                    }
                }
                Entry::Directory(dir) => {
                    log::debug!("Ignorando diretório {} (recursão desativada)", dir.display());
                }
            }
        }

        if !self.entries.is_empty() {
            self.refresh_count();
        }
        self.entries.len() - before
    }

    fn accept_file(&mut self, file: FileCandidate, prefix: &str) {
        if !file.is_csv() {
            return;
        }

        let key = file.duplicate_key();
        if self.keys.contains(&key) {
            self.duplicate_warning = true;
            log::info!("Arquivo duplicado ignorado: {}", file.name);
            return;
        }

        let path = if prefix.is_empty() {
            file.name.clone()
        } else {
            format!("{}/{}", prefix, file.name)
        };

        self.keys.insert(key.clone());
        self.entries.push(SelectedFile { key, path, file });
    }

    /// Drop the entry with this key. Returns whether one was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        if !self.keys.remove(key) {
            return false;
        }
        self.entries.retain(|e| e.key != key);
        self.refresh_count();
        true
    }

    /// Back to the freshly-loaded state.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
        self.duplicate_warning = false;
        self.action = ActionControl::default();
    }

    fn refresh_count(&mut self) {
        self.action.label = format!("{} ({})", DEFAULT_ACTION_LABEL, self.entries.len());
    }

    pub(crate) fn begin_submit(&mut self) {
        self.action.enabled = false;
        self.action.label = BUSY_ACTION_LABEL.to_string();
    }

    pub(crate) fn submit_failed(&mut self) {
        self.action = ActionControl::default();
    }

    pub fn entries(&self) -> &[SelectedFile] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn rows(&self) -> Vec<ListRow> {
        self.entries
            .iter()
            .map(|e| ListRow {
                key: e.key.clone(),
                path: e.path.clone(),
            })
            .collect()
    }

    pub fn list_visible(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn duplicate_warning(&self) -> bool {
        self.duplicate_warning
    }

    pub fn action(&self) -> &ActionControl {
        &self.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, size: u64, modified: i64) -> FileCandidate {
        FileCandidate {
            source: PathBuf::from(format!("/tmp/{}", name)),
            name: name.to_string(),
            size,
            modified,
        }
    }

    fn files(list: &[FileCandidate]) -> Vec<Entry> {
        list.iter().cloned().map(Entry::File).collect()
    }

    // ==========================================================================
    // CSV FILTER
    // ==========================================================================

    #[test]
    fn test_only_csv_is_retained() {
        let mut state = SelectionState::new();
        let added = state.accept(
            files(&[
                candidate("jan.csv", 10, 1),
                candidate("FEV.CSV", 10, 1),
                candidate("notes.txt", 10, 1),
                candidate("csv", 10, 1),
                candidate("report.csv.bak", 10, 1),
            ]),
            false,
        );
        assert_eq!(added, 2);
        let paths: Vec<String> = state.rows().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["jan.csv", "FEV.CSV"]);
        assert!(!state.duplicate_warning());
    }

    // ==========================================================================
    // DUPLICATES
    // ==========================================================================

    #[test]
    fn test_duplicate_keeps_first_and_warns() {
        let mut state = SelectionState::new();
        state.accept(files(&[candidate("a.csv", 100, 42)]), false);
        let added = state.accept(files(&[candidate("a.csv", 100, 42)]), false);

        assert_eq!(added, 0);
        assert_eq!(state.len(), 1);
        assert!(state.duplicate_warning());
    }

    #[test]
    fn test_same_name_different_size_is_not_duplicate() {
        let mut state = SelectionState::new();
        state.accept(
            files(&[candidate("a.csv", 100, 42), candidate("a.csv", 101, 42)]),
            false,
        );
        assert_eq!(state.len(), 2);
        assert!(!state.duplicate_warning());
    }

    #[test]
    fn test_duplicate_key_format() {
        assert_eq!(candidate("a.csv", 100, 42).duplicate_key(), "a.csv_100_42");
    }

    // ==========================================================================
    // REMOVE / CLEAR
    // ==========================================================================

    #[test]
    fn test_remove_one() {
        let mut state = SelectionState::new();
        state.accept(
            files(&[candidate("a.csv", 1, 1), candidate("b.csv", 2, 2)]),
            false,
        );

        assert!(state.remove("a.csv_1_1"));
        assert_eq!(state.len(), 1);
        assert_eq!(state.rows().len(), state.len());
        assert!(!state.contains("a.csv_1_1"));
        assert_eq!(state.action().label, "Analisar Arquivos (1)");
        assert!(state.list_visible());
    }

    #[test]
    fn test_remove_last_hides_list() {
        let mut state = SelectionState::new();
        state.accept(files(&[candidate("a.csv", 1, 1)]), false);
        state.remove("a.csv_1_1");
        assert!(state.is_empty());
        assert!(!state.list_visible());
    }

    #[test]
    fn test_remove_unknown_key() {
        let mut state = SelectionState::new();
        state.accept(files(&[candidate("a.csv", 1, 1)]), false);
        assert!(!state.remove("nope"));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_removed_file_can_be_added_again() {
        let mut state = SelectionState::new();
        state.accept(files(&[candidate("a.csv", 1, 1)]), false);
        state.remove("a.csv_1_1");
        assert_eq!(state.accept(files(&[candidate("a.csv", 1, 1)]), false), 1);
        assert!(!state.duplicate_warning());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut state = SelectionState::new();
        state.accept(
            files(&[candidate("a.csv", 1, 1), candidate("a.csv", 1, 1)]),
            false,
        );
        assert!(state.duplicate_warning());

        state.clear();
        assert_eq!(state.len(), 0);
        assert!(state.rows().is_empty());
        assert!(!state.list_visible());
        assert!(!state.duplicate_warning());
        assert_eq!(state.action().label, DEFAULT_ACTION_LABEL);
    }

    // ==========================================================================
    // ACTION LABEL
    // ==========================================================================

    #[test]
    fn test_label_counts_retained_files() {
        let mut state = SelectionState::new();
        assert_eq!(state.action().label, "Analisar Arquivos");
        state.accept(
            files(&[candidate("a.csv", 1, 1), candidate("b.csv", 1, 1)]),
            false,
        );
        assert_eq!(state.action().label, "Analisar Arquivos (2)");
        assert!(state.action().enabled);
    }
}
