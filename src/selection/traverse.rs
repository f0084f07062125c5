//! Turning dropped paths into selection entries

use super::FileCandidate;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Something the user dropped or picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(FileCandidate),
    Directory(PathBuf),
}

impl Entry {
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Ok(Entry::Directory(path.to_path_buf()))
        } else {
            FileCandidate::from_path(path).map(Entry::File)
        }
    }
}

/// Every file below `dir`, paired with its parent chain relative to `dir`
/// (`""` for files directly inside it).
///
/// Symlinks are not followed, so the walk always terminates. Unreadable
/// entries are logged and skipped.
pub fn expand(dir: &Path) -> Vec<(String, FileCandidate)> {
    WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Entrada ignorada em {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let prefix = relative_prefix(dir, e.path());
            match FileCandidate::from_path(e.path()) {
                Ok(file) => Some((prefix, file)),
                Err(err) => {
                    log::warn!("Arquivo ignorado {}: {}", e.path().display(), err);
                    None
                }
            }
        })
        .collect()
}

fn relative_prefix(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}
