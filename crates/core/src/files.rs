//! Finding printable files under a directory tree.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Whether `path` has one of `extensions` (with or without the leading dot,
/// compared case-insensitively).
pub fn has_printable_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Recursively collect files under `root` whose extension is allowed.
///
/// Results are sorted so runs are repeatable. Paths are relative to `root`
/// when `root` is `.`, otherwise joined onto it. Symlinked directories are
/// not followed; unreadable subdirectories are skipped with a warning.
pub fn find_printable(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    let mut is_root = true;

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if !is_root => {
                warn!("Skipping unreadable directory {:?}: {}", dir, e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        is_root = false;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file()
                || (file_type.is_symlink() && path.is_file())
            {
                if has_printable_extension(&path, extensions) {
                    found.push(path);
                }
            }
        }
    }

    if root == Path::new(".") {
        for path in &mut found {
            if let Ok(stripped) = path.strip_prefix(".") {
                *path = stripped.to_path_buf();
            }
        }
    }

    found.sort();
    debug!("Found {} printable files under {:?}", found.len(), root);
    Ok(found)
}
