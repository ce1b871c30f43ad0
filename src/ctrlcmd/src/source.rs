//! File system helpers shared by the extractors

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::{Error, Result};

/// Read a file as text, replacing invalid UTF-8 sequences
///
/// Decoding never fails; only a missing or unreadable file is an error.
pub fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Walk files in a directory tree whose name ends with `suffix`
///
/// Entries are visited in file-name order at every level so the traversal is
/// the same on every filesystem. Symlinks to files are visited; symlinked
/// directories are not descended into. Unreadable directory entries are
/// logged and skipped.
pub(crate) fn walk_files_with_suffix<F>(root: &Path, suffix: &str, mut handler: F) -> Result<()>
where
    F: FnMut(&Path),
{
    if !root.is_dir() {
        return Err(Error::NotFound {
            path: root.to_path_buf(),
        });
    }

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        // Symlinked headers count, dangling ones included
        let file_type = entry.file_type();
        let is_file_like =
            file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir());
        if !is_file_like {
            continue;
        }

        let matches = entry
            .file_name()
            .to_str()
            .map(|name| name.ends_with(suffix))
            .unwrap_or(false);

        if matches {
            handler(entry.path());
        }
    }

    Ok(())
}
