//! JSON file helpers
//!
//! Writes go to a sibling temp file that is synced and then renamed over the
//! target, so a reader sees either the old document or the new one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{PassbookError, PassbookResult};

/// Load a JSON document, or `T::default()` when the file does not exist yet
pub fn load_json_or_default<T, P>(path: P) -> PassbookResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(PassbookError::Io(format!(
                "Failed to open {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| PassbookError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Serialize `data` and atomically replace `path` with it
pub fn save_json_atomic<T, P>(path: P, data: &T) -> PassbookResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PassbookError::Io(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let temp_path = temp_path_for(path);
    let result = write_synced(&temp_path, data).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|e| {
            PassbookError::Io(format!("Failed to replace {}: {}", path.display(), e))
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Delete a file, treating "already gone" as success
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> PassbookResult<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PassbookError::Io(format!(
            "Failed to remove {}: {}",
            path.display(),
            e
        ))),
    }
}

fn write_synced<T: Serialize>(path: &Path, data: &T) -> PassbookResult<()> {
    let file = File::create(path)
        .map_err(|e| PassbookError::Io(format!("Failed to create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

// Same directory as the target so the rename never crosses filesystems.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
