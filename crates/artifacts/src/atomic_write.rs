//! Write-rename persistence for every artifact.
//!
//! Bytes go to `{path}.tmp`, are flushed with `sync_all()`, and only then
//! renamed over `path`. A stage that fails before this point leaves the
//! previous artifact (or nothing) in place, never a half-written file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ArtifactError, Result};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Atomically replace the contents of `path` with `data`, creating parent
/// directories as needed.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ArtifactError::io(parent, e))?;
        }
    }

    let tmp = tmp_path(path);
    let mut file = File::create(&tmp).map_err(|e| ArtifactError::io(&tmp, e))?;
    file.write_all(data).map_err(|e| ArtifactError::io(&tmp, e))?;
    file.sync_all().map_err(|e| ArtifactError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| ArtifactError::io(path, e))?;

    tracing::debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
