//! Idempotent header writes.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::SyscfgError;

/// Directory under the target root that holds generated includes.
pub const INCLUDE_SUBDIR: &str = "include/syscfg";

/// Name of the generated header.
pub const HEADER_FILENAME: &str = "syscfg.h";

/// Result of a header write attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub path: PathBuf,

    /// False when the existing file already held identical bytes
    pub written: bool,

    /// SHA-256 of the header contents
    pub sha256: String,
}

/// `<target_root>/include/syscfg/syscfg.h`
pub fn header_path(target_root: &Path) -> PathBuf {
    target_root.join(INCLUDE_SUBDIR).join(HEADER_FILENAME)
}

fn digest(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    hex::encode(hasher.finalize())
}

/// Run `write` against `temp_path`, removing whatever it left behind if it
/// fails.
fn stage(temp_path: &Path, write: impl FnOnce(&Path) -> io::Result<()>) -> io::Result<()> {
    write(temp_path).map_err(|e| {
        let _ = fs::remove_file(temp_path);
        e
    })
}

/// Write `contents` to `path` unless the file already holds exactly these
/// bytes. Missing parent directories are created. The write goes through a
/// temporary sibling followed by a rename, so readers never see a partial
/// header.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> Result<WriteOutcome, SyscfgError> {
    let sha256 = digest(contents);

    match fs::read(path) {
        Ok(existing) if existing == contents => {
            return Ok(WriteOutcome {
                path: path.to_path_buf(),
                written: false,
                sha256,
            });
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(SyscfgError::io(path, e)),
    }

    let parent = path.parent().ok_or_else(|| {
        SyscfgError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
        )
    })?;
    fs::create_dir_all(parent).map_err(|e| SyscfgError::io(parent, e))?;

    let temp_path = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
    stage(&temp_path, |p| fs::write(p, contents)).map_err(|e| SyscfgError::io(&temp_path, e))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(SyscfgError::io(path, e));
    }

    Ok(WriteOutcome {
        path: path.to_path_buf(),
        written: true,
        sha256,
    })
}
