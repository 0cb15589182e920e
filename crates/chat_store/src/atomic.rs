use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::StoreError;
use crate::paths::temp_sibling;

/// Reads `path`, mapping a missing or whitespace-only file to `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(None),
        Ok(content) => Ok(Some(content)),
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::io("reading", path, source)),
    }
}

/// Replaces `path` with `bytes` via a synced sibling temp file and a rename,
/// so readers observe either the old contents or the new ones.
pub(crate) fn write_replacing(path: &Path, bytes: &[u8], private: bool) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|source| StoreError::io("creating parent directory", parent, source))?;
    }

    let temp_path = temp_sibling(path);
    let result = write_temp(&temp_path, bytes, private).and_then(|()| {
        fs::rename(&temp_path, path)
            .map_err(|source| StoreError::io("replacing file", path, source))
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp(temp_path: &Path, bytes: &[u8], private: bool) -> Result<(), StoreError> {
    let mut file = File::create(temp_path)
        .map_err(|source| StoreError::io("creating temp file", temp_path, source))?;
    if private {
        restrict_permissions(&file, temp_path)?;
    }
    file.write_all(bytes)
        .map_err(|source| StoreError::io("writing temp file", temp_path, source))?;
    file.sync_all()
        .map_err(|source| StoreError::io("syncing temp file", temp_path, source))
}

#[cfg(unix)]
fn restrict_permissions(file: &File, path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o600))
        .map_err(|source| StoreError::io("restricting permissions", path, source))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File, _path: &Path) -> Result<(), StoreError> {
    Ok(())
}
