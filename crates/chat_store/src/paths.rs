use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Directory under the user's home that holds the credential file.
pub const CREDENTIAL_DIR: &str = ".config";
pub const CREDENTIAL_FILE_NAME: &str = ".chatsh";

/// `~/.config/.chatsh`
pub fn default_credential_path() -> Result<PathBuf, StoreError> {
    let home = dirs::home_dir().ok_or(StoreError::HomeDirUnavailable)?;
    Ok(credential_path_under(&home))
}

#[must_use]
pub fn credential_path_under(home: &Path) -> PathBuf {
    home.join(CREDENTIAL_DIR).join(CREDENTIAL_FILE_NAME)
}

/// Sibling path used for write-then-rename replacement.
#[must_use]
pub(crate) fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chatsh".to_string());
    path.with_file_name(format!("{file_name}.{}.tmp", std::process::id()))
}
