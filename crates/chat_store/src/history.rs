use std::path::Path;

use chat_provider::ChatMessage;

use crate::atomic::{read_optional, write_replacing};
use crate::error::StoreError;
use crate::schema::HistoryRecord;

/// Loads prior turns. An unset path, a missing file or an empty file all
/// yield an empty conversation.
pub fn load_conversation(path: Option<&Path>) -> Result<Vec<ChatMessage>, StoreError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let Some(content) = read_optional(path)? else {
        tracing::debug!(path = %path.display(), "history file absent; starting empty");
        return Ok(Vec::new());
    };

    let records = serde_json::from_str::<Vec<HistoryRecord>>(&content)
        .map_err(|source| StoreError::json_parse(path, source))?;
    Ok(records.into_iter().map(HistoryRecord::into_message).collect())
}

/// Replaces the history file with `conversation`. Last writer wins.
pub fn save_conversation(path: &Path, conversation: &[ChatMessage]) -> Result<(), StoreError> {
    let records = conversation
        .iter()
        .enumerate()
        .map(|(index, message)| {
            HistoryRecord::from_message(message).ok_or_else(|| {
                StoreError::SystemMessageInHistory {
                    path: path.to_path_buf(),
                    index,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut bytes = serde_json::to_vec(&records)
        .map_err(|source| StoreError::json_serialize(path, source))?;
    bytes.push(b'\n');
    write_replacing(path, &bytes, false)?;
    tracing::info!(path = %path.display(), messages = records.len(), "saved conversation history");
    Ok(())
}
