mod atomic;
mod credentials;
mod error;
mod history;
mod paths;
mod schema;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::StoreError;
pub use history::{load_conversation, save_conversation};
pub use paths::{default_credential_path, CREDENTIAL_DIR, CREDENTIAL_FILE_NAME};
pub use schema::{CredentialRecord, HistoryRecord, HistoryRole};
