//! OAuth credential management and storage.

pub mod credential;
pub mod error;
pub mod manager;
pub mod store;

pub use credential::{Credential, EXPIRY_MARGIN_SECS};
pub use error::AuthError;
pub use manager::CredentialManager;
pub use store::{default_credential_path, CredentialStore, FileCredentialStore};
