//! Convenience re-exports for common use.

pub use crate::error::{AmpgateError, ErrorCategory, Result};
pub use crate::auth::{Credential, CredentialManager, CredentialStore, FileCredentialStore};
pub use crate::source::{ActivitySource, BraviaTv, SourceRole, SpotifyPlayback};
pub use crate::switch::{KasaPlug, PowerSwitch, SwitchChain};
pub use crate::control::{ActivationLoop, ActivationState, LoopHandle, ShutoffTimer};
pub use crate::config::AmpgateConfig;
