//! Activity sources polled by the monitoring loop.

pub mod bravia;
pub mod spotify;

use async_trait::async_trait;

use crate::error::AmpgateError;

pub use bravia::BraviaTv;
pub use spotify::SpotifyPlayback;

/// How a source's activity is allowed to affect power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// Activity powers the rig on and keeps it on.
    Trigger,
    /// Activity only keeps an already-powered rig on.
    KeepAlive,
}

/// Core trait implemented by all activity sources.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Source name used in logs and status output (e.g., "Spotify").
    fn name(&self) -> &str;

    /// Whether activity here may power the rig on, or only hold it on.
    fn role(&self) -> SourceRole;

    /// Poll the source for current activity.
    async fn is_active(&self) -> Result<bool, AmpgateError>;

    /// Verify the source can be polled at all. Runs once before
    /// monitoring starts; a failure here prevents startup.
    async fn check_ready(&self) -> Result<(), AmpgateError> {
        Ok(())
    }
}
