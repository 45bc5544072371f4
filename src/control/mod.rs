//! Idle timing, state snapshots, and the monitoring loop.

pub mod runner;
pub mod state;
pub mod timer;

pub use runner::{ActivationLoop, LoopHandle, DEFAULT_RECOVERY_INTERVAL, DEFAULT_TICK_INTERVAL};
pub use state::ActivationState;
pub use timer::ShutoffTimer;
