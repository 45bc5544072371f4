use chrono::{DateTime, Local, Utc};
use serde::Serialize;

/// Point-in-time snapshot of what the monitor believes.
///
/// Published on a watch channel after every tick; `Default` is the
/// not-running state a subscriber sees before the loop starts and
/// after it shuts down.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ActivationState {
    /// Whether the monitoring loop is running.
    pub running: bool,
    /// Whether the rig is powered, from a fresh output-stage query.
    pub powered: bool,
    /// Name of the active source observed this tick, if any.
    pub active_source: Option<String>,
    /// When the rig will power off absent further activity.
    pub shutoff_deadline: Option<DateTime<Utc>>,
}

impl ActivationState {
    /// Human-readable status line.
    pub fn status_message(&self) -> String {
        if !self.running {
            return "Monitoring is not running.".to_string();
        }
        if !self.powered {
            return "Speakers are OFF.".to_string();
        }
        if let Some(source) = &self.active_source {
            return format!("Speakers are ON and being used by {source}.");
        }
        if let Some(deadline) = self.shutoff_deadline {
            return format!(
                "Speakers are ON and will turn off at {}.",
                deadline.with_timezone(&Local).format("%H:%M:%S")
            );
        }
        "Speakers are ON.".to_string()
    }
}
