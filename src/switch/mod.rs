//! Power switches and the ordered amplification chain.

pub mod kasa;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AmpgateError;

pub use kasa::KasaPlug;

/// A mains power switch.
#[async_trait]
pub trait PowerSwitch: Send + Sync {
    /// Switch name used in logs (e.g., "speakers").
    fn name(&self) -> &str;

    /// Query the device for its current state. Never served from a
    /// cache, so switching done outside this process shows up here.
    async fn is_on(&self) -> Result<bool, AmpgateError>;

    /// Switch on, no-op when already on.
    async fn turn_on(&self) -> Result<(), AmpgateError>;

    /// Switch off, no-op when already off.
    async fn turn_off(&self) -> Result<(), AmpgateError>;
}

/// The amplification chain: a mixer feeding powered speakers.
///
/// Power-on brings the mixer up first and lets it settle before the
/// speakers; power-off is the reverse. The speakers are therefore never
/// live while the mixer rides through a power transient. One lock
/// serializes every sequence, so the monitoring loop and a manual
/// override cannot interleave half-finished sequences.
pub struct SwitchChain {
    mixer: Arc<dyn PowerSwitch>,
    speakers: Arc<dyn PowerSwitch>,
    settle: Duration,
    lock: Mutex<()>,
}

impl SwitchChain {
    pub fn new(
        mixer: Arc<dyn PowerSwitch>,
        speakers: Arc<dyn PowerSwitch>,
        settle: Duration,
    ) -> Self {
        Self {
            mixer,
            speakers,
            settle,
            lock: Mutex::new(()),
        }
    }

    /// Whether the rig counts as powered. The output stage decides;
    /// the mixer only matters for sequencing.
    pub async fn is_on(&self) -> Result<bool, AmpgateError> {
        let _guard = self.lock.lock().await;
        self.speakers.is_on().await
    }

    /// Mixer on, settle, speakers on.
    pub async fn power_on(&self) -> Result<(), AmpgateError> {
        let _guard = self.lock.lock().await;
        self.power_on_locked().await
    }

    /// Speakers off, settle, mixer off.
    pub async fn power_off(&self) -> Result<(), AmpgateError> {
        let _guard = self.lock.lock().await;
        self.power_off_locked().await
    }

    /// Flip the chain based on a fresh output-stage query.
    ///
    /// Returns the state the chain was driven to. Query and sequence
    /// run under the same lock acquisition.
    pub async fn toggle(&self) -> Result<bool, AmpgateError> {
        let _guard = self.lock.lock().await;
        if self.speakers.is_on().await? {
            self.power_off_locked().await?;
            Ok(false)
        } else {
            self.power_on_locked().await?;
            Ok(true)
        }
    }

    async fn power_on_locked(&self) -> Result<(), AmpgateError> {
        tracing::info!(
            mixer = self.mixer.name(),
            speakers = self.speakers.name(),
            "Powering chain on"
        );
        self.mixer.turn_on().await?;
        tokio::time::sleep(self.settle).await;
        self.speakers.turn_on().await?;
        Ok(())
    }

    async fn power_off_locked(&self) -> Result<(), AmpgateError> {
        tracing::info!(
            mixer = self.mixer.name(),
            speakers = self.speakers.name(),
            "Powering chain off"
        );
        self.speakers.turn_off().await?;
        tokio::time::sleep(self.settle).await;
        self.mixer.turn_off().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    struct FakeSwitch {
        name: &'static str,
        on: AtomicBool,
        log: Arc<StdMutex<Vec<String>>>,
    }

    impl FakeSwitch {
        fn new(name: &'static str, on: bool, log: Arc<StdMutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                on: AtomicBool::new(on),
                log,
            })
        }
    }

    #[async_trait]
    impl PowerSwitch for FakeSwitch {
        fn name(&self) -> &str {
            self.name
        }

        async fn is_on(&self) -> Result<bool, AmpgateError> {
            Ok(self.on.load(Ordering::SeqCst))
        }

        async fn turn_on(&self) -> Result<(), AmpgateError> {
            self.on.store(true, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("on {}", self.name));
            Ok(())
        }

        async fn turn_off(&self) -> Result<(), AmpgateError> {
            self.on.store(false, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("off {}", self.name));
            Ok(())
        }
    }

    fn chain(mixer_on: bool, speakers_on: bool) -> (SwitchChain, Arc<StdMutex<Vec<String>>>) {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mixer = FakeSwitch::new("mixer", mixer_on, log.clone());
        let speakers = FakeSwitch::new("speakers", speakers_on, log.clone());
        (
            SwitchChain::new(mixer, speakers, Duration::ZERO),
            log,
        )
    }

    #[tokio::test]
    async fn power_on_runs_mixer_before_speakers() {
        let (chain, log) = chain(false, false);
        chain.power_on().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["on mixer", "on speakers"]);
        assert!(chain.is_on().await.unwrap());
    }

    #[tokio::test]
    async fn power_off_runs_speakers_before_mixer() {
        let (chain, log) = chain(true, true);
        chain.power_off().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["off speakers", "off mixer"]);
        assert!(!chain.is_on().await.unwrap());
    }

    #[tokio::test]
    async fn toggle_from_off_powers_on() {
        let (chain, log) = chain(false, false);
        let now_on = chain.toggle().await.unwrap();
        assert!(now_on);
        assert_eq!(*log.lock().unwrap(), vec!["on mixer", "on speakers"]);
    }

    #[tokio::test]
    async fn toggle_from_on_powers_off() {
        let (chain, log) = chain(true, true);
        let now_on = chain.toggle().await.unwrap();
        assert!(!now_on);
        assert_eq!(*log.lock().unwrap(), vec!["off speakers", "off mixer"]);
    }

    #[tokio::test]
    async fn chain_state_tracks_output_stage_only() {
        let (chain, _log) = chain(true, false);
        assert!(!chain.is_on().await.unwrap());
    }
}
