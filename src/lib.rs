//! Activity-driven power gate for an amplified audio rig.
//!
//! Watches activity sources (Spotify playback, a TV) and drives a pair
//! of smart plugs powering a mixer and active speakers. Activity keeps
//! the rig alive; a fixed idle window with no activity powers it down,
//! output stage first.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use ampgate::auth::{CredentialManager, FileCredentialStore};
//! use ampgate::control::{ActivationLoop, ShutoffTimer};
//! use ampgate::source::{BraviaTv, SpotifyPlayback};
//! use ampgate::switch::{KasaPlug, SwitchChain};
//!
//! # async fn example() -> ampgate::error::Result<()> {
//! let store = Arc::new(FileCredentialStore::new_default());
//! let manager = Arc::new(CredentialManager::new(
//!     store,
//!     "client-id",
//!     "client-secret",
//!     "http://127.0.0.1:8888/callback",
//! ));
//!
//! let mixer = Arc::new(KasaPlug::new("mixer", "192.168.1.30"));
//! let speakers = Arc::new(KasaPlug::new("speakers", "192.168.1.31"));
//! let chain = Arc::new(SwitchChain::new(mixer, speakers, Duration::from_secs(2)));
//!
//! let timer = ShutoffTimer::new(chrono::Duration::minutes(20));
//! let handle = ActivationLoop::new(chain, timer)
//!     .with_source(Arc::new(BraviaTv::new("192.168.1.40")))
//!     .with_source(Arc::new(SpotifyPlayback::new(manager)))
//!     .start()
//!     .await?;
//!
//! println!("{}", handle.state().status_message());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod auth;
pub mod error;
pub mod control;
pub mod prelude;
pub mod source;
pub mod switch;
pub mod util;
pub mod cli;
