//! Shared test doubles: scripted activity sources, fake switches, and
//! an in-memory credential store.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use ampgate::auth::{AuthError, Credential, CredentialStore};
use ampgate::error::AmpgateError;
use ampgate::source::{ActivitySource, SourceRole};
use ampgate::switch::PowerSwitch;

/// An activity source that replays a scripted sequence of poll
/// results, then keeps returning a fallback once the script runs out.
pub struct ScriptedSource {
    name: String,
    role: SourceRole,
    script: Mutex<VecDeque<Result<bool, AmpgateError>>>,
    fallback: bool,
    ready_error: Mutex<Option<AmpgateError>>,
    polls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(name: &str, role: SourceRole) -> Self {
        Self {
            name: name.to_string(),
            role,
            script: Mutex::new(VecDeque::new()),
            fallback: false,
            ready_error: Mutex::new(None),
            polls: AtomicUsize::new(0),
        }
    }

    /// Result returned for every poll past the end of the script.
    pub fn with_fallback(mut self, active: bool) -> Self {
        self.fallback = active;
        self
    }

    /// Make the first `check_ready` call fail with `error`.
    pub fn with_ready_error(self, error: AmpgateError) -> Self {
        *self.ready_error.lock().expect("ready lock") = Some(error);
        self
    }

    /// Append one poll result to the script.
    pub fn enqueue(&self, result: Result<bool, AmpgateError>) {
        self.script.lock().expect("script lock").push_back(result);
    }

    /// How many times the loop has polled this source.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivitySource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> SourceRole {
        self.role
    }

    async fn is_active(&self) -> Result<bool, AmpgateError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().expect("script lock").pop_front() {
            Some(result) => result,
            None => Ok(self.fallback),
        }
    }

    async fn check_ready(&self) -> Result<(), AmpgateError> {
        match self.ready_error.lock().expect("ready lock").take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// A switch that records transitions in a shared command log.
///
/// Like the real plug, commands are skipped (and not logged) when the
/// switch is already in the requested state, and queries can be made
/// to fail to exercise the loop's recovery path.
pub struct FakeSwitch {
    name: String,
    on: AtomicBool,
    commands: Arc<Mutex<Vec<String>>>,
    fail_queries: AtomicUsize,
    fail_commands: AtomicBool,
}

impl FakeSwitch {
    pub fn new(name: &str, commands: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            on: AtomicBool::new(false),
            commands,
            fail_queries: AtomicUsize::new(0),
            fail_commands: AtomicBool::new(false),
        }
    }

    pub fn set_on(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
    }

    pub fn is_on_now(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// Fail the next `count` state queries with a device error.
    pub fn fail_next_queries(&self, count: usize) {
        self.fail_queries.store(count, Ordering::SeqCst);
    }

    /// Make every subsequent command fail with a device error.
    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PowerSwitch for FakeSwitch {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_on(&self) -> Result<bool, AmpgateError> {
        let remaining = self.fail_queries.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_queries.store(remaining - 1, Ordering::SeqCst);
            return Err(AmpgateError::device(&self.name, "query failed"));
        }
        Ok(self.on.load(Ordering::SeqCst))
    }

    async fn turn_on(&self) -> Result<(), AmpgateError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(AmpgateError::device(&self.name, "command failed"));
        }
        if !self.on.swap(true, Ordering::SeqCst) {
            self.commands
                .lock()
                .expect("command log lock")
                .push(format!("on {}", self.name));
        }
        Ok(())
    }

    async fn turn_off(&self) -> Result<(), AmpgateError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(AmpgateError::device(&self.name, "command failed"));
        }
        if self.on.swap(false, Ordering::SeqCst) {
            self.commands
                .lock()
                .expect("command log lock")
                .push(format!("off {}", self.name));
        }
        Ok(())
    }
}

/// Credential store backed by a mutex, for tests that must not touch
/// the filesystem.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
    saves: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, credential: Credential) {
        *self.credential.lock().expect("store lock") = Some(credential);
    }

    pub fn get(&self) -> Option<Credential> {
        self.credential.lock().expect("store lock").clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, AuthError> {
        Ok(self.get())
    }

    fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        *self.credential.lock().expect("store lock") = Some(credential.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.credential.lock().expect("store lock") = None;
        Ok(())
    }
}

/// A credential with plenty of lifetime left.
pub fn fresh_credential(access_token: &str) -> Credential {
    Credential {
        access_token: Some(access_token.to_string()),
        refresh_token: Some("refresh-1".to_string()),
        issued_at: Some(Utc::now()),
        expires_in: Some(3600),
    }
}

/// A credential inside the refresh margin (200s of 3600s remaining).
pub fn stale_credential(access_token: &str) -> Credential {
    Credential {
        access_token: Some(access_token.to_string()),
        refresh_token: Some("refresh-1".to_string()),
        issued_at: Some(Utc::now() - chrono::Duration::seconds(3400)),
        expires_in: Some(3600),
    }
}
