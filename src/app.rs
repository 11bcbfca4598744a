//! Portal shell: the piece a front end drives.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Portal` owns the session store, the API client, and the route-guard
//! state machine, and keeps them consistent. Session changes (login, logout,
//! a 401 seen by any screen, another tab) arrive as `SessionEvent`s and are
//! folded into the guard by `sync`, which every navigation calls first. That
//! is how a 401 on the boletos screen turns the next `view()` into Login.
//!
//! DESIGN
//! ======
//! Role resolution is tagged with the session generation it started for. Its
//! result is applied only if both the guard and the store are still at that
//! generation when it completes; otherwise it is discarded and the same call
//! goes on to resolve the newer session.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::auth::{AuthMachine, AuthState, ProfileSource, RoleError, RouteOutcome, Screen, resolve_role, route};
use crate::config::PortalConfig;
use crate::net::error::NETWORK_ERROR_MESSAGE;
use crate::net::{ApiClient, ApiError};
use crate::screens::{ActionOutcome, LoginScreen};
use crate::session::{ClearReason, SessionEvent, SessionStore, TokenStorage};

/// Redirect chains in the routing table are at most two hops.
const MAX_REDIRECTS: usize = 4;

/// Lookups attempted in one `resolve_role` call while the session churns.
const MAX_RESOLUTION_ROUNDS: usize = 8;

/// What the front end should display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    /// Session verification pending.
    Loading,
    /// Session could not be verified because the server is unreachable.
    Unavailable(String),
    Screen(Screen),
}

pub struct Portal {
    config: PortalConfig,
    session: Arc<SessionStore>,
    api: ApiClient,
    machine: AuthMachine,
    events: broadcast::Receiver<SessionEvent>,
    /// Highest session generation folded into `machine`.
    seen: u64,
    /// Last requested screen; `None` for an unknown path.
    current: Option<Screen>,
}

impl Portal {
    /// Open a portal over `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: PortalConfig, storage: Arc<dyn TokenStorage>) -> Result<Self, ApiError> {
        Self::with_session(config, Arc::new(SessionStore::new(storage)))
    }

    /// Open a portal over an existing store, e.g. one joined to a
    /// `StorageBus`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_session(config: PortalConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api_url, Arc::clone(&session))?;
        // Subscribe before the snapshot so no change falls between the two.
        let events = session.subscribe();
        let snapshot = session.snapshot();
        let machine = AuthMachine::new(snapshot.token.is_some(), snapshot.generation);
        Ok(Self { config, session, api, machine, events, seen: snapshot.generation, current: Some(Screen::Login) })
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn state(&self) -> &AuthState {
        self.machine.state()
    }

    #[must_use]
    pub fn current(&self) -> Option<Screen> {
        self.current
    }

    /// Resolve the role of a restored session, if any.
    pub async fn start(&mut self) -> &AuthState {
        self.sync();
        if self.machine.pending().is_some() {
            self.resolve_role().await;
        }
        self.machine.state()
    }

    /// Fold pending session events into the guard state.
    pub fn sync(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "session events lagged; resetting from snapshot");
                    self.reset_from_snapshot();
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        let generation = event.generation();
        if generation <= self.seen {
            return;
        }
        self.seen = generation;
        match event {
            SessionEvent::TokenSet { generation } => self.machine.token_appeared(generation),
            SessionEvent::TokenCleared { reason, .. } => {
                tracing::debug!(generation, ?reason, "guard observed session end");
                self.machine.session_cleared();
            }
        }
    }

    fn reset_from_snapshot(&mut self) {
        let snapshot = self.session.snapshot();
        if snapshot.generation <= self.seen {
            return;
        }
        self.seen = snapshot.generation;
        if snapshot.token.is_some() {
            self.machine.token_appeared(snapshot.generation);
        } else {
            self.machine.session_cleared();
        }
    }

    /// Resolve the pending session's role through the API.
    pub async fn resolve_role(&mut self) -> &AuthState {
        let api = self.api.clone();
        self.resolve_role_with(&api).await
    }

    /// Whether a session is waiting for role resolution, e.g. after a login
    /// in another tab. Front ends call `resolve_role` when this is true.
    pub fn needs_resolution(&mut self) -> bool {
        self.sync();
        self.machine.pending().is_some()
    }

    /// Resolve the pending session's role through `source`.
    ///
    /// A no-op unless the guard is `Authenticating`. A rejected token clears
    /// the session (only if it is still the same session); an unreachable
    /// server leaves it `Unverified` unless strict mode is on. When the
    /// session is replaced mid-lookup the result is dropped and the newer
    /// session is resolved in turn.
    pub async fn resolve_role_with(&mut self, source: &dyn ProfileSource) -> &AuthState {
        self.sync();
        let mut rounds = 0;
        while let Some(generation) = self.machine.pending() {
            if rounds == MAX_RESOLUTION_ROUNDS {
                tracing::warn!(generation, rounds, "session keeps changing; leaving role unresolved");
                break;
            }
            rounds += 1;
            self.resolve_generation(source, generation).await;
        }
        self.machine.state()
    }

    async fn resolve_generation(&mut self, source: &dyn ProfileSource, generation: u64) {
        let snapshot = self.session.snapshot();
        let Some(token) = snapshot.token.filter(|_| snapshot.generation == generation) else {
            self.reset_from_snapshot();
            return;
        };

        let result = resolve_role(source, &token).await;

        if self.session.generation() != generation {
            tracing::debug!(generation, "discarding role resolution for replaced session");
            self.sync();
            return;
        }

        match result {
            Ok(role) => {
                tracing::info!(generation, %role, "session authenticated");
                self.machine.resolution_succeeded(generation, role);
            }
            Err(err) => {
                let invalidates = err.invalidates_session(self.config.strict_role_check);
                tracing::warn!(generation, error = %err, invalidates, "role resolution failed");
                let message = match &err {
                    RoleError::Unreachable(_) => NETWORK_ERROR_MESSAGE,
                    RoleError::EmptyToken | RoleError::Rejected(_) => "Sessão inválida",
                };
                if self.machine.resolution_failed(generation, invalidates, message) && invalidates {
                    self.session.clear_if_current(generation, ClearReason::RoleRejected);
                }
            }
        }
        self.sync();
    }

    /// Go to `path`, following guard redirects, and record where we landed.
    pub fn navigate(&mut self, path: &str) -> View {
        self.sync();
        let requested = Screen::from_path(path);
        if requested.is_none() {
            tracing::debug!(path, "unknown route");
        }
        self.land(requested)
    }

    /// Re-evaluate the current screen against the latest session state.
    pub fn view(&mut self) -> View {
        self.sync();
        self.land(self.current)
    }

    fn land(&mut self, mut requested: Option<Screen>) -> View {
        for _ in 0..MAX_REDIRECTS {
            match route(self.machine.state(), requested) {
                RouteOutcome::Render(screen) => {
                    self.current = Some(screen);
                    return View::Screen(screen);
                }
                RouteOutcome::Redirect(screen) => requested = Some(screen),
                RouteOutcome::Loading => {
                    self.current = requested;
                    return View::Loading;
                }
                RouteOutcome::Unavailable(message) => {
                    self.current = requested;
                    return View::Unavailable(message);
                }
            }
        }
        tracing::warn!(?requested, "redirect loop in route table");
        self.current = requested;
        View::Loading
    }

    /// Submit `screen` and, on success, resolve the new session's role.
    pub async fn login(&mut self, screen: &mut LoginScreen) -> ActionOutcome {
        let outcome = screen.submit(&self.api).await;
        if outcome == ActionOutcome::Completed {
            self.resolve_role().await;
        }
        outcome
    }

    /// End the session and return to the login screen.
    pub fn logout(&mut self) -> View {
        self.session.clear_token(ClearReason::Logout);
        self.navigate(Screen::Login.path())
    }

    /// Try role resolution again after the server was unreachable.
    pub async fn retry(&mut self) -> View {
        self.sync();
        if self.machine.retry().is_some() {
            self.resolve_role().await;
        }
        self.view()
    }
}
