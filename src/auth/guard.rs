//! Route guard: auth state machine plus the per-route access table.
//!
//! DESIGN
//! ======
//! `route` is a pure function of (state, requested screen). `AuthMachine`
//! owns the state and only accepts a role-resolution result that belongs to
//! the generation currently being authenticated; anything else is stale and
//! dropped.
//!
//! ```text
//! Anonymous --token--> Authenticating(g) --role--> Authenticated(role, g)
//!                          |        \--unreachable--> Unverified(g) --retry--> Authenticating(g)
//!                          \--rejected--> Invalid --cleared--> Anonymous
//! Authenticated/Unverified --cleared--> Anonymous
//! ```

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::role::Role;

/// Screens a route can render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Register,
    /// Default authenticated screen.
    Boletos,
    /// Admin-only authorized-document management.
    AdminDocuments,
}

impl Screen {
    /// Map a path to its screen. Unknown paths yield `None`.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default().trim();
        let path = path.trim_end_matches('/');
        match path {
            "" | "/login" => Some(Self::Login),
            "/register" | "/cadastro" => Some(Self::Register),
            "/boletos" => Some(Self::Boletos),
            "/admin" | "/admin/documentos" => Some(Self::AdminDocuments),
            _ => None,
        }
    }

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Boletos => "/boletos",
            Self::AdminDocuments => "/admin/documentos",
        }
    }

    /// Reachable without a session.
    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

/// Authentication state of the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    /// Role lookup in flight for session `generation`.
    Authenticating { generation: u64 },
    Authenticated { role: Role, generation: u64 },
    /// Token refused; collapses to `Anonymous` once the session is cleared.
    Invalid,
    /// Role lookup could not reach the server; the token is kept.
    Unverified { generation: u64, message: String },
}

/// Guard decision for one requested screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Render(Screen),
    Redirect(Screen),
    /// Authentication pending; show a neutral indicator.
    Loading,
    /// Server unreachable while verifying the session.
    Unavailable(String),
}

/// Decide what to show for `requested` (`None` for an unknown path).
#[must_use]
pub fn route(state: &AuthState, requested: Option<Screen>) -> RouteOutcome {
    match state {
        AuthState::Authenticating { .. } => RouteOutcome::Loading,
        AuthState::Anonymous | AuthState::Invalid => match requested {
            Some(screen) if screen.is_public() => RouteOutcome::Render(screen),
            _ => RouteOutcome::Redirect(Screen::Login),
        },
        AuthState::Unverified { message, .. } => match requested {
            Some(screen) if screen.is_public() => RouteOutcome::Render(screen),
            _ => RouteOutcome::Unavailable(message.clone()),
        },
        AuthState::Authenticated { role, .. } => match requested {
            Some(Screen::Boletos) => RouteOutcome::Render(Screen::Boletos),
            Some(Screen::AdminDocuments) if role.is_admin() => RouteOutcome::Render(Screen::AdminDocuments),
            _ => RouteOutcome::Redirect(Screen::Boletos),
        },
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

#[derive(Clone, Debug)]
pub struct AuthMachine {
    state: AuthState,
}

impl AuthMachine {
    /// Initial state: `Authenticating` when storage already holds a token.
    #[must_use]
    pub fn new(token_present: bool, generation: u64) -> Self {
        let state = if token_present { AuthState::Authenticating { generation } } else { AuthState::Anonymous };
        Self { state }
    }

    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Generation awaiting role resolution, if any.
    #[must_use]
    pub fn pending(&self) -> Option<u64> {
        match self.state {
            AuthState::Authenticating { generation } => Some(generation),
            _ => None,
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        match &self.state {
            AuthState::Authenticated { role, .. } => Some(role),
            _ => None,
        }
    }

    /// A (new) token is in the store.
    pub fn token_appeared(&mut self, generation: u64) {
        self.state = AuthState::Authenticating { generation };
    }

    /// The store no longer holds a token.
    pub fn session_cleared(&mut self) {
        self.state = AuthState::Anonymous;
    }

    /// Apply a successful lookup. Returns `false` if it was stale.
    pub fn resolution_succeeded(&mut self, generation: u64, role: Role) -> bool {
        if self.pending() != Some(generation) {
            return false;
        }
        self.state = AuthState::Authenticated { role, generation };
        true
    }

    /// Apply a failed lookup. Returns `false` if it was stale.
    pub fn resolution_failed(&mut self, generation: u64, invalidates: bool, message: &str) -> bool {
        if self.pending() != Some(generation) {
            return false;
        }
        self.state = if invalidates {
            AuthState::Invalid
        } else {
            AuthState::Unverified { generation, message: message.to_owned() }
        };
        true
    }

    /// Re-arm resolution after an unreachable server. Returns the generation
    /// to resolve.
    pub fn retry(&mut self) -> Option<u64> {
        let AuthState::Unverified { generation, .. } = self.state else {
            return None;
        };
        self.state = AuthState::Authenticating { generation };
        Some(generation)
    }
}
