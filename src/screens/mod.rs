//! Per-route view models.
//!
//! ARCHITECTURE
//! ============
//! Each screen is a plain struct holding its form fields, the last fetched
//! collection, a `busy` flag, and the single most recent error. Actions are
//! async methods taking the `ApiClient`; a front end renders the struct and
//! forwards user input. Shared rules:
//! - the error banner is cleared at the start of every action;
//! - an action started while `busy` is ignored;
//! - mutations are followed by a full re-fetch, never a local patch;
//! - a 401 leaves the banner alone, since the shell is already navigating
//!   to the login screen.

pub mod boletos;
pub mod documents;
pub mod login;
pub mod register;

pub use boletos::{BoletoForm, BoletosScreen};
pub use documents::{DocumentForm, DocumentsScreen};
pub use login::LoginScreen;
pub use register::RegisterScreen;

use crate::net::ApiError;

/// Result of a screen action, for the front end to react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// A request was already in flight.
    Ignored,
    /// Local input validation failed; the banner says why.
    Invalid,
    /// The request failed; the banner says why unless the session was revoked.
    Failed,
}

/// Banner text for a failed request, `None` for a revoked session.
pub(crate) fn banner_for(err: &ApiError) -> Option<String> {
    (!err.is_unauthorized()).then(|| err.user_message())
}
