//! Role resolution and route gating.
//!
//! SYSTEM CONTEXT
//! ==============
//! `role` asks the API who the token belongs to; `guard` turns the session
//! state plus that answer into a render/redirect decision per route.

pub mod guard;
pub mod role;

pub use guard::{AuthMachine, AuthState, RouteOutcome, Screen, route};
pub use role::{ProfileSource, Role, RoleError, resolve_role};
