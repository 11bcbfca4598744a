//! # portal
//!
//! Client core for the boleto portal: session handling, role gating, and the
//! request pipeline in front of the remote billing API.
//!
//! ARCHITECTURE
//! ============
//! - `session` holds the bearer token and broadcasts changes to subscribers.
//! - `auth` resolves the caller's role and runs the route-guard state machine.
//! - `net` wraps `reqwest` with bearer attachment and 401 interception.
//! - `screens` are the per-route view models (login, register, boletos, admin).
//! - `app` wires everything into the `Portal` shell a front end drives.

pub mod app;
pub mod auth;
pub mod config;
pub mod format;
pub mod net;
pub mod screens;
pub mod session;

pub use app::{Portal, View};
pub use config::PortalConfig;
