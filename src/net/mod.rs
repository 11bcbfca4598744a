//! Networking: the HTTP client wrapper, endpoint helpers, and wire types.
//!
//! SYSTEM CONTEXT
//! ==============
//! `client` attaches the session token and intercepts 401s, `api` maps each
//! remote endpoint to a typed call, `error` classifies failures, and `types`
//! defines the JSON schema shared with the server.

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
