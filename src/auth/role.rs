//! Role resolver: token in, role out.
//!
//! DESIGN
//! ======
//! Resolution never touches the session store; the caller decides what a
//! failure means. Failures are split in two so that a flaky network does not
//! log the user out: `Rejected` (401/403, the server refused the token) and
//! `Unreachable` (everything else: no answer, a 5xx, a rate limit or other
//! 4xx, or a profile that would not decode).

#[cfg(test)]
#[path = "role_test.rs"]
mod role_test;

use crate::net::ApiError;
use crate::net::types::Profile;

/// Coarse authorization label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Other(String),
    /// The profile carried no role.
    Unknown,
}

impl Role {
    #[must_use]
    pub fn from_profile(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Unknown,
            Some(raw) if raw.eq_ignore_ascii_case("admin") => Self::Admin,
            Some(raw) => Self::Other(raw.to_owned()),
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Other(raw) => f.write_str(raw),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error("empty session token")]
    EmptyToken,

    #[error("session rejected: {0}")]
    Rejected(String),

    /// The token could be fine; the server just did not confirm it.
    #[error("session could not be verified: {0}")]
    Unreachable(String),
}

impl RoleError {
    /// Whether this failure should end the session. In strict mode every
    /// failure does; otherwise only a refused token does.
    #[must_use]
    pub fn invalidates_session(&self, strict: bool) -> bool {
        strict || !matches!(self, Self::Unreachable(_))
    }
}

impl From<ApiError> for RoleError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } | ApiError::Rejected { status: 403, .. } => Self::Rejected(err.to_string()),
            // A 429 or an odd profile body says nothing about the token.
            ApiError::Rejected { .. }
            | ApiError::Decode(_)
            | ApiError::Transport(_)
            | ApiError::Server { .. }
            | ApiError::HttpClientBuild(_) => Self::Unreachable(err.to_string()),
        }
    }
}

/// Where profiles come from. `ApiClient` is the production implementation.
#[async_trait::async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the profile of the user owning `token`.
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError>;
}

/// Ask `source` who owns `token` and return their role.
///
/// # Errors
///
/// `EmptyToken` without a network call for a blank token, otherwise the
/// classified fetch failure.
pub async fn resolve_role(source: &dyn ProfileSource, token: &str) -> Result<Role, RoleError> {
    if token.trim().is_empty() {
        return Err(RoleError::EmptyToken);
    }
    let profile = source.fetch_profile(token).await?;
    let role = Role::from_profile(profile.role.as_deref());
    tracing::debug!(%role, "role resolved");
    Ok(role)
}
