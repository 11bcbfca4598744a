use std::sync::Mutex;

use super::*;
use crate::auth::Role;
use crate::config::TOKEN_STORAGE_KEY;
use crate::net::types::Profile;
use crate::session::{MemoryStorage, StorageBus};

struct FixedSource(Result<Profile, ApiError>);

impl FixedSource {
    fn role(role: &str) -> Self {
        Self(Ok(Profile { role: Some(role.to_owned()), ..Profile::default() }))
    }
}

#[async_trait::async_trait]
impl ProfileSource for FixedSource {
    async fn fetch_profile(&self, _token: &str) -> Result<Profile, ApiError> {
        self.0.clone()
    }
}

/// Replaces the session during the first lookup, answering that lookup
/// with `first` and every later one with an admin profile.
struct RelogDuringLookup {
    store: Arc<SessionStore>,
    first: Result<Profile, ApiError>,
    tokens_seen: Mutex<Vec<String>>,
}

impl RelogDuringLookup {
    fn new(store: &Arc<SessionStore>, first: Result<Profile, ApiError>) -> Self {
        Self { store: Arc::clone(store), first, tokens_seen: Mutex::new(Vec::new()) }
    }

    fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().expect("lock").clone()
    }
}

#[async_trait::async_trait]
impl ProfileSource for RelogDuringLookup {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError> {
        let first_call = {
            let mut seen = self.tokens_seen.lock().expect("lock");
            seen.push(token.to_owned());
            seen.len() == 1
        };
        if first_call {
            self.store.set_token("newer-token");
            return self.first.clone();
        }
        Ok(Profile { role: Some("admin".to_owned()), ..Profile::default() })
    }
}

fn config() -> PortalConfig {
    PortalConfig::default().with_api_url("http://127.0.0.1:9")
}

fn portal(token: Option<&str>) -> Portal {
    let storage = token.map_or_else(MemoryStorage::new, |token| MemoryStorage::with_entry(TOKEN_STORAGE_KEY, token));
    Portal::new(config(), Arc::new(storage)).expect("portal")
}

fn unreachable() -> FixedSource {
    FixedSource(Err(ApiError::Transport("connection refused".to_owned())))
}

// =============================================================================
// Initial state & routing
// =============================================================================

#[test]
fn anonymous_admin_route_redirects_to_login() {
    let mut portal = portal(None);
    assert_eq!(portal.state(), &AuthState::Anonymous);
    assert_eq!(portal.navigate("/admin"), View::Screen(Screen::Login));
    assert_eq!(portal.current(), Some(Screen::Login));
}

#[test]
fn restored_token_starts_loading() {
    let mut portal = portal(Some("tok"));
    assert!(matches!(portal.state(), AuthState::Authenticating { .. }));
    assert_eq!(portal.navigate("/boletos"), View::Loading);
    assert_eq!(portal.current(), Some(Screen::Boletos));
}

#[tokio::test]
async fn admin_role_renders_admin_screen() {
    let mut portal = portal(Some("tok"));
    portal.resolve_role_with(&FixedSource::role("admin")).await;
    assert!(matches!(portal.state(), AuthState::Authenticated { role: Role::Admin, .. }));
    assert_eq!(portal.navigate("/admin/documentos"), View::Screen(Screen::AdminDocuments));
}

#[tokio::test]
async fn user_role_is_sent_back_to_boletos() {
    let mut portal = portal(Some("tok"));
    portal.resolve_role_with(&FixedSource::role("user")).await;
    assert_eq!(portal.navigate("/admin"), View::Screen(Screen::Boletos));
    assert_eq!(portal.navigate("/nowhere"), View::Screen(Screen::Boletos));
    assert_eq!(portal.navigate("/login"), View::Screen(Screen::Boletos));
}

#[tokio::test]
async fn loading_view_settles_once_role_arrives() {
    let mut portal = portal(Some("tok"));
    assert_eq!(portal.navigate("/admin"), View::Loading);
    portal.resolve_role_with(&FixedSource::role("admin")).await;
    assert_eq!(portal.view(), View::Screen(Screen::AdminDocuments));
}

// =============================================================================
// Resolution failures
// =============================================================================

#[tokio::test]
async fn rejected_token_clears_session() {
    let mut portal = portal(Some("tok"));
    let source = FixedSource(Err(ApiError::Unauthorized { detail: None }));
    assert_eq!(portal.resolve_role_with(&source).await, &AuthState::Anonymous);
    assert_eq!(portal.session().get_token(), None);
    assert_eq!(portal.navigate("/boletos"), View::Screen(Screen::Login));
}

#[tokio::test]
async fn unreachable_server_keeps_token_and_reports_unavailable() {
    let mut portal = portal(Some("tok"));
    portal.resolve_role_with(&unreachable()).await;
    assert!(matches!(portal.state(), AuthState::Unverified { .. }));
    assert_eq!(portal.session().get_token().as_deref(), Some("tok"));
    assert_eq!(portal.navigate("/boletos"), View::Unavailable(NETWORK_ERROR_MESSAGE.to_owned()));
    assert_eq!(portal.navigate("/register"), View::Screen(Screen::Register));
}

#[tokio::test]
async fn strict_mode_clears_session_on_unreachable_server() {
    let storage = Arc::new(MemoryStorage::with_entry(TOKEN_STORAGE_KEY, "tok"));
    let config = PortalConfig { strict_role_check: true, ..config() };
    let mut portal = Portal::new(config, storage).expect("portal");
    assert_eq!(portal.resolve_role_with(&unreachable()).await, &AuthState::Anonymous);
    assert_eq!(portal.session().get_token(), None);
}

#[tokio::test]
async fn stale_resolution_is_discarded_and_newer_session_resolved() {
    let mut portal = portal(Some("old-token"));
    let source = RelogDuringLookup::new(portal.session(), Ok(Profile { role: Some("user".to_owned()), ..Profile::default() }));
    portal.resolve_role_with(&source).await;

    let current = portal.session().generation();
    assert_eq!(portal.state(), &AuthState::Authenticated { role: Role::Admin, generation: current });
    assert_eq!(source.tokens_seen(), vec!["old-token".to_owned(), "newer-token".to_owned()]);
    assert_eq!(portal.navigate("/boletos"), View::Screen(Screen::Boletos));
}

#[tokio::test]
async fn rejection_for_replaced_session_does_not_clear_new_token() {
    let mut portal = portal(Some("old-token"));
    let source = RelogDuringLookup::new(portal.session(), Err(ApiError::Unauthorized { detail: None }));
    portal.resolve_role_with(&source).await;

    assert_eq!(portal.session().get_token().as_deref(), Some("newer-token"));
    assert!(matches!(portal.state(), AuthState::Authenticated { role: Role::Admin, .. }));
}

#[tokio::test]
async fn rate_limited_lookup_keeps_session() {
    let mut portal = portal(Some("tok"));
    let source = FixedSource(Err(ApiError::Rejected { status: 429, detail: None }));
    portal.resolve_role_with(&source).await;

    assert!(matches!(portal.state(), AuthState::Unverified { .. }));
    assert_eq!(portal.session().get_token().as_deref(), Some("tok"));
}

#[tokio::test]
async fn forbidden_lookup_clears_session() {
    let mut portal = portal(Some("tok"));
    let source = FixedSource(Err(ApiError::Rejected { status: 403, detail: None }));
    assert_eq!(portal.resolve_role_with(&source).await, &AuthState::Anonymous);
    assert_eq!(portal.session().get_token(), None);
}

// =============================================================================
// Session changes
// =============================================================================

#[tokio::test]
async fn cleared_session_sends_next_view_to_login() {
    let mut portal = portal(Some("tok"));
    portal.resolve_role_with(&FixedSource::role("user")).await;
    assert_eq!(portal.navigate("/boletos"), View::Screen(Screen::Boletos));

    portal.session().clear_token(ClearReason::Unauthorized);
    assert_eq!(portal.view(), View::Screen(Screen::Login));
}

#[tokio::test]
async fn logout_returns_to_login() {
    let mut portal = portal(Some("tok"));
    portal.resolve_role_with(&FixedSource::role("admin")).await;
    assert_eq!(portal.logout(), View::Screen(Screen::Login));
    assert_eq!(portal.session().get_token(), None);
    assert_eq!(portal.state(), &AuthState::Anonymous);
}

#[tokio::test]
async fn retry_while_server_still_down_stays_unavailable() {
    let mut portal = portal(Some("tok"));
    portal.resolve_role_with(&unreachable()).await;
    assert_eq!(portal.navigate("/boletos"), View::Unavailable(NETWORK_ERROR_MESSAGE.to_owned()));

    // The configured API address refuses connections.
    assert_eq!(portal.retry().await, View::Unavailable(NETWORK_ERROR_MESSAGE.to_owned()));
    assert!(matches!(portal.state(), AuthState::Unverified { .. }));
    assert_eq!(portal.session().get_token().as_deref(), Some("tok"));
}

#[tokio::test]
async fn retry_without_unverified_session_only_reevaluates_view() {
    let mut portal = portal(None);
    assert_eq!(portal.retry().await, View::Screen(Screen::Login));
}

#[tokio::test]
async fn other_tab_login_is_picked_up() {
    let storage: Arc<dyn TokenStorage> = Arc::new(MemoryStorage::new());
    let bus = StorageBus::new();
    let here = Arc::new(SessionStore::with_bus(Arc::clone(&storage), &bus));
    let there = SessionStore::with_bus(storage, &bus);
    let listener = here.spawn_bus_listener().expect("bus listener");

    let mut portal = Portal::with_session(config(), Arc::clone(&here)).expect("portal");
    assert_eq!(portal.state(), &AuthState::Anonymous);

    there.set_token("from-other-tab");
    for _ in 0..50 {
        if here.get_token().is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert!(portal.needs_resolution());
    assert_eq!(portal.navigate("/boletos"), View::Loading);
    portal.resolve_role_with(&FixedSource::role("user")).await;
    assert_eq!(portal.navigate("/boletos"), View::Screen(Screen::Boletos));
    assert!(!portal.needs_resolution());
    listener.abort();
}
