use super::*;

fn authenticated(role: Role) -> AuthState {
    AuthState::Authenticated { role, generation: 1 }
}

fn user() -> Role {
    Role::Other("user".to_owned())
}

// =============================================================
// Paths
// =============================================================

#[test]
fn from_path_maps_known_routes() {
    assert_eq!(Screen::from_path("/"), Some(Screen::Login));
    assert_eq!(Screen::from_path("/login/"), Some(Screen::Login));
    assert_eq!(Screen::from_path("/register"), Some(Screen::Register));
    assert_eq!(Screen::from_path("/boletos?page=2"), Some(Screen::Boletos));
    assert_eq!(Screen::from_path("/admin/documentos#top"), Some(Screen::AdminDocuments));
    assert_eq!(Screen::from_path("/nope"), None);
}

#[test]
fn path_round_trips_through_from_path() {
    for screen in [Screen::Login, Screen::Register, Screen::Boletos, Screen::AdminDocuments] {
        assert_eq!(Screen::from_path(screen.path()), Some(screen));
    }
}

// =============================================================
// Routing table
// =============================================================

#[test]
fn anonymous_renders_public_screens_only() {
    let state = AuthState::Anonymous;
    assert_eq!(route(&state, Some(Screen::Login)), RouteOutcome::Render(Screen::Login));
    assert_eq!(route(&state, Some(Screen::Register)), RouteOutcome::Render(Screen::Register));
    assert_eq!(route(&state, Some(Screen::Boletos)), RouteOutcome::Redirect(Screen::Login));
    assert_eq!(route(&state, None), RouteOutcome::Redirect(Screen::Login));
}

#[test]
fn anonymous_admin_request_redirects_to_login() {
    assert_eq!(route(&AuthState::Anonymous, Some(Screen::AdminDocuments)), RouteOutcome::Redirect(Screen::Login));
    assert_eq!(route(&AuthState::Invalid, Some(Screen::AdminDocuments)), RouteOutcome::Redirect(Screen::Login));
}

#[test]
fn non_admin_admin_request_redirects_to_default() {
    let state = authenticated(user());
    assert_eq!(route(&state, Some(Screen::AdminDocuments)), RouteOutcome::Redirect(Screen::Boletos));
    let state = authenticated(Role::Unknown);
    assert_eq!(route(&state, Some(Screen::AdminDocuments)), RouteOutcome::Redirect(Screen::Boletos));
}

#[test]
fn admin_renders_admin_screen() {
    let state = authenticated(Role::Admin);
    assert_eq!(route(&state, Some(Screen::AdminDocuments)), RouteOutcome::Render(Screen::AdminDocuments));
}

#[test]
fn authenticated_public_and_unknown_paths_redirect_to_default() {
    let state = authenticated(user());
    assert_eq!(route(&state, Some(Screen::Login)), RouteOutcome::Redirect(Screen::Boletos));
    assert_eq!(route(&state, Some(Screen::Register)), RouteOutcome::Redirect(Screen::Boletos));
    assert_eq!(route(&state, None), RouteOutcome::Redirect(Screen::Boletos));
    assert_eq!(route(&state, Some(Screen::Boletos)), RouteOutcome::Render(Screen::Boletos));
}

#[test]
fn authenticating_defers_every_decision() {
    let state = AuthState::Authenticating { generation: 3 };
    for requested in [None, Some(Screen::Login), Some(Screen::Boletos), Some(Screen::AdminDocuments)] {
        assert_eq!(route(&state, requested), RouteOutcome::Loading);
    }
}

#[test]
fn unverified_blocks_protected_screens_with_message() {
    let state = AuthState::Unverified { generation: 2, message: "offline".to_owned() };
    assert_eq!(route(&state, Some(Screen::Boletos)), RouteOutcome::Unavailable("offline".to_owned()));
    assert_eq!(route(&state, Some(Screen::Login)), RouteOutcome::Render(Screen::Login));
}

// =============================================================
// State machine
// =============================================================

#[test]
fn initial_state_depends_on_stored_token() {
    assert_eq!(AuthMachine::new(false, 0).state(), &AuthState::Anonymous);
    assert_eq!(AuthMachine::new(true, 0).state(), &AuthState::Authenticating { generation: 0 });
}

#[test]
fn successful_resolution_authenticates() {
    let mut machine = AuthMachine::new(false, 0);
    machine.token_appeared(1);
    assert_eq!(machine.pending(), Some(1));
    assert!(machine.resolution_succeeded(1, Role::Admin));
    assert_eq!(machine.role(), Some(&Role::Admin));
}

#[test]
fn stale_resolution_is_discarded_after_logout() {
    let mut machine = AuthMachine::new(false, 0);
    machine.token_appeared(1);
    machine.session_cleared();
    assert!(!machine.resolution_succeeded(1, Role::Admin));
    assert_eq!(machine.state(), &AuthState::Anonymous);
}

#[test]
fn resolution_for_replaced_token_is_discarded() {
    let mut machine = AuthMachine::new(false, 0);
    machine.token_appeared(1);
    machine.token_appeared(2);
    assert!(!machine.resolution_succeeded(1, Role::Admin));
    assert!(!machine.resolution_failed(1, true, "late"));
    assert_eq!(machine.pending(), Some(2));
}

#[test]
fn rejected_resolution_goes_invalid_then_anonymous() {
    let mut machine = AuthMachine::new(true, 0);
    assert!(machine.resolution_failed(0, true, "rejected"));
    assert_eq!(machine.state(), &AuthState::Invalid);
    machine.session_cleared();
    assert_eq!(machine.state(), &AuthState::Anonymous);
}

#[test]
fn unreachable_resolution_can_be_retried() {
    let mut machine = AuthMachine::new(true, 4);
    assert!(machine.resolution_failed(4, false, "offline"));
    assert_eq!(machine.state(), &AuthState::Unverified { generation: 4, message: "offline".to_owned() });
    assert_eq!(machine.retry(), Some(4));
    assert_eq!(machine.pending(), Some(4));
    assert_eq!(machine.retry(), None);
}
