use super::*;

#[test]
fn from_status_classifies_by_range() {
    assert!(ApiError::from_status(401, "").is_unauthorized());
    assert_eq!(ApiError::from_status(404, ""), ApiError::Rejected { status: 404, detail: None });
    assert_eq!(ApiError::from_status(503, r#"{"detail":"down"}"#), ApiError::Server { status: 503 });
}

#[test]
fn extract_detail_reads_string_detail() {
    assert_eq!(
        extract_detail(r#"{"detail":"Documento não encontrado"}"#).as_deref(),
        Some("Documento não encontrado")
    );
}

#[test]
fn extract_detail_joins_validation_messages() {
    let body = r#"{"detail":[{"loc":["body","valor"],"msg":"field required"},{"msg":"bad date"}]}"#;
    assert_eq!(extract_detail(body).as_deref(), Some("field required; bad date"));
}

#[test]
fn extract_detail_falls_back_to_message_field() {
    assert_eq!(extract_detail(r#"{"message":"quota"}"#).as_deref(), Some("quota"));
}

#[test]
fn extract_detail_none_for_unstructured_bodies() {
    assert_eq!(extract_detail("<html>Bad Gateway</html>"), None);
    assert_eq!(extract_detail(r#"{"detail":""}"#), None);
    assert_eq!(extract_detail(r#"{"detail":[]}"#), None);
    assert_eq!(extract_detail(""), None);
}

#[test]
fn user_message_prefers_server_detail() {
    let err = ApiError::from_status(400, r#"{"detail":"Email já cadastrado"}"#);
    assert_eq!(err.user_message(), "Email já cadastrado");
}

#[test]
fn user_message_is_generic_without_detail() {
    assert_eq!(ApiError::Transport("refused".to_owned()).user_message(), NETWORK_ERROR_MESSAGE);
    assert_eq!(ApiError::Server { status: 500 }.user_message(), SERVER_ERROR_MESSAGE);
    assert_eq!(ApiError::Rejected { status: 422, detail: None }.user_message(), NETWORK_ERROR_MESSAGE);
}

#[test]
fn status_is_reported_only_for_responses() {
    assert_eq!(ApiError::Unauthorized { detail: None }.status(), Some(401));
    assert_eq!(ApiError::Server { status: 502 }.status(), Some(502));
    assert_eq!(ApiError::Decode("x".to_owned()).status(), None);
}
