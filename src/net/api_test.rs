use super::*;

#[test]
fn verify_document_endpoint_formats_digits() {
    assert_eq!(verify_document_endpoint("12345678901"), "/verificar-documento/12345678901");
}

#[test]
fn boleto_endpoint_formats_numeric_and_text_ids() {
    assert_eq!(boleto_endpoint(&RecordId::Int(7)), "/boletos/7");
    assert_eq!(boleto_endpoint(&RecordId::Text("ab-1".to_owned())), "/boletos/ab-1");
}

#[test]
fn document_endpoint_formats_id() {
    assert_eq!(document_endpoint(&RecordId::Int(12)), "/documentos-autorizados/12");
}

#[test]
fn to_body_uses_wire_field_names() {
    let body = to_body(&NewDocument {
        documento: "12345678000195".to_owned(),
        nome: "ACME".to_owned(),
        tipo: crate::format::DocumentKind::Cnpj,
    })
    .expect("body");
    assert_eq!(body, serde_json::json!({ "documento": "12345678000195", "nome": "ACME", "tipo": "CNPJ" }));
}
