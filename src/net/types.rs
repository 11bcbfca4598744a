//! Wire DTOs for the billing API.
//!
//! DESIGN
//! ======
//! Field names follow the server's Portuguese JSON schema. Enumerations keep
//! an `Other` arm so an unexpected value from a newer server still decodes.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::format::DocumentKind;

/// Server-assigned identifier; numeric or textual depending on the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Parse a user-supplied id, preferring the numeric form.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        raw.parse::<i64>().map_or_else(|_| Self::Text(raw.to_owned()), Self::Int)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

// =============================================================================
// BOLETOS
// =============================================================================

/// Payment status of a boleto.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BoletoStatus {
    Pendente,
    Pago,
    Other(String),
}

impl From<String> for BoletoStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "PENDENTE" => Self::Pendente,
            "PAGO" => Self::Pago,
            _ => Self::Other(raw),
        }
    }
}

impl From<BoletoStatus> for String {
    fn from(status: BoletoStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl BoletoStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pendente => "PENDENTE",
            Self::Pago => "PAGO",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for BoletoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A billing record as returned by `GET /boletos`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boleto {
    pub id: RecordId,
    pub valor: f64,
    pub vencimento: NaiveDate,
    #[serde(default)]
    pub descricao: String,
    pub status: BoletoStatus,
}

/// Body of `POST /boletos`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewBoleto {
    pub valor: f64,
    pub vencimento: NaiveDate,
    pub descricao: String,
}

// =============================================================================
// AUTHORIZED DOCUMENTS
// =============================================================================

/// A CPF/CNPJ allowed to register, as returned by `GET /documentos-autorizados`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedDocument {
    pub id: RecordId,
    /// Digits only.
    pub documento: String,
    pub nome: String,
    pub tipo: DocumentKind,
    #[serde(default)]
    pub registrado: bool,
}

/// Body of `POST /documentos-autorizados`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub documento: String,
    pub nome: String,
    pub tipo: DocumentKind,
}

/// Response of `GET /verificar-documento/{digits}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCheck {
    pub autorizado: bool,
}

// =============================================================================
// USERS & AUTH
// =============================================================================

/// Body of `POST /usuarios`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub nome: String,
    pub email: String,
    pub senha: String,
    /// Digits only.
    pub documento: String,
}

/// Response of `POST /login`. The token is optional so a 2xx without one is
/// reported as an invalid response rather than a decode failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Response of `GET /usuarios/me`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
