//! Typed calls for each billing-API endpoint.
//!
//! Paths are built by small helpers so they can be checked without a server.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{
    AuthorizedDocument, Boleto, DocumentCheck, LoginResponse, NewBoleto, NewDocument, NewUser, Profile, RecordId,
};
use crate::auth::ProfileSource;

pub const LOGIN_PATH: &str = "/login";
pub const USERS_PATH: &str = "/usuarios";
pub const PROFILE_PATH: &str = "/usuarios/me";
pub const BOLETOS_PATH: &str = "/boletos";
pub const DOCUMENTS_PATH: &str = "/documentos-autorizados";

fn verify_document_endpoint(digits: &str) -> String {
    format!("/verificar-documento/{digits}")
}

fn boleto_endpoint(id: &RecordId) -> String {
    format!("{BOLETOS_PATH}/{id}")
}

fn document_endpoint(id: &RecordId) -> String {
    format!("{DOCUMENTS_PATH}/{id}")
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

impl ApiClient {
    /// `POST /login` with form-encoded credentials.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.post_form(LOGIN_PATH, &[("username", username), ("password", password)]).await
    }

    /// `POST /usuarios`.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn register(&self, user: &NewUser) -> Result<serde_json::Value, ApiError> {
        self.post_json(USERS_PATH, to_body(user)?).await
    }

    /// `GET /usuarios/me` for the current session.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn me(&self) -> Result<Profile, ApiError> {
        self.get_json(PROFILE_PATH).await
    }

    /// `GET /verificar-documento/{digits}`.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn verify_document(&self, digits: &str) -> Result<DocumentCheck, ApiError> {
        self.get_json(&verify_document_endpoint(digits)).await
    }

    /// `GET /boletos`.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn list_boletos(&self) -> Result<Vec<Boleto>, ApiError> {
        self.get_json(BOLETOS_PATH).await
    }

    /// `POST /boletos`.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn create_boleto(&self, boleto: &NewBoleto) -> Result<Boleto, ApiError> {
        self.post_json(BOLETOS_PATH, to_body(boleto)?).await
    }

    /// `DELETE /boletos/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn delete_boleto(&self, id: &RecordId) -> Result<(), ApiError> {
        self.delete(&boleto_endpoint(id)).await
    }

    /// `GET /documentos-autorizados`.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn list_documents(&self) -> Result<Vec<AuthorizedDocument>, ApiError> {
        self.get_json(DOCUMENTS_PATH).await
    }

    /// `POST /documentos-autorizados`.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn create_document(&self, document: &NewDocument) -> Result<AuthorizedDocument, ApiError> {
        self.post_json(DOCUMENTS_PATH, to_body(document)?).await
    }

    /// `DELETE /documentos-autorizados/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the classified request failure.
    pub async fn delete_document(&self, id: &RecordId) -> Result<(), ApiError> {
        self.delete(&document_endpoint(id)).await
    }
}

#[async_trait::async_trait]
impl ProfileSource for ApiClient {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError> {
        self.get_json_with_token(PROFILE_PATH, token).await
    }
}
