//! Admin screen: CPF/CNPJ numbers allowed to create an account.

#[cfg(test)]
#[path = "documents_test.rs"]
mod documents_test;

use super::{ActionOutcome, banner_for};
use crate::format::{DocumentKind, digits_only, format_as};
use crate::net::types::{AuthorizedDocument, NewDocument, RecordId};
use crate::net::{ApiClient, ApiError};

pub const INCOMPLETE_DOCUMENT: &str = "Documento incompleto.";
pub const MISSING_NOME: &str = "Informe o nome.";

/// Create-form input. `documento` is kept masked for the selected `tipo`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentForm {
    documento: String,
    pub nome: String,
    tipo: DocumentKind,
}

impl DocumentForm {
    #[must_use]
    pub fn new(tipo: DocumentKind, documento: &str, nome: &str) -> Self {
        Self { documento: format_as(tipo, documento), nome: nome.to_owned(), tipo }
    }

    #[must_use]
    pub fn documento(&self) -> &str {
        &self.documento
    }

    #[must_use]
    pub fn tipo(&self) -> DocumentKind {
        self.tipo
    }

    pub fn set_documento(&mut self, raw: &str) {
        self.documento = format_as(self.tipo, raw);
    }

    /// Switch type and re-mask the current digits.
    pub fn set_tipo(&mut self, tipo: DocumentKind) {
        self.tipo = tipo;
        self.documento = format_as(tipo, &self.documento);
    }

    /// Validate into a request body with a digits-only `documento`.
    ///
    /// # Errors
    ///
    /// Returns the banner text for the first invalid field.
    pub fn parse(&self) -> Result<NewDocument, &'static str> {
        let documento = digits_only(&self.documento);
        if documento.len() != self.tipo.max_digits() {
            return Err(INCOMPLETE_DOCUMENT);
        }
        let nome = self.nome.trim();
        if nome.is_empty() {
            return Err(MISSING_NOME);
        }
        Ok(NewDocument { documento, nome: nome.to_owned(), tipo: self.tipo })
    }
}

#[derive(Clone, Debug, Default)]
pub struct DocumentsScreen {
    pub documents: Vec<AuthorizedDocument>,
    pub form: DocumentForm,
    pub busy: bool,
    pub error: Option<String>,
}

impl DocumentsScreen {
    pub async fn load(&mut self, api: &ApiClient) -> ActionOutcome {
        if self.busy {
            return ActionOutcome::Ignored;
        }
        self.error = None;
        self.busy = true;
        let result = self.refresh(api).await;
        self.busy = false;
        match result {
            Ok(()) => ActionOutcome::Completed,
            Err(err) => {
                self.error = banner_for(&err);
                ActionOutcome::Failed
            }
        }
    }

    /// Authorize the document in `form`, reset the form, and re-fetch.
    pub async fn create(&mut self, api: &ApiClient) -> ActionOutcome {
        if self.busy {
            return ActionOutcome::Ignored;
        }
        self.error = None;
        let document = match self.form.parse() {
            Ok(document) => document,
            Err(message) => {
                self.error = Some(message.to_owned());
                return ActionOutcome::Invalid;
            }
        };

        self.busy = true;
        let result = api.create_document(&document).await.map(|_| ());
        if result.is_ok() {
            tracing::info!(tipo = %document.tipo, "authorized document created");
            self.form = DocumentForm { tipo: document.tipo, ..DocumentForm::default() };
        }
        let outcome = self.finish_mutation(api, result).await;
        self.busy = false;
        outcome
    }

    pub async fn delete(&mut self, api: &ApiClient, id: &RecordId) -> ActionOutcome {
        if self.busy {
            return ActionOutcome::Ignored;
        }
        self.error = None;
        self.busy = true;
        let result = api.delete_document(id).await;
        if result.is_ok() {
            tracing::info!(%id, "authorized document deleted");
        }
        let outcome = self.finish_mutation(api, result).await;
        self.busy = false;
        outcome
    }

    async fn refresh(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        self.documents = api.list_documents().await?;
        Ok(())
    }

    async fn finish_mutation(&mut self, api: &ApiClient, result: Result<(), ApiError>) -> ActionOutcome {
        if let Err(err) = &result
            && err.is_unauthorized()
        {
            return ActionOutcome::Failed;
        }
        let refreshed = self.refresh(api).await;
        match (result, refreshed) {
            (Ok(()), Ok(())) => ActionOutcome::Completed,
            (Err(err), _) | (Ok(()), Err(err)) => {
                self.error = banner_for(&err);
                ActionOutcome::Failed
            }
        }
    }
}
