//! Registration screen. Only pre-authorized CPF/CNPJ holders may sign up, so
//! the document is verified against the API before the form can be sent.

#[cfg(test)]
#[path = "register_test.rs"]
mod register_test;

use super::{ActionOutcome, banner_for};
use crate::format::{digits_only, format_document};
use crate::net::ApiClient;
use crate::net::types::NewUser;

pub const NOT_PRE_REGISTERED: &str =
    "CPF/CNPJ não está pré-cadastrado no sistema. Entre em contato com o administrador.";
pub const VERIFY_FIRST: &str = "Por favor, verifique seu CPF/CNPJ primeiro.";
pub const PASSWORD_MISMATCH: &str = "As senhas não coincidem";
pub const MISSING_FIELDS: &str = "Preencha nome, email e senha.";

#[derive(Clone, Debug, Default)]
pub struct RegisterScreen {
    pub nome: String,
    pub email: String,
    pub senha: String,
    pub confirmar_senha: String,
    /// Masked as typed.
    documento: String,
    documento_verificado: bool,
    pub busy: bool,
    pub error: Option<String>,
}

impl RegisterScreen {
    #[must_use]
    pub fn new(nome: &str, email: &str, senha: &str, confirmar_senha: &str) -> Self {
        Self {
            nome: nome.to_owned(),
            email: email.to_owned(),
            senha: senha.to_owned(),
            confirmar_senha: confirmar_senha.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn documento(&self) -> &str {
        &self.documento
    }

    #[must_use]
    pub fn documento_verificado(&self) -> bool {
        self.documento_verificado
    }

    /// Update the document field; any edit invalidates a previous check.
    pub fn set_documento(&mut self, raw: &str) {
        self.documento = format_document(raw);
        self.documento_verificado = false;
    }

    /// Check the document against the authorized list.
    pub async fn verify_document(&mut self, api: &ApiClient) -> ActionOutcome {
        if self.busy {
            return ActionOutcome::Ignored;
        }
        let digits = digits_only(&self.documento);
        if digits.is_empty() {
            return ActionOutcome::Ignored;
        }
        self.error = None;

        self.busy = true;
        let result = api.verify_document(&digits).await;
        self.busy = false;

        match result {
            Ok(check) => {
                self.documento_verificado = check.autorizado;
                if check.autorizado {
                    ActionOutcome::Completed
                } else {
                    self.error = Some(NOT_PRE_REGISTERED.to_owned());
                    ActionOutcome::Invalid
                }
            }
            Err(err) => {
                self.documento_verificado = false;
                self.error = banner_for(&err).map(|message| format!("Erro ao verificar documento. {message}"));
                ActionOutcome::Failed
            }
        }
    }

    /// Create the account. On `Completed` the front end returns to login.
    pub async fn submit(&mut self, api: &ApiClient) -> ActionOutcome {
        if self.busy {
            return ActionOutcome::Ignored;
        }
        self.error = None;
        let user = match self.validate() {
            Ok(user) => user,
            Err(message) => {
                self.error = Some(message.to_owned());
                return ActionOutcome::Invalid;
            }
        };

        self.busy = true;
        let result = api.register(&user).await;
        self.busy = false;

        match result {
            Ok(_) => {
                tracing::info!(email = %user.email, "account created");
                self.senha.clear();
                self.confirmar_senha.clear();
                ActionOutcome::Completed
            }
            Err(err) => {
                self.error = banner_for(&err);
                ActionOutcome::Failed
            }
        }
    }

    fn validate(&self) -> Result<NewUser, &'static str> {
        if !self.documento_verificado {
            return Err(VERIFY_FIRST);
        }
        if self.senha != self.confirmar_senha {
            return Err(PASSWORD_MISMATCH);
        }
        let nome = self.nome.trim();
        let email = self.email.trim();
        if nome.is_empty() || email.is_empty() || self.senha.is_empty() {
            return Err(MISSING_FIELDS);
        }
        Ok(NewUser {
            nome: nome.to_owned(),
            email: email.to_owned(),
            senha: self.senha.clone(),
            documento: digits_only(&self.documento),
        })
    }
}
