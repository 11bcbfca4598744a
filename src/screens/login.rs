//! Login screen: email + password exchanged for a bearer token.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use super::ActionOutcome;
use crate::net::{ApiClient, ApiError};

pub const MISSING_CREDENTIALS: &str = "Informe email e senha.";
pub const INVALID_CREDENTIALS: &str = "Email ou senha incorretos";
pub const INVALID_RESPONSE: &str = "Resposta inválida do servidor";

#[derive(Clone, Debug, Default)]
pub struct LoginScreen {
    pub email: String,
    pub password: String,
    pub busy: bool,
    pub error: Option<String>,
}

impl LoginScreen {
    #[must_use]
    pub fn new(email: &str, password: &str) -> Self {
        Self { email: email.to_owned(), password: password.to_owned(), ..Self::default() }
    }

    /// Exchange the credentials for a token and store it in the session.
    pub async fn submit(&mut self, api: &ApiClient) -> ActionOutcome {
        if self.busy {
            return ActionOutcome::Ignored;
        }
        self.error = None;
        let (email, password) = match validate_login_input(&self.email, &self.password) {
            Ok(fields) => fields,
            Err(message) => {
                self.error = Some(message.to_owned());
                return ActionOutcome::Invalid;
            }
        };

        self.busy = true;
        let result = api.login(&email, &password).await;
        self.busy = false;

        match result {
            Ok(resp) => match resp.access_token.filter(|token| !token.trim().is_empty()) {
                Some(token) => {
                    api.session().set_token(&token);
                    self.password.clear();
                    tracing::info!(email = %email, "login succeeded");
                    ActionOutcome::Completed
                }
                None => {
                    tracing::warn!("login response carried no token");
                    self.error = Some(INVALID_RESPONSE.to_owned());
                    ActionOutcome::Failed
                }
            },
            Err(err) => {
                tracing::info!(email = %email, error = %err, "login failed");
                self.error = Some(login_error_message(&err));
                ActionOutcome::Failed
            }
        }
    }
}

fn validate_login_input(email: &str, password: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(MISSING_CREDENTIALS);
    }
    Ok((email.to_owned(), password.to_owned()))
}

fn login_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized { detail } => detail.clone().unwrap_or_else(|| INVALID_CREDENTIALS.to_owned()),
        _ => err.user_message(),
    }
}
