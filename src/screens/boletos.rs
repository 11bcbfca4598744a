//! Boleto list with create and delete.

#[cfg(test)]
#[path = "boletos_test.rs"]
mod boletos_test;

use chrono::NaiveDate;

use super::{ActionOutcome, banner_for};
use crate::net::types::{Boleto, NewBoleto, RecordId};
use crate::net::{ApiClient, ApiError};

pub const INVALID_VALOR: &str = "Informe um valor maior que zero.";
pub const INVALID_VENCIMENTO: &str = "Informe o vencimento no formato AAAA-MM-DD.";
pub const MISSING_DESCRICAO: &str = "Informe a descrição.";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Raw create-form input, as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoletoForm {
    pub valor: String,
    pub vencimento: String,
    pub descricao: String,
}

impl BoletoForm {
    #[must_use]
    pub fn new(valor: &str, vencimento: &str, descricao: &str) -> Self {
        Self { valor: valor.to_owned(), vencimento: vencimento.to_owned(), descricao: descricao.to_owned() }
    }

    /// Validate the form into a request body.
    ///
    /// # Errors
    ///
    /// Returns the banner text for the first invalid field.
    pub fn parse(&self) -> Result<NewBoleto, &'static str> {
        let valor = parse_valor(&self.valor).ok_or(INVALID_VALOR)?;
        let vencimento = parse_vencimento(&self.vencimento).ok_or(INVALID_VENCIMENTO)?;
        let descricao = self.descricao.trim();
        if descricao.is_empty() {
            return Err(MISSING_DESCRICAO);
        }
        Ok(NewBoleto { valor, vencimento, descricao: descricao.to_owned() })
    }
}

/// Parse a positive amount written with `.` or `,` as the decimal
/// separator. With both present, the last one is the decimal separator.
fn parse_valor(raw: &str) -> Option<f64> {
    let raw = raw.trim().trim_start_matches("R$").trim();
    let normalized = match (raw.rfind(','), raw.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (Some(_), None) => raw.replace(',', "."),
        _ => raw.to_owned(),
    };
    let valor = normalized.parse::<f64>().ok()?;
    (valor.is_finite() && valor > 0.0).then_some(valor)
}

fn parse_vencimento(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[derive(Clone, Debug, Default)]
pub struct BoletosScreen {
    pub boletos: Vec<Boleto>,
    pub form: BoletoForm,
    pub busy: bool,
    pub error: Option<String>,
    /// At least one list fetch has succeeded.
    pub loaded: bool,
}

impl BoletosScreen {
    /// Fetch the list.
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

    /// Create a boleto from `form`, reset the form, and re-fetch the list.
    pub async fn create(&mut self, api: &ApiClient) -> ActionOutcome {
        if self.busy {
            return ActionOutcome::Ignored;
        }
        self.error = None;
        let boleto = match self.form.parse() {
            Ok(boleto) => boleto,
            Err(message) => {
                self.error = Some(message.to_owned());
                return ActionOutcome::Invalid;
            }
        };

        self.busy = true;
        let result = api.create_boleto(&boleto).await.map(|_| ());
        if result.is_ok() {
            tracing::info!(valor = boleto.valor, vencimento = %boleto.vencimento, "boleto created");
            self.form = BoletoForm::default();
        }
        let outcome = self.finish_mutation(api, result).await;
        self.busy = false;
        outcome
    }

    /// Delete boleto `id` and re-fetch the list.
    pub async fn delete(&mut self, api: &ApiClient, id: &RecordId) -> ActionOutcome {
        if self.busy {
            return ActionOutcome::Ignored;
        }
        self.error = None;
        self.busy = true;
        let result = api.delete_boleto(id).await;
        if result.is_ok() {
            tracing::info!(%id, "boleto deleted");
        }
        let outcome = self.finish_mutation(api, result).await;
        self.busy = false;
        outcome
    }

    async fn refresh(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        self.boletos = api.list_boletos().await?;
        self.loaded = true;
        Ok(())
    }

    /// Re-fetch after a mutation. The mutation's own error wins the banner.
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
