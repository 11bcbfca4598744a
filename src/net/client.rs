//! HTTP client wrapper: base URL, bearer attachment, 401 interception.
//!
//! DESIGN
//! ======
//! Every request goes through `dispatch`, which snapshots the session before
//! sending. A 401 clears the session only if it is still the one whose token
//! was attached, so a late 401 for an old token cannot log out a fresh login.
//! Each call is fire-once: no retries, no queueing, default timeouts.

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
use crate::config::normalize_base_url;
use crate::session::{ClearReason, SessionStore};

pub(crate) enum Body<'a> {
    Empty,
    Json(Value),
    Form(&'a [(&'a str, &'a str)]),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Build a client for `base_url` reading tokens from `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: normalize_base_url(base_url), session })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request with the current session token attached.
    pub(crate) async fn dispatch(&self, method: Method, path: &str, body: Body<'_>) -> Result<Response, ApiError> {
        let snapshot = self.session.snapshot();
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(token) = &snapshot.token {
            request = request.bearer_auth(token);
        }
        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            Body::Form(fields) => request.form(fields),
        };

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "api request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        tracing::debug!(%method, path, status = status.as_u16(), "api response");
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status.as_u16(), &text);
        if error.is_unauthorized() && snapshot.token.is_some() {
            tracing::info!(%method, path, "api rejected session token");
            self.session.clear_if_current(snapshot.generation, ClearReason::Unauthorized);
        }
        Err(error)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.dispatch(Method::GET, path, Body::Empty).await?;
        decode(response).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let response = self.dispatch(Method::POST, path, Body::Json(body)).await?;
        decode(response).await
    }

    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self.dispatch(Method::POST, path, Body::Form(fields)).await?;
        decode(response).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.dispatch(Method::DELETE, path, Body::Empty).await?;
        Ok(())
    }

    /// Fetch `path` with an explicit token and no 401 interception.
    ///
    /// Role verification uses this so that the caller, not the wrapper,
    /// decides what a rejected token does to the session.
    pub(crate) async fn get_json_with_token<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        tracing::debug!(path, status = status.as_u16(), "api response (unintercepted)");
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), &text));
        }
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let text = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;
    // 204 / empty 2xx bodies decode as JSON null.
    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}
