use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{CompanyPayload, CompanySummary},
    error::{describe_failure, ErrorNormalization, FailureResponse},
    protocol::{EvaluateRequest, HealthStatus},
};
use tracing::debug;

pub mod config;
pub mod controller;
pub mod error;
pub mod render;

pub use config::{load_settings, load_settings_from, Settings};
pub use controller::{
    ControllerOptions, FormSnapshot, FormView, SubmissionController, SubmitEvent, SubmitOutcome,
};
pub use error::{SettingsError, SubmitError};
pub use render::ResultsView;

// Success bodies are `None` when empty or not JSON.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    async fn create_company(&self, payload: &CompanyPayload) -> Result<Option<Value>, SubmitError>;
    async fn evaluate(&self, request: &EvaluateRequest) -> Result<Option<Value>, SubmitError>;
    async fn list_companies(&self) -> Result<Vec<CompanySummary>, SubmitError>;
    async fn health(&self) -> Result<HealthStatus, SubmitError>;
}

pub struct HttpBackend {
    http: Client,
    api_base: String,
    error_normalization: ErrorNormalization,
}

impl HttpBackend {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            error_normalization: ErrorNormalization::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.api_base.clone()).with_error_normalization(settings.error_normalization)
    }

    pub fn with_error_normalization(mut self, policy: ErrorNormalization) -> Self {
        self.error_normalization = policy;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    async fn post_json<B>(&self, path: &str, body: &B) -> Result<Option<Value>, SubmitError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let endpoint = self.endpoint(path);
        debug!(%endpoint, "POST");
        let response = self
            .http
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .map_err(|source| SubmitError::Connectivity {
                endpoint: endpoint.clone(),
                source,
            })?;
        self.read_response(response).await
    }

    async fn get_json(&self, path: &str) -> Result<Option<Value>, SubmitError> {
        let endpoint = self.endpoint(path);
        debug!(%endpoint, "GET");
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|source| SubmitError::Connectivity {
                endpoint: endpoint.clone(),
                source,
            })?;
        self.read_response(response).await
    }

    async fn read_response(&self, response: Response) -> Result<Option<Value>, SubmitError> {
        let status = response.status();
        let raw_text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&raw_text).ok();
        debug!(status = status.as_u16(), parsed = body.is_some(), "response");

        if status.is_success() {
            return Ok(body);
        }

        let message = describe_failure(
            &FailureResponse {
                status: status.as_u16(),
                reason: status.canonical_reason(),
                body: body.as_ref(),
                raw_text: &raw_text,
            },
            self.error_normalization,
        );
        Err(SubmitError::Application {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ScoringBackend for HttpBackend {
    async fn create_company(&self, payload: &CompanyPayload) -> Result<Option<Value>, SubmitError> {
        self.post_json("/companies", payload).await
    }

    async fn evaluate(&self, request: &EvaluateRequest) -> Result<Option<Value>, SubmitError> {
        self.post_json("/evaluate", request).await
    }

    async fn list_companies(&self) -> Result<Vec<CompanySummary>, SubmitError> {
        let body = self.get_json("/companies").await?;
        let Some(body) = body else {
            return Err(SubmitError::ContractViolation(
                "The backend returned an unreadable company list.".to_string(),
            ));
        };
        serde_json::from_value(body).map_err(|err| {
            SubmitError::ContractViolation(format!(
                "The backend returned an unexpected company list: {err}"
            ))
        })
    }

    async fn health(&self) -> Result<HealthStatus, SubmitError> {
        let body = self.get_json("/health").await?;
        body.and_then(|body| serde_json::from_value(body).ok())
            .ok_or_else(|| {
                SubmitError::ContractViolation(
                    "The backend health check returned no status.".to_string(),
                )
            })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
