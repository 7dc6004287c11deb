use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{IdentityQuery, ServiceOutcome};
use crate::normalization::normalize_response;
use crate::soap::{render_request, Credentials, SOAP_ACTION};
use crate::xml_tree::parse_xml;
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

/// One call to the metering-point lookup service.
///
/// Implementations own serialization, transport and normalization; callers only
/// see [`ServiceOutcome`] or a transport/parse error.
#[async_trait]
pub trait MeteringPointGateway: Send + Sync {
    async fn call(&self, query: &IdentityQuery) -> Result<ServiceOutcome, AppError>;
}

/// Client for the Nubix `getMeteringPointIdIn` SOAP operation.
#[derive(Clone)]
pub struct NubixGatewayClient {
    client: reqwest::Client,
    service_url: String,
    credentials: Credentials,
}

impl NubixGatewayClient {
    /// Creates a new `NubixGatewayClient` from configuration.
    ///
    /// The per-request timeout is applied by the underlying HTTP client.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.nubix_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create Nubix client: {}", e)))?;

        Ok(Self {
            client,
            service_url: config.nubix_service_url.clone(),
            credentials: Credentials {
                username: config.nubix_username.clone(),
                password: config.nubix_password.clone(),
                gln: config.nubix_gln.clone(),
            },
        })
    }

    async fn post_envelope(&self, body: String) -> Result<String, AppError> {
        let response = self
            .client
            .post(&self.service_url)
            .header("SOAPAction", SOAP_ACTION)
            .header("Content-Type", "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Nubix request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Transport(format!(
                "Nubix returned {}: {}",
                status, error_text
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MeteringPointGateway for NubixGatewayClient {
    async fn call(&self, query: &IdentityQuery) -> Result<ServiceOutcome, AppError> {
        let request_id = Uuid::new_v4();
        tracing::debug!("Calling Nubix getMeteringPointIdIn (request {})", request_id);

        let body = render_request(query, &self.credentials, request_id);
        let xml = self
            .post_envelope(body)
            .await
            .with_context(|| format!("getMeteringPointIdIn request {}", request_id))?;

        let tree = parse_xml(&xml).context("decoding Nubix response")?;
        let outcome = normalize_response(&tree, query).context("normalizing Nubix response")?;

        match &outcome {
            ServiceOutcome::Found(records) => {
                tracing::info!("✓ Nubix request {} found {} record(s)", request_id, records.len())
            }
            ServiceOutcome::NotFound => {
                tracing::info!("Nubix request {} found no metering point", request_id)
            }
            ServiceOutcome::ServiceError(description) => {
                tracing::warn!("Nubix request {} reported fault: {}", request_id, description)
            }
        }

        Ok(outcome)
    }
}
