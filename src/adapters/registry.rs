use crate::core::{AuditReport, AuditRequest, AuditSubmitter, ConfigProvider};
use crate::utils::error::{AuditError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

pub const AUDIT_ENDPOINT: &str = "-/npm/v1/security/audits";

/// Longest slice of an error body kept in error messages.
const BODY_EXCERPT: usize = 200;

/// Submits audit requests to an npm-compatible registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    endpoint: String,
}

impl RegistryClient {
    pub fn new(registry_url: &str, timeout: Duration) -> Result<Self> {
        Self::with_headers(registry_url, timeout, &BTreeMap::new())
    }

    pub fn with_headers(
        registry_url: &str,
        timeout: Duration,
        headers: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                AuditError::InvalidConfigValueError {
                    field: "registry.headers".to_string(),
                    value: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                AuditError::InvalidConfigValueError {
                    field: format!("registry.headers.{}", name),
                    value: "<redacted>".to_string(),
                    reason: e.to_string(),
                }
            })?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .user_agent(concat!("split-audit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: audit_endpoint(registry_url),
        })
    }

    pub fn from_config<C: ConfigProvider>(
        config: &C,
        headers: &BTreeMap<String, String>,
    ) -> Result<Self> {
        Self::with_headers(config.registry_url(), config.request_timeout(), headers)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn audit_endpoint(registry_url: &str) -> String {
    format!("{}/{}", registry_url.trim_end_matches('/'), AUDIT_ENDPOINT)
}

#[async_trait]
impl AuditSubmitter for RegistryClient {
    async fn submit(&self, request: &AuditRequest) -> Result<AuditReport> {
        tracing::debug!(
            "POST {} ({})",
            self.endpoint,
            request.requires.keys().cloned().collect::<Vec<_>>().join(", ")
        );

        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::RegistryStatus {
                status: status.as_u16(),
                body: body.chars().take(BODY_EXCERPT).collect(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| AuditError::InvalidResponse {
            message: e.to_string(),
        })
    }
}
