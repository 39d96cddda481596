//! HTTP reconciler for the reasoning-engine control plane.
//!
//! Every mutation runs fetch, merge, write in that order: the control
//! plane's PATCH replaces the addressed collection wholesale, so the write
//! body must carry the merged collection, scoped by an explicit update mask
//! so no sibling field of the document is ever touched.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{TokenCache, TokenProvider};
use crate::error::{EngineError, Phase, Result, truncate_body};
use crate::merge::{merge_env, remove_env};
use crate::model::{ENV_FIELD_MASK, EngineId, EngineSnapshot, EnvPatchBody, EnvVar};
use crate::retry::RetryPolicy;

/// Tunables for [`EngineClient`].
#[derive(Debug, Clone)]
pub struct EngineClientConfig {
    /// Control-plane API version segment.
    pub api_version: String,
    /// Base endpoint override. Defaults to the regional endpoint
    /// `https://{location}-aiplatform.googleapis.com`.
    pub endpoint: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for EngineClientConfig {
    fn default() -> Self {
        Self {
            api_version: "v1beta1".to_string(),
            endpoint: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Client for reading and reconciling a reasoning engine's env-var
/// collection.
pub struct EngineClient {
    http: Client,
    auth: TokenCache,
    config: EngineClientConfig,
}

impl EngineClient {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self::with_config(provider, EngineClientConfig::default())
    }

    pub fn with_config(provider: Arc<dyn TokenProvider>, config: EngineClientConfig) -> Self {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build reqwest client");
        Self {
            http,
            auth: TokenCache::new(provider),
            config,
        }
    }

    fn engine_url(&self, id: &EngineId) -> String {
        let endpoint = match &self.config.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", id.location),
        };
        format!(
            "{}/{}/{}",
            endpoint,
            self.config.api_version,
            id.resource_path()
        )
    }

    /// GET the engine's full configuration document.
    pub async fn fetch(&self, id: &EngineId) -> Result<EngineSnapshot> {
        debug!(engine = %id, "fetching engine configuration");
        let url = self.engine_url(id);
        let response = self
            .send_with_retry(Phase::Fetch, || self.http.get(&url))
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let raw: Value = serde_json::from_str(&body).map_err(|_| EngineError::Protocol {
            phase: Phase::Fetch,
            status,
            body: truncate_body(&body),
        })?;
        Ok(EngineSnapshot::new(raw))
    }

    /// The current env-var collection; an engine with none configured yet
    /// yields an empty list.
    pub async fn list_env_vars(&self, id: &EngineId) -> Result<Vec<EnvVar>> {
        self.fetch(id).await?.env_vars(Phase::Fetch)
    }

    /// Merge `updates` into the engine's env-var collection and write the
    /// result back, scoped to exactly that field.
    ///
    /// Returns the server-confirmed collection; when the server's PATCH
    /// response omits the field (long-running operation envelope), the
    /// locally merged collection is returned instead.
    ///
    /// Concurrent writers against the same engine are not coordinated here:
    /// the control plane offers no transactional guarantee, so the later of
    /// two overlapping fetch/merge/write sequences wins. Callers needing
    /// cross-process atomicity must serialize externally.
    pub async fn apply_env_vars(&self, id: &EngineId, updates: &[EnvVar]) -> Result<Vec<EnvVar>> {
        let snapshot = self.fetch(id).await?;
        let existing = snapshot.env_vars(Phase::Fetch)?;

        if updates.is_empty() {
            debug!(engine = %id, "no updates supplied, skipping write");
            return Ok(existing);
        }

        let merged = merge_env(&existing, updates);
        info!(
            engine = %id,
            existing = existing.len(),
            updates = updates.len(),
            merged = merged.len(),
            "writing merged env-var collection"
        );
        self.write_env(id, merged).await
    }

    /// Drop the named entries from the engine's env-var collection and write
    /// the survivors back.
    pub async fn remove_env_vars(&self, id: &EngineId, names: &[String]) -> Result<Vec<EnvVar>> {
        let snapshot = self.fetch(id).await?;
        let existing = snapshot.env_vars(Phase::Fetch)?;
        let remaining = remove_env(&existing, names);
        info!(
            engine = %id,
            removed = existing.len() - remaining.len(),
            remaining = remaining.len(),
            "writing env-var collection after removal"
        );
        self.write_env(id, remaining).await
    }

    async fn write_env(&self, id: &EngineId, merged: Vec<EnvVar>) -> Result<Vec<EnvVar>> {
        let url = self.engine_url(id);
        let response = self
            .send_with_retry(Phase::Write, || {
                self.http
                    .patch(&url)
                    .query(&[("updateMask", ENV_FIELD_MASK)])
                    .json(&EnvPatchBody::new(&merged))
            })
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let raw: Value = serde_json::from_str(&body).map_err(|_| EngineError::Protocol {
            phase: Phase::Write,
            status,
            body: truncate_body(&body),
        })?;

        if raw.pointer("/spec/deploymentSpec/env").is_some() {
            EngineSnapshot::new(raw).env_vars(Phase::Write)
        } else {
            Ok(merged)
        }
    }

    /// Send a request, classifying failures per the error taxonomy:
    /// 401/403 invalidates the cached token and retries exactly once,
    /// 5xx and transport errors retry under the backoff policy,
    /// 400 on write is a validation failure, 404 and everything else is
    /// fatal immediately.
    async fn send_with_retry<F>(&self, phase: Phase, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut auth_retried = false;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let credential = self.auth.token().await?;

            let response = match build().bearer_auth(&credential.token).send().await {
                Ok(response) => response,
                Err(e) => {
                    if attempt < self.config.retry.max_attempts {
                        let delay = self.config.retry.delay_for(attempt);
                        warn!(%phase, attempt, error = %e, "transport error, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(EngineError::Transient {
                        phase,
                        attempts: attempt,
                        message: format!("transport error: {e}"),
                    });
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = server_message(&body);

            match code {
                401 | 403 => {
                    self.auth.invalidate().await;
                    if !auth_retried {
                        auth_retried = true;
                        // Does not consume a transient attempt.
                        attempt -= 1;
                        warn!(%phase, status = code, "credentials rejected, re-minting once");
                        continue;
                    }
                    return Err(EngineError::Authentication(format!(
                        "server rejected a freshly minted token during {phase} (status {code}): {message}"
                    )));
                }
                404 => {
                    return Err(EngineError::ResourceNotFound { phase, message });
                }
                400 if phase == Phase::Write => {
                    return Err(EngineError::Validation {
                        phase,
                        path: ENV_FIELD_MASK.to_string(),
                        message,
                    });
                }
                500..=599 => {
                    if attempt < self.config.retry.max_attempts {
                        let delay = self.config.retry.delay_for(attempt);
                        warn!(%phase, attempt, status = code, "server error, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(EngineError::Transient {
                        phase,
                        attempts: attempt,
                        message: format!("status {code}: {message}"),
                    });
                }
                _ => {
                    return Err(EngineError::Protocol {
                        phase,
                        status: code,
                        body: truncate_body(&body),
                    });
                }
            }
        }
    }
}

/// Pull the human-readable message out of a Google-style error body
/// (`{"error": {"message": ...}}`), falling back to the raw body.
fn server_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body)
        && let Some(message) = value.pointer("/error/message").and_then(Value::as_str)
    {
        return message.to_string();
    }
    truncate_body(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_extracts_google_error() {
        let body = r#"{"error": {"code": 400, "message": "field not recognized", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(server_message(body), "field not recognized");
    }

    #[test]
    fn test_server_message_falls_back_to_raw_body() {
        assert_eq!(server_message("<html>bad gateway</html>"), "<html>bad gateway</html>");
    }

    #[test]
    fn test_regional_endpoint_url() {
        let client = EngineClient::new(Arc::new(crate::auth::GcloudTokenProvider));
        let id = EngineId::new("p", "europe-west4", "e-1");
        assert_eq!(
            client.engine_url(&id),
            "https://europe-west4-aiplatform.googleapis.com/v1beta1/projects/p/locations/europe-west4/reasoningEngines/e-1"
        );
    }
}
