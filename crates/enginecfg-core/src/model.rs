//! Resource identifiers and wire types for the reasoning-engine control plane

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, Phase, Result, truncate_body};

/// Field path the update mask is scoped to. Casing must match the server
/// contract exactly; a snake_case or root-level variant is rejected with
/// "field not recognized".
pub const ENV_FIELD_MASK: &str = "spec.deploymentSpec.env";

/// Fully-qualified identifier of a deployed reasoning engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineId {
    pub project: String,
    pub location: String,
    pub engine: String,
}

impl EngineId {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        engine: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            engine: engine.into(),
        }
    }

    /// REST resource path relative to the API version root.
    pub fn resource_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/reasoningEngines/{}",
            self.project, self.location, self.engine
        )
    }
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.resource_path())
    }
}

/// A single environment variable entry as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The full document returned by GET. Sibling fields are opaque; only the
/// env collection at `spec.deploymentSpec.env` is interpreted.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    raw: Value,
}

impl EngineSnapshot {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    /// Extract the env collection. An absent path is an engine with no
    /// variables configured yet, not an error; a present-but-malformed
    /// value is a protocol violation.
    pub fn env_vars(&self, phase: Phase) -> Result<Vec<EnvVar>> {
        match self.raw.pointer("/spec/deploymentSpec/env") {
            None => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|e| EngineError::Protocol {
                    phase,
                    status: 200,
                    body: truncate_body(&format!(
                        "malformed {ENV_FIELD_MASK} field: {e}: {value}"
                    )),
                })
            }
        }
    }
}

/// PATCH body. Serialize-only and nesting exactly the env field path, so a
/// write can never carry sibling fields of the document it was derived from.
#[derive(Serialize)]
pub(crate) struct EnvPatchBody<'a> {
    pub spec: EnvPatchSpec<'a>,
}

#[derive(Serialize)]
pub(crate) struct EnvPatchSpec<'a> {
    #[serde(rename = "deploymentSpec")]
    pub deployment_spec: EnvPatchDeploymentSpec<'a>,
}

#[derive(Serialize)]
pub(crate) struct EnvPatchDeploymentSpec<'a> {
    pub env: &'a [EnvVar],
}

impl<'a> EnvPatchBody<'a> {
    pub fn new(env: &'a [EnvVar]) -> Self {
        Self {
            spec: EnvPatchSpec {
                deployment_spec: EnvPatchDeploymentSpec { env },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_path() {
        let id = EngineId::new("proj", "us-central1", "engine-123");
        assert_eq!(
            id.resource_path(),
            "projects/proj/locations/us-central1/reasoningEngines/engine-123"
        );
    }

    #[test]
    fn test_snapshot_extracts_env() {
        let snapshot = EngineSnapshot::new(json!({
            "name": "projects/p/locations/l/reasoningEngines/e",
            "spec": {
                "deploymentSpec": {
                    "env": [{"name": "LOG_LEVEL", "value": "debug"}]
                }
            }
        }));
        let vars = snapshot.env_vars(Phase::Fetch).unwrap();
        assert_eq!(vars, vec![EnvVar::new("LOG_LEVEL", "debug")]);
    }

    #[test]
    fn test_snapshot_missing_path_is_empty() {
        let snapshot = EngineSnapshot::new(json!({"name": "whatever"}));
        assert!(snapshot.env_vars(Phase::Fetch).unwrap().is_empty());

        // Partially present path counts as absent too.
        let snapshot = EngineSnapshot::new(json!({"spec": {"deploymentSpec": {}}}));
        assert!(snapshot.env_vars(Phase::Fetch).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_malformed_env_is_protocol_error() {
        let snapshot = EngineSnapshot::new(json!({
            "spec": {"deploymentSpec": {"env": "not-an-array"}}
        }));
        let err = snapshot.env_vars(Phase::Fetch).unwrap_err();
        assert!(matches!(err, EngineError::Protocol { .. }));
    }

    #[test]
    fn test_patch_body_carries_only_env_path() {
        let env = vec![EnvVar::new("A", "1")];
        let body = serde_json::to_value(EnvPatchBody::new(&env)).unwrap();
        assert_eq!(
            body,
            json!({"spec": {"deploymentSpec": {"env": [{"name": "A", "value": "1"}]}}})
        );
        // Top level holds nothing besides `spec`.
        assert_eq!(body.as_object().unwrap().len(), 1);
    }
}
