//! Error types for the reconcile pipeline

use thiserror::Error;

/// Truncate error bodies to prevent leaking large or sensitive responses.
pub(crate) const MAX_ERROR_BODY: usize = 512;

/// Pipeline phase an error surfaced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetch,
    Merge,
    Write,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Fetch => write!(f, "fetch"),
            Phase::Merge => write!(f, "merge"),
            Phase::Write => write!(f, "write"),
        }
    }
}

/// Error taxonomy for engine configuration operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Identity provider unreachable, unauthenticated, or the server rejected
    /// a freshly minted token. Not retried; re-authenticate out of band.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// 404 from the control plane. The project/location/engine triple is
    /// wrong; no write is attempted.
    #[error("reasoning engine not found during {phase}: {message}")]
    ResourceNotFound { phase: Phase, message: String },

    /// The server rejected the field path or payload shape. Indicates the
    /// `spec.deploymentSpec.env` contract has drifted; carries the exact
    /// path and server message for diagnosis. Never retried.
    #[error("server rejected field path '{path}' during {phase}: {message}")]
    Validation {
        phase: Phase,
        path: String,
        message: String,
    },

    /// 5xx or transport failure that survived the bounded retry policy.
    #[error("transient failure during {phase} after {attempts} attempt(s): {message}")]
    Transient {
        phase: Phase,
        attempts: u32,
        message: String,
    },

    /// Any other non-2xx status or an unparsable response body.
    #[error("unexpected response during {phase} (status {status}): {body}")]
    Protocol {
        phase: Phase,
        status: u16,
        body: String,
    },
}

impl EngineError {
    pub fn phase(&self) -> Option<Phase> {
        match self {
            EngineError::Authentication(_) => None,
            EngineError::ResourceNotFound { phase, .. }
            | EngineError::Validation { phase, .. }
            | EngineError::Transient { phase, .. }
            | EngineError::Protocol { phase, .. } => Some(*phase),
        }
    }
}

/// Result type alias for engine configuration operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Clamp a response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(2048);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("... [truncated]"));
        assert!(truncated.len() < body.len());
    }

    #[test]
    fn test_short_body_untouched() {
        assert_eq!(truncate_body("field not recognized"), "field not recognized");
    }

    #[test]
    fn test_error_names_phase() {
        let err = EngineError::ResourceNotFound {
            phase: Phase::Fetch,
            message: "engine missing".to_string(),
        };
        assert_eq!(err.phase(), Some(Phase::Fetch));
        assert!(err.to_string().contains("fetch"));
    }
}
