//! Domain errors for the adaptest toolkit.
//!
//! These are the errors ports may return. Services translate them into
//! [`Diagnostic`](crate::domain::models::Diagnostic)s rather than propagating.

use thiserror::Error;

/// Errors from a persisted collection store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed store {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the test synthesizer collaborator.
#[derive(Debug, Error)]
pub enum SynthesizerError {
    #[error("Synthesizer unavailable: {0}")]
    Unavailable(String),

    #[error("Synthesizer request timed out")]
    Timeout,

    #[error("Synthesizer returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed synthesizer response: {0}")]
    MalformedResponse(String),
}

/// Errors from the external test runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to spawn test runner `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Test runner exceeded timeout of {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_status_and_timeout() {
        let status = SynthesizerError::Status {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(
            status.to_string(),
            "Synthesizer returned status 503: overloaded"
        );
        assert_eq!(
            RunnerError::Timeout { timeout_secs: 300 }.to_string(),
            "Test runner exceeded timeout of 300s"
        );
    }
}
