// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the Kandy bridge.

use serde_json::Value;
use thiserror::Error;

/// Top-level error type for all Kandy bridge operations.
#[derive(Debug, Error)]
pub enum KandyError {
    // -- Native invocation --
    /// The native layer rejected the command. The payload is whatever the
    /// native side reported, untouched.
    #[error("native command `{command}` failed: {payload}")]
    Native { command: String, payload: Value },

    #[error("native invoker dropped command `{0}` without answering")]
    InvokerClosed(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Widgets --
    #[error("unknown widget kind: {0}")]
    UnknownWidget(String),

    #[error("no element with id `{0}`")]
    UnknownElement(String),

    #[error("id `{0}` is already in use")]
    DuplicateId(String),

    #[error("bridge already initialized")]
    AlreadyInitialized,

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KandyError {
    /// The value handed to an error hook or the default error action.
    ///
    /// Native failures pass their payload through verbatim; everything else
    /// is reported as its display string.
    pub fn payload(&self) -> Value {
        match self {
            Self::Native { payload, .. } => payload.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KandyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn native_payload_is_verbatim() {
        let err = KandyError::Native {
            command: "login".into(),
            payload: json!({"code": 401, "message": "bad password"}),
        };
        assert_eq!(err.payload(), json!({"code": 401, "message": "bad password"}));
    }

    #[test]
    fn other_errors_report_their_message() {
        let err = KandyError::InvokerClosed("logout".into());
        assert_eq!(
            err.payload(),
            json!("native invoker dropped command `logout` without answering")
        );
    }
}
