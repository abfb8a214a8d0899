//! Structured error types shared across tc-bridge crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`BridgeError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code (`tcb.<area>.<reason>`).
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (handles, paths, operation names).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// Canonical error type for the bridge.
///
/// The variant names the layer that failed. None of these ever reach the host:
/// the trace funnel turns each one into the failure status of the operation
/// that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum BridgeError {
    /// Wire decoding or encoding could not produce a value the call needs.
    #[error("marshal error: {0}")]
    Marshal(ErrorInfo),
    /// A handle did not resolve or its session is unusable.
    #[error("handle error: {0}")]
    Handle(ErrorInfo),
    /// A host callback is missing or answered with an error.
    #[error("callback error: {0}")]
    Callback(ErrorInfo),
    /// The plugin implementation reported a fault.
    #[error("plugin error: {0}")]
    Plugin(ErrorInfo),
    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// The plugin instance is not initialised or was torn down.
    #[error("lifecycle error: {0}")]
    Lifecycle(ErrorInfo),
}

impl BridgeError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            BridgeError::Marshal(info)
            | BridgeError::Handle(info)
            | BridgeError::Callback(info)
            | BridgeError::Plugin(info)
            | BridgeError::Config(info)
            | BridgeError::Lifecycle(info) => info,
        }
    }

    /// Returns the stable code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Shorthand for a plugin fault with the given code and message.
    pub fn plugin(code: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Plugin(ErrorInfo::new(code, message))
    }

    /// Shorthand for a marshaling failure on a required argument.
    pub fn missing_argument(operation: &str, argument: &str) -> Self {
        BridgeError::Marshal(
            ErrorInfo::new(
                "tcb.marshal.missing_argument",
                format!("{operation} received no usable {argument}"),
            )
            .with_context("operation", operation)
            .with_context("argument", argument),
        )
    }

    /// Shorthand for a numeric argument outside its documented range.
    pub fn invalid_code(operation: &str, argument: &str, code: i32) -> Self {
        BridgeError::Marshal(
            ErrorInfo::new(
                "tcb.marshal.invalid_code",
                format!("{operation} received {argument} {code}"),
            )
            .with_context("operation", operation)
            .with_context("argument", argument),
        )
    }

    /// Shorthand for a session opened after shutdown began.
    pub fn shutting_down(operation: &str) -> Self {
        BridgeError::Lifecycle(
            ErrorInfo::new("tcb.lifecycle.closing", "plugin is shutting down")
                .with_context("operation", operation),
        )
    }
}
