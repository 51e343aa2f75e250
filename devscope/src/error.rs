//! Error types for devscope.
//!
//! The engine distinguishes *why* a value is missing, because each layer
//! reacts differently:
//!
//! | Variant                | Conditions | Readers   | Communicator façade      |
//! |------------------------|------------|-----------|--------------------------|
//! | `Transport`            | false      | surfaced  | surfaced                 |
//! | `NotFound`             | false      | surfaced  | continue with parent     |
//! | `NotImplemented`       | -          | -         | continue with parent     |
//! | `ComponentNotFound`    | -          | -         | returned directly        |
//! | `PreCondition`         | raised     | skipped   | continue with parent     |
//! | `DidNotMatch`          | -          | next one  | continue with parent     |

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for devscope operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SNMP/HTTP transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device answered, but the requested object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// No reader is defined for this getter on any level
    #[error("Not implemented")]
    NotImplemented,

    /// The component is disabled for the resolved device class
    #[error("Component '{0}' is not available for this device class")]
    ComponentNotFound(String),

    /// An identify field was read before it was determined
    #[error("Pre-condition failed: {0}")]
    PreCondition(String),

    /// A filter operator rejected the value
    #[error("Value did not match: {0}")]
    DidNotMatch(String),

    /// Value conversion or arithmetic errors
    #[error("Value error: {0}")]
    Value(#[from] ValueError),

    /// Device class file errors
    #[error("Device class error: {0}")]
    Class(#[from] ClassError),

    /// Invalid property filter passed by the caller
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// The operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    /// "No such object / instance" or an empty result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// No reader was defined for the getter.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Error::NotImplemented)
    }

    /// Transport-level failure (timeout, refused, malformed response).
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// The value is simply not available; callers may try something else.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::NotImplemented
                | Error::PreCondition(_)
                | Error::DidNotMatch(_)
        )
    }

    /// Short, stable name of the error category, used in trace logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport(TransportError::Snmp(_)) => "snmp",
            Error::Transport(_) => "network",
            Error::NotFound(_) => "not-found",
            Error::NotImplemented => "not-implemented",
            Error::ComponentNotFound(_) => "component-not-found",
            Error::PreCondition(_) => "pre-condition",
            Error::DidNotMatch(_) => "did-not-match",
            Error::Value(_) => "value",
            Error::Class(_) => "class",
            Error::InvalidFilter(_) => "invalid-filter",
            Error::Cancelled => "cancelled",
        }
    }
}

/// Transport layer errors (SNMP and HTTP).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request timed out after all retries
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The device did not answer a single probe
    #[error("Device did not answer any probe")]
    NoResponse,

    /// Failed to reach the host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The operation needs a transport that was not configured
    #[error("No {0} transport available")]
    Unavailable(&'static str),

    /// SNMP protocol error (malformed response, error status)
    #[error("SNMP error: {0}")]
    Snmp(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request could not be built (bad header, bad URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Non-success HTTP status
    #[error("HTTP request to '{uri}' returned status {status}")]
    HttpStatus { uri: String, status: u16 },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Value conversion errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The value is not a number
    #[error("'{0}' is not a number")]
    NotNumeric(String),

    /// The value is not a boolean
    #[error("'{0}' is not a boolean")]
    NotBoolean(String),

    /// The value does not fit the requested integer type
    #[error("'{0}' is out of range")]
    OutOfRange(String),

    /// Division by zero in an arithmetic operator
    #[error("Division by zero")]
    DivisionByZero,

    /// Arithmetic overflow in an arithmetic operator
    #[error("Arithmetic overflow")]
    Overflow,

    /// Malformed OID
    #[error("Invalid OID '{0}'")]
    InvalidOid(String),

    /// Two table rows were mapped onto the same index
    #[error("Index '{0}' is mapped more than once")]
    DuplicateIndex(String),
}

/// Device class loading errors.
#[derive(Error, Debug)]
pub enum ClassError {
    /// Invalid class definition
    #[error("Invalid device class '{class}': {message}")]
    InvalidDefinition { class: String, message: String },

    /// Invalid regex in a class file
    #[error("Invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// YAML syntax or schema error
    #[error("Failed to parse '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Unexpected file in the class directory
    #[error("Unexpected file '{0}' in device class directory")]
    UnexpectedFile(PathBuf),

    /// Unknown mapping file referenced by a map operator
    #[error("Unknown mapping file '{0}'")]
    UnknownMapping(String),

    /// A code extension with this name is already registered
    #[error("Code extension '{name}' is already registered")]
    ExtensionAlreadyRegistered { name: String },

    /// I/O error while reading the class directory
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ClassError {
    pub(crate) fn invalid(class: impl Into<String>, message: impl Into<String>) -> Self {
        ClassError::InvalidDefinition {
            class: class.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using devscope's Error.
pub type Result<T> = std::result::Result<T, Error>;
