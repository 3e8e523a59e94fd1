//! Error types for ACL compilation.
//!
//! All errors implement `std::error::Error` via `thiserror`. Missing
//! directory objects are deliberately not represented here: a dangling
//! subnet or group reference contributes no entries instead of failing.

use std::io;
use thiserror::Error;

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors that can occur while compiling ACLs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The rule's protocol is neither a number in 0-255 nor a known name.
    #[error(
        "The protocol \"{protocol}\" is not supported. Valid protocols are: \
         {valid_protocols}; or protocol numbers ranging from 0 to 255."
    )]
    UnsupportedProtocol {
        /// The offending protocol token.
        protocol: String,
        /// Comma-separated list of every supported protocol name.
        valid_protocols: String,
    },

    /// The apply collaborator rejected the compiled entries.
    #[error("Failed to apply ACLs: {0}")]
    Apply(String),
}

impl CompileError {
    /// Creates an unsupported protocol error.
    pub fn unsupported_protocol(
        protocol: impl Into<String>,
        valid_protocols: impl Into<String>,
    ) -> Self {
        Self::UnsupportedProtocol {
            protocol: protocol.into(),
            valid_protocols: valid_protocols.into(),
        }
    }
}

/// Errors that can occur while loading compiler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}
