use thiserror::Error;

use crate::structure::ObjectKind;

/// schemasnap errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Cannot snapshot {kind} on {database}: {message}")]
    Unsupported {
        database: String,
        kind: ObjectKind,
        message: String,
    },

    #[error("Unexpected state: {0}")]
    Invariant(String),

    #[error("Metadata query '{operation}' failed: {message}")]
    Execution { operation: String, message: String },

    #[error("Failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },

    #[error("Failed to render output: {0}")]
    Output(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
