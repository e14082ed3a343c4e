use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while projecting, rendering, or archiving an export batch.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Record type {type_name} exposes no exportable fields")]
    TypeIntrospection { type_name: String },

    #[error("Record {row} of {type_name} does not match its columns: {detail}")]
    ShapeMismatch {
        type_name: String,
        row: usize,
        detail: String,
    },

    #[error("Failed to render {format}: {message}")]
    Render {
        format: &'static str,
        message: String,
    },

    #[error("Record type has {available} columns but the document shows at most {max}")]
    ColumnLimitExceeded { available: usize, max: usize },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Duplicate archive entry: {filename}")]
    DuplicateEntry { filename: String },

    #[error("Invalid invoker state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Broad grouping used when reporting a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The record type or record values are unusable.
    Data,
    /// A renderer could not produce its format.
    Render,
    /// Building or writing the archive failed.
    Io,
    /// The caller misused the invoker or supplied bad configuration.
    Usage,
}

impl ExportError {
    /// Wraps a renderer failure, keeping the whole `anyhow` context chain.
    pub fn render(format: &'static str, err: anyhow::Error) -> Self {
        Self::Render {
            format,
            message: format!("{err:#}"),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TypeIntrospection { .. } | Self::ShapeMismatch { .. } => ErrorCategory::Data,
            Self::Render { .. } | Self::ColumnLimitExceeded { .. } => ErrorCategory::Render,
            Self::Archive(_) => ErrorCategory::Io,
            Self::DuplicateEntry { .. } | Self::InvalidState(_) | Self::Config(_) => {
                ErrorCategory::Usage
            }
        }
    }

    /// Returns the message shown to the person running the export.
    pub fn user_message(&self) -> String {
        match self {
            Self::TypeIntrospection { type_name } => {
                format!("Nothing to export: {type_name} has no fields.")
            }
            Self::ShapeMismatch { type_name, row, .. } => {
                format!("Record {row} of {type_name} is malformed.")
            }
            Self::Render { format, message } => format!("Could not create {format} file: {message}"),
            Self::ColumnLimitExceeded { available, max } => format!(
                "The document can show {max} columns but the records have {available}. \
                 Raise max_columns or allow truncation."
            ),
            Self::Archive(_) => "Could not write the archive. Check disk space and permissions.".into(),
            Self::DuplicateEntry { filename } => {
                format!("Two exports would both be named {filename}.")
            }
            Self::InvalidState(msg) => format!("Export batch misuse: {msg}"),
            Self::Config(msg) => format!("Configuration issue: {msg}"),
        }
    }
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
