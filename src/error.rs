use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn one configured source into a dataset.
///
/// Always scoped to a single dataset: the store logs it and carries on with
/// the remaining descriptors.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("{name}: source {} not found", path.display())]
    MissingSource { name: String, path: PathBuf },

    #[error("{name}: cannot read {}: {reason}", path.display())]
    Unreadable {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("{name}: unsupported source format .{extension}")]
    UnsupportedFormat { name: String, extension: String },

    #[error("{name}: column '{column}' not present in source")]
    MissingColumn { name: String, column: String },

    #[error("{name}: no valid rows after cleaning")]
    Empty { name: String },

    #[error("{name}: a dataset with this name is already loaded")]
    DuplicateName { name: String },
}

impl IngestionError {
    /// Name of the dataset the failure belongs to.
    pub fn dataset(&self) -> &str {
        match self {
            IngestionError::MissingSource { name, .. }
            | IngestionError::Unreadable { name, .. }
            | IngestionError::UnsupportedFormat { name, .. }
            | IngestionError::MissingColumn { name, .. }
            | IngestionError::Empty { name }
            | IngestionError::DuplicateName { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dataset not found: {0}")]
pub struct NotFoundError(pub String);

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no series selected")]
    NoSeriesSelected,

    #[error("an export is already in progress")]
    Busy,

    #[error("failed to render figure: {0}")]
    Render(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
