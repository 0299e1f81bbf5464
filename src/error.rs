use thiserror::Error;

/// Result type alias for describer and model operations.
pub type Result<T> = std::result::Result<T, VeidtError>;

/// Errors raised by describers, models and their persistence.
///
/// Every variant propagates unchanged to the caller; nothing in this crate
/// retries or substitutes a fallback value.
#[derive(Debug, Error)]
pub enum VeidtError {
    /// A describer received an object it cannot process.
    #[error("unsupported object for {describer}: {reason}")]
    UnsupportedObject {
        describer: &'static str,
        reason: String,
    },

    /// Two arrays that must agree in length (or width) do not.
    #[error("dimension mismatch in {context}: expected {expected}, got {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// A parameter-dependent operation was called before `fit`.
    #[error("{estimator} is not fitted; call fit first")]
    NotFitted { estimator: &'static str },

    /// Descriptor tables with different column layouts were combined.
    #[error("column mismatch: expected {expected:?}, got {found:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A descriptor was built with the same column name twice.
    #[error("duplicate column name `{0}`")]
    DuplicateColumn(String),

    /// A training option or parameter was unknown or out of range.
    #[error("invalid option `{option}` for {estimator}: {reason}")]
    InvalidOption {
        estimator: &'static str,
        option: String,
        reason: String,
    },

    /// A persisted document describes a different type than requested.
    #[error("persisted object is a {found}, expected {expected}")]
    PersistedKind { expected: String, found: String },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Array construction with an inconsistent shape.
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// I/O error (file operations).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
