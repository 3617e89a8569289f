use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DyssolError {
    /// A named unit, stream, feed, holdup, compound, phase, option or
    /// parameter does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A parameter write received a value of an incompatible kind.
    #[error("Type mismatch for parameter '{parameter}': expected {expected}, got {received}")]
    TypeMismatch {
        parameter: String,
        expected: String,
        received: String,
    },

    /// Integer overflow, negative value for an unsigned target, or a
    /// number that does not fit the declared width.
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Malformed comma‑separated list or composition label.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Distribution length or dependent x/y length mismatch.
    #[error("Size mismatch: {0}")]
    SizeMismatch(String),

    /// Unrecognized phase, option enum or distribution name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Materials database, models directory or flowsheet could not be loaded.
    #[error("Load failed: {0}")]
    LoadFailed(String),

    /// Flowsheet could not be written.
    #[error("Save failed: {0}")]
    SaveFailed(String),

    /// Error string reported by the engine (initialization, solver).
    #[error("Engine error: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, DyssolError>;
