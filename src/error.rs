use thiserror::Error;

use crate::parameters::expression::ExpressionError;
use crate::parameters::parameter::ParameterError;

/// Error types for the galkin-rs library.
#[derive(Error, Debug)]
pub enum GalkinError {
    /// A required setting or collaborator is missing or inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A component with the same name already exists in the model set.
    #[error("Component '{0}' already exists; component names must be unique")]
    DuplicateComponent(String),

    /// The named component is not part of the model set.
    #[error("Component '{0}' is not part of the model set")]
    ComponentNotFound(String),

    /// The named parameter does not belong to the component.
    #[error("Parameter '{param}' is not part of component '{component}'")]
    ParameterNotFound { component: String, param: String },

    /// A flat parameter vector had the wrong length.
    #[error("Length mismatch: expected {expected} values, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// Unknown mass-component subtype.
    #[error("Mass subtype '{0}' not recognized; expected 'baryonic', 'dark_matter' or 'combined'")]
    InvalidSubtype(String),

    /// An external collaborator needed for the requested computation is absent.
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(String),

    /// Requested physical configuration is not supported.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Tie expression failed to parse or evaluate.
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Parameter-level error.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Array shape error.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Root finding failed outside a context with a documented fallback.
    #[error("Root finding error: {0:?}")]
    RootFinding(roots::SearchError),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<roots::SearchError> for GalkinError {
    fn from(err: roots::SearchError) -> Self {
        GalkinError::RootFinding(err)
    }
}

/// Result type alias for galkin-rs operations.
pub type Result<T> = std::result::Result<T, GalkinError>;
