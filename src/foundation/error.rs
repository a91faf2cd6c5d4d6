/// Convenience result type used across Prism.
pub type PrismResult<T> = Result<T, PrismError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Configuration problems found while rendering a frame are not errors: they are reported as
/// [`crate::Diagnostic`] values and the frame is skipped. Only failures the caller must act on
/// surface here.
#[derive(thiserror::Error, Debug)]
pub enum PrismError {
    /// Invalid node declaration or description data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Graph configuration problems that cannot be deferred to a frame diagnostic.
    #[error("config error: {0}")]
    Config(String),

    /// Texture allocation failed or the pool hit its limit.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A renderer call failed synchronously.
    #[error("backend error: {0}")]
    Backend(String),

    /// Errors while lexing, parsing or evaluating a size expression.
    #[error("expression error: {0}")]
    Expression(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PrismError {
    /// Build a [`PrismError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PrismError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`PrismError::ResourceExhausted`] value.
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Build a [`PrismError::Backend`] value.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Build a [`PrismError::Expression`] value.
    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    /// Build a [`PrismError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
