use crate::foundation::error::PrismError;

/// Lex or parse failure, located by byte offset into the expression source.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (offset {offset})")]
pub(crate) struct ExprError {
    pub(crate) offset: usize,
    pub(crate) message: String,
}

impl ExprError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl From<ExprError> for PrismError {
    fn from(e: ExprError) -> Self {
        PrismError::expression(e.to_string())
    }
}
