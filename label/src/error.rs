use thiserror::Error;

/// The error raised when a category or token is not part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("token index {0} is out of vocabulary")]
    InvalidToken(i64),
}
