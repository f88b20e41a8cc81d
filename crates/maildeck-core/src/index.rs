//! Interface to the mail index collaborator.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Another process holds the index write lock. Callers are expected to
    /// retry later instead of treating this as fatal.
    #[error("index locked by another process")]
    Locked,
    #[error("index is read-only")]
    ReadOnly,
    #[error("index failure: {0}")]
    Failure(String),
}

/// The mail index as the interaction core sees it. The real implementation
/// lives outside this workspace; tests script one.
pub trait MailIndex {
    /// Commit queued writes to the index.
    fn flush(&mut self) -> Result<(), IndexError>;

    /// Every tag present in the index, unsorted.
    fn all_tags(&self) -> Result<Vec<String>, IndexError>;
}
