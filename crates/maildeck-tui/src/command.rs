//! The command abstraction and its error taxonomy.

use maildeck_core::index::IndexError;
use thiserror::Error;

use crate::argspec::ParseError;
use crate::ui::Ui;

/// Everything that can go wrong while building or applying a command.
/// None of these terminate the interaction loop; the dispatch boundary
/// turns them into user notifications.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("no command '{name}' in mode '{mode}'")]
    Unknown { mode: String, name: String },

    /// An operation was attempted in a state that cannot support it, such
    /// as cycling focus on an empty buffer stack.
    #[error("{0}")]
    Precondition(String),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// The child process could not be started at all. A child that starts
    /// and exits non-zero is not an error; it is logged and dropped.
    #[error("failed to run '{command}': {message}")]
    Spawn { command: String, message: String },
}

impl CommandError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }
}

/// A single executable command. Instances are built by the registry from
/// resolved arguments and consumed by one `apply` call. Commands that need
/// an answer from the user install a continuation on the [`Ui`] and return;
/// the engine resumes them when the answer arrives.
pub trait Command {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError>;
}
