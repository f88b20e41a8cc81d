//! Rendering-side collaborator interface.
//!
//! The engine never draws. It tells the screen what changed and what
//! question is on display; widget layout, input handling and completion
//! cycling happen on the other side of this trait.

use std::fmt;

use maildeck_core::abook::Completer;

use crate::buffers::BufferId;

/// A line prompt awaiting user input.
pub struct PromptSpec {
    pub prefix: String,
    pub initial: String,
    /// Opaque completion source for the input line; the engine never calls
    /// it.
    pub completer: Option<Box<dyn Completer>>,
}

impl PromptSpec {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            initial: String::new(),
            completer: None,
        }
    }

    #[must_use]
    pub fn with_initial(mut self, initial: &str) -> Self {
        self.initial = initial.to_string();
        self
    }

    #[must_use]
    pub fn with_completer(mut self, completer: Box<dyn Completer>) -> Self {
        self.completer = Some(completer);
        self
    }
}

impl fmt::Debug for PromptSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptSpec")
            .field("prefix", &self.prefix)
            .field("initial", &self.initial)
            .field("completer", &self.completer.is_some())
            .finish()
    }
}

/// A multiple-choice question. `select` is the answer delivered for a bare
/// confirmation, `cancel` the answer delivered when the user backs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSpec {
    pub question: String,
    pub options: Vec<String>,
    pub select: String,
    pub cancel: String,
}

impl ChoiceSpec {
    #[must_use]
    pub fn yes_no(question: &str) -> Self {
        Self {
            question: question.to_string(),
            options: vec!["yes".to_string(), "no".to_string()],
            select: "yes".to_string(),
            cancel: "no".to_string(),
        }
    }
}

/// What the interaction core needs from the rendering side.
pub trait Screen {
    fn buffer_opened(&mut self, id: BufferId, title: &str);
    fn buffer_closed(&mut self, id: BufferId);
    fn buffer_focused(&mut self, id: BufferId);
    fn buffer_refreshed(&mut self, id: BufferId);

    /// Show a transient message.
    fn notify(&mut self, message: &str);

    fn show_prompt(&mut self, spec: &PromptSpec);
    fn show_choice(&mut self, spec: &ChoiceSpec);
    fn clear_question(&mut self);

    /// Release the terminal before a foreground child runs.
    fn suspend(&mut self);
    /// Take the terminal back after the child exited.
    fn resume(&mut self);

    /// Open the command prompt pre-filled with `initial`.
    fn open_command_prompt(&mut self, initial: &str);
    /// Feed a synthetic keypress to the focused widget.
    fn send_keypress(&mut self, key: &str);
}
