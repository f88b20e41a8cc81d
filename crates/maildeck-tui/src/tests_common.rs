//! Shared recording fixtures for engine tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use maildeck_core::abook::{AddressBook, Contact};
use maildeck_core::accounts::{Account, Accounts};
use maildeck_core::index::{IndexError, MailIndex};
use maildeck_core::settings::Settings;

use crate::buffers::BufferId;
use crate::globals;
use crate::registry::RegistryBuilder;
use crate::screen::{ChoiceSpec, PromptSpec, Screen};
use crate::ui::Ui;

/// Everything the recording screen saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    Opened(BufferId, String),
    Closed(BufferId),
    Focused(BufferId),
    Refreshed(BufferId),
    Notified(String),
    PromptShown(String),
    ChoiceShown(String),
    QuestionCleared,
    Suspended,
    Resumed,
    CommandPromptOpened(String),
    Keypress(String),
}

/// Shared handle on the recorded event list.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<ScreenEvent>>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<ScreenEvent> {
        self.events.borrow().clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ScreenEvent::Notified(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ScreenEvent::PromptShown(prefix) => Some(prefix.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn choices(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ScreenEvent::ChoiceShown(question) => Some(question.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn keypresses(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ScreenEvent::Keypress(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: ScreenEvent) {
        self.events.borrow_mut().push(event);
    }
}

pub struct RecordingScreen {
    log: EventLog,
}

impl RecordingScreen {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl Screen for RecordingScreen {
    fn buffer_opened(&mut self, id: BufferId, title: &str) {
        self.log.push(ScreenEvent::Opened(id, title.to_string()));
    }

    fn buffer_closed(&mut self, id: BufferId) {
        self.log.push(ScreenEvent::Closed(id));
    }

    fn buffer_focused(&mut self, id: BufferId) {
        self.log.push(ScreenEvent::Focused(id));
    }

    fn buffer_refreshed(&mut self, id: BufferId) {
        self.log.push(ScreenEvent::Refreshed(id));
    }

    fn notify(&mut self, message: &str) {
        self.log.push(ScreenEvent::Notified(message.to_string()));
    }

    fn show_prompt(&mut self, spec: &PromptSpec) {
        self.log.push(ScreenEvent::PromptShown(spec.prefix.clone()));
    }

    fn show_choice(&mut self, spec: &ChoiceSpec) {
        self.log.push(ScreenEvent::ChoiceShown(spec.question.clone()));
    }

    fn clear_question(&mut self) {
        self.log.push(ScreenEvent::QuestionCleared);
    }

    fn suspend(&mut self) {
        self.log.push(ScreenEvent::Suspended);
    }

    fn resume(&mut self) {
        self.log.push(ScreenEvent::Resumed);
    }

    fn open_command_prompt(&mut self, initial: &str) {
        self.log
            .push(ScreenEvent::CommandPromptOpened(initial.to_string()));
    }

    fn send_keypress(&mut self, key: &str) {
        self.log.push(ScreenEvent::Keypress(key.to_string()));
    }
}

/// Scripted flush outcomes, consumed front to back; empty means success.
pub type FlushScript = Rc<RefCell<VecDeque<Result<(), IndexError>>>>;

pub struct FakeIndex {
    pub flush_script: FlushScript,
    pub flush_calls: Rc<RefCell<usize>>,
    pub tags: Vec<String>,
}

impl FakeIndex {
    pub fn new(tags: &[&str]) -> Self {
        Self {
            flush_script: Rc::new(RefCell::new(VecDeque::new())),
            flush_calls: Rc::new(RefCell::new(0)),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

impl MailIndex for FakeIndex {
    fn flush(&mut self) -> Result<(), IndexError> {
        *self.flush_calls.borrow_mut() += 1;
        self.flush_script.borrow_mut().pop_front().unwrap_or(Ok(()))
    }

    fn all_tags(&self) -> Result<Vec<String>, IndexError> {
        Ok(self.tags.clone())
    }
}

/// Engine wired to recording collaborators, with handles kept out so tests
/// can script and inspect them.
pub struct TestUi {
    pub ui: Ui,
    pub events: EventLog,
    pub flush_script: FlushScript,
    pub flush_calls: Rc<RefCell<usize>>,
}

pub fn test_settings() -> Settings {
    Settings {
        bug_on_exit: false,
        ask_subject: true,
        complete_matching_abook_only: false,
        spawn_editor: false,
        editor_cmd: "editor".to_string(),
        terminal_cmd: "x-terminal-emulator -e".to_string(),
        flush_retry_timeout_secs: 5,
        log_file: None,
    }
}

pub fn test_accounts() -> Accounts {
    Accounts::new(vec![
        Account {
            realname: "Ada Lovelace".to_string(),
            address: "ada@example.org".to_string(),
            aliases: vec!["lovelace@example.org".to_string()],
            abooks: vec![AddressBook {
                contacts: vec![Contact {
                    name: "Charles Babbage".to_string(),
                    address: "charles@example.org".to_string(),
                }],
            }],
        },
        Account {
            realname: "Bob".to_string(),
            address: "bob@example.org".to_string(),
            aliases: Vec::new(),
            abooks: Vec::new(),
        },
    ])
}

pub fn test_ui() -> TestUi {
    test_ui_with(test_settings(), test_accounts())
}

pub fn test_ui_with(settings: Settings, accounts: Accounts) -> TestUi {
    let events = EventLog::default();
    let index = FakeIndex::new(&["inbox", "unread"]);
    let flush_script = index.flush_script.clone();
    let flush_calls = index.flush_calls.clone();

    let mut builder = RegistryBuilder::new();
    globals::register_builtins(&mut builder);

    let ui = Ui::new(
        builder.build(),
        Box::new(RecordingScreen::new(events.clone())),
        Box::new(index),
        accounts,
        settings,
    );
    TestUi {
        ui,
        events,
        flush_script,
        flush_calls,
    }
}
