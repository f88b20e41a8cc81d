//! The execution engine: one logical thread of control.
//!
//! `Ui` owns the buffer stack and the collaborators, parses prompt lines
//! against the focused buffer's mode, and carries suspended work: the
//! pending question's continuation, scheduled tasks, and background
//! process jobs. All state mutation happens on the caller's thread; worker
//! threads only ever send on the completion channel.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use maildeck_core::accounts::Accounts;
use maildeck_core::index::MailIndex;
use maildeck_core::settings::Settings;

use crate::buffers::{
    Buffer, BufferId, BufferKind, BufferListBuffer, BufferStack, SearchBuffer, TagListBuffer,
};
use crate::command::{Command, CommandError};
use crate::exec::{self, ProcessCompletion};
use crate::log::SessionLog;
use crate::registry::CommandRegistry;
use crate::screen::{ChoiceSpec, PromptSpec, Screen};

pub type PromptHandler = Box<dyn FnOnce(&mut Ui, Option<String>)>;
pub type ChoiceHandler = Box<dyn FnOnce(&mut Ui, String)>;
/// Continuation run after a successful external command.
pub type OnSuccess = Box<dyn FnOnce(&mut Ui)>;
type ScheduledFn = Box<dyn FnOnce(&mut Ui)>;

enum PendingAsk {
    Prompt { spec: PromptSpec, then: PromptHandler },
    Choice { spec: ChoiceSpec, then: ChoiceHandler },
}

/// Read-only view of the question currently on display.
#[derive(Debug)]
pub enum PendingQuestion<'a> {
    Prompt(&'a PromptSpec),
    Choice(&'a ChoiceSpec),
}

struct ScheduledTask {
    due: Instant,
    seq: u64,
    run: ScheduledFn,
}

struct PendingJob {
    on_success: Option<OnSuccess>,
    refocus: Option<BufferId>,
    worker: JoinHandle<()>,
}

/// Request for the external process bridge.
pub struct ExternalSpec {
    /// Command template; `{}` is replaced with the quoted path.
    pub command: String,
    pub path: Option<String>,
    /// Prefix the configured terminal launcher.
    pub spawn_terminal: bool,
    /// Run on a worker thread instead of blocking with the screen
    /// suspended.
    pub background: bool,
    /// Refocus the calling buffer after a successful exit, if it is still
    /// open.
    pub refocus: bool,
    pub on_success: Option<OnSuccess>,
}

impl ExternalSpec {
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            path: None,
            spawn_terminal: false,
            background: false,
            refocus: true,
            on_success: None,
        }
    }
}

pub struct Ui {
    registry: CommandRegistry,
    stack: BufferStack,
    screen: Box<dyn Screen>,
    index: Box<dyn MailIndex>,
    accounts: Accounts,
    settings: Settings,
    log: SessionLog,
    pending_ask: Option<PendingAsk>,
    timers: Vec<ScheduledTask>,
    timer_seq: u64,
    jobs: HashMap<u64, PendingJob>,
    next_job: u64,
    completion_tx: Sender<ProcessCompletion>,
    completion_rx: Receiver<ProcessCompletion>,
    exit_requested: bool,
}

impl Ui {
    pub fn new(
        registry: CommandRegistry,
        screen: Box<dyn Screen>,
        index: Box<dyn MailIndex>,
        accounts: Accounts,
        settings: Settings,
    ) -> Self {
        let log = match &settings.log_file {
            Some(path) => SessionLog::open(path).unwrap_or_else(|_| SessionLog::disabled()),
            None => SessionLog::disabled(),
        };
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            registry,
            stack: BufferStack::new(),
            screen,
            index,
            accounts,
            settings,
            log,
            pending_ask: None,
            timers: Vec::new(),
            timer_seq: 0,
            jobs: HashMap::new(),
            next_job: 0,
            completion_tx,
            completion_rx,
            exit_requested: false,
        }
    }

    // -----------------------------------------------------------------
    // Collaborator access
    // -----------------------------------------------------------------

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    #[must_use]
    pub fn index(&self) -> &dyn MailIndex {
        self.index.as_ref()
    }

    pub fn index_mut(&mut self) -> &mut dyn MailIndex {
        self.index.as_mut()
    }

    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    #[must_use]
    pub fn stack(&self) -> &BufferStack {
        &self.stack
    }

    pub fn buffer_mut(&mut self, id: BufferId) -> Option<&mut Box<dyn Buffer>> {
        self.stack.get_mut(id)
    }

    /// Command mode of the focused buffer; "global" for an empty stack.
    #[must_use]
    pub fn current_mode(&self) -> &'static str {
        self.stack.current_mode()
    }

    // -----------------------------------------------------------------
    // Dispatch boundary
    // -----------------------------------------------------------------

    /// Parse and apply one prompt line. Every failure ends here as a
    /// notification; nothing terminates the interaction loop.
    pub fn dispatch_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let mode = self.current_mode();
        let _ = self.log.write_line(&format!("dispatch [{mode}]: {line}"));
        if self.pending_ask.is_some() {
            self.notify("a question is pending; answer or cancel it first");
            return;
        }
        match self.registry.parse_command_line(mode, line) {
            Ok(command) => self.apply_command(command),
            Err(err) => {
                let _ = self.log.write_line(&format!("parse error: {err}"));
                self.notify(&err.to_string());
            }
        }
    }

    /// Apply a built command, converting its error into a notification.
    pub fn apply_command(&mut self, command: Box<dyn Command>) {
        if let Err(err) = command.apply(self) {
            let _ = self.log.write_line(&format!("command error: {err}"));
            self.notify(&err.to_string());
        }
    }

    pub fn notify(&mut self, message: &str) {
        self.screen.notify(message);
    }

    // -----------------------------------------------------------------
    // Buffer operations
    // -----------------------------------------------------------------

    /// Append `buffer` to the stack and focus it.
    pub fn open_buffer(&mut self, buffer: Box<dyn Buffer>) -> BufferId {
        let title = buffer.title();
        let kind = buffer.kind();
        let id = self.stack.open(buffer);
        self.screen.buffer_opened(id, &title);
        self.screen.buffer_focused(id);
        if kind == BufferKind::BufferList {
            self.snapshot_buffer_list(id);
        }
        let _ = self.log.write_line(&format!("buffer opened {id}: {title}"));
        id
    }

    pub fn close_buffer(&mut self, id: BufferId) -> Result<(), CommandError> {
        if self.stack.close(id).is_none() {
            return Err(CommandError::precondition(format!("no buffer {id}")));
        }
        self.screen.buffer_closed(id);
        if let Some(focused) = self.stack.focused() {
            self.screen.buffer_focused(focused);
        }
        let _ = self.log.write_line(&format!("buffer closed {id}"));
        Ok(())
    }

    pub fn focus_buffer(&mut self, id: BufferId) -> Result<(), CommandError> {
        if self.stack.focus(id) {
            self.screen.buffer_focused(id);
            Ok(())
        } else {
            Err(CommandError::precondition(format!("no buffer {id}")))
        }
    }

    /// Move focus by a signed offset with wraparound. The stack must be
    /// non-empty.
    pub fn cycle_focus(&mut self, offset: isize) -> Result<(), CommandError> {
        match self.stack.cycle_focus(offset) {
            Some(id) => {
                self.screen.buffer_focused(id);
                Ok(())
            }
            None => Err(CommandError::precondition(
                "cannot cycle focus on an empty buffer stack",
            )),
        }
    }

    pub fn refresh_focused(&mut self) -> Result<(), CommandError> {
        match self.stack.focused() {
            Some(id) => self.refresh_buffer(id),
            None => Err(CommandError::precondition("no buffer to refresh")),
        }
    }

    /// Recompute the buffer's view-model and tell the renderer.
    pub fn refresh_buffer(&mut self, id: BufferId) -> Result<(), CommandError> {
        let Some(kind) = self.stack.get(id).map(Buffer::kind) else {
            return Err(CommandError::precondition(format!("no buffer {id}")));
        };
        match kind {
            BufferKind::BufferList => self.snapshot_buffer_list(id),
            BufferKind::TagList => {
                let tags = self.index.all_tags()?;
                if let Some(buffer) = self.stack.get_mut(id) {
                    if let Some(taglist) = buffer.as_any_mut().downcast_mut::<TagListBuffer>() {
                        taglist.set_tags(tags);
                    }
                }
            }
            BufferKind::Search => {
                if let Some(buffer) = self.stack.get_mut(id) {
                    if let Some(search) = buffer.as_any_mut().downcast_mut::<SearchBuffer>() {
                        search.bump_generation();
                    }
                }
            }
            BufferKind::Envelope => {}
        }
        self.screen.buffer_refreshed(id);
        Ok(())
    }

    fn snapshot_buffer_list(&mut self, id: BufferId) {
        let entries: Vec<(BufferId, String)> = self
            .stack
            .iter()
            .map(|(entry, buffer)| (entry, buffer.title()))
            .collect();
        if let Some(buffer) = self.stack.get_mut(id) {
            if let Some(listing) = buffer.as_any_mut().downcast_mut::<BufferListBuffer>() {
                listing.set_entries(entries);
            }
        }
    }

    // -----------------------------------------------------------------
    // Questions
    // -----------------------------------------------------------------

    /// Suspend for a line of input. `then` runs when the host delivers the
    /// answer; `None` means the user canceled.
    pub fn prompt(
        &mut self,
        spec: PromptSpec,
        then: impl FnOnce(&mut Ui, Option<String>) + 'static,
    ) -> Result<(), CommandError> {
        if self.pending_ask.is_some() {
            return Err(CommandError::precondition("a question is already pending"));
        }
        self.screen.show_prompt(&spec);
        self.pending_ask = Some(PendingAsk::Prompt {
            spec,
            then: Box::new(then),
        });
        Ok(())
    }

    /// Suspend for a multiple-choice answer. Cancellation delivers the
    /// spec's `cancel` value, so `then` sees it like any other option.
    pub fn choice(
        &mut self,
        spec: ChoiceSpec,
        then: impl FnOnce(&mut Ui, String) + 'static,
    ) -> Result<(), CommandError> {
        if self.pending_ask.is_some() {
            return Err(CommandError::precondition("a question is already pending"));
        }
        self.screen.show_choice(&spec);
        self.pending_ask = Some(PendingAsk::Choice {
            spec,
            then: Box::new(then),
        });
        Ok(())
    }

    #[must_use]
    pub fn pending_question(&self) -> Option<PendingQuestion<'_>> {
        match &self.pending_ask {
            Some(PendingAsk::Prompt { spec, .. }) => Some(PendingQuestion::Prompt(spec)),
            Some(PendingAsk::Choice { spec, .. }) => Some(PendingQuestion::Choice(spec)),
            None => None,
        }
    }

    #[must_use]
    pub fn has_pending_question(&self) -> bool {
        self.pending_ask.is_some()
    }

    /// Deliver the prompt answer; `None` cancels.
    pub fn answer_prompt(&mut self, reply: Option<String>) {
        match self.pending_ask.take() {
            Some(PendingAsk::Prompt { then, .. }) => {
                self.screen.clear_question();
                then(self, reply);
            }
            Some(other) => {
                self.pending_ask = Some(other);
                self.notify("no prompt is pending");
            }
            None => self.notify("no prompt is pending"),
        }
    }

    /// Deliver the choice answer; `None` or an unknown option cancels.
    pub fn answer_choice(&mut self, reply: Option<String>) {
        match self.pending_ask.take() {
            Some(PendingAsk::Choice { spec, then }) => {
                self.screen.clear_question();
                let value = match reply {
                    Some(option) if spec.options.contains(&option) => option,
                    _ => spec.cancel.clone(),
                };
                then(self, value);
            }
            Some(other) => {
                self.pending_ask = Some(other);
                self.notify("no choice is pending");
            }
            None => self.notify("no choice is pending"),
        }
    }

    // -----------------------------------------------------------------
    // Scheduled tasks
    // -----------------------------------------------------------------

    pub fn schedule_after(&mut self, delay: Duration, task: impl FnOnce(&mut Ui) + 'static) {
        let due = Instant::now() + delay;
        let seq = self.timer_seq;
        self.timer_seq += 1;
        self.timers.push(ScheduledTask {
            due,
            seq,
            run: Box::new(task),
        });
        let _ = self
            .log
            .write_line(&format!("scheduled task in {}s", delay.as_secs()));
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|task| task.due).min()
    }

    /// Run every task due at `now` in deadline order, schedule order for
    /// ties. A task scheduled by a running task joins the same pass when
    /// already due.
    pub fn run_due(&mut self, now: Instant) {
        loop {
            let mut ready = Vec::new();
            let mut waiting = Vec::new();
            for task in self.timers.drain(..) {
                if task.due <= now {
                    ready.push(task);
                } else {
                    waiting.push(task);
                }
            }
            self.timers = waiting;
            if ready.is_empty() {
                return;
            }
            ready.sort_by_key(|task| (task.due, task.seq));
            for task in ready {
                (task.run)(self);
            }
        }
    }

    // -----------------------------------------------------------------
    // External processes
    // -----------------------------------------------------------------

    /// Run an external command through the bridge. Foreground runs block
    /// with the screen suspended; background runs go to a worker thread
    /// and complete later via [`Ui::poll_externals`]. In both cases the
    /// completion policy is the same: the continuation runs only after a
    /// zero exit, and the calling buffer is refocused only if still open.
    pub fn run_external(&mut self, spec: ExternalSpec) -> Result<(), CommandError> {
        let refocus = if spec.refocus { self.stack.focused() } else { None };
        let command_line = exec::build_command_line(
            &spec.command,
            spec.path.as_deref(),
            spec.spawn_terminal,
            &self.settings.terminal_cmd,
        );
        let argv = exec::split_command(&command_line)?;
        let _ = self
            .log
            .write_line(&format!("calling external command: {command_line}"));

        if spec.background {
            let job = self.next_job;
            self.next_job += 1;
            let worker = exec::spawn_worker(job, argv, self.completion_tx.clone());
            self.jobs.insert(
                job,
                PendingJob {
                    on_success: spec.on_success,
                    refocus,
                    worker,
                },
            );
            return Ok(());
        }

        self.screen.suspend();
        let outcome = exec::run_to_completion(&argv);
        self.screen.resume();
        match outcome {
            Ok(true) => {
                self.complete_success(spec.on_success, refocus);
                Ok(())
            }
            Ok(false) => {
                let _ = self.log.write_line("external command failed");
                Ok(())
            }
            Err(message) => Err(CommandError::Spawn {
                command: command_line,
                message,
            }),
        }
    }

    /// Drain completed background jobs. Each worker is joined before its
    /// continuation runs, so continuations observe a fully exited child.
    pub fn poll_externals(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            let Some(job) = self.jobs.remove(&completion.job) else {
                continue;
            };
            let _ = job.worker.join();
            let _ = self.log.write_line(&format!(
                "external command finished (job {}, success: {})",
                completion.job, completion.success
            ));
            if completion.success {
                self.complete_success(job.on_success, job.refocus);
            }
            handled += 1;
        }
        handled
    }

    fn complete_success(&mut self, on_success: Option<OnSuccess>, refocus: Option<BufferId>) {
        if let Some(continuation) = on_success {
            continuation(self);
        }
        if let Some(id) = refocus {
            if self.stack.focus(id) {
                let _ = self.log.write_line("refocussing");
                self.screen.buffer_focused(id);
            }
        }
    }

    #[must_use]
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// One engine tick: background completions, then due timers.
    pub fn pump(&mut self) {
        self.poll_externals();
        self.run_due(Instant::now());
    }

    // -----------------------------------------------------------------
    // Loop control and screen passthroughs
    // -----------------------------------------------------------------

    pub fn exit(&mut self) {
        self.exit_requested = true;
        let _ = self.log.write_line("exit requested");
    }

    #[must_use]
    pub fn should_exit(&self) -> bool {
        self.exit_requested
    }

    pub fn open_command_prompt(&mut self, initial: &str) {
        self.screen.open_command_prompt(initial);
    }

    pub fn send_keypress(&mut self, key: &str) {
        self.screen.send_keypress(key);
    }
}
