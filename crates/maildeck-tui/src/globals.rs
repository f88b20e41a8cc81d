//! Built-in commands and their registry descriptors.
//!
//! Each command is a small struct built from resolved arguments by a
//! `BuildFn`. Aliases (`bnext`/`bprevious`, `cancel`/`select`,
//! `closefocussed`) register the same builder under different names with
//! forced argument values.

use maildeck_core::abook::{AccountCompleter, ContactsCompleter};
use maildeck_core::accounts::parse_address;
use maildeck_core::draft::Draft;
use maildeck_core::index::IndexError;

use crate::argspec::{ArgPolicy, ArgSpec, Arity, ParseError, ResolvedArgs};
use crate::buffers::{
    BufferKind, BufferListBuffer, EnvelopeBuffer, SearchBuffer, TagListBuffer,
};
use crate::command::{Command, CommandError};
use crate::registry::{CommandSpec, RegistryBuilder, GLOBAL_MODE};
use crate::screen::{ChoiceSpec, PromptSpec};
use crate::ui::{ExternalSpec, Ui};

/// Install the full builtin roster on a registry builder.
pub fn register_builtins(builder: &mut RegistryBuilder) {
    builder
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "exit",
                summary: "shut down cleanly",
                args: &[],
                build: build_exit,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "search",
                summary: "open a search buffer for the given query",
                args: SEARCH_ARGS,
                build: build_search,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "prompt",
                summary: "open the command prompt, optionally pre-filled",
                args: PROMPT_ARGS,
                build: build_prompt,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "refresh",
                summary: "refresh the focused buffer",
                args: &[],
                build: build_refresh,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "shellescape",
                summary: "run an external command",
                args: SHELLESCAPE_ARGS,
                build: build_shellescape,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "edit",
                summary: "edit a file with the configured editor",
                args: EDIT_ARGS,
                build: build_edit,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "bclose",
                summary: "close the focused buffer",
                args: &[],
                build: build_bclose,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "bnext",
                summary: "focus the next buffer",
                args: BNEXT_ARGS,
                build: build_focus_offset,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "bprevious",
                summary: "focus the previous buffer",
                args: BPREVIOUS_ARGS,
                build: build_focus_offset,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "bufferlist",
                summary: "open a list of active buffers",
                args: &[],
                build: build_bufferlist,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "taglist",
                summary: "list all tags in the index",
                args: &[],
                build: build_taglist,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "flush",
                summary: "flush write operations or retry until committed",
                args: &[],
                build: build_flush,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "help",
                summary: "display help for a command",
                args: HELP_ARGS,
                build: build_help,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "compose",
                summary: "compose a new email",
                args: COMPOSE_ARGS,
                build: build_compose,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "move",
                summary: "send a movement keypress to the focused widget",
                args: MOVE_ARGS,
                build: build_keypress,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "cancel",
                summary: "send a cancel keypress",
                args: CANCEL_ARGS,
                build: build_keypress,
            },
        )
        .register(
            GLOBAL_MODE,
            CommandSpec {
                name: "select",
                summary: "send a select keypress",
                args: SELECT_ARGS,
                build: build_keypress,
            },
        )
        .register(
            "bufferlist",
            CommandSpec {
                name: "openfocussed",
                summary: "focus the selected buffer",
                args: &[],
                build: build_openfocussed,
            },
        )
        .register(
            "bufferlist",
            CommandSpec {
                name: "closefocussed",
                summary: "close the selected buffer",
                args: CLOSEFOCUSSED_ARGS,
                build: build_bclose,
            },
        );
}

// ---------------------------------------------------------------------
// exit
// ---------------------------------------------------------------------

struct ExitCommand;

impl Command for ExitCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        if ui.settings().bug_on_exit {
            ui.choice(
                ChoiceSpec::yes_no("do you want to report a bug before quitting?"),
                |ui, _answer| ui.exit(),
            )?;
            return Ok(());
        }
        ui.exit();
        Ok(())
    }
}

fn build_exit(_args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(ExitCommand))
}

// ---------------------------------------------------------------------
// search
// ---------------------------------------------------------------------

const SEARCH_ARGS: &[ArgSpec] = &[ArgSpec::positional(
    "query",
    Arity::ZeroOrMore,
    "search string",
)];

struct SearchCommand {
    query: String,
}

impl Command for SearchCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        if self.query.is_empty() {
            return Err(CommandError::precondition("empty query string"));
        }
        if self.query == "*" && !ui.stack().is_empty() {
            let query = self.query;
            ui.choice(
                ChoiceSpec::yes_no("really search for all threads? This takes a while.."),
                move |ui, answer| {
                    if answer == "yes" {
                        open_or_focus_search(ui, &query);
                    }
                },
            )?;
            return Ok(());
        }
        open_or_focus_search(ui, &self.query);
        Ok(())
    }
}

/// Focus an existing search buffer with the same querystring instead of
/// opening a duplicate.
fn open_or_focus_search(ui: &mut Ui, query: &str) {
    for id in ui.stack().of_kind(BufferKind::Search) {
        let same = ui
            .stack()
            .get(id)
            .and_then(|buffer| buffer.as_any().downcast_ref::<SearchBuffer>())
            .is_some_and(|search| search.querystring() == query);
        if same {
            let _ = ui.focus_buffer(id);
            return;
        }
    }
    ui.open_buffer(Box::new(SearchBuffer::new(query)));
}

fn build_search(args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(SearchCommand {
        query: args.many("query").join(" "),
    }))
}

// ---------------------------------------------------------------------
// prompt / refresh
// ---------------------------------------------------------------------

const PROMPT_ARGS: &[ArgSpec] = &[ArgSpec::positional(
    "startwith",
    Arity::ZeroOrOne,
    "initial command prompt content",
)];

struct PromptCommand {
    startwith: String,
}

impl Command for PromptCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        ui.open_command_prompt(&self.startwith);
        Ok(())
    }
}

fn build_prompt(args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(PromptCommand {
        startwith: args.opt("startwith").unwrap_or("").to_string(),
    }))
}

struct RefreshCommand;

impl Command for RefreshCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        ui.refresh_focused()
    }
}

fn build_refresh(_args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(RefreshCommand))
}

// ---------------------------------------------------------------------
// shellescape / edit
// ---------------------------------------------------------------------

const SHELLESCAPE_ARGS: &[ArgSpec] = &[
    ArgSpec::positional("cmdline", Arity::One, "command line to execute"),
    ArgSpec::switch("spawn", "run in a terminal, in the background"),
    ArgSpec::switch("refocus", "refocus the calling buffer when done")
        .with_policy(ArgPolicy::Defaulted("true")),
];

struct ShellEscapeCommand {
    cmdline: String,
    spawn: bool,
    refocus: bool,
}

impl Command for ShellEscapeCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        let mut spec = ExternalSpec::new(&self.cmdline);
        spec.spawn_terminal = self.spawn;
        spec.background = self.spawn;
        spec.refocus = self.refocus;
        ui.run_external(spec)
    }
}

fn build_shellescape(args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(ShellEscapeCommand {
        cmdline: args.one("cmdline")?.to_string(),
        spawn: args.flag("spawn"),
        refocus: args.flag("refocus"),
    }))
}

const EDIT_ARGS: &[ArgSpec] = &[
    ArgSpec::positional("path", Arity::One, "file to edit"),
    ArgSpec::switch("spawn", "run the editor in a terminal, in the background"),
];

struct EditCommand {
    path: String,
    spawn: Option<bool>,
}

impl Command for EditCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        let spawn = self.spawn.unwrap_or(ui.settings().spawn_editor);
        let template = ui.settings().editor_cmd.clone();
        let mut spec = ExternalSpec::new(&template);
        spec.path = Some(self.path);
        spec.spawn_terminal = spawn;
        spec.background = spawn;
        ui.run_external(spec)
    }
}

fn build_edit(args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(EditCommand {
        path: args.one("path")?.to_string(),
        spawn: if args.flag("spawn") { Some(true) } else { None },
    }))
}

// ---------------------------------------------------------------------
// buffer commands
// ---------------------------------------------------------------------

const CLOSEFOCUSSED_ARGS: &[ArgSpec] =
    &[ArgSpec::switch("focussed", "close the buffer selected in the list")
        .with_policy(ArgPolicy::Forced("true"))];

struct BufferCloseCommand {
    focussed: bool,
}

impl Command for BufferCloseCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        let target = if self.focussed {
            let selected = ui
                .stack()
                .focused_buffer()
                .and_then(|buffer| buffer.as_any().downcast_ref::<BufferListBuffer>())
                .and_then(|listing| listing.selected_buffer());
            match selected {
                Some(id) => id,
                None => return Err(CommandError::precondition("no buffer selected")),
            }
        } else {
            match ui.stack().focused() {
                Some(id) => id,
                None => return Err(CommandError::precondition("no buffer to close")),
            }
        };
        // Closing the only remaining buffer means quitting.
        if ui.stack().len() == 1 && ui.stack().contains(target) {
            return Box::new(ExitCommand).apply(ui);
        }
        let listing = if self.focussed { ui.stack().focused() } else { None };
        ui.close_buffer(target)?;
        if let Some(id) = listing {
            if ui.stack().contains(id) {
                ui.refresh_buffer(id)?;
            }
        }
        Ok(())
    }
}

fn build_bclose(args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(BufferCloseCommand {
        focussed: args.flag("focussed"),
    }))
}

const BNEXT_ARGS: &[ArgSpec] = &[ArgSpec::named("offset", Arity::One, "focus offset")
    .with_policy(ArgPolicy::Forced("1"))];
const BPREVIOUS_ARGS: &[ArgSpec] = &[ArgSpec::named("offset", Arity::One, "focus offset")
    .with_policy(ArgPolicy::Forced("-1"))];

struct FocusOffsetCommand {
    offset: isize,
}

impl Command for FocusOffsetCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        ui.cycle_focus(self.offset)
    }
}

fn build_focus_offset(args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(FocusOffsetCommand {
        offset: args.parse::<isize>("offset")?,
    }))
}

struct OpenBufferListCommand;

impl Command for OpenBufferListCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        if let Some(id) = ui.stack().of_kind(BufferKind::BufferList).first().copied() {
            ui.focus_buffer(id)?;
            ui.refresh_buffer(id)?;
        } else {
            ui.open_buffer(Box::new(BufferListBuffer::new()));
        }
        Ok(())
    }
}

fn build_bufferlist(_args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(OpenBufferListCommand))
}

struct TagListCommand;

impl Command for TagListCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        let tags = ui.index().all_tags()?;
        ui.open_buffer(Box::new(TagListBuffer::new(tags)));
        Ok(())
    }
}

fn build_taglist(_args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(TagListCommand))
}

// ---------------------------------------------------------------------
// flush
// ---------------------------------------------------------------------

struct FlushCommand;

impl Command for FlushCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        match ui.index_mut().flush() {
            Ok(()) => Ok(()),
            Err(IndexError::Locked) => {
                let delay = ui.settings().flush_retry_delay();
                ui.schedule_after(delay, |ui| ui.apply_command(Box::new(FlushCommand)));
                ui.notify(&format!(
                    "index locked, will try again in {} secs",
                    delay.as_secs()
                ));
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn build_flush(_args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(FlushCommand))
}

// ---------------------------------------------------------------------
// help
// ---------------------------------------------------------------------

const HELP_ARGS: &[ArgSpec] = &[ArgSpec::positional(
    "commandname",
    Arity::ZeroOrOne,
    "command to describe",
)];

struct HelpCommand {
    commandname: Option<String>,
}

impl Command for HelpCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        let mode = ui.current_mode();
        if let Some(name) = &self.commandname {
            let spec = ui.registry().lookup(mode, name).copied();
            match spec {
                Some(spec) => {
                    let usage = spec.usage();
                    ui.notify(&usage);
                }
                None => ui.notify(&format!("command {name} not known in mode {mode}")),
            }
            return Ok(());
        }

        let registry = ui.registry();
        let mode_names = registry.names_for_mode(mode);
        let mut rows: Vec<(String, String)> = Vec::new();
        for name in &mode_names {
            if let Some(spec) = registry.lookup(mode, name) {
                rows.push((spec.name.to_string(), spec.summary.to_string()));
            }
        }
        if mode != GLOBAL_MODE {
            for name in registry.names_for_mode(GLOBAL_MODE) {
                if mode_names.contains(&name) {
                    continue;
                }
                if let Some(spec) = registry.lookup(GLOBAL_MODE, name) {
                    rows.push((spec.name.to_string(), spec.summary.to_string()));
                }
            }
        }
        rows.sort();
        let text = rows
            .iter()
            .map(|(name, summary)| format!("{name:<16}{summary}"))
            .collect::<Vec<_>>()
            .join("\n");
        ui.notify(&text);
        Ok(())
    }
}

fn build_help(args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(HelpCommand {
        commandname: args.opt("commandname").map(str::to_string),
    }))
}

// ---------------------------------------------------------------------
// compose
// ---------------------------------------------------------------------

const COMPOSE_ARGS: &[ArgSpec] = &[
    ArgSpec::named("sender", Arity::ZeroOrOne, "sender address"),
    ArgSpec::named("subject", Arity::ZeroOrOne, "subject line"),
    ArgSpec::named("to", Arity::ZeroOrMore, "recipients"),
    ArgSpec::named("cc", Arity::ZeroOrMore, "copy-to recipients"),
    ArgSpec::named("bcc", Arity::ZeroOrMore, "blind copy-to recipients"),
];

struct ComposeCommand {
    draft: Draft,
}

impl Command for ComposeCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        ask_from(ui, self.draft)
    }
}

fn build_compose(args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    let mut draft = Draft::new();
    if let Some(sender) = args.opt("sender") {
        draft.set("From", sender);
    }
    if let Some(subject) = args.opt("subject") {
        draft.set("Subject", subject);
    }
    for to in args.many("to") {
        draft.add("To", to);
    }
    for cc in args.many("cc") {
        draft.add("Cc", cc);
    }
    for bcc in args.many("bcc") {
        draft.add("Bcc", bcc);
    }
    Ok(Box::new(ComposeCommand { draft }))
}

fn ask_from(ui: &mut Ui, mut draft: Draft) -> Result<(), CommandError> {
    if draft.contains("From") {
        return ask_to(ui, draft);
    }
    if ui.accounts().is_empty() {
        return Err(CommandError::precondition("no accounts set"));
    }
    if ui.accounts().len() == 1 {
        if let Some(from) = ui
            .accounts()
            .first()
            .map(|account| account.from_header_value())
        {
            draft.set("From", &from);
        }
        return ask_to(ui, draft);
    }
    prompt_from(ui, draft)
}

/// Ask for a From address until it matches a configured account.
fn prompt_from(ui: &mut Ui, draft: Draft) -> Result<(), CommandError> {
    let addresses: Vec<String> = ui
        .accounts()
        .list()
        .iter()
        .map(|account| account.address.clone())
        .collect();
    let spec =
        PromptSpec::new("From>").with_completer(Box::new(AccountCompleter::new(addresses)));
    ui.prompt(spec, move |ui, reply| {
        let Some(reply) = reply else {
            ui.notify("canceled");
            return;
        };
        let address = parse_address(&reply).to_string();
        let from = ui
            .accounts()
            .matching(&address)
            .map(|account| account.from_header_value());
        match from {
            Some(value) => {
                let mut draft = draft;
                draft.set("From", &value);
                if let Err(err) = ask_to(ui, draft) {
                    ui.notify(&err.to_string());
                }
            }
            None => {
                ui.notify("no account for this address. (<esc> cancels)");
                if let Err(err) = prompt_from(ui, draft) {
                    ui.notify(&err.to_string());
                }
            }
        }
    })
}

fn ask_to(ui: &mut Ui, draft: Draft) -> Result<(), CommandError> {
    if draft.contains("To") {
        return ask_subject(ui, draft);
    }
    let sender_address = draft.get("From").map(|value| parse_address(value).to_string());
    let books = {
        let accounts = ui.accounts();
        let sender = sender_address
            .as_deref()
            .and_then(|address| accounts.matching(address));
        accounts.address_books(sender, ui.settings().complete_matching_abook_only)
    };
    let spec = PromptSpec::new("To>").with_completer(Box::new(ContactsCompleter::new(books)));
    ui.prompt(spec, move |ui, reply| {
        let Some(reply) = reply else {
            ui.notify("canceled");
            return;
        };
        let mut draft = draft;
        draft.set("To", &reply);
        if let Err(err) = ask_subject(ui, draft) {
            ui.notify(&err.to_string());
        }
    })
}

fn ask_subject(ui: &mut Ui, draft: Draft) -> Result<(), CommandError> {
    if !ui.settings().ask_subject || draft.contains("Subject") {
        return finish_compose(ui, draft);
    }
    ui.prompt(PromptSpec::new("Subject>"), move |ui, reply| {
        let Some(reply) = reply else {
            ui.notify("canceled");
            return;
        };
        let mut draft = draft;
        draft.set("Subject", &reply);
        if let Err(err) = finish_compose(ui, draft) {
            ui.notify(&err.to_string());
        }
    })
}

fn finish_compose(ui: &mut Ui, draft: Draft) -> Result<(), CommandError> {
    Box::new(EnvelopeOpenCommand { draft }).apply(ui)
}

/// Opens the envelope buffer for a finished draft. Constructed internally
/// by `compose`; not registered under any command name.
pub struct EnvelopeOpenCommand {
    pub draft: Draft,
}

impl Command for EnvelopeOpenCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        ui.open_buffer(Box::new(EnvelopeBuffer::new(self.draft)));
        Ok(())
    }
}

// ---------------------------------------------------------------------
// keypress injection
// ---------------------------------------------------------------------

const MOVE_ARGS: &[ArgSpec] = &[ArgSpec::positional(
    "movement",
    Arity::OneOrMore,
    "movement key to inject",
)];
const CANCEL_ARGS: &[ArgSpec] = &[
    ArgSpec::positional("movement", Arity::One, "").with_policy(ArgPolicy::Forced("cancel")),
];
const SELECT_ARGS: &[ArgSpec] = &[
    ArgSpec::positional("movement", Arity::One, "").with_policy(ArgPolicy::Forced("select")),
];

struct SendKeypressCommand {
    key: String,
}

impl Command for SendKeypressCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        ui.send_keypress(&self.key);
        Ok(())
    }
}

fn build_keypress(args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(SendKeypressCommand {
        key: args.many("movement").join(" "),
    }))
}

// ---------------------------------------------------------------------
// bufferlist mode
// ---------------------------------------------------------------------

struct OpenFocussedCommand;

impl Command for OpenFocussedCommand {
    fn apply(self: Box<Self>, ui: &mut Ui) -> Result<(), CommandError> {
        let selected = ui
            .stack()
            .focused_buffer()
            .and_then(|buffer| buffer.as_any().downcast_ref::<BufferListBuffer>())
            .and_then(|listing| listing.selected_buffer());
        match selected {
            Some(id) => ui.focus_buffer(id),
            None => Err(CommandError::precondition("no buffer selected")),
        }
    }
}

fn build_openfocussed(_args: &ResolvedArgs) -> Result<Box<dyn Command>, ParseError> {
    Ok(Box::new(OpenFocussedCommand))
}
