use std::io::{BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use maildeck_core::index::{IndexError, MailIndex};
use maildeck_core::settings::load_settings;
use maildeck_tui::buffers::BufferId;
use maildeck_tui::globals;
use maildeck_tui::registry::RegistryBuilder;
use maildeck_tui::screen::{ChoiceSpec, PromptSpec, Screen};
use maildeck_tui::ui::{PendingQuestion, Ui};

fn main() {
    let code = match run() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    };
    std::process::exit(code);
}

fn run() -> Result<(), String> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        print!("{}", usage_text());
        return Ok(());
    }

    let (settings, accounts, config_path) = load_settings(args.config.as_deref())?;

    let mut builder = RegistryBuilder::new();
    globals::register_builtins(&mut builder);

    let mut ui = Ui::new(
        builder.build(),
        Box::new(TermScreen),
        Box::new(SessionIndex::default()),
        accounts,
        settings,
    );

    if let Some(path) = &config_path {
        println!("config: {}", path.display());
    }
    println!("maildeck ready; 'help' lists commands, 'exit' quits");

    // Reader thread feeds stdin lines over a channel so the main thread can
    // keep pumping timers and process completions while idle. It stays
    // blocked on stdin after `exit`; process exit reaps it.
    let (line_tx, line_rx) = mpsc::channel::<String>();
    let _reader = thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        ui.pump();
        if ui.should_exit() {
            break;
        }
        match line_rx.recv_timeout(poll_timeout(&ui)) {
            Ok(line) => handle_line(&mut ui, &line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

/// Sleep no longer than the next timer deadline, and poll briefly while
/// background jobs are outstanding.
fn poll_timeout(ui: &Ui) -> Duration {
    let idle = if ui.pending_jobs() > 0 {
        Duration::from_millis(100)
    } else {
        Duration::from_secs(60)
    };
    match ui.next_deadline() {
        Some(deadline) => deadline
            .saturating_duration_since(Instant::now())
            .min(idle)
            .max(Duration::from_millis(10)),
        None => idle,
    }
}

fn handle_line(ui: &mut Ui, line: &str) {
    if ui.has_pending_question() {
        let reply = parse_reply(line);
        let is_prompt = matches!(ui.pending_question(), Some(PendingQuestion::Prompt(_)));
        if is_prompt {
            ui.answer_prompt(reply);
        } else {
            ui.answer_choice(reply);
        }
        return;
    }
    ui.dispatch_line(line);
}

/// A lone escape byte or the literal `<esc>` cancels the pending question.
fn parse_reply(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed == "\u{1b}" || trimmed.eq_ignore_ascii_case("<esc>") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug)]
struct CliArgs {
    config: Option<String>,
    help: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        config: None,
        help: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --config".to_string())?;
                parsed.config = Some(value);
            }
            "-h" | "--help" => parsed.help = true,
            other => return Err(format!("unknown argument '{other}' (try --help)")),
        }
    }
    Ok(parsed)
}

fn usage_text() -> String {
    [
        "maildeck-tui - line-mode front end for the maildeck interaction core",
        "",
        "usage: maildeck-tui [-c|--config FILE]",
        "",
        "  -c, --config FILE  settings file (default: ~/.config/maildeck/config.yaml)",
        "  -h, --help         show this help",
        "",
    ]
    .join("\n")
}

/// Plain-text screen: every engine event becomes one stdout line.
struct TermScreen;

impl Screen for TermScreen {
    fn buffer_opened(&mut self, id: BufferId, title: &str) {
        println!("opened {id}: {title}");
    }

    fn buffer_closed(&mut self, id: BufferId) {
        println!("closed {id}");
    }

    fn buffer_focused(&mut self, id: BufferId) {
        println!("focus {id}");
    }

    fn buffer_refreshed(&mut self, id: BufferId) {
        println!("refreshed {id}");
    }

    fn notify(&mut self, message: &str) {
        println!("* {message}");
    }

    fn show_prompt(&mut self, spec: &PromptSpec) {
        if spec.initial.is_empty() {
            print!("{} ", spec.prefix);
        } else {
            print!("{} [{}] ", spec.prefix, spec.initial);
        }
        let _ = std::io::stdout().flush();
    }

    fn show_choice(&mut self, spec: &ChoiceSpec) {
        print!("{} ({}) ", spec.question, spec.options.join("/"));
        let _ = std::io::stdout().flush();
    }

    fn clear_question(&mut self) {}

    fn suspend(&mut self) {
        let _ = std::io::stdout().flush();
    }

    fn resume(&mut self) {}

    fn open_command_prompt(&mut self, initial: &str) {
        print!(": {initial}");
        let _ = std::io::stdout().flush();
    }

    fn send_keypress(&mut self, key: &str) {
        println!("key {key}");
    }
}

/// Stand-in index for the driver: accepts flushes, reports no tags.
#[derive(Default)]
struct SessionIndex {
    tags: Vec<String>,
}

impl MailIndex for SessionIndex {
    fn flush(&mut self) -> Result<(), IndexError> {
        Ok(())
    }

    fn all_tags(&self) -> Result<Vec<String>, IndexError> {
        Ok(self.tags.clone())
    }
}
