//! External process bridge: command-line assembly and child execution.
//!
//! Command templates are strings from configuration or the prompt. `{}` in
//! a template is replaced with the shell-quoted path argument; a template
//! without `{}` gets the quoted path appended. The assembled line is split
//! into argv with the prompt tokenizer, so quoting rules match what the
//! user already knows from the command prompt.

use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use crate::argspec::{tokenize, ParseError};

/// The one message each worker thread sends when its child exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessCompletion {
    pub job: u64,
    pub success: bool,
}

/// Single-quote `value` for the shell; embedded quotes become `'\''`.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Assemble the final command line from a template, an optional path and
/// the terminal launcher prefix.
#[must_use]
pub fn build_command_line(
    template: &str,
    path: Option<&str>,
    spawn_terminal: bool,
    terminal_cmd: &str,
) -> String {
    let mut cmd = match path {
        Some(path) if template.contains("{}") => template.replace("{}", &shell_quote(path)),
        Some(path) => format!("{template} {}", shell_quote(path)),
        None => template.to_string(),
    };
    if spawn_terminal && !terminal_cmd.trim().is_empty() {
        cmd = format!("{terminal_cmd} {cmd}");
    }
    cmd
}

/// Split a command line into argv.
pub fn split_command(command_line: &str) -> Result<Vec<String>, ParseError> {
    let tokens = tokenize(command_line)?;
    if tokens.is_empty() {
        return Err(ParseError::new("empty command line"));
    }
    Ok(tokens.into_iter().map(|token| token.text).collect())
}

/// Run argv to completion on the current thread. `Ok(true)` means the
/// child exited 0; an `Err` means it could not be started.
pub fn run_to_completion(argv: &[String]) -> Result<bool, String> {
    let Some((program, args)) = argv.split_first() else {
        return Err("empty command line".to_string());
    };
    let status = std::process::Command::new(program)
        .args(args)
        .status()
        .map_err(|err| err.to_string())?;
    Ok(status.success())
}

/// Run argv on a worker thread. The worker sends exactly one completion on
/// `tx` and exits; a child that could not be started counts as a failure.
pub fn spawn_worker(job: u64, argv: Vec<String>, tx: Sender<ProcessCompletion>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let success = matches!(run_to_completion(&argv), Ok(true));
        let _ = tx.send(ProcessCompletion { job, success });
    })
}

#[cfg(test)]
mod tests {
    use super::{build_command_line, shell_quote, split_command};

    #[test]
    fn shell_quote_wraps_and_escapes() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("two words"), "'two words'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn template_placeholder_is_substituted() {
        let cmd = build_command_line("mutt -f {}", Some("a b.mbox"), false, "");
        assert_eq!(cmd, "mutt -f 'a b.mbox'");
    }

    #[test]
    fn path_is_appended_without_placeholder() {
        let cmd = build_command_line("vim", Some("draft.eml"), false, "");
        assert_eq!(cmd, "vim 'draft.eml'");
    }

    #[test]
    fn terminal_prefix_wraps_the_whole_line() {
        let cmd = build_command_line("vim", Some("draft.eml"), true, "x-terminal-emulator -e");
        assert_eq!(cmd, "x-terminal-emulator -e vim 'draft.eml'");
    }

    #[test]
    fn no_path_leaves_template_untouched() {
        let cmd = build_command_line("make dist", None, false, "");
        assert_eq!(cmd, "make dist");
    }

    #[test]
    fn split_command_honors_quoting() {
        let argv = match split_command("vim 'a b.eml'") {
            Ok(argv) => argv,
            Err(err) => panic!("split: {err}"),
        };
        assert_eq!(argv, vec!["vim".to_string(), "a b.eml".to_string()]);
    }

    #[test]
    fn split_command_rejects_empty_lines() {
        assert!(split_command("   ").is_err());
    }
}
