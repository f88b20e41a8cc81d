//! Typed settings with YAML overlay loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::accounts::{Account, Accounts};

#[derive(Debug, Clone)]
pub struct Settings {
    /// Ask whether to report a bug before quitting.
    pub bug_on_exit: bool,
    /// Prompt for a subject while composing.
    pub ask_subject: bool,
    /// Offer only the sender account's address books for completion.
    pub complete_matching_abook_only: bool,
    /// Launch the editor in a terminal of its own, detached from the UI.
    pub spawn_editor: bool,
    /// Editor command template; `{}` is replaced with the file path.
    pub editor_cmd: String,
    /// Prefix used to launch a command in a new terminal.
    pub terminal_cmd: String,
    /// Delay between flush retries while the index is locked.
    pub flush_retry_timeout_secs: u64,
    /// Session log destination; unset disables logging.
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn default_from_env() -> Self {
        let editor_cmd = match std::env::var("EDITOR") {
            Ok(editor) if !editor.trim().is_empty() => editor.trim().to_string(),
            _ => "editor".to_string(),
        };
        Self {
            bug_on_exit: false,
            ask_subject: true,
            complete_matching_abook_only: false,
            spawn_editor: false,
            editor_cmd,
            terminal_cmd: "x-terminal-emulator -e".to_string(),
            flush_retry_timeout_secs: 5,
            log_file: None,
        }
    }

    #[must_use]
    pub fn flush_retry_delay(&self) -> Duration {
        Duration::from_secs(self.flush_retry_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialSettings {
    #[serde(default)]
    bug_on_exit: Option<bool>,
    #[serde(default)]
    ask_subject: Option<bool>,
    #[serde(default)]
    complete_matching_abook_only: Option<bool>,
    #[serde(default)]
    spawn_editor: Option<bool>,
    #[serde(default)]
    editor_cmd: String,
    #[serde(default)]
    terminal_cmd: String,
    #[serde(default)]
    flush_retry_timeout_secs: Option<i64>,
    #[serde(default)]
    log_file: String,
    #[serde(default)]
    accounts: Vec<Account>,
}

/// Load settings and accounts with defaults < (optional) settings file
/// precedence. An explicitly named file must be readable; the default
/// location may be absent.
pub fn load_settings(
    settings_file: Option<&str>,
) -> Result<(Settings, Accounts, Option<PathBuf>), String> {
    let mut settings = Settings::default_from_env();

    let explicit = settings_file
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let (path_to_try, required) = if let Some(path) = explicit {
        (Some(path), true)
    } else {
        (default_settings_path(), false)
    };

    if let Some(path) = path_to_try {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let mut parsed: PartialSettings =
                    serde_yaml::from_str(&text).map_err(|err| format!("parse settings: {err}"))?;
                let accounts = Accounts::new(std::mem::take(&mut parsed.accounts));
                apply_partial(&mut settings, parsed)?;
                return Ok((settings, accounts, Some(path)));
            }
            Err(err) => {
                if required {
                    return Err(format!("failed to load settings file: {err}"));
                }
            }
        }
    }

    Ok((settings, Accounts::default(), None))
}

fn default_settings_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("maildeck").join("config.yaml"));
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(
                PathBuf::from(home)
                    .join(".config")
                    .join("maildeck")
                    .join("config.yaml"),
            );
        }
    }
    None
}

fn apply_partial(settings: &mut Settings, partial: PartialSettings) -> Result<(), String> {
    if let Some(value) = partial.bug_on_exit {
        settings.bug_on_exit = value;
    }
    if let Some(value) = partial.ask_subject {
        settings.ask_subject = value;
    }
    if let Some(value) = partial.complete_matching_abook_only {
        settings.complete_matching_abook_only = value;
    }
    if let Some(value) = partial.spawn_editor {
        settings.spawn_editor = value;
    }
    if !partial.editor_cmd.trim().is_empty() {
        settings.editor_cmd = partial.editor_cmd.trim().to_string();
    }
    if !partial.terminal_cmd.trim().is_empty() {
        settings.terminal_cmd = partial.terminal_cmd.trim().to_string();
    }
    if let Some(secs) = partial.flush_retry_timeout_secs {
        if secs < 0 {
            return Err(format!("flush_retry_timeout_secs must be >= 0, got {secs}"));
        }
        settings.flush_retry_timeout_secs = secs as u64;
    }
    if !partial.log_file.trim().is_empty() {
        settings.log_file = Some(expand_tilde(partial.log_file.trim())?);
    }
    Ok(())
}

fn expand_tilde(input: &str) -> Result<PathBuf, String> {
    if input == "~" {
        let home = std::env::var("HOME").map_err(|_| "failed to resolve HOME".to_string())?;
        return Ok(PathBuf::from(home));
    }
    if let Some(rest) = input.strip_prefix("~/") {
        let home = std::env::var("HOME").map_err(|_| "failed to resolve HOME".to_string())?;
        return Ok(PathBuf::from(home).join(rest));
    }
    Ok(Path::new(input).to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default_from_env();
        assert!(!settings.bug_on_exit);
        assert!(settings.ask_subject);
        assert!(!settings.complete_matching_abook_only);
        assert!(!settings.spawn_editor);
        assert_eq!(settings.terminal_cmd, "x-terminal-emulator -e");
        assert_eq!(settings.flush_retry_timeout_secs, 5);
        assert!(settings.log_file.is_none());
    }

    #[test]
    fn flush_retry_delay_reflects_setting() {
        let mut settings = Settings::default_from_env();
        settings.flush_retry_timeout_secs = 12;
        assert_eq!(settings.flush_retry_delay().as_secs(), 12);
    }
}
