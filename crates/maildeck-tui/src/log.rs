//! Append-only session log for the interaction core.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// File-backed session log. A disabled log swallows writes, so callers log
/// unconditionally and never branch on configuration.
pub struct SessionLog {
    writer: Option<Mutex<BufWriter<File>>>,
}

impl SessionLog {
    pub fn open(path: &Path) -> Result<Self, String> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| format!("open session log: {err}"))?;
        Ok(Self {
            writer: Some(Mutex::new(BufWriter::new(file))),
        })
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn write_line(&self, message: &str) -> Result<(), String> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };
        let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let mut writer = writer.lock().map_err(|err| err.to_string())?;
        writer
            .write_all(format!("[{stamp}] {message}\n").as_bytes())
            .map_err(|err| err.to_string())?;
        writer.flush().map_err(|err| err.to_string())
    }
}
