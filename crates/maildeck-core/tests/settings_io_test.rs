#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Write;

use maildeck_core::settings::load_settings;

fn write_settings(dir: &tempfile::TempDir, text: &str) -> String {
    let path = dir.path().join("config.yaml");
    let mut file = std::fs::File::create(&path).expect("create settings file");
    file.write_all(text.as_bytes()).expect("write settings file");
    path.to_string_lossy().into_owned()
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(
        &dir,
        "bug_on_exit: true\n\
         ask_subject: false\n\
         editor_cmd: \"vim {}\"\n\
         flush_retry_timeout_secs: 30\n",
    );

    let (settings, accounts, used) = load_settings(Some(&path)).expect("load settings");
    assert!(settings.bug_on_exit);
    assert!(!settings.ask_subject);
    assert_eq!(settings.editor_cmd, "vim {}");
    assert_eq!(settings.flush_retry_timeout_secs, 30);
    assert_eq!(used.map(|p| p.to_string_lossy().into_owned()), Some(path));
    assert!(accounts.is_empty());

    // Untouched keys keep their defaults.
    assert_eq!(settings.terminal_cmd, "x-terminal-emulator -e");
    assert!(!settings.spawn_editor);
}

#[test]
fn accounts_are_loaded_from_the_same_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(
        &dir,
        r"accounts:
  - realname: Ada Lovelace
    address: ada@example.org
    aliases: [lovelace@example.org]
    abooks:
      - contacts:
          - name: Charles Babbage
            address: charles@example.org
  - realname: Bob
    address: bob@example.org
",
    );

    let (_, accounts, _) = load_settings(Some(&path)).expect("load settings");
    assert_eq!(accounts.len(), 2);
    let ada = accounts.matching("LOVELACE@example.org").expect("alias match");
    assert_eq!(ada.address, "ada@example.org");
    assert_eq!(ada.abooks.len(), 1);
    assert_eq!(ada.abooks[0].contacts[0].address, "charles@example.org");
    assert_eq!(
        accounts.first().map(|a| a.from_header_value()),
        Some("Ada Lovelace <ada@example.org>".to_string())
    );
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.yaml");
    let result = load_settings(Some(&missing.to_string_lossy()));
    match result {
        Err(err) => assert!(err.contains("failed to load settings file"), "got: {err}"),
        Ok(_) => panic!("expected an error for an explicit missing file"),
    }
}

#[test]
fn negative_retry_timeout_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(&dir, "flush_retry_timeout_secs: -1\n");
    match load_settings(Some(&path)) {
        Err(err) => assert!(err.contains("flush_retry_timeout_secs"), "got: {err}"),
        Ok(_) => panic!("expected a validation error"),
    }
}

#[test]
fn log_file_tilde_is_expanded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_settings(&dir, "log_file: \"~/maildeck.log\"\n");
    let (settings, _, _) = load_settings(Some(&path)).expect("load settings");
    let log_file = settings.log_file.expect("log file set");
    assert!(log_file.ends_with("maildeck.log"));
    assert!(!log_file.to_string_lossy().contains('~'));
}
