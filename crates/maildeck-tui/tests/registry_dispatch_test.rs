#![allow(clippy::expect_used, clippy::unwrap_used)]

use maildeck_tui::buffers::BufferKind;
use maildeck_tui::tests_common::test_ui;

#[test]
fn unknown_command_reports_the_focused_mode() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("openfocussed");
    assert!(fixture
        .events
        .notifications()
        .contains(&"no command 'openfocussed' in mode 'global'".to_string()));
}

#[test]
fn global_commands_fall_back_inside_mode_buffers() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("bufferlist");
    assert_eq!(fixture.ui.current_mode(), "bufferlist");

    fixture.ui.dispatch_line("search tag:inbox");
    assert_eq!(fixture.ui.stack().of_kind(BufferKind::Search).len(), 1);
    assert_eq!(fixture.ui.current_mode(), "search");
}

#[test]
fn mode_commands_resolve_once_their_buffer_is_focused() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("search tag:inbox");
    fixture.ui.dispatch_line("bufferlist");
    fixture.events.clear();

    // No longer unknown now that a bufferlist buffer owns the mode.
    fixture.ui.dispatch_line("openfocussed");
    assert!(!fixture
        .events
        .notifications()
        .iter()
        .any(|n| n.contains("no command 'openfocussed'")));
}

#[test]
fn parse_errors_carry_the_offending_byte_offset() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("search \"unterminated");
    let notified = fixture.events.notifications().join("\n");
    assert!(notified.contains("unterminated"), "got: {notified}");
    assert!(notified.contains("(at byte 7)"), "got: {notified}");
}

#[test]
fn help_overview_merges_mode_and_unshadowed_global_commands() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("bufferlist");
    fixture.events.clear();

    fixture.ui.dispatch_line("help");
    let overview = fixture.events.notifications().join("\n");
    assert!(overview.contains("openfocussed"), "got: {overview}");
    assert!(overview.contains("closefocussed"), "got: {overview}");
    assert!(overview.contains("search"), "got: {overview}");
    assert!(overview.contains("flush"), "got: {overview}");
}

#[test]
fn dispatch_trims_and_ignores_blank_lines() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("   ");
    fixture.ui.dispatch_line("");
    assert!(fixture.events.notifications().is_empty());
    assert!(fixture.ui.stack().is_empty());
}
