#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use maildeck_tui::buffers::SearchBuffer;
use maildeck_tui::tests_common::{test_accounts, test_settings, test_ui, test_ui_with, ScreenEvent, TestUi};
use maildeck_tui::ui::ExternalSpec;

fn wait_for_jobs(fixture: &mut TestUi) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while fixture.ui.pending_jobs() > 0 {
        assert!(
            Instant::now() < deadline,
            "background job did not finish in time"
        );
        fixture.ui.pump();
        thread::sleep(Duration::from_millis(10));
    }
}

fn success_flag() -> (Rc<RefCell<bool>>, Box<dyn FnOnce(&mut maildeck_tui::ui::Ui)>) {
    let ran = Rc::new(RefCell::new(false));
    let flag = ran.clone();
    (ran, Box::new(move |_ui| *flag.borrow_mut() = true))
}

#[test]
fn background_zero_exit_runs_the_continuation_and_refocuses_the_caller() {
    let mut fixture = test_ui();
    let caller = fixture.ui.open_buffer(Box::new(SearchBuffer::new("tag:a")));

    let (ran, on_success) = success_flag();
    let mut spec = ExternalSpec::new("true");
    spec.background = true;
    spec.on_success = Some(on_success);
    fixture.ui.run_external(spec).expect("spawn background job");

    // Focus moves elsewhere while the job runs.
    let other = fixture.ui.open_buffer(Box::new(SearchBuffer::new("tag:b")));
    assert_eq!(fixture.ui.stack().focused(), Some(other));

    wait_for_jobs(&mut fixture);
    assert!(*ran.borrow());
    assert_eq!(fixture.ui.stack().focused(), Some(caller));
}

#[test]
fn background_refocus_is_skipped_once_the_caller_is_closed() {
    let mut fixture = test_ui();
    let caller = fixture.ui.open_buffer(Box::new(SearchBuffer::new("tag:a")));

    let (ran, on_success) = success_flag();
    let mut spec = ExternalSpec::new("true");
    spec.background = true;
    spec.on_success = Some(on_success);
    fixture.ui.run_external(spec).expect("spawn background job");

    let other = fixture.ui.open_buffer(Box::new(SearchBuffer::new("tag:b")));
    fixture.ui.close_buffer(caller).expect("close caller");

    wait_for_jobs(&mut fixture);
    assert!(*ran.borrow());
    assert_eq!(fixture.ui.stack().focused(), Some(other));
}

#[test]
fn background_nonzero_exit_runs_no_continuation() {
    let mut fixture = test_ui();
    fixture.ui.open_buffer(Box::new(SearchBuffer::new("tag:a")));

    let (ran, on_success) = success_flag();
    let mut spec = ExternalSpec::new("false");
    spec.background = true;
    spec.on_success = Some(on_success);
    fixture.ui.run_external(spec).expect("spawn background job");

    let other = fixture.ui.open_buffer(Box::new(SearchBuffer::new("tag:b")));

    wait_for_jobs(&mut fixture);
    assert!(!*ran.borrow());
    assert_eq!(fixture.ui.stack().focused(), Some(other));
    assert!(fixture.events.notifications().is_empty());
}

#[test]
fn foreground_runs_suspend_the_screen_around_the_child() {
    let mut fixture = test_ui();
    let (ran, on_success) = success_flag();
    let mut spec = ExternalSpec::new("true");
    spec.on_success = Some(on_success);
    fixture.ui.run_external(spec).expect("run to completion");

    assert!(*ran.borrow());
    let events = fixture.events.events();
    let suspended = events
        .iter()
        .position(|e| *e == ScreenEvent::Suspended)
        .expect("screen suspended");
    let resumed = events
        .iter()
        .position(|e| *e == ScreenEvent::Resumed)
        .expect("screen resumed");
    assert!(suspended < resumed);
}

#[test]
fn foreground_failure_is_silent_and_skips_the_continuation() {
    let mut fixture = test_ui();
    let (ran, on_success) = success_flag();
    let mut spec = ExternalSpec::new("false");
    spec.on_success = Some(on_success);
    fixture.ui.run_external(spec).expect("run to completion");

    assert!(!*ran.borrow());
    assert!(fixture.events.notifications().is_empty());
}

#[test]
fn unrunnable_commands_are_reported() {
    let mut fixture = test_ui();
    fixture
        .ui
        .dispatch_line("shellescape maildeck-missing-binary-a3f");
    assert!(fixture
        .events
        .notifications()
        .iter()
        .any(|n| n.contains("failed to run")));
}

#[test]
fn edit_substitutes_the_path_into_the_editor_template() {
    let mut settings = test_settings();
    settings.editor_cmd = "true {}".to_string();
    let mut fixture = test_ui_with(settings, test_accounts());

    fixture.ui.dispatch_line("edit /tmp/maildeck-test-draft");
    let events = fixture.events.events();
    assert!(events.contains(&ScreenEvent::Suspended));
    assert!(events.contains(&ScreenEvent::Resumed));
    assert!(fixture.events.notifications().is_empty());
}
