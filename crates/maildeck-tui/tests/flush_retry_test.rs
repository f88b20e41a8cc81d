#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::{Duration, Instant};

use maildeck_core::index::IndexError;
use maildeck_tui::tests_common::{test_accounts, test_settings, test_ui, test_ui_with};

#[test]
fn flush_success_is_silent() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("flush");
    assert_eq!(*fixture.flush_calls.borrow(), 1);
    assert!(fixture.events.notifications().is_empty());
    assert!(fixture.ui.next_deadline().is_none());
}

#[test]
fn locked_index_retries_until_the_flush_lands() {
    let mut fixture = test_ui();
    fixture
        .flush_script
        .borrow_mut()
        .extend([Err(IndexError::Locked), Err(IndexError::Locked)]);

    fixture.ui.dispatch_line("flush");
    assert_eq!(*fixture.flush_calls.borrow(), 1);
    assert!(fixture.ui.next_deadline().is_some());

    // Both scheduled retries fall due inside this window; the second one
    // is scheduled by the first and runs in the same pass.
    fixture.ui.run_due(Instant::now() + Duration::from_secs(30));
    assert_eq!(*fixture.flush_calls.borrow(), 3);

    let locked: Vec<String> = fixture
        .events
        .notifications()
        .into_iter()
        .filter(|n| n.contains("index locked"))
        .collect();
    assert_eq!(
        locked,
        vec![
            "index locked, will try again in 5 secs".to_string(),
            "index locked, will try again in 5 secs".to_string(),
        ]
    );
    assert!(fixture.ui.next_deadline().is_none());
}

#[test]
fn zero_timeout_retries_on_the_next_pump() {
    let mut fixture = test_ui_with(
        {
            let mut settings = test_settings();
            settings.flush_retry_timeout_secs = 0;
            settings
        },
        test_accounts(),
    );
    fixture
        .flush_script
        .borrow_mut()
        .push_back(Err(IndexError::Locked));

    fixture.ui.dispatch_line("flush");
    assert!(fixture
        .events
        .notifications()
        .contains(&"index locked, will try again in 0 secs".to_string()));

    fixture.ui.pump();
    assert_eq!(*fixture.flush_calls.borrow(), 2);
}

#[test]
fn other_index_errors_surface_to_the_user() {
    let mut fixture = test_ui();
    fixture
        .flush_script
        .borrow_mut()
        .push_back(Err(IndexError::Failure("database corrupt".to_string())));

    fixture.ui.dispatch_line("flush");
    assert!(fixture
        .events
        .notifications()
        .iter()
        .any(|n| n.contains("database corrupt")));
    assert!(fixture.ui.next_deadline().is_none());
}
