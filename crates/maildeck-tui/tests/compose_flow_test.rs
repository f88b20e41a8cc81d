#![allow(clippy::expect_used, clippy::unwrap_used)]

use maildeck_core::accounts::{Account, Accounts};
use maildeck_core::draft::Draft;
use maildeck_tui::buffers::{BufferKind, EnvelopeBuffer};
use maildeck_tui::tests_common::{test_accounts, test_settings, test_ui, test_ui_with, TestUi};

fn single_account() -> Accounts {
    Accounts::new(vec![Account {
        realname: "Ada Lovelace".to_string(),
        address: "ada@example.org".to_string(),
        aliases: Vec::new(),
        abooks: Vec::new(),
    }])
}

fn open_draft(fixture: &TestUi) -> Option<Draft> {
    let id = fixture
        .ui
        .stack()
        .of_kind(BufferKind::Envelope)
        .first()
        .copied()?;
    fixture
        .ui
        .stack()
        .get(id)
        .and_then(|buffer| buffer.as_any().downcast_ref::<EnvelopeBuffer>())
        .map(|envelope| envelope.draft().clone())
}

#[test]
fn cancel_at_the_from_prompt_leaves_the_stack_untouched() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("compose");
    assert_eq!(fixture.events.prompts(), vec!["From>"]);

    fixture.ui.answer_prompt(None);
    assert!(fixture
        .events
        .notifications()
        .contains(&"canceled".to_string()));
    assert!(fixture.ui.stack().is_empty());
    assert!(!fixture.ui.has_pending_question());
}

#[test]
fn unknown_from_address_reprompts_until_it_matches() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("compose");

    fixture
        .ui
        .answer_prompt(Some("nobody@example.net".to_string()));
    assert!(fixture
        .events
        .notifications()
        .contains(&"no account for this address. (<esc> cancels)".to_string()));
    assert_eq!(fixture.events.prompts(), vec!["From>", "From>"]);

    fixture.ui.answer_prompt(Some("bob@example.org".to_string()));
    assert_eq!(fixture.events.prompts().last().map(String::as_str), Some("To>"));
}

#[test]
fn full_flow_opens_an_envelope_buffer() {
    let mut fixture = test_ui();
    fixture.ui.dispatch_line("compose");

    fixture.ui.answer_prompt(Some("bob@example.org".to_string()));
    fixture
        .ui
        .answer_prompt(Some("Charles Babbage <charles@example.org>".to_string()));
    assert_eq!(
        fixture.events.prompts(),
        vec!["From>", "To>", "Subject>"]
    );
    fixture.ui.answer_prompt(Some("lunch".to_string()));

    assert_eq!(fixture.ui.current_mode(), "envelope");
    let draft = open_draft(&fixture).expect("envelope draft");
    assert_eq!(draft.get("From"), Some("Bob <bob@example.org>"));
    assert_eq!(
        draft.get("To"),
        Some("Charles Babbage <charles@example.org>")
    );
    assert_eq!(draft.get("Subject"), Some("lunch"));
}

#[test]
fn a_single_account_is_used_without_asking() {
    let mut fixture = test_ui_with(test_settings(), single_account());
    fixture
        .ui
        .dispatch_line("compose --to bob@example.org --subject hi");

    assert!(fixture.events.prompts().is_empty());
    let draft = open_draft(&fixture).expect("envelope draft");
    assert_eq!(draft.get("From"), Some("Ada Lovelace <ada@example.org>"));
    assert_eq!(draft.get("Subject"), Some("hi"));
}

#[test]
fn multiple_recipients_are_kept_in_order() {
    let mut fixture = test_ui_with(test_settings(), single_account());
    fixture
        .ui
        .dispatch_line("compose --to one@example.org two@example.org --subject hi");

    let draft = open_draft(&fixture).expect("envelope draft");
    assert_eq!(
        draft.get_all("To"),
        ["one@example.org".to_string(), "two@example.org".to_string()]
    );
}

#[test]
fn subject_prompt_is_skipped_when_disabled() {
    let mut settings = test_settings();
    settings.ask_subject = false;
    let mut fixture = test_ui_with(settings, test_accounts());
    fixture
        .ui
        .dispatch_line("compose --sender ada@example.org --to bob@example.org");

    assert!(fixture.events.prompts().is_empty());
    let draft = open_draft(&fixture).expect("envelope draft");
    assert!(!draft.contains("Subject"));
}

#[test]
fn cancel_at_the_subject_prompt_opens_nothing() {
    let mut fixture = test_ui();
    fixture
        .ui
        .dispatch_line("compose --sender ada@example.org --to bob@example.org");
    assert_eq!(fixture.events.prompts(), vec!["Subject>"]);

    fixture.ui.answer_prompt(None);
    assert!(fixture
        .events
        .notifications()
        .contains(&"canceled".to_string()));
    assert!(fixture.ui.stack().is_empty());
}
