//! maildeck-core: collaborator-facing domain types for the maildeck TUI.
//!
//! The interaction core in `maildeck-tui` reaches the outside world through
//! the interfaces here: the mail index, account identities, address-book
//! completion, composition drafts and typed settings.

pub mod abook;
pub mod accounts;
pub mod draft;
pub mod index;
pub mod settings;
