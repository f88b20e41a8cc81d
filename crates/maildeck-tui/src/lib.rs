//! Interaction core of the maildeck terminal mail client: the command
//! registry, buffer stack, execution engine and external process bridge.

pub mod argspec;
pub mod buffers;
pub mod command;
pub mod exec;
pub mod globals;
pub mod log;
pub mod registry;
pub mod screen;
pub mod tests_common;
pub mod ui;
