//! Mode-scoped command registry.
//!
//! Commands are registered under `(mode, name)`. Lookup tries the requested
//! mode first and falls back to [`GLOBAL_MODE`]; no other mode is ever
//! consulted. The registry is assembled once by [`RegistryBuilder`] and
//! frozen before the engine starts.

use std::collections::HashMap;

use crate::argspec::{resolve, tokenize, ArgKind, ArgPolicy, ArgSpec, Arity, ParseError, ResolvedArgs};
use crate::command::{Command, CommandError};

/// The fallback scope consulted when a mode has no own binding.
pub const GLOBAL_MODE: &str = "global";

/// Builds a command instance from resolved arguments.
pub type BuildFn = fn(&ResolvedArgs) -> Result<Box<dyn Command>, ParseError>;

/// Registered command metadata: name, summary, argument schema and builder.
/// Aliases register the same builder under several names with different
/// forced or defaulted argument policies.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub summary: &'static str,
    pub args: &'static [ArgSpec],
    pub build: BuildFn,
}

impl CommandSpec {
    /// Help text rendered from the schema. Forced arguments are not
    /// user-settable and do not appear.
    #[must_use]
    pub fn usage(&self) -> String {
        let visible: Vec<&ArgSpec> = self
            .args
            .iter()
            .filter(|arg| !matches!(arg.policy, ArgPolicy::Forced(_)))
            .collect();

        let mut usage = format!("usage: {}", self.name);
        for arg in &visible {
            let upper = arg.name.to_ascii_uppercase();
            match (arg.kind, arg.arity) {
                (ArgKind::Switch, _) => usage.push_str(&format!(" [--{}]", arg.name)),
                (ArgKind::Named, Arity::ZeroOrMore | Arity::OneOrMore) => {
                    usage.push_str(&format!(" [--{} {upper}...]", arg.name));
                }
                (ArgKind::Named, _) => usage.push_str(&format!(" [--{} {upper}]", arg.name)),
                (ArgKind::Positional, Arity::One) => usage.push_str(&format!(" {upper}")),
                (ArgKind::Positional, Arity::ZeroOrOne) => usage.push_str(&format!(" [{upper}]")),
                (ArgKind::Positional, Arity::OneOrMore) => usage.push_str(&format!(" {upper}...")),
                (ArgKind::Positional, Arity::ZeroOrMore) => {
                    usage.push_str(&format!(" [{upper}...]"));
                }
            }
        }

        let mut lines = vec![self.summary.to_string(), usage];
        for arg in &visible {
            if arg.help.is_empty() {
                continue;
            }
            let shown = match arg.kind {
                ArgKind::Positional => arg.name.to_ascii_uppercase(),
                ArgKind::Named | ArgKind::Switch => format!("--{}", arg.name),
            };
            lines.push(format!("  {shown:<16}{}", arg.help));
        }
        lines.join("\n")
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    modes: HashMap<String, HashMap<String, CommandSpec>>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `spec` under `(mode, spec.name)`. Within one mode the last
    /// registration for a name wins.
    pub fn register(&mut self, mode: &str, spec: CommandSpec) -> &mut Self {
        self.modes
            .entry(mode.to_string())
            .or_default()
            .insert(spec.name.to_string(), spec);
        self
    }

    #[must_use]
    pub fn build(self) -> CommandRegistry {
        CommandRegistry { modes: self.modes }
    }
}

/// The frozen registry. No runtime mutation; lookups only.
pub struct CommandRegistry {
    modes: HashMap<String, HashMap<String, CommandSpec>>,
}

impl CommandRegistry {
    /// Resolve `name` in `mode`, falling back to the global scope.
    #[must_use]
    pub fn lookup(&self, mode: &str, name: &str) -> Option<&CommandSpec> {
        if let Some(spec) = self.modes.get(mode).and_then(|table| table.get(name)) {
            return Some(spec);
        }
        if mode != GLOBAL_MODE {
            return self
                .modes
                .get(GLOBAL_MODE)
                .and_then(|table| table.get(name));
        }
        None
    }

    /// Names registered in exactly `mode`, sorted.
    #[must_use]
    pub fn names_for_mode(&self, mode: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .modes
            .get(mode)
            .map(|table| table.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Parse a prompt line in `mode` into a ready-to-apply command.
    pub fn parse_command_line(
        &self,
        mode: &str,
        line: &str,
    ) -> Result<Box<dyn Command>, CommandError> {
        let tokens = tokenize(line)?;
        let Some((first, rest)) = tokens.split_first() else {
            return Err(CommandError::precondition("empty command line"));
        };
        let spec = self.lookup(mode, &first.text).ok_or_else(|| CommandError::Unknown {
            mode: mode.to_string(),
            name: first.text.clone(),
        })?;
        let args = resolve(spec.args, rest)?;
        Ok((spec.build)(&args)?)
    }
}
