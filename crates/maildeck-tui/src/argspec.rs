//! Command-line argument schemas and resolution.
//!
//! ## Syntax
//!
//! | Form              | Meaning                                          |
//! |-------------------|--------------------------------------------------|
//! | `word`            | Positional value, filled in declaration order     |
//! | `--name value`    | Named argument                                    |
//! | `--name`          | Switch (boolean presence)                         |
//! | `'text'` / `"text"` | Quoting; double quotes honor `\"` and `\\`      |
//! | `\x`              | Backslash escape outside quotes                   |
//!
//! A schema is a slice of [`ArgSpec`]s. Resolution walks the tokens once,
//! injects forced values, fills defaults and checks arity; it is pure, so
//! resolving the same tokens against the same schema twice yields the same
//! [`ResolvedArgs`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// How an argument is spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Positional,
    Named,
    Switch,
}

/// How many values an argument takes. For positionals this is the total
/// count; for named arguments it is the count per appearance. A variadic
/// positional must be the last positional in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

/// Who may set the argument's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPolicy {
    /// Only the user supplies a value.
    UserOnly,
    /// The value used when the user supplies none.
    Defaulted(&'static str),
    /// Fixed by the registration; user attempts to set it are rejected.
    Forced(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub arity: Arity,
    pub policy: ArgPolicy,
    pub help: &'static str,
}

impl ArgSpec {
    #[must_use]
    pub const fn positional(name: &'static str, arity: Arity, help: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Positional,
            arity,
            policy: ArgPolicy::UserOnly,
            help,
        }
    }

    #[must_use]
    pub const fn named(name: &'static str, arity: Arity, help: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Named,
            arity,
            policy: ArgPolicy::UserOnly,
            help,
        }
    }

    #[must_use]
    pub const fn switch(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Switch,
            arity: Arity::ZeroOrOne,
            policy: ArgPolicy::UserOnly,
            help,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: ArgPolicy) -> Self {
        self.policy = policy;
        self
    }

    const fn forced_value(&self) -> Option<&'static str> {
        match self.policy {
            ArgPolicy::Forced(value) => Some(value),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error produced while tokenizing or resolving a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Byte offset into the input where the error was detected (if known).
    pub offset: Option<usize>,
    /// A hint for how to fix the input.
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
            hint: None,
        }
    }

    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: Some(offset),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(off) = self.offset {
            write!(f, " (at byte {off})")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "; hint: {hint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// A token with the byte offset of its first character in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub offset: usize,
}

/// Shell-like splitting with offset tracking. Quotes may start mid-word;
/// adjacent quoted and unquoted runs join into one token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, first)) = chars.peek() {
        if first.is_whitespace() {
            chars.next();
            continue;
        }

        let mut text = String::new();
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            match c {
                '\'' => {
                    chars.next();
                    let mut closed = false;
                    for (_, q) in chars.by_ref() {
                        if q == '\'' {
                            closed = true;
                            break;
                        }
                        text.push(q);
                    }
                    if !closed {
                        return Err(ParseError::at("unterminated quoted string", i)
                            .with_hint("close with a matching \"'\""));
                    }
                }
                '"' => {
                    chars.next();
                    let mut closed = false;
                    while let Some((_, q)) = chars.next() {
                        match q {
                            '"' => {
                                closed = true;
                                break;
                            }
                            '\\' => match chars.next() {
                                Some((_, escaped)) if escaped == '"' || escaped == '\\' => {
                                    text.push(escaped);
                                }
                                Some((_, escaped)) => {
                                    text.push('\\');
                                    text.push(escaped);
                                }
                                None => break,
                            },
                            _ => text.push(q),
                        }
                    }
                    if !closed {
                        return Err(ParseError::at("unterminated quoted string", i)
                            .with_hint("close with a matching '\"'"));
                    }
                }
                '\\' => {
                    chars.next();
                    match chars.next() {
                        Some((_, escaped)) => text.push(escaped),
                        None => {
                            return Err(ParseError::at("trailing backslash", i)
                                .with_hint("escape it as '\\\\' or remove it"));
                        }
                    }
                }
                _ => {
                    text.push(c);
                    chars.next();
                }
            }
        }
        tokens.push(Token {
            text,
            offset: start,
        });
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolved argument values by name. Switches resolve to `"true"` when
/// present and `"false"` when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedArgs {
    values: HashMap<String, Vec<String>>,
}

impl ResolvedArgs {
    fn push(&mut self, name: &str, value: String) {
        self.values.entry(name.to_string()).or_default().push(value);
    }

    fn insert(&mut self, name: &str, values: Vec<String>) {
        self.values.insert(name.to_string(), values);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The single value of `name`. Schema guarantees presence for required
    /// arguments; an absent name reports a `ParseError` instead of panicking.
    pub fn one(&self, name: &str) -> Result<&str, ParseError> {
        self.opt(name)
            .ok_or_else(|| ParseError::new(format!("missing required argument '{name}'")))
    }

    #[must_use]
    pub fn opt(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn many(&self, name: &str) -> &[String] {
        match self.values.get(name) {
            Some(values) => values,
            None => &[],
        }
    }

    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.opt(name) == Some("true")
    }

    /// Parse the single value of `name` into `T`.
    pub fn parse<T>(&self, name: &str) -> Result<T, ParseError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.one(name)?;
        raw.parse::<T>()
            .map_err(|err| ParseError::new(format!("invalid value '{raw}' for '{name}': {err}")))
    }
}

/// Map `tokens` onto `specs`. Forced values are injected first and user
/// attempts to supply them are rejected; defaults fill absent values; arity
/// violations are reported with the offending token's offset where known.
pub fn resolve(specs: &[ArgSpec], tokens: &[Token]) -> Result<ResolvedArgs, ParseError> {
    let mut out = ResolvedArgs::default();
    for spec in specs {
        if let Some(value) = spec.forced_value() {
            out.insert(spec.name, vec![value.to_string()]);
        }
    }

    let positionals: Vec<&ArgSpec> = specs
        .iter()
        .filter(|s| s.kind == ArgKind::Positional && s.forced_value().is_none())
        .collect();
    let mut next_positional = 0;

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if let Some(name) = token.text.strip_prefix("--") {
            let spec = specs
                .iter()
                .find(|s| s.name == name && s.kind != ArgKind::Positional)
                .ok_or_else(|| ParseError::at(format!("unknown argument --{name}"), token.offset))?;
            if spec.forced_value().is_some() {
                return Err(ParseError::at(
                    format!("argument --{name} is fixed for this command"),
                    token.offset,
                ));
            }
            if out.contains(name) {
                return Err(ParseError::at(
                    format!("argument --{name} given more than once"),
                    token.offset,
                ));
            }
            i += 1;
            match spec.kind {
                ArgKind::Switch => out.push(name, "true".to_string()),
                ArgKind::Named => {
                    let mut values = Vec::new();
                    let take_many =
                        matches!(spec.arity, Arity::ZeroOrMore | Arity::OneOrMore);
                    while i < tokens.len() && !tokens[i].text.starts_with("--") {
                        values.push(tokens[i].text.clone());
                        i += 1;
                        if !take_many {
                            break;
                        }
                    }
                    if values.is_empty() {
                        return Err(ParseError::at(
                            format!("missing value for --{name}"),
                            token.offset,
                        ));
                    }
                    out.insert(name, values);
                }
                ArgKind::Positional => {}
            }
        } else {
            let Some(slot) = positionals.get(next_positional) else {
                return Err(ParseError::at(
                    format!("unexpected argument '{}'", token.text),
                    token.offset,
                ));
            };
            out.push(slot.name, token.text.clone());
            match slot.arity {
                Arity::One | Arity::ZeroOrOne => next_positional += 1,
                Arity::ZeroOrMore | Arity::OneOrMore => {}
            }
            i += 1;
        }
    }

    for spec in specs {
        if out.contains(spec.name) {
            continue;
        }
        match spec.policy {
            ArgPolicy::Forced(_) => {}
            ArgPolicy::Defaulted(value) => out.insert(spec.name, vec![value.to_string()]),
            ArgPolicy::UserOnly => match (spec.kind, spec.arity) {
                (ArgKind::Switch, _) => out.insert(spec.name, vec!["false".to_string()]),
                (_, Arity::One | Arity::OneOrMore) if spec.kind == ArgKind::Positional => {
                    return Err(ParseError::new(format!(
                        "missing required argument '{}'",
                        spec.name
                    )));
                }
                _ => {}
            },
        }
    }

    Ok(out)
}
