//! Composition drafts: ordered mail headers plus a body.

use serde::{Deserialize, Serialize};

/// A message under composition. Headers keep insertion order and are
/// matched by name ignoring case, as mail headers are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    headers: Vec<(String, Vec<String>)>,
    body: String,
}

impl Draft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// First value of the named header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entry(name)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        match self.entry(name) {
            Some((_, values)) => values,
            None => &[],
        }
    }

    /// Append a value, creating the header if absent.
    pub fn add(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.entry_mut(name) {
            slot.push(value.to_string());
            return;
        }
        self.headers
            .push((name.to_string(), vec![value.to_string()]));
    }

    /// Replace all values of the named header.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.entry_mut(name) {
            slot.clear();
            slot.push(value.to_string());
            return;
        }
        self.headers
            .push((name.to_string(), vec![value.to_string()]));
    }

    #[must_use]
    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: &str) {
        self.body = body.to_string();
    }

    fn entry(&self, name: &str) -> Option<&(String, Vec<String>)> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        self.headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values)
    }
}

#[cfg(test)]
mod tests {
    use super::Draft;

    #[test]
    fn header_lookup_ignores_case() {
        let mut draft = Draft::new();
        draft.set("From", "ada@example.org");
        assert_eq!(draft.get("from"), Some("ada@example.org"));
        assert!(draft.contains("FROM"));
        assert!(!draft.contains("To"));
    }

    #[test]
    fn add_appends_set_replaces() {
        let mut draft = Draft::new();
        draft.add("To", "ada@example.org");
        draft.add("To", "bob@example.org");
        assert_eq!(draft.get_all("to").len(), 2);

        draft.set("To", "carol@example.org");
        assert_eq!(draft.get_all("To"), ["carol@example.org".to_string()]);
    }

    #[test]
    fn header_order_is_insertion_order() {
        let mut draft = Draft::new();
        draft.set("From", "a");
        draft.set("To", "b");
        draft.set("Subject", "c");
        assert_eq!(draft.header_names(), vec!["From", "To", "Subject"]);
    }
}
