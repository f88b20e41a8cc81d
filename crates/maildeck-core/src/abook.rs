//! Address books and prompt completion sources.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub address: String,
}

impl Contact {
    /// How the contact is inserted into a recipient header.
    #[must_use]
    pub fn display(&self) -> String {
        if self.name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.name, self.address)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl AddressBook {
    /// Contacts whose name or address contains `query`, ignoring case.
    #[must_use]
    pub fn lookup(&self, query: &str) -> Vec<&Contact> {
        let needle = query.to_ascii_lowercase();
        self.contacts
            .iter()
            .filter(|c| {
                c.name.to_ascii_lowercase().contains(&needle)
                    || c.address.to_ascii_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// A completion source handed opaquely to the prompt primitive. The engine
/// never calls it; the rendering side does while the user types.
pub trait Completer {
    fn complete(&self, prefix: &str) -> Vec<String>;
}

/// Completes recipient input from a set of address books.
pub struct ContactsCompleter {
    books: Vec<AddressBook>,
}

impl ContactsCompleter {
    #[must_use]
    pub fn new(books: Vec<AddressBook>) -> Self {
        Self { books }
    }
}

impl Completer for ContactsCompleter {
    fn complete(&self, prefix: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for book in &self.books {
            for contact in book.lookup(prefix) {
                let rendered = contact.display();
                if !seen.contains(&rendered) {
                    seen.push(rendered);
                }
            }
        }
        seen
    }
}

/// Completes sender input from the configured account addresses.
pub struct AccountCompleter {
    addresses: Vec<String>,
}

impl AccountCompleter {
    #[must_use]
    pub fn new(addresses: Vec<String>) -> Self {
        Self { addresses }
    }
}

impl Completer for AccountCompleter {
    fn complete(&self, prefix: &str) -> Vec<String> {
        let needle = prefix.to_ascii_lowercase();
        self.addresses
            .iter()
            .filter(|a| a.to_ascii_lowercase().starts_with(&needle))
            .cloned()
            .collect()
    }
}
