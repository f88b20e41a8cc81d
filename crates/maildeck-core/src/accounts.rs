//! Account identities and address-book ordering for completion.

use serde::{Deserialize, Serialize};

use crate::abook::AddressBook;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub realname: String,
    pub address: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abooks: Vec<AddressBook>,
}

impl Account {
    /// The account as it appears in a From header.
    #[must_use]
    pub fn from_header_value(&self) -> String {
        if self.realname.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.realname, self.address)
        }
    }

    fn answers_to(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(address))
    }
}

/// Ordered collection of configured accounts. The first account is the
/// default sender.
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    accounts: Vec<Account>,
}

impl Accounts {
    #[must_use]
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    #[must_use]
    pub fn list(&self) -> &[Account] {
        &self.accounts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Account> {
        self.accounts.first()
    }

    /// Account whose address or one of whose aliases matches, ignoring case.
    #[must_use]
    pub fn matching(&self, address: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.answers_to(address))
    }

    /// Address books for recipient completion: `first`'s books lead, the
    /// remaining accounts' books follow unless `matching_only` is set.
    #[must_use]
    pub fn address_books(&self, first: Option<&Account>, matching_only: bool) -> Vec<AddressBook> {
        let mut books = Vec::new();
        if let Some(account) = first {
            books.extend(account.abooks.iter().cloned());
        }
        if !matching_only {
            for account in &self.accounts {
                if let Some(lead) = first {
                    if account.address == lead.address {
                        continue;
                    }
                }
                books.extend(account.abooks.iter().cloned());
            }
        }
        books
    }
}

/// Extract the bare address from `Name <addr>` or a bare address string.
#[must_use]
pub fn parse_address(value: &str) -> &str {
    if let (Some(open), Some(close)) = (value.rfind('<'), value.rfind('>')) {
        if open < close {
            return value[open + 1..close].trim();
        }
    }
    value.trim()
}

#[cfg(test)]
mod tests {
    use super::{parse_address, Account, Accounts};
    use crate::abook::{AddressBook, Contact};

    fn account(address: &str, book_entries: &[&str]) -> Account {
        Account {
            realname: "Test".to_string(),
            address: address.to_string(),
            aliases: Vec::new(),
            abooks: vec![AddressBook {
                contacts: book_entries
                    .iter()
                    .map(|a| Contact {
                        name: String::new(),
                        address: (*a).to_string(),
                    })
                    .collect(),
            }],
        }
    }

    #[test]
    fn matching_ignores_case_and_checks_aliases() {
        let mut ada = account("ada@example.org", &[]);
        ada.aliases.push("lovelace@example.org".to_string());
        let accounts = Accounts::new(vec![ada]);

        assert!(accounts.matching("ADA@example.org").is_some());
        assert!(accounts.matching("lovelace@example.org").is_some());
        assert!(accounts.matching("nobody@example.org").is_none());
    }

    #[test]
    fn address_books_order_sender_first() {
        let ada = account("ada@example.org", &["a@x.org"]);
        let bob = account("bob@example.org", &["b@x.org"]);
        let accounts = Accounts::new(vec![ada, bob.clone()]);

        let books = accounts.address_books(Some(&bob), false);
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].contacts[0].address, "b@x.org");
        assert_eq!(books[1].contacts[0].address, "a@x.org");

        let only = accounts.address_books(Some(&bob), true);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].contacts[0].address, "b@x.org");
    }

    #[test]
    fn parse_address_strips_display_names() {
        assert_eq!(parse_address("Ada <ada@example.org>"), "ada@example.org");
        assert_eq!(parse_address("ada@example.org"), "ada@example.org");
        assert_eq!(parse_address("  ada@example.org "), "ada@example.org");
    }

    #[test]
    fn from_header_value_includes_realname_when_present() {
        let ada = Account {
            realname: "Ada Lovelace".to_string(),
            address: "ada@example.org".to_string(),
            aliases: Vec::new(),
            abooks: Vec::new(),
        };
        assert_eq!(ada.from_header_value(), "Ada Lovelace <ada@example.org>");
    }
}
