//! Address book mapping address codes to street addresses.

use crate::error::RackScanError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

/// Read-only mapping from address code to street address, loaded once per
/// run from a JSON object.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    entries: HashMap<String, String>,
}

impl AddressBook {
    /// Loads the address book from a JSON file.
    pub fn load(path: &str) -> Result<Self, RackScanError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Builds an address book from in-memory entries.
    pub fn from_entries<I: IntoIterator<Item = (String, String)>>(entries: I) -> Self {
        AddressBook {
            entries: entries.into_iter().collect(),
        }
    }

    /// Resolves an address code. Unknown codes resolve to the empty string.
    pub fn resolve(&self, code: &str) -> &str {
        self.entries.get(code).map(String::as_str).unwrap_or("")
    }
}
