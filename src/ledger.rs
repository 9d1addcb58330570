use serde::Deserialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Set of episode keys with a completed download on disk. A key goes in only
/// after its file has been fully written; the set is persisted after every
/// success so an aborted run loses at most the in-flight episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    keys: BTreeSet<String>,
}

// canonical shape is the bare list; the object shape is a legacy format
#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Keys(Vec<String>),
    Items { items: Vec<String> },
}

impl Ledger {
    /// A missing or unreadable ledger is the normal first-run state and
    /// loads as empty.
    pub fn load(path: &Path) -> Ledger {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Ledger::default(),
        };
        match serde_json::from_str::<Stored>(&text) {
            Ok(Stored::Keys(keys)) | Ok(Stored::Items { items: keys }) => Ledger {
                keys: keys.into_iter().collect(),
            },
            Err(e) => {
                log::debug!("ignoring unreadable ledger {}: {}", path.display(), e);
                Ledger::default()
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn record(&mut self, key: String) {
        self.keys.insert(key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Full overwrite, sorted ascending for determinism.
    pub fn persist(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let keys: Vec<&String> = self.keys.iter().collect();
        let json = serde_json::to_string_pretty(&keys)?;
        fs::write(path, json)?;
        Ok(())
    }
}
