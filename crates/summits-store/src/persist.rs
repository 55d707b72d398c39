//! Local key-value persistence and pinned aims

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use summits_model::Address;

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// File access failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// File content is not a JSON string map
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value storage surviving restarts
pub trait KeyValueStore: Send + Sync {
    /// Value under `key`
    ///
    /// # Errors
    /// Returns error if the backing storage fails
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Store `value` under `key`
    ///
    /// # Errors
    /// Returns error if the backing storage fails
    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;

    /// Delete `key`
    ///
    /// # Errors
    /// Returns error if the backing storage fails
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// Volatile store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file, rewritten on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<IndexMap<String, String>>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if it does not exist
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            IndexMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &IndexMap<String, String>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.shift_remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Storage key of the pin list for one network and account
#[must_use]
pub fn pins_key(network: &str, account: &Address) -> String {
    format!("pins.{network}.{account}")
}

/// Pinned aims of one account on one network
///
/// Kept as a comma-joined address list; rewritten on every pin or unpin.
pub struct Pins {
    key: String,
    addresses: IndexSet<Address>,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Pins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pins")
            .field("key", &self.key)
            .field("addresses", &self.addresses)
            .finish_non_exhaustive()
    }
}

impl Pins {
    /// Read the pin list from `store`
    ///
    /// Malformed entries are skipped.
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        network: &str,
        account: &Address,
    ) -> Result<Self, PersistError> {
        let key = pins_key(network, account);
        let addresses = store
            .get(&key)?
            .map(|joined| parse_pins(&joined))
            .unwrap_or_default();
        Ok(Self {
            key,
            addresses,
            store,
        })
    }

    /// Storage key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Pinned addresses in pin order
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter()
    }

    /// Whether `address` is pinned
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Number of pins
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// No pins
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Pin `address`; returns `false` if already pinned
    ///
    /// # Errors
    /// Returns error if the store cannot be written
    pub fn pin(&mut self, address: Address) -> Result<bool, PersistError> {
        if !self.addresses.insert(address) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Unpin `address`; returns `false` if it was not pinned
    ///
    /// # Errors
    /// Returns error if the store cannot be written
    pub fn unpin(&mut self, address: &Address) -> Result<bool, PersistError> {
        if !self.addresses.shift_remove(address) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn save(&self) -> Result<(), PersistError> {
        let joined = self
            .addresses
            .iter()
            .map(Address::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.store.set(&self.key, &joined)
    }
}

fn parse_pins(joined: &str) -> IndexSet<Address> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<Address>() {
            Ok(address) => Some(address),
            Err(e) => {
                tracing::warn!("Skipping malformed pin {:?}: {}", s, e);
                None
            }
        })
        .collect()
}
