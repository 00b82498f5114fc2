//! In-memory rule text store
//!
//! Rules are plain expression text keyed by machine id. The store can be
//! seeded from a YAML file of `machine_id: logic` entries so demo machines
//! exist at startup (the engine itself never writes here).

use anyhow::{Context, Result};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Concurrent machine-id → rule-text store.
///
/// Cloning yields another handle to the same underlying map.
#[derive(Debug, Default, Clone)]
pub struct LogicStore {
    rules: Arc<DashMap<String, String>>,
}

impl LogicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `machine_id: logic` entries from a YAML file
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
        let entries: BTreeMap<String, String> = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid seed file: {}", path.display()))?;

        let store = Self::new();
        for (machine_id, logic) in entries {
            store.rules.insert(machine_id, logic);
        }
        info!("Seeded {} machine rules from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn get(&self, machine_id: &str) -> Option<String> {
        self.rules.get(machine_id).map(|entry| entry.clone())
    }

    pub fn put(&self, machine_id: impl Into<String>, logic: impl Into<String>) {
        self.rules.insert(machine_id.into(), logic.into());
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_put_get() {
        let store = LogicStore::new();
        assert_eq!(store.get("machine_A"), None);
        store.put("machine_A", r#""running""#);
        assert_eq!(store.get("machine_A"), Some(r#""running""#.to_string()));
    }

    #[test]
    fn test_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "machine_A: 'if(signal == 1, \"running\", \"stopped\")'"
        )
        .unwrap();
        writeln!(file, "machine_B: '\"unknown\"'").unwrap();

        let store = LogicStore::from_seed_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("machine_A").unwrap().contains("signal"));
    }
}
