use crate::vault::{LogicalBackend, Secret, VaultError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Read(String),
    Write(String, Map<String, Value>),
    Delete(String),
    List(String),
}

/// In-memory stand-in for Vault's logical API.
///
/// Writes replace the stored map, reads echo it back, and listing derives
/// child names from stored paths the way KV v1 does (`"dir/"` for nested
/// entries, sorted lexically).
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, Map<String, Value>>>,
    calls: Mutex<Vec<Call>>,
    fail_with: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` at `path` without recording a call.
    pub fn insert(&self, path: &str, data: Value) {
        let map = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.entries
            .lock()
            .unwrap()
            .insert(path.trim_matches('/').to_string(), map);
    }

    pub fn remove(&self, path: &str) {
        self.entries.lock().unwrap().remove(path.trim_matches('/'));
    }

    pub fn get(&self, path: &str) -> Option<Map<String, Value>> {
        self.entries.lock().unwrap().get(path).cloned()
    }

    /// Makes every subsequent call fail with an API error.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), VaultError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().as_ref() {
            Some(message) => Err(VaultError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LogicalBackend for MemoryBackend {
    async fn read(&self, path: &str) -> Result<Option<Secret>, VaultError> {
        self.record(Call::Read(path.to_string()))?;
        Ok(self.get(path).map(Secret::from_data))
    }

    async fn write(
        &self,
        path: &str,
        data: Map<String, Value>,
    ) -> Result<Option<Secret>, VaultError> {
        self.record(Call::Write(path.to_string(), data.clone()))?;
        self.entries.lock().unwrap().insert(path.to_string(), data);
        Ok(None)
    }

    async fn delete(&self, path: &str) -> Result<(), VaultError> {
        self.record(Call::Delete(path.to_string()))?;
        self.entries.lock().unwrap().remove(path);
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<String>, VaultError> {
        self.record(Call::List(path.to_string()))?;
        let prefix = format!("{}/", path.trim_matches('/'));
        let mut names = BTreeSet::new();
        for key in self.entries.lock().unwrap().keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                match rest.split_once('/') {
                    Some((dir, _)) => names.insert(format!("{}/", dir)),
                    None => names.insert(rest.to_string()),
                };
            }
        }
        Ok(names.into_iter().collect())
    }
}
