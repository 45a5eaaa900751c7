//! Identifier resolver: simulator entity names to numeric session ids.
//!
//! Ids are looked up once through [`SimulatorApi`] and memoized per
//! category for the lifetime of the process. Failed lookups are never
//! cached, so the next access retries.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::client::SimulatorApi;
use crate::error::{BridgeError, Result};

/// Category of a simulator entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    DataRef,
    Command,
}

impl IdentifierKind {
    /// REST collection path.
    pub fn path(&self) -> &'static str {
        match self {
            IdentifierKind::DataRef => "datarefs",
            IdentifierKind::Command => "commands",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::DataRef => write!(f, "dataref"),
            IdentifierKind::Command => write!(f, "command"),
        }
    }
}

/// Write-once name -> id maps, one per category.
#[derive(Debug, Default)]
pub struct IdentifierCache {
    datarefs: HashMap<String, u64>,
    commands: HashMap<String, u64>,
}

impl IdentifierCache {
    fn table(&self, kind: IdentifierKind) -> &HashMap<String, u64> {
        match kind {
            IdentifierKind::DataRef => &self.datarefs,
            IdentifierKind::Command => &self.commands,
        }
    }

    pub fn get(&self, kind: IdentifierKind, name: &str) -> Option<u64> {
        self.table(kind).get(name).copied()
    }

    /// Insert an id unless one is already cached; returns the cached id.
    pub fn insert(&mut self, kind: IdentifierKind, name: &str, id: u64) -> u64 {
        let table = match kind {
            IdentifierKind::DataRef => &mut self.datarefs,
            IdentifierKind::Command => &mut self.commands,
        };
        *table.entry(name.to_string()).or_insert(id)
    }

    /// Reverse lookup by linear scan.
    pub fn name_of(&self, kind: IdentifierKind, id: u64) -> Option<&str> {
        self.table(kind)
            .iter()
            .find(|(_, cached)| **cached == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self, kind: IdentifierKind) -> usize {
        self.table(kind).len()
    }
}

/// Resolves and caches simulator ids.
pub struct IdentifierResolver {
    api: Arc<dyn SimulatorApi>,
    cache: RwLock<IdentifierCache>,
}

impl IdentifierResolver {
    pub fn new(api: Arc<dyn SimulatorApi>) -> Self {
        Self {
            api,
            cache: RwLock::new(IdentifierCache::default()),
        }
    }

    /// Resolve a name, returning the error on failure.
    pub async fn try_resolve(&self, kind: IdentifierKind, name: &str) -> Result<u64> {
        let cached = self.cache.read().get(kind, name);
        if let Some(id) = cached {
            return Ok(id);
        }

        match self.api.lookup_id(kind, name).await? {
            Some(id) => {
                let id = self.cache.write().insert(kind, name, id);
                info!(%kind, %name, id, "Found simulator id");
                Ok(id)
            }
            None => Err(BridgeError::NotFound {
                kind,
                name: name.to_string(),
            }),
        }
    }

    /// Resolve a name; not-found and transport failures are logged and
    /// reported as `None`.
    pub async fn resolve(&self, kind: IdentifierKind, name: &str) -> Option<u64> {
        match self.try_resolve(kind, name).await {
            Ok(id) => Some(id),
            Err(e @ BridgeError::NotFound { .. }) => {
                warn!("{}", e);
                None
            }
            Err(e) => {
                error!(%kind, %name, "Error fetching id: {}", e);
                None
            }
        }
    }

    /// Resolve every name, one lookup at a time. Fails with
    /// [`BridgeError::BatchAborted`] naming every unresolved entry if any
    /// name does not resolve.
    pub async fn resolve_all(&self, kind: IdentifierKind, names: &[String]) -> Result<Vec<u64>> {
        let mut ids = Vec::with_capacity(names.len());
        let mut missing = Vec::new();

        for name in names {
            match self.resolve(kind, name).await {
                Some(id) => ids.push(id),
                None => missing.push(name.clone()),
            }
        }

        if missing.is_empty() {
            Ok(ids)
        } else {
            Err(BridgeError::BatchAborted {
                kind,
                names: missing,
            })
        }
    }

    /// Name of a cached id.
    pub fn name_of(&self, kind: IdentifierKind, id: u64) -> Option<String> {
        self.cache.read().name_of(kind, id).map(str::to_string)
    }

    /// Read a live data reference value.
    pub async fn read_value(&self, id: u64) -> Result<Value> {
        debug!(id, "Reading current value");
        self.api.read_value(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_is_write_once() {
        let mut cache = IdentifierCache::default();
        assert_eq!(cache.insert(IdentifierKind::DataRef, "sim/a", 1), 1);
        assert_eq!(cache.insert(IdentifierKind::DataRef, "sim/a", 2), 1);
        assert_eq!(cache.get(IdentifierKind::DataRef, "sim/a"), Some(1));
    }

    #[test]
    fn test_cache_categories_are_independent() {
        let mut cache = IdentifierCache::default();
        cache.insert(IdentifierKind::DataRef, "sim/a", 1);
        cache.insert(IdentifierKind::Command, "sim/a", 7);

        assert_eq!(cache.get(IdentifierKind::Command, "sim/a"), Some(7));
        assert_eq!(cache.name_of(IdentifierKind::DataRef, 7), None);
        assert_eq!(cache.name_of(IdentifierKind::Command, 7), Some("sim/a"));
        assert_eq!(cache.len(IdentifierKind::DataRef), 1);
    }

    #[test]
    fn test_kind_paths() {
        assert_eq!(IdentifierKind::DataRef.path(), "datarefs");
        assert_eq!(IdentifierKind::Command.path(), "commands");
        assert_eq!(IdentifierKind::Command.to_string(), "command");
    }
}
