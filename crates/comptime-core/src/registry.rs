//! The registry of compile-time constants
//!
//! A [`ComptimeRegistry`] is a cheaply clonable handle: clones share the
//! same entries, so the caller can keep registering through one handle while
//! an injector reads through another. Entries keep their first insertion
//! position, which is the order they are emitted in.

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::config::{ComptimeOptions, DuplicatePolicy};
use crate::errors::{ProducerError, RegistryError, Result, ValueError};
use crate::identifier::is_valid_identifier;
use crate::value::ComptimeValue;

#[derive(Debug, Default)]
struct RegistryInner {
    entries: RwLock<IndexMap<String, ComptimeValue>>,
    policy: DuplicatePolicy,
}

/// Id -> value store read by the injector at load time
#[derive(Debug, Clone, Default)]
pub struct ComptimeRegistry {
    inner: Arc<RegistryInner>,
}

static GLOBAL_REGISTRY: OnceLock<ComptimeRegistry> = OnceLock::new();

impl ComptimeRegistry {
    /// Create an empty registry that overwrites duplicate ids
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given duplicate-id policy
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: RwLock::new(IndexMap::new()),
                policy,
            }),
        }
    }

    pub fn from_options(options: &ComptimeOptions) -> Self {
        Self::with_policy(options.duplicate_policy)
    }

    /// The process-wide registry.
    ///
    /// Created empty on first use and never cleared automatically; callers
    /// running several builds in one process should prefer their own
    /// registries or call [`clear`](Self::clear) between builds.
    pub fn global() -> &'static ComptimeRegistry {
        GLOBAL_REGISTRY.get_or_init(ComptimeRegistry::new)
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.inner.policy
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, ComptimeValue>> {
        self.inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, ComptimeValue>> {
        self.inner
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a value directly
    pub fn register(&self, id: impl Into<String>, value: impl Into<ComptimeValue>) -> Result<()> {
        let id = id.into();
        self.check_registrable(&id)?;
        self.insert(id, value.into())
    }

    /// Register the result of a producer.
    ///
    /// The producer runs exactly once, synchronously, before the registry is
    /// touched; only its result is stored. If it fails the registry is left
    /// as it was.
    pub fn register_with<F, V, E>(&self, id: impl Into<String>, producer: F) -> Result<()>
    where
        F: FnOnce() -> std::result::Result<V, E>,
        V: Into<ComptimeValue>,
        E: Into<ProducerError>,
    {
        let id = id.into();
        self.check_registrable(&id)?;

        let value = producer().map_err(|source| RegistryError::Producer {
            id: id.clone(),
            source: source.into(),
        })?;

        self.insert(id, value.into())
    }

    /// Register any serde-serializable data
    pub fn register_serialize<T: Serialize + ?Sized>(
        &self,
        id: impl Into<String>,
        data: &T,
    ) -> Result<()> {
        let id = id.into();
        self.check_registrable(&id)?;

        let value = ComptimeValue::from_serialize(data).map_err(|source| RegistryError::Value {
            id: id.clone(),
            source,
        })?;

        self.insert(id, value)
    }

    fn check_registrable(&self, id: &str) -> Result<()> {
        if !is_valid_identifier(id) {
            return Err(RegistryError::InvalidIdentifier { id: id.to_string() });
        }
        if self.inner.policy == DuplicatePolicy::Strict && self.contains(id) {
            return Err(RegistryError::DuplicateId { id: id.to_string() });
        }
        Ok(())
    }

    fn insert(&self, id: String, value: ComptimeValue) -> Result<()> {
        if value.has_prototype_key() {
            return Err(RegistryError::Value {
                id,
                source: ValueError::PrototypeKey,
            });
        }
        if value.has_unsafe_integer() {
            warn!(
                "Comptime value '{}' holds an integer beyond 2^53 - 1; it will be rounded when parsed",
                id
            );
        }

        let mut entries = self.write();

        if entries.contains_key(&id) {
            // A producer may have raced another registration of the same id
            if self.inner.policy == DuplicatePolicy::Strict {
                return Err(RegistryError::DuplicateId { id });
            }
            warn!("Overwriting comptime value '{}'", id);
        } else {
            debug!("Registered comptime value '{}' ({})", id, value.kind());
        }

        entries.insert(id, value);
        Ok(())
    }

    /// Copy the current entries out, in insertion order
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entries: self.read().clone(),
        }
    }

    pub fn get(&self, id: &str) -> Option<ComptimeValue> {
        self.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Remove an entry, returning its value. Later entries keep their order.
    pub fn remove(&self, id: &str) -> Option<ComptimeValue> {
        self.write().shift_remove(id)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// A point-in-time copy of the registry's entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: IndexMap<String, ComptimeValue>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ComptimeValue> {
        self.entries.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComptimeValue)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }
}

/// Later pairs overwrite earlier ones with the same id
impl<K: Into<String>> FromIterator<(K, ComptimeValue)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, ComptimeValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(id, value)| (id.into(), value)).collect(),
        }
    }
}

impl IntoIterator for Snapshot {
    type Item = (String, ComptimeValue);
    type IntoIter = indexmap::map::IntoIter<String, ComptimeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::synthesize_module;
    use std::cell::Cell;

    #[test]
    fn test_register_direct_value() {
        let registry = ComptimeRegistry::new();
        registry.register("answer", 42).unwrap();

        assert_eq!(registry.get("answer").and_then(|v| v.as_i64()), Some(42));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_producer_runs_once() {
        let registry = ComptimeRegistry::new();
        let calls = Cell::new(0);

        registry
            .register_with("version", || {
                calls.set(calls.get() + 1);
                Ok::<_, ProducerError>("1.0")
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(registry.get("version").unwrap().as_str(), Some("1.0"));

        registry.register("version", "2.0").unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_producer_failure_keeps_previous_value() {
        let registry = ComptimeRegistry::new();
        registry.register("commit", "abc123").unwrap();

        let result = registry.register_with("commit", || Err::<String, _>("git not found"));

        match result {
            Err(RegistryError::Producer { id, source }) => {
                assert_eq!(id, "commit");
                assert_eq!(source.to_string(), "git not found");
            }
            other => panic!("Expected producer error, got {:?}", other),
        }
        assert_eq!(registry.get("commit").unwrap().as_str(), Some("abc123"));
    }

    #[test]
    fn test_producer_failure_adds_no_entry() {
        let registry = ComptimeRegistry::new();
        let result = registry.register_with("missing", || Err::<i32, _>("boom"));

        assert!(result.is_err());
        assert!(!registry.contains("missing"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let registry = ComptimeRegistry::new();
        registry.register("a", 1).unwrap();
        registry.register("b", 2).unwrap();
        registry.register("a", 3).unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(snapshot.get("a").and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn test_strict_policy_rejects_duplicates() {
        let registry = ComptimeRegistry::with_policy(DuplicatePolicy::Strict);
        registry.register("flag", true).unwrap();

        let result = registry.register("flag", false);
        assert!(matches!(result, Err(RegistryError::DuplicateId { ref id }) if id == "flag"));
        assert_eq!(registry.get("flag").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_strict_policy_skips_producer_for_duplicates() {
        let registry = ComptimeRegistry::with_policy(DuplicatePolicy::Strict);
        registry.register("flag", true).unwrap();

        let ran = Cell::new(false);
        let result = registry.register_with("flag", || {
            ran.set(true);
            Ok::<_, ProducerError>(false)
        });

        assert!(result.is_err());
        assert!(!ran.get());
    }

    #[test]
    fn test_invalid_identifier_rejected_at_registration() {
        let registry = ComptimeRegistry::new();

        for id in ["not-an-ident", "eval", "arguments", "x\u{b2}", "\u{345}a"] {
            let result = registry.register(id, 1);
            assert!(
                matches!(result, Err(RegistryError::InvalidIdentifier { .. })),
                "{id:?} should be rejected"
            );
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_prototype_key_rejected_at_registration() {
        let registry = ComptimeRegistry::new();

        let err = registry
            .register_serialize("cfg", &serde_json::json!({"nested": {"__proto__": 5}}))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Value { ref id, source: ValueError::PrototypeKey } if id == "cfg"
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_registration_and_snapshots() {
        const COUNT: usize = 200;
        let registry = ComptimeRegistry::new();
        let ids: Vec<String> = (0..COUNT).map(|i| format!("value{i}")).collect();

        std::thread::scope(|scope| {
            let writer = registry.clone();
            let ids = &ids;
            scope.spawn(move || {
                for (i, id) in ids.iter().enumerate() {
                    writer.register(id.as_str(), i).unwrap();
                }
            });

            let reader = registry.clone();
            scope.spawn(move || {
                let mut last_len = 0;
                while last_len < COUNT {
                    let snapshot = reader.snapshot();
                    assert!(snapshot.len() >= last_len);
                    for (i, (id, value)) in snapshot.iter().enumerate() {
                        assert_eq!(id, ids[i]);
                        assert_eq!(value.as_i64(), Some(i as i64));
                    }

                    let module = synthesize_module(&snapshot).unwrap();
                    assert_eq!(module.lines().count(), snapshot.len());
                    last_len = snapshot.len();
                }
            });
        });

        assert_eq!(registry.len(), COUNT);
    }

    #[test]
    fn test_register_serialize_error_names_id() {
        let registry = ComptimeRegistry::new();
        let mut data = std::collections::HashMap::new();
        data.insert(vec![1u8], 1);

        let err = registry.register_serialize("table", &data).unwrap_err();
        assert!(err.to_string().contains("'table'"));
    }

    #[test]
    fn test_clones_share_entries() {
        let registry = ComptimeRegistry::new();
        let handle = registry.clone();

        registry.register("shared", "yes").unwrap();
        assert!(handle.contains("shared"));

        handle.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = ComptimeRegistry::new();
        registry.register("before", 1).unwrap();

        let snapshot = registry.snapshot();
        registry.register("after", 2).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.snapshot().len(), 2);
    }

    #[test]
    fn test_remove_preserves_order() {
        let registry = ComptimeRegistry::new();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            registry.register(*id, i).unwrap();
        }

        assert_eq!(registry.remove("b").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(registry.snapshot().ids().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_snapshot_from_iter_last_write_wins() {
        let snapshot: Snapshot = vec![
            ("x", ComptimeValue::from(1)),
            ("y", ComptimeValue::from(2)),
            ("x", ComptimeValue::from(3)),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("x").and_then(|v| v.as_i64()), Some(3));
    }
}
