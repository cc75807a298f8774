//! Result store: latest diagnostics per analyzer.
//!
//! Each slot is overwritten, never merged. Writers hold the lock only to
//! swap an `Arc`; readers clone the `Arc` and never wait on a running
//! analyzer.

use crate::models::Diagnostic;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Shared cache of per-analyzer diagnostics.
pub trait ResultStore: Send + Sync {
    /// Overwrite the slot for `analyzer`.
    fn set(&self, analyzer: &str, diagnostics: Vec<Diagnostic>);

    /// Overwrite the slot unless it already holds a result from a request
    /// newer than `sequence`. Returns whether the write happened.
    fn set_if_newer(&self, analyzer: &str, sequence: u64, diagnostics: Vec<Diagnostic>) -> bool;

    /// Last value set for `analyzer`, or empty if never set.
    fn get(&self, analyzer: &str) -> Arc<[Diagnostic]>;

    /// Every slot that has been set, keyed by analyzer id.
    fn snapshot(&self) -> BTreeMap<String, Arc<[Diagnostic]>>;
}

struct Slot {
    sequence: u64,
    diagnostics: Arc<[Diagnostic]>,
}

/// In-memory `ResultStore`.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryStore {
    fn set(&self, analyzer: &str, diagnostics: Vec<Diagnostic>) {
        let mut slots = self.slots.write();
        let sequence = slots.get(analyzer).map(|s| s.sequence).unwrap_or(0);
        slots.insert(
            analyzer.to_string(),
            Slot {
                sequence,
                diagnostics: diagnostics.into(),
            },
        );
    }

    fn set_if_newer(&self, analyzer: &str, sequence: u64, diagnostics: Vec<Diagnostic>) -> bool {
        let mut slots = self.slots.write();
        if let Some(slot) = slots.get(analyzer) {
            if slot.sequence > sequence {
                return false;
            }
        }
        slots.insert(
            analyzer.to_string(),
            Slot {
                sequence,
                diagnostics: diagnostics.into(),
            },
        );
        true
    }

    fn get(&self, analyzer: &str) -> Arc<[Diagnostic]> {
        self.slots
            .read()
            .get(analyzer)
            .map(|s| Arc::clone(&s.diagnostics))
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    fn snapshot(&self) -> BTreeMap<String, Arc<[Diagnostic]>> {
        self.slots
            .read()
            .iter()
            .map(|(id, s)| (id.clone(), Arc::clone(&s.diagnostics)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Position, Severity};

    fn diag(msg: &str, line: u32) -> Diagnostic {
        Diagnostic::new(msg, Position { line, column: 0 }, Severity::Warning)
    }

    #[test]
    fn test_get_unset_slot_is_empty() {
        let store = MemoryStore::new();
        assert!(store.get("phpcs").is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_set_overwrites_instead_of_merging() {
        let store = MemoryStore::new();
        store.set("phpcs", vec![diag("a", 1), diag("b", 2)]);
        store.set("phpcs", vec![diag("c", 3)]);
        let got = store.get("phpcs");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].message(), "c");
    }

    #[test]
    fn test_preserves_parser_order() {
        let store = MemoryStore::new();
        store.set("phpmd", vec![diag("z", 9), diag("a", 1)]);
        let msgs: Vec<_> = store.get("phpmd").iter().map(|d| d.message().to_string()).collect();
        assert_eq!(msgs, vec!["z", "a"]);
    }

    #[test]
    fn test_set_if_newer_rejects_stale_sequence() {
        let store = MemoryStore::new();
        assert!(store.set_if_newer("phpl", 2, vec![diag("new", 1)]));
        assert!(!store.set_if_newer("phpl", 1, vec![diag("old", 1)]));
        assert_eq!(store.get("phpl")[0].message(), "new");
        assert!(store.set_if_newer("phpl", 2, vec![]));
        assert!(store.get("phpl").is_empty());
    }

    #[test]
    fn test_snapshot_held_across_writes() {
        let store = MemoryStore::new();
        store.set("phpcs", vec![diag("a", 1)]);
        let before = store.get("phpcs");
        store.set("phpcs", vec![]);
        assert_eq!(before.len(), 1);
        assert!(store.get("phpcs").is_empty());
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let store = Arc::new(MemoryStore::new());
        let ids = ["phpcpd", "phpcs", "phpl", "phpmd"];
        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let store = Arc::clone(&store);
                let id = id.to_string();
                std::thread::spawn(move || {
                    for i in 0..200u32 {
                        store.set(&id, vec![diag(&id, i)]);
                        let _ = store.get("phpcs");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = store.snapshot();
        assert_eq!(snap.len(), 4);
        for id in ids {
            assert_eq!(snap[id][0].position().line, 199);
        }
    }
}
