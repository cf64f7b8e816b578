//! The set of desired control targets.
//!
//! Writers run on the network-receive context whenever a message arrives;
//! the single reader is the reconciler on the simulation-tick context.
//!
//! # Locking
//!
//! A tick pass takes an *upgradable* read lock for its whole duration via
//! [`TargetStore::snapshot_for_tick`]. Writers are excluded for the pass, so
//! the reconciler iterates a set that cannot move underneath it. Removals
//! the pass decides on are staged and applied by
//! [`TickSnapshot::commit`], which upgrades the same guard to a write lock
//! atomically. No writer can slip in between the read and the removal, so a
//! target replaced by a fresh command is never removed by a stale decision.

use std::collections::BTreeMap;

use cablink_protocol::ControlTarget;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

/// Concurrent map from control identifier to its desired target.
#[derive(Debug, Default)]
pub struct TargetStore {
    targets: RwLock<BTreeMap<String, ControlTarget>>,
}

impl TargetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the target for its identifier.
    ///
    /// Returns the target that was replaced, if any.
    pub fn upsert(&self, target: ControlTarget) -> Option<ControlTarget> {
        self.targets
            .write()
            .insert(target.identifier.clone(), target)
    }

    /// Remove the target for `identifier`. Idempotent.
    ///
    /// Returns `true` if a target was removed.
    pub fn remove_if_present(&self, identifier: &str) -> bool {
        self.targets.write().remove(identifier).is_some()
    }

    /// Return a copy of the target for `identifier`.
    pub fn get(&self, identifier: &str) -> Option<ControlTarget> {
        self.targets.read().get(identifier).cloned()
    }

    /// Whether a target exists for `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.targets.read().contains_key(identifier)
    }

    /// Number of pending targets.
    pub fn len(&self) -> usize {
        self.targets.read().len()
    }

    /// Whether no targets are pending.
    pub fn is_empty(&self) -> bool {
        self.targets.read().is_empty()
    }

    /// Take the read view for one tick pass.
    ///
    /// Blocks writers until the snapshot is dropped or committed. Plain
    /// readers are not blocked.
    pub fn snapshot_for_tick(&self) -> TickSnapshot<'_> {
        TickSnapshot {
            guard: self.targets.upgradable_read(),
        }
    }
}

/// Read view of the store held for the duration of one tick pass.
pub struct TickSnapshot<'a> {
    guard: RwLockUpgradableReadGuard<'a, BTreeMap<String, ControlTarget>>,
}

impl TickSnapshot<'_> {
    /// Iterate the pending targets in identifier order.
    pub fn targets(&self) -> impl Iterator<Item = &ControlTarget> {
        self.guard.values()
    }

    /// Whether a target exists for `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.guard.contains_key(identifier)
    }

    /// Number of targets in the view.
    pub fn len(&self) -> usize {
        self.guard.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Apply the pass's staged removals and release the lock.
    ///
    /// Returns the number of targets removed.
    pub fn commit(self, removals: &[String]) -> usize {
        if removals.is_empty() {
            return 0;
        }
        let mut targets = RwLockUpgradableReadGuard::upgrade(self.guard);
        removals
            .iter()
            .filter(|identifier| targets.remove(identifier.as_str()).is_some())
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::sync::{Arc, mpsc};
    use std::thread;

    use cablink_protocol::ControlFlags;

    use super::*;

    fn target(identifier: &str, value: f32) -> ControlTarget {
        ControlTarget::new(identifier, value, ControlFlags::NONE)
    }

    #[test]
    fn upsert_replaces_existing_target() {
        let store = TargetStore::new();
        assert!(store.upsert(target("throttle", 0.2)).is_none());
        let previous = store.upsert(target("throttle", 0.8)).unwrap();
        assert_eq!(previous.value, 0.2);
        assert_eq!(store.get("throttle").unwrap().value, 0.8);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = TargetStore::new();
        store.upsert(target("horn", 1.0));
        assert!(store.remove_if_present("horn"));
        assert!(!store.remove_if_present("horn"));
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_iterates_in_identifier_order() {
        let store = TargetStore::new();
        store.upsert(target("wiper", 1.0));
        store.upsert(target("brake", 0.5));
        store.upsert(target("horn", 1.0));

        let snapshot = store.snapshot_for_tick();
        let ids: Vec<&str> = snapshot.targets().map(|t| t.identifier.as_str()).collect();
        assert_eq!(ids, vec!["brake", "horn", "wiper"]);
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn commit_removes_only_staged_targets() {
        let store = TargetStore::new();
        store.upsert(target("brake", 0.5));
        store.upsert(target("horn", 1.0));

        let snapshot = store.snapshot_for_tick();
        let removed = snapshot.commit(&["horn".to_owned(), "missing".to_owned()]);
        assert_eq!(removed, 1);
        assert!(store.contains("brake"));
        assert!(!store.contains("horn"));
    }

    #[test]
    fn readers_are_not_blocked_by_a_tick_pass() {
        let store = TargetStore::new();
        store.upsert(target("brake", 0.5));
        let snapshot = store.snapshot_for_tick();
        assert!(store.contains("brake"));
        assert_eq!(snapshot.commit(&[]), 0);
    }

    #[test]
    fn writer_waits_for_the_pass_to_finish() {
        let store = Arc::new(TargetStore::new());
        store.upsert(target("throttle", 0.1));

        let snapshot = store.snapshot_for_tick();
        let (started_tx, started_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let writer_store = Arc::clone(&store);
        let writer = thread::spawn(move || {
            started_tx.send(()).unwrap();
            writer_store.upsert(target("throttle", 0.9));
            done_tx.send(()).unwrap();
        });

        started_rx.recv().unwrap();
        // Still inside the pass: the writer cannot have finished.
        assert_eq!(done_rx.try_recv(), Err(mpsc::TryRecvError::Empty));
        assert_eq!(snapshot.targets().next().unwrap().value, 0.1);
        assert_eq!(snapshot.commit(&["throttle".to_owned()]), 1);

        done_rx.recv().unwrap();
        writer.join().unwrap();
        assert_eq!(store.get("throttle").unwrap().value, 0.9);
    }
}
