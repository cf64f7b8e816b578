//! Actuators currently held under exclusive control.
//!
//! Only the reconciler touches the tracker, and only from the tick context,
//! so it is a plain owned map: the `&mut self` receivers are the whole
//! concurrency story. An identifier is present exactly while its actuator is
//! held; removing the entry is the caller's cue to release the actuator once.

use std::collections::BTreeMap;

/// One actuator held on behalf of a control identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredControl<H> {
    /// The held actuator.
    pub actuator: H,
    /// Tick on which exclusive control was requested.
    pub acquired_at: u64,
}

/// Map from control identifier to the actuator held for it.
#[derive(Debug, Clone)]
pub struct AcquisitionTracker<H> {
    held: BTreeMap<String, AcquiredControl<H>>,
}

impl<H> Default for AcquisitionTracker<H> {
    fn default() -> Self {
        Self {
            held: BTreeMap::new(),
        }
    }
}

impl<H> AcquisitionTracker<H> {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `actuator` is held for `identifier`.
    ///
    /// Returns the previous entry, which the caller must release.
    pub fn acquire(
        &mut self,
        identifier: impl Into<String>,
        actuator: H,
        tick: u64,
    ) -> Option<AcquiredControl<H>> {
        self.held.insert(
            identifier.into(),
            AcquiredControl {
                actuator,
                acquired_at: tick,
            },
        )
    }

    /// Remove the entry for `identifier`, returning what was held.
    pub fn release(&mut self, identifier: &str) -> Option<AcquiredControl<H>> {
        self.held.remove(identifier)
    }

    /// Whether any actuator is held for `identifier`.
    pub fn has(&self, identifier: &str) -> bool {
        self.held.contains_key(identifier)
    }

    /// The entry held for `identifier`.
    pub fn get(&self, identifier: &str) -> Option<&AcquiredControl<H>> {
        self.held.get(identifier)
    }

    /// Identifiers with a held actuator, in order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.held.keys().map(String::as_str)
    }

    /// Number of held actuators.
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl<H: PartialEq> AcquisitionTracker<H> {
    /// Whether exactly `actuator` is held for `identifier`.
    pub fn holds(&self, identifier: &str, actuator: &H) -> bool {
        self.held
            .get(identifier)
            .is_some_and(|entry| entry.actuator == *actuator)
    }
}
