//! Tick reconciliation: drive actuators toward their desired targets.
//!
//! The reconciler runs once per simulation tick. Each pass goes through
//! these steps:
//!
//! 1. **Cleanup** -- release every held actuator whose target has left the
//!    store.
//! 2. **Context** -- resolve the player's driving context and the entity it
//!    controls. If either is missing the pass ends; targets stay pending.
//! 3. **Targets** -- each pending target is handled independently:
//!    - resolve the concrete actuator name and look it up;
//!    - for relative targets, add the delta to the current value;
//!    - if the actuator is neither being changed nor held, request
//!      exclusive control and stop there for this tick;
//!    - otherwise apply the value in the actuator's control style.
//! 4. **Commit** -- remove converged one-shot targets from the store.
//!
//! Per target, the passes move through the states
//! `Pending -> Acquiring -> Applying -> (Converged | Held)`, reported as
//! [`TargetOutcome`] values in the [`TickReport`]. A relative target is
//! applied exactly once: it leaves the store after its first write whether
//! or not the actuator reached `current + delta`.
//!
//! Failures never escape a pass. A missing actuator, an unreadable value, or
//! an unsupported control style skips that target for this tick only; it is
//! retried on the next pass because the target is still in the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use cablink_protocol::ControlTarget;
use tracing::{debug, info, trace};

use crate::directory::{ActuatorDirectory, ControlStyle};
use crate::naming::{SeatSide, resolve_control_name};
use crate::store::{TargetStore, TickSnapshot};
use crate::tracker::AcquisitionTracker;

/// Name of the per-frame event on which a pass runs.
pub const TICK_EVENT: &str = "Tick";

/// Absolute tolerance within which a continuous actuator has converged.
pub const CONVERGENCE_EPSILON: f32 = 0.05;

/// Effective targets above this value push a discrete actuator.
pub const PUSH_THRESHOLD: f32 = 0.5;

/// Why a whole pass was skipped after cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSkip {
    /// No active player driving context.
    NoPlayerContext,
    /// The player context controls no drivable entity.
    NoControllable,
}

/// Why one target was skipped for this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No actuator with the resolved name exists.
    ActuatorNotFound {
        /// The concrete name that was looked up.
        name: String,
    },
    /// The actuator's current value could not be read.
    ValueUnavailable,
    /// The actuator exposes neither control style.
    UnsupportedStyle,
}

/// What happened to one target during a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    /// Left pending; retried next tick.
    Skipped(SkipReason),
    /// Exclusive control requested; the value is applied from the next tick.
    Acquiring,
    /// Value applied but not yet within tolerance; kept for the next tick.
    Applying {
        /// Value that was written.
        target: f32,
        /// Value read back after the write.
        current: Option<f32>,
    },
    /// Value applied and the target removed from the store.
    Converged {
        /// Value that was written.
        target: f32,
    },
    /// Relative delta applied once without reaching its value; the target
    /// is removed so the delta is never added twice.
    Spent {
        /// Value that was written.
        target: f32,
        /// Value read back after the write.
        current: Option<f32>,
    },
    /// Value applied and the target kept because it holds.
    Held {
        /// Value that was written.
        target: f32,
    },
}

impl TargetOutcome {
    /// Whether the target leaves the store at the end of the pass.
    pub const fn removes_target(&self) -> bool {
        matches!(self, Self::Converged { .. } | Self::Spent { .. })
    }
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The pass number (1-based).
    pub tick: u64,
    /// Set when the pass stopped after cleanup.
    pub skipped: Option<TickSkip>,
    /// Identifiers whose actuators were released during cleanup.
    pub released: Vec<String>,
    /// Outcome per processed identifier.
    pub outcomes: BTreeMap<String, TargetOutcome>,
    /// Number of targets removed from the store.
    pub removed: usize,
}

impl TickReport {
    const fn new(tick: u64) -> Self {
        Self {
            tick,
            skipped: None,
            released: Vec::new(),
            outcomes: BTreeMap::new(),
            removed: 0,
        }
    }

    /// Outcome recorded for `identifier`, if it was processed.
    pub fn outcome(&self, identifier: &str) -> Option<&TargetOutcome> {
        self.outcomes.get(identifier)
    }
}

/// The per-tick control loop.
///
/// Owns the [`AcquisitionTracker`] outright: only the tick context ever
/// mutates it. The [`TargetStore`] is shared with the receive context.
pub struct Reconciler<D: ActuatorDirectory> {
    store: Arc<TargetStore>,
    tracker: AcquisitionTracker<D::Handle>,
    tick: u64,
}

impl<D: ActuatorDirectory> Reconciler<D> {
    /// Create a reconciler reading targets from `store`.
    pub fn new(store: Arc<TargetStore>) -> Self {
        Self {
            store,
            tracker: AcquisitionTracker::new(),
            tick: 0,
        }
    }

    /// The shared target store.
    pub fn store(&self) -> &Arc<TargetStore> {
        &self.store
    }

    /// Actuators currently held under exclusive control.
    pub const fn tracker(&self) -> &AcquisitionTracker<D::Handle> {
        &self.tracker
    }

    /// Number of passes run so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Entry point for the simulation's per-frame event hook.
    ///
    /// Runs a pass for [`TICK_EVENT`] and ignores every other event.
    pub fn on_frame_event(&mut self, event: &str, directory: &mut D) -> Option<TickReport> {
        if event != TICK_EVENT {
            return None;
        }
        Some(self.run_tick(directory))
    }

    /// Run one reconciliation pass.
    pub fn run_tick(&mut self, directory: &mut D) -> TickReport {
        self.tick = self.tick.saturating_add(1);
        let mut report = TickReport::new(self.tick);

        let store = Arc::clone(&self.store);
        let snapshot = store.snapshot_for_tick();

        // --- Cleanup ---
        report.released = self.release_orphans(&snapshot, directory);

        // --- Context ---
        let Some(context) = directory.resolve_player_context() else {
            trace!(tick = self.tick, "Missing player context, skipping tick");
            report.skipped = Some(TickSkip::NoPlayerContext);
            return report;
        };
        let Some(controllable) = directory.resolve_controllable(&context) else {
            trace!(tick = self.tick, "Missing controllable entity, skipping tick");
            report.skipped = Some(TickSkip::NoControllable);
            return report;
        };
        let side = SeatSide::of(directory, &context);

        // --- Targets ---
        let mut removals = Vec::new();
        for target in snapshot.targets() {
            let outcome = self.reconcile_target(target, side, &controllable, directory);
            if outcome.removes_target() {
                removals.push(target.identifier.clone());
            }
            report.outcomes.insert(target.identifier.clone(), outcome);
        }

        // --- Commit ---
        report.removed = snapshot.commit(&removals);
        report
    }

    /// Release held actuators whose target is no longer in the store.
    fn release_orphans(&mut self, snapshot: &TickSnapshot<'_>, directory: &mut D) -> Vec<String> {
        let orphans: Vec<String> = self
            .tracker
            .identifiers()
            .filter(|identifier| !snapshot.contains(identifier))
            .map(str::to_owned)
            .collect();

        for identifier in &orphans {
            if let Some(held) = self.tracker.release(identifier) {
                info!(
                    identifier = %identifier,
                    acquired_at = held.acquired_at,
                    held_ticks = self.tick.saturating_sub(held.acquired_at),
                    "Releasing control"
                );
                directory.end_exclusive(&held.actuator);
            }
        }
        orphans
    }

    fn reconcile_target(
        &mut self,
        target: &ControlTarget,
        side: SeatSide,
        controllable: &D::Handle,
        directory: &mut D,
    ) -> TargetOutcome {
        let identifier = target.identifier.as_str();
        let name = resolve_control_name(identifier, side);
        let Some(actuator) = directory.find_actuator(controllable, &name) else {
            trace!(identifier, name = %name, "Actuator not found");
            return TargetOutcome::Skipped(SkipReason::ActuatorNotFound {
                name: name.into_owned(),
            });
        };

        let hold = target.flags.holds();
        let effective = if target.flags.relative {
            let Some(current) = directory.read_value(&actuator) else {
                return TargetOutcome::Skipped(SkipReason::ValueUnavailable);
            };
            current + target.value
        } else {
            target.value
        };

        // --- Acquisition (value applied from the next tick) ---
        if !directory.is_changing(&actuator) && !self.tracker.holds(identifier, &actuator) {
            if let Some(stale) = self.tracker.acquire(identifier, actuator.clone(), self.tick) {
                debug!(identifier, "Releasing previously held actuator");
                directory.end_exclusive(&stale.actuator);
            }
            debug!(identifier, name = %name, "Acquiring control");
            directory.begin_exclusive(&actuator);
            return TargetOutcome::Acquiring;
        }

        // --- Application ---
        match directory.control_style(&actuator) {
            ControlStyle::Discrete => {
                let pushed = effective > PUSH_THRESHOLD;
                directory.apply_discrete(&actuator, pushed, true);
                debug!(identifier, pushed, hold, "Applied discrete control");
                if hold {
                    TargetOutcome::Held { target: effective }
                } else {
                    TargetOutcome::Converged { target: effective }
                }
            }
            ControlStyle::Continuous => {
                directory.apply_continuous(&actuator, effective);
                let current = directory.read_value(&actuator);
                let converged =
                    current.is_some_and(|value| (effective - value).abs() < CONVERGENCE_EPSILON);
                debug!(identifier, target = effective, ?current, converged, hold, "Applied continuous control");
                if hold {
                    TargetOutcome::Held { target: effective }
                } else if converged {
                    TargetOutcome::Converged { target: effective }
                } else if target.flags.relative {
                    TargetOutcome::Spent {
                        target: effective,
                        current,
                    }
                } else {
                    TargetOutcome::Applying {
                        target: effective,
                        current,
                    }
                }
            }
            ControlStyle::Unsupported => {
                trace!(identifier, name = %name, "Actuator exposes no control style");
                TargetOutcome::Skipped(SkipReason::UnsupportedStyle)
            }
        }
    }
}
