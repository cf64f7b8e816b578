//! The simulation's object graph as seen by the reconciler.
//!
//! The simulation engine owns every actuator. The reconciler and the event
//! forwarder only reach it through [`ActuatorDirectory`], which abstracts the
//! lookups, reads, writes, and exclusive-control requests they need. Every
//! operation tolerates handles that have gone stale between ticks: lookups
//! and reads return `None`, and writes against a stale handle do nothing.

use serde::{Deserialize, Serialize};

/// How an actuator accepts input. Detected once when it is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlStyle {
    /// Push-button: driven by a pushed/released state.
    Discrete,
    /// Analog: driven by writing a new current value.
    Continuous,
    /// Neither style is exposed; the actuator cannot be driven.
    Unsupported,
}

/// A value-change notification raised by the simulation for one actuator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChanged<H> {
    /// The actuator whose value changed.
    pub actuator: H,
    /// Value before the change.
    pub old: f32,
    /// Value after the change.
    pub new: f32,
}

/// Access to the simulation's actuators and player state.
///
/// All calls are made from the single simulation-tick context. Write
/// operations take `&mut self` because they mutate simulation state.
pub trait ActuatorDirectory {
    /// Opaque reference to a simulation object (actuator or vehicle).
    type Handle: Clone + PartialEq + std::fmt::Debug;

    /// The active player's driving context (the pawn occupying a seat).
    type Context;

    /// A controller that can be changing an actuator.
    type Controller;

    /// Resolve the active player's driving context.
    fn resolve_player_context(&self) -> Option<Self::Context>;

    /// Resolve the drivable entity the player context controls.
    fn resolve_controllable(&self, context: &Self::Context) -> Option<Self::Handle>;

    /// Raw side flag of the seat attached to the context, if a seat is
    /// attached.
    fn seat_side(&self, context: &Self::Context) -> Option<u8>;

    /// Find an actuator on the controllable entity by concrete name.
    fn find_actuator(&self, controllable: &Self::Handle, name: &str) -> Option<Self::Handle>;

    /// Probe which input style the actuator exposes.
    fn control_style(&self, actuator: &Self::Handle) -> ControlStyle;

    /// Read the actuator's current value.
    fn read_value(&self, actuator: &Self::Handle) -> Option<f32>;

    /// Whether the actuator is currently being changed by some controller.
    fn is_changing(&self, actuator: &Self::Handle) -> bool;

    /// Request exclusive control of the actuator.
    fn begin_exclusive(&mut self, actuator: &Self::Handle);

    /// Release exclusive control of the actuator.
    fn end_exclusive(&mut self, actuator: &Self::Handle);

    /// Drive a push-button actuator.
    fn apply_discrete(&mut self, actuator: &Self::Handle, pushed: bool, instantaneous: bool);

    /// Drive an analog actuator towards `value`.
    fn apply_continuous(&mut self, actuator: &Self::Handle, value: f32);

    /// The actuator's input identifier; `None` for the null identifier.
    fn input_identifier(&self, actuator: &Self::Handle) -> Option<String>;

    /// The controller currently changing the actuator, if any.
    fn changing_controller(&self, actuator: &Self::Handle) -> Option<Self::Controller>;

    /// Whether `controller` belongs to the local player.
    fn is_local_player(&self, controller: &Self::Controller) -> bool;
}
