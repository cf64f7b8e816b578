//! An in-memory driving cab implementing [`ActuatorDirectory`].
//!
//! The cab stands in for the simulation engine: it owns a single vehicle
//! with a set of named actuators, tracks which controller is changing each
//! one, and queues a [`ValueChanged`] notification whenever a value moves.
//! The engine binary drives it from `cablink.yaml`, and the tests use it to
//! script player input and inspect every call the reconciler makes.

use std::collections::BTreeMap;

use crate::config::{ActuatorConfig, CabConfig};
use crate::directory::{ActuatorDirectory, ControlStyle, ValueChanged};

/// Who is changing an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Controller {
    /// The local player's controller.
    LocalPlayer,
    /// The bridge's own exclusive-control session.
    Bridge,
    /// Any other controller (AI, remote player), by id.
    Other(u32),
}

/// Handle to an object inside the cab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CabHandle {
    /// The drivable vehicle itself.
    Vehicle,
    /// An actuator, by its unique id. Ids are never reused.
    Actuator(u32),
}

/// The player's driving context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CabContext {
    /// Raw side flag of the occupied seat.
    pub seat_side: Option<u8>,
}

/// Static description of one actuator.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorSpec {
    /// Concrete actuator name.
    pub name: String,
    /// Input identifier; empty means the null identifier.
    pub input_identifier: String,
    /// How the actuator accepts input.
    pub style: ControlStyle,
    /// Starting value.
    pub initial: f32,
    /// Lowest reachable value.
    pub min: f32,
    /// Highest reachable value.
    pub max: f32,
    /// Detents a continuous value snaps to.
    pub notches: Vec<f32>,
}

impl ActuatorSpec {
    /// A `[0, 1]` actuator starting at zero with no detents.
    pub fn new(
        name: impl Into<String>,
        input_identifier: impl Into<String>,
        style: ControlStyle,
    ) -> Self {
        Self {
            name: name.into(),
            input_identifier: input_identifier.into(),
            style,
            initial: 0.0,
            min: 0.0,
            max: 1.0,
            notches: Vec::new(),
        }
    }

    /// Set the starting value.
    #[must_use]
    pub const fn with_initial(mut self, initial: f32) -> Self {
        self.initial = initial;
        self
    }

    /// Set the reachable range.
    #[must_use]
    pub const fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the detent positions.
    #[must_use]
    pub fn with_notches(mut self, notches: Vec<f32>) -> Self {
        self.notches = notches;
        self
    }
}

impl From<&ActuatorConfig> for ActuatorSpec {
    fn from(config: &ActuatorConfig) -> Self {
        Self {
            name: config.name.clone(),
            input_identifier: config.input_identifier.clone(),
            style: config.style,
            initial: config.initial,
            min: config.min,
            max: config.max,
            notches: config.notches.clone(),
        }
    }
}

/// One directory call that touched actuator state, recorded in order.
#[derive(Debug, Clone, PartialEq)]
pub enum CabCall {
    /// `begin_exclusive` on the named actuator.
    BeginExclusive(String),
    /// `end_exclusive` on the named actuator.
    EndExclusive(String),
    /// `apply_discrete` on the named actuator.
    Discrete {
        /// Actuator name.
        name: String,
        /// Requested pushed state.
        pushed: bool,
    },
    /// `apply_continuous` on the named actuator.
    Continuous {
        /// Actuator name.
        name: String,
        /// Requested value, before clamping.
        value: f32,
    },
}

#[derive(Debug, Clone)]
struct Actuator {
    spec: ActuatorSpec,
    value: f32,
    pushed: bool,
    readable: bool,
    changing_by: Option<Controller>,
}

impl Actuator {
    fn new(spec: ActuatorSpec) -> Self {
        Self {
            value: spec.initial,
            pushed: false,
            readable: true,
            changing_by: None,
            spec,
        }
    }

    fn settle(&self, value: f32) -> f32 {
        let clamped = value.max(self.spec.min).min(self.spec.max);
        self.spec
            .notches
            .iter()
            .copied()
            .min_by(|a, b| (a - clamped).abs().total_cmp(&(b - clamped).abs()))
            .unwrap_or(clamped)
    }
}

/// A single-vehicle cab with named actuators.
#[derive(Debug, Clone)]
pub struct VirtualCab {
    actuators: BTreeMap<u32, Actuator>,
    next_id: u32,
    player_present: bool,
    vehicle_present: bool,
    seat_side: Option<u8>,
    pending: Vec<ValueChanged<CabHandle>>,
    journal: Vec<CabCall>,
}

impl VirtualCab {
    /// An empty cab with the player seated on `seat_side`.
    pub const fn new(seat_side: Option<u8>) -> Self {
        Self {
            actuators: BTreeMap::new(),
            next_id: 0,
            player_present: true,
            vehicle_present: true,
            seat_side,
            pending: Vec::new(),
            journal: Vec::new(),
        }
    }

    /// Build a cab from its configured layout.
    pub fn from_config(config: &CabConfig) -> Self {
        let mut cab = Self::new(config.seat_side);
        for actuator in &config.actuators {
            cab.add_actuator(ActuatorSpec::from(actuator));
        }
        cab
    }

    /// Install an actuator and return its handle.
    ///
    /// Name lookups return the earliest installed actuator with that name.
    pub fn add_actuator(&mut self, spec: ActuatorSpec) -> CabHandle {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.actuators.insert(id, Actuator::new(spec));
        CabHandle::Actuator(id)
    }

    /// Remove the named actuator. Its handles go stale.
    pub fn remove_actuator(&mut self, name: &str) -> bool {
        match self.id_of(name) {
            Some(id) => self.actuators.remove(&id).is_some(),
            None => false,
        }
    }

    /// Seat or unseat the player.
    pub const fn set_player_present(&mut self, present: bool) {
        self.player_present = present;
    }

    /// Attach or detach the drivable vehicle.
    pub const fn set_vehicle_present(&mut self, present: bool) {
        self.vehicle_present = present;
    }

    /// Move the player to another seat.
    pub const fn set_seat_side(&mut self, seat_side: Option<u8>) {
        self.seat_side = seat_side;
    }

    /// Make the named actuator's value readable or not.
    pub fn set_readable(&mut self, name: &str, readable: bool) -> bool {
        let Some(actuator) = self.by_name_mut(name) else {
            return false;
        };
        actuator.readable = readable;
        true
    }

    /// Current value of the named actuator, ignoring readability.
    pub fn value(&self, name: &str) -> Option<f32> {
        self.by_name(name).map(|actuator| actuator.value)
    }

    /// Current pushed state of the named actuator.
    pub fn is_pushed(&self, name: &str) -> Option<bool> {
        self.by_name(name).map(|actuator| actuator.pushed)
    }

    /// Controller currently changing the named actuator.
    pub fn controller_of(&self, name: &str) -> Option<Controller> {
        self.by_name(name).and_then(|actuator| actuator.changing_by)
    }

    /// Handle of the named actuator.
    pub fn handle_of(&self, name: &str) -> Option<CabHandle> {
        self.id_of(name).map(CabHandle::Actuator)
    }

    /// Move the named actuator by hand on behalf of `controller`.
    ///
    /// The controller keeps changing the actuator until [`release_drag`].
    /// Returns `false` if no such actuator exists.
    ///
    /// [`release_drag`]: Self::release_drag
    pub fn drag(&mut self, name: &str, value: f32, controller: Controller) -> bool {
        let Some(id) = self.id_of(name) else {
            return false;
        };
        if let Some(actuator) = self.actuators.get_mut(&id) {
            actuator.changing_by = Some(controller);
        }
        self.set_value(id, value);
        true
    }

    /// Let go of the named actuator.
    pub fn release_drag(&mut self, name: &str) {
        if let Some(actuator) = self.by_name_mut(name) {
            actuator.changing_by = None;
        }
    }

    /// Take every notification raised since the last drain, oldest first.
    pub fn drain_value_changes(&mut self) -> Vec<ValueChanged<CabHandle>> {
        std::mem::take(&mut self.pending)
    }

    /// Every state-changing call made through the directory so far.
    pub fn journal(&self) -> &[CabCall] {
        &self.journal
    }

    /// Forget recorded calls.
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    fn id_of(&self, name: &str) -> Option<u32> {
        self.actuators
            .iter()
            .find(|(_, actuator)| actuator.spec.name == name)
            .map(|(id, _)| *id)
    }

    fn by_name(&self, name: &str) -> Option<&Actuator> {
        self.actuators
            .values()
            .find(|actuator| actuator.spec.name == name)
    }

    fn by_name_mut(&mut self, name: &str) -> Option<&mut Actuator> {
        self.actuators
            .values_mut()
            .find(|actuator| actuator.spec.name == name)
    }

    fn lookup(&self, handle: CabHandle) -> Option<(u32, &Actuator)> {
        match handle {
            CabHandle::Actuator(id) => self.actuators.get(&id).map(|actuator| (id, actuator)),
            CabHandle::Vehicle => None,
        }
    }

    fn lookup_mut(&mut self, handle: CabHandle) -> Option<(u32, &mut Actuator)> {
        match handle {
            CabHandle::Actuator(id) => self.actuators.get_mut(&id).map(|actuator| (id, actuator)),
            CabHandle::Vehicle => None,
        }
    }

    fn set_value(&mut self, id: u32, requested: f32) {
        let Some(actuator) = self.actuators.get_mut(&id) else {
            return;
        };
        let old = actuator.value;
        let new = actuator.settle(requested);
        if old.to_bits() == new.to_bits() {
            return;
        }
        actuator.value = new;
        self.pending.push(ValueChanged {
            actuator: CabHandle::Actuator(id),
            old,
            new,
        });
    }
}

impl ActuatorDirectory for VirtualCab {
    type Handle = CabHandle;
    type Context = CabContext;
    type Controller = Controller;

    fn resolve_player_context(&self) -> Option<CabContext> {
        self.player_present.then_some(CabContext {
            seat_side: self.seat_side,
        })
    }

    fn resolve_controllable(&self, _context: &CabContext) -> Option<CabHandle> {
        self.vehicle_present.then_some(CabHandle::Vehicle)
    }

    fn seat_side(&self, context: &CabContext) -> Option<u8> {
        context.seat_side
    }

    fn find_actuator(&self, controllable: &CabHandle, name: &str) -> Option<CabHandle> {
        if *controllable != CabHandle::Vehicle {
            return None;
        }
        self.handle_of(name)
    }

    fn control_style(&self, actuator: &CabHandle) -> ControlStyle {
        self.lookup(*actuator)
            .map_or(ControlStyle::Unsupported, |(_, actuator)| actuator.spec.style)
    }

    fn read_value(&self, actuator: &CabHandle) -> Option<f32> {
        self.lookup(*actuator)
            .filter(|(_, actuator)| actuator.readable)
            .map(|(_, actuator)| actuator.value)
    }

    fn is_changing(&self, actuator: &CabHandle) -> bool {
        self.lookup(*actuator)
            .is_some_and(|(_, actuator)| actuator.changing_by.is_some())
    }

    fn begin_exclusive(&mut self, handle: &CabHandle) {
        let Some((_, actuator)) = self.lookup_mut(*handle) else {
            return;
        };
        actuator.changing_by = Some(Controller::Bridge);
        let name = actuator.spec.name.clone();
        self.journal.push(CabCall::BeginExclusive(name));
    }

    fn end_exclusive(&mut self, handle: &CabHandle) {
        let Some((_, actuator)) = self.lookup_mut(*handle) else {
            return;
        };
        if actuator.changing_by == Some(Controller::Bridge) {
            actuator.changing_by = None;
        }
        let name = actuator.spec.name.clone();
        self.journal.push(CabCall::EndExclusive(name));
    }

    fn apply_discrete(&mut self, handle: &CabHandle, pushed: bool, _instantaneous: bool) {
        let Some((id, actuator)) = self.lookup_mut(*handle) else {
            return;
        };
        actuator.pushed = pushed;
        let value = if pushed {
            actuator.spec.max
        } else {
            actuator.spec.min
        };
        let name = actuator.spec.name.clone();
        self.journal.push(CabCall::Discrete { name, pushed });
        self.set_value(id, value);
    }

    fn apply_continuous(&mut self, handle: &CabHandle, value: f32) {
        let Some((id, actuator)) = self.lookup(*handle) else {
            return;
        };
        let name = actuator.spec.name.clone();
        self.journal.push(CabCall::Continuous { name, value });
        self.set_value(id, value);
    }

    fn input_identifier(&self, actuator: &CabHandle) -> Option<String> {
        self.lookup(*actuator)
            .map(|(_, actuator)| actuator.spec.input_identifier.clone())
            .filter(|identifier| !identifier.is_empty())
    }

    fn changing_controller(&self, actuator: &CabHandle) -> Option<Controller> {
        self.lookup(*actuator)
            .and_then(|(_, actuator)| actuator.changing_by)
    }

    fn is_local_player(&self, controller: &Controller) -> bool {
        *controller == Controller::LocalPlayer
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn continuous_values_clamp_and_snap() {
        let mut cab = VirtualCab::new(Some(0));
        let lever = cab.add_actuator(
            ActuatorSpec::new("Reverser", "reverser", ControlStyle::Continuous)
                .with_range(-1.0, 1.0)
                .with_notches(vec![-1.0, 0.0, 1.0]),
        );

        cab.apply_continuous(&lever, 0.4);
        assert_eq!(cab.value("Reverser"), Some(0.0));
        cab.apply_continuous(&lever, 0.6);
        assert_eq!(cab.value("Reverser"), Some(1.0));
        cab.apply_continuous(&lever, -7.0);
        assert_eq!(cab.value("Reverser"), Some(-1.0));
    }

    #[test]
    fn notifications_only_for_real_changes() {
        let mut cab = VirtualCab::new(Some(0));
        let wiper = cab.add_actuator(ActuatorSpec::new("Wiper", "wiper", ControlStyle::Continuous));

        cab.apply_continuous(&wiper, 0.0);
        assert!(cab.drain_value_changes().is_empty());

        cab.apply_continuous(&wiper, 0.3);
        cab.apply_continuous(&wiper, 0.3);
        let changes = cab.drain_value_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.first().unwrap().new, 0.3);
    }

    #[test]
    fn discrete_push_drives_range_ends() {
        let mut cab = VirtualCab::new(Some(0));
        let horn = cab.add_actuator(ActuatorSpec::new("Horn", "horn", ControlStyle::Discrete));

        cab.apply_discrete(&horn, true, true);
        assert_eq!(cab.value("Horn"), Some(1.0));
        assert_eq!(cab.is_pushed("Horn"), Some(true));

        cab.apply_discrete(&horn, false, true);
        assert_eq!(cab.value("Horn"), Some(0.0));
    }

    #[test]
    fn exclusive_control_marks_bridge_as_changer() {
        let mut cab = VirtualCab::new(Some(0));
        let wiper = cab.add_actuator(ActuatorSpec::new("Wiper", "wiper", ControlStyle::Continuous));

        assert!(!cab.is_changing(&wiper));
        cab.begin_exclusive(&wiper);
        assert_eq!(cab.changing_controller(&wiper), Some(Controller::Bridge));
        cab.end_exclusive(&wiper);
        assert!(!cab.is_changing(&wiper));

        assert_eq!(
            cab.journal(),
            [
                CabCall::BeginExclusive("Wiper".to_owned()),
                CabCall::EndExclusive("Wiper".to_owned()),
            ]
        );
    }

    #[test]
    fn removed_actuators_leave_stale_handles() {
        let mut cab = VirtualCab::new(Some(0));
        let old = cab.add_actuator(ActuatorSpec::new("Wiper", "wiper", ControlStyle::Continuous));
        assert!(cab.remove_actuator("Wiper"));

        assert_eq!(cab.read_value(&old), None);
        assert_eq!(cab.control_style(&old), ControlStyle::Unsupported);
        cab.apply_continuous(&old, 1.0);
        assert!(cab.journal().is_empty());

        let new = cab.add_actuator(ActuatorSpec::new("Wiper", "wiper", ControlStyle::Continuous));
        assert_ne!(old, new);
        assert_eq!(cab.find_actuator(&CabHandle::Vehicle, "Wiper"), Some(new));
    }

    #[test]
    fn context_follows_presence_flags() {
        let mut cab = VirtualCab::new(Some(1));
        let context = cab.resolve_player_context().unwrap();
        assert_eq!(cab.seat_side(&context), Some(1));

        cab.set_vehicle_present(false);
        assert_eq!(cab.resolve_controllable(&context), None);

        cab.set_player_present(false);
        assert_eq!(cab.resolve_player_context(), None);
    }

    #[test]
    fn builds_from_config() {
        let config = CabConfig {
            seat_side: None,
            actuators: vec![ActuatorConfig {
                name: "Throttle_F".to_owned(),
                input_identifier: "Throttle".to_owned(),
                style: ControlStyle::Continuous,
                initial: 0.5,
                min: 0.0,
                max: 1.0,
                notches: Vec::new(),
            }],
        };
        let cab = VirtualCab::from_config(&config);
        assert_eq!(cab.value("Throttle_F"), Some(0.5));
        assert_eq!(cab.resolve_player_context().unwrap().seat_side, None);
    }
}
