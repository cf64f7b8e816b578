//! Desired control targets and their behavior flags.

/// Behavior flags attached to a [`ControlTarget`].
///
/// `hold` keeps a target alive after it has been applied; `relative` turns
/// the target value into a delta added to the actuator's current value.
/// A relative target is always one-shot, so `relative` overrides `hold`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ControlFlags {
    /// Keep the target active instead of removing it once applied.
    pub hold: bool,
    /// Interpret the value as a delta from the actuator's current value.
    pub relative: bool,
}

impl ControlFlags {
    /// No flags set: an absolute, one-shot target.
    pub const NONE: Self = Self {
        hold: false,
        relative: false,
    };

    /// Only `hold` set.
    pub const HOLD: Self = Self {
        hold: true,
        relative: false,
    };

    /// Only `relative` set.
    pub const RELATIVE: Self = Self {
        hold: false,
        relative: true,
    };

    /// Whether the target should survive application.
    ///
    /// Always `false` for relative targets.
    pub const fn holds(self) -> bool {
        self.hold && !self.relative
    }

    /// Flag names in wire order (`hold` before `relative`).
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        [(self.hold, "hold"), (self.relative, "relative")]
            .into_iter()
            .filter_map(|(set, name)| set.then_some(name))
    }
}

/// The desired value and behavior flags for one named control.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlTarget {
    /// Logical control identifier; may contain the `{SIDE}` placeholder.
    pub identifier: String,
    /// Target value, or delta when [`ControlFlags::relative`] is set.
    pub value: f32,
    /// Behavior flags.
    pub flags: ControlFlags,
}

impl ControlTarget {
    /// Create a target from its parts.
    pub fn new(identifier: impl Into<String>, value: f32, flags: ControlFlags) -> Self {
        Self {
            identifier: identifier.into(),
            value,
            flags,
        }
    }
}

/// A structured command decoded from an inbound wire message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCommand {
    /// `direct_control`: set or replace the target for one control.
    DirectControl(ControlTarget),
}
