//! Value-change events reported back to the controller.

/// A player-initiated change of one control, as sent over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    /// The actuator's input identifier.
    pub identifier: String,
    /// The new value after the change.
    pub value: f32,
}

impl ValueChange {
    /// Create an event from its parts.
    pub fn new(identifier: impl Into<String>, value: f32) -> Self {
        Self {
            identifier: identifier.into(),
            value,
        }
    }
}
