//! Seat-side substitution for control names.
//!
//! The same logical control maps to mirrored actuators depending on which
//! driving position is occupied, so identifiers may carry a `{SIDE}`
//! placeholder that is filled in from the seat the player sits in.

use std::borrow::Cow;

use crate::directory::ActuatorDirectory;

/// Placeholder substituted with the seat side code.
pub const SIDE_PLACEHOLDER: &str = "{SIDE}";

/// Which end of the vehicle the occupied seat faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SeatSide {
    /// Side flag 0, or no seat attached.
    #[default]
    Front,
    /// Side flag 1.
    Back,
}

impl SeatSide {
    /// Map a raw seat side flag. Anything other than `1` is the front.
    pub const fn from_raw(raw: Option<u8>) -> Self {
        match raw {
            Some(1) => Self::Back,
            _ => Self::Front,
        }
    }

    /// The code substituted for [`SIDE_PLACEHOLDER`].
    pub const fn code(self) -> &'static str {
        match self {
            Self::Front => "F",
            Self::Back => "B",
        }
    }

    /// Read the side of the seat attached to `context`.
    pub fn of<D: ActuatorDirectory>(directory: &D, context: &D::Context) -> Self {
        Self::from_raw(directory.seat_side(context))
    }
}

/// Resolve a logical identifier to a concrete actuator name.
///
/// Replaces the first `{SIDE}` with the side code; identifiers without the
/// placeholder pass through untouched.
pub fn resolve_control_name(identifier: &str, side: SeatSide) -> Cow<'_, str> {
    if identifier.contains(SIDE_PLACEHOLDER) {
        Cow::Owned(identifier.replacen(SIDE_PLACEHOLDER, side.code(), 1))
    } else {
        Cow::Borrowed(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_side_code() {
        assert_eq!(
            resolve_control_name("throttle_{SIDE}", SeatSide::Back),
            "throttle_B"
        );
        assert_eq!(
            resolve_control_name("{SIDE}_Brake", SeatSide::Front),
            "F_Brake"
        );
    }

    #[test]
    fn plain_identifiers_pass_through() {
        let name = resolve_control_name("Horn", SeatSide::Back);
        assert!(matches!(name, Cow::Borrowed("Horn")));
    }

    #[test]
    fn only_first_placeholder_is_replaced() {
        assert_eq!(
            resolve_control_name("{SIDE}_{SIDE}", SeatSide::Back),
            "B_{SIDE}"
        );
    }

    #[test]
    fn missing_or_unknown_seat_is_front() {
        assert_eq!(SeatSide::from_raw(None), SeatSide::Front);
        assert_eq!(SeatSide::from_raw(Some(0)), SeatSide::Front);
        assert_eq!(SeatSide::from_raw(Some(2)), SeatSide::Front);
        assert_eq!(SeatSide::from_raw(Some(1)), SeatSide::Back);
    }
}
