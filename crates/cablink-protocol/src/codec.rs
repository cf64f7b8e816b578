//! Text codec for inbound commands and outbound value-change events.
//!
//! Parsing never fails loudly: anything that is not a well-formed command is
//! noise on the wire and yields `None`. Numbers are rendered without any
//! locale dependence so the same value always encodes to the same text.

use crate::event::ValueChange;
use crate::target::{ControlFlags, ControlTarget, InboundCommand};

/// Leading field of every direct-control command.
pub const DIRECT_CONTROL_TAG: &str = "direct_control";

/// Separator between message fields.
const FIELD_SEPARATOR: char = ',';

/// Separator between flags inside the flags field.
const FLAG_SEPARATOR: char = '|';

/// Parse one inbound wire message.
///
/// Accepts `direct_control,<identifier>,<target_value>,<flags>` where
/// `<flags>` is a `|`-separated list that may be empty. Fields past the
/// fourth are ignored, as are unrecognized flags. Returns `None` for fewer
/// than four fields, a different leading tag, or a target value that is not
/// a finite number.
pub fn parse_command(raw: &str) -> Option<InboundCommand> {
    let raw = raw.trim_end_matches(['\r', '\n']);
    let mut fields = raw.split(FIELD_SEPARATOR);

    if fields.next()? != DIRECT_CONTROL_TAG {
        return None;
    }
    let identifier = fields.next()?;
    let value = parse_value(fields.next()?)?;
    let flags = parse_flags(fields.next()?);

    Some(InboundCommand::DirectControl(ControlTarget::new(
        identifier, value, flags,
    )))
}

/// Encode a target as an inbound command, the inverse of [`parse_command`].
pub fn encode_command(target: &ControlTarget) -> String {
    let flags: Vec<&str> = target.flags.names().collect();
    format!(
        "{DIRECT_CONTROL_TAG},{},{},{}",
        target.identifier,
        format_value(target.value),
        flags.join("|")
    )
}

/// Encode an outbound value-change event as `<identifier>,<value>`.
pub fn encode_value_change(identifier: &str, value: f32) -> String {
    format!("{identifier},{}", format_value(value))
}

/// Parse an outbound value-change event on the controller side.
///
/// The value is everything after the last comma; the identifier must be
/// non-empty.
pub fn parse_value_change(raw: &str) -> Option<ValueChange> {
    let raw = raw.trim_end_matches(['\r', '\n']);
    let (identifier, value) = raw.rsplit_once(FIELD_SEPARATOR)?;
    if identifier.is_empty() {
        return None;
    }
    Some(ValueChange::new(identifier, parse_value(value)?))
}

/// Render a value as a plain decimal.
///
/// Uses the shortest representation that round-trips, never exponent
/// notation, and always keeps a fractional part (`1` renders as `1.0`).
pub fn format_value(value: f32) -> String {
    let mut text = value.to_string();
    if text.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        text.push_str(".0");
    }
    text
}

fn parse_value(field: &str) -> Option<f32> {
    field
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
}

fn parse_flags(field: &str) -> ControlFlags {
    field
        .split(FLAG_SEPARATOR)
        .map(str::trim)
        .fold(ControlFlags::NONE, |mut flags, name| {
            match name {
                "hold" => flags.hold = true,
                "relative" => flags.relative = true,
                _ => {}
            }
            flags
        })
}
