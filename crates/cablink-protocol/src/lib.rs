//! Wire types and text codec for the cablink direct-control protocol.
//!
//! An external controller drives in-simulation controls by sending one text
//! message per command over a persistent connection. The simulation reports
//! manual control changes back over the same connection.
//!
//! # Modules
//!
//! - [`target`] -- Desired control targets and their behavior flags.
//! - [`event`] -- Value-change events reported back to the controller.
//! - [`codec`] -- Parsing inbound commands and encoding outbound events.
//!
//! # Wire format
//!
//! ```text
//! inbound:  direct_control,<identifier>,<target_value>,<flag>[|<flag>...]
//! outbound: <identifier>,<value>
//! ```

pub mod codec;
pub mod event;
pub mod target;

pub use codec::{
    DIRECT_CONTROL_TAG, encode_command, encode_value_change, format_value, parse_command,
    parse_value_change,
};
pub use event::ValueChange;
pub use target::{ControlFlags, ControlTarget, InboundCommand};
