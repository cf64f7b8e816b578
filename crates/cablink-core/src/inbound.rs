//! Routing received wire messages into the target store.

use cablink_protocol::{InboundCommand, parse_command};
use tracing::{debug, trace};

use crate::store::TargetStore;

/// Handle one received text message.
///
/// Well-formed commands insert or replace their target; anything else is
/// dropped without a reply. Returns whether the store was updated.
pub fn receive_message(store: &TargetStore, raw: &str) -> bool {
    match parse_command(raw) {
        Some(InboundCommand::DirectControl(target)) => {
            debug!(
                identifier = %target.identifier,
                value = target.value,
                hold = target.flags.hold,
                relative = target.flags.relative,
                "Processing direct control message"
            );
            store.upsert(target);
            true
        }
        None => {
            trace!(message = raw, "Dropping unrecognized message");
            false
        }
    }
}
