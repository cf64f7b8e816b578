//! Reporting manual control changes back to the controller.
//!
//! The simulation raises a value-change notification for every actuator
//! change, whoever caused it. Only changes made by the local player's
//! controller are forwarded; everything else is dropped here.

use cablink_protocol::encode_value_change;
use tracing::{debug, trace, warn};

use crate::directory::{ActuatorDirectory, ValueChanged};

/// Errors from handing a message to the outgoing channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The outgoing queue has no room; the message was dropped.
    #[error("outgoing queue is full")]
    Full,

    /// The channel has shut down.
    #[error("channel is closed")]
    Closed,
}

/// The sending half of the message channel.
///
/// Implementations must not block: `send` is called from the tick context.
pub trait MessageSink {
    /// Queue one text message for delivery.
    fn send(&self, message: String) -> Result<(), SinkError>;
}

/// Why a notification was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The actuator has the null input identifier.
    NoIdentifier,
    /// No controller is changing the actuator.
    NoChangingController,
    /// The changing controller is not the local player's.
    NotLocalPlayer,
}

/// What the forwarder did with one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// The encoded message was queued.
    Sent(String),
    /// The notification was filtered out.
    Ignored(IgnoreReason),
    /// The message was encoded but the channel refused it.
    Dropped(SinkError),
}

/// Forwards player-initiated value changes through a [`MessageSink`].
#[derive(Debug)]
pub struct EventForwarder<S> {
    sink: S,
}

impl<S: MessageSink> EventForwarder<S> {
    /// Create a forwarder sending through `sink`.
    pub const fn new(sink: S) -> Self {
        Self { sink }
    }

    /// The sink messages are sent through.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Handle one value-change notification.
    pub fn on_value_changed<D: ActuatorDirectory>(
        &self,
        directory: &D,
        change: &ValueChanged<D::Handle>,
    ) -> ForwardOutcome {
        let identifier = match directory.input_identifier(&change.actuator) {
            Some(identifier) if !identifier.is_empty() => identifier,
            _ => return ignored(IgnoreReason::NoIdentifier),
        };
        let Some(controller) = directory.changing_controller(&change.actuator) else {
            return ignored(IgnoreReason::NoChangingController);
        };
        if !directory.is_local_player(&controller) {
            return ignored(IgnoreReason::NotLocalPlayer);
        }

        let message = encode_value_change(&identifier, change.new);
        match self.sink.send(message.clone()) {
            Ok(()) => {
                debug!(message = %message, old = change.old, "Sending value change");
                ForwardOutcome::Sent(message)
            }
            Err(error) => {
                warn!(message = %message, error = %error, "Failed to queue value change");
                ForwardOutcome::Dropped(error)
            }
        }
    }

    /// Handle a batch of notifications in order.
    pub fn forward_all<D: ActuatorDirectory>(
        &self,
        directory: &D,
        changes: &[ValueChanged<D::Handle>],
    ) -> Vec<ForwardOutcome> {
        changes
            .iter()
            .map(|change| self.on_value_changed(directory, change))
            .collect()
    }
}

fn ignored(reason: IgnoreReason) -> ForwardOutcome {
    trace!(?reason, "Ignoring value change");
    ForwardOutcome::Ignored(reason)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::directory::ControlStyle;
    use crate::virtual_cab::{ActuatorSpec, Controller, VirtualCab};

    #[derive(Default)]
    struct RecordingSink {
        sent: RefCell<Vec<String>>,
        refuse: Option<SinkError>,
    }

    impl MessageSink for RecordingSink {
        fn send(&self, message: String) -> Result<(), SinkError> {
            if let Some(error) = self.refuse {
                return Err(error);
            }
            self.sent.borrow_mut().push(message);
            Ok(())
        }
    }

    fn cab() -> VirtualCab {
        let mut cab = VirtualCab::new(Some(0));
        cab.add_actuator(ActuatorSpec::new("Wiper", "wiper", ControlStyle::Continuous));
        cab.add_actuator(ActuatorSpec::new("Lamp", "", ControlStyle::Continuous));
        cab
    }

    #[test]
    fn forwards_local_player_changes() {
        let mut cab = cab();
        let forwarder = EventForwarder::new(RecordingSink::default());

        assert!(cab.drag("Wiper", 1.0, Controller::LocalPlayer));
        let changes = cab.drain_value_changes();
        assert_eq!(changes.len(), 1);

        let outcomes = forwarder.forward_all(&cab, &changes);
        assert_eq!(outcomes, vec![ForwardOutcome::Sent("wiper,1.0".to_owned())]);
        assert_eq!(*forwarder.sink().sent.borrow(), vec!["wiper,1.0".to_owned()]);
    }

    #[test]
    fn ignores_other_controllers() {
        let mut cab = cab();
        let forwarder = EventForwarder::new(RecordingSink::default());

        cab.drag("Wiper", 1.0, Controller::Other(3));
        let changes = cab.drain_value_changes();
        let outcome = forwarder.on_value_changed(&cab, changes.first().unwrap());
        assert_eq!(outcome, ForwardOutcome::Ignored(IgnoreReason::NotLocalPlayer));
        assert!(forwarder.sink().sent.borrow().is_empty());
    }

    #[test]
    fn ignores_released_actuators_and_null_identifiers() {
        let mut cab = cab();
        let forwarder = EventForwarder::new(RecordingSink::default());

        cab.drag("Wiper", 1.0, Controller::LocalPlayer);
        cab.release_drag("Wiper");
        cab.drag("Lamp", 1.0, Controller::LocalPlayer);
        let changes = cab.drain_value_changes();

        let outcomes = forwarder.forward_all(&cab, &changes);
        assert_eq!(
            outcomes,
            vec![
                ForwardOutcome::Ignored(IgnoreReason::NoChangingController),
                ForwardOutcome::Ignored(IgnoreReason::NoIdentifier),
            ]
        );
    }

    #[test]
    fn reports_refused_sends() {
        let mut cab = cab();
        let forwarder = EventForwarder::new(RecordingSink {
            refuse: Some(SinkError::Full),
            ..RecordingSink::default()
        });

        cab.drag("Wiper", 0.5, Controller::LocalPlayer);
        let changes = cab.drain_value_changes();
        let outcome = forwarder.on_value_changed(&cab, changes.first().unwrap());
        assert_eq!(outcome, ForwardOutcome::Dropped(SinkError::Full));
    }
}
