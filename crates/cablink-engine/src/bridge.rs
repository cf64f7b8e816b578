//! One simulation frame of the bridge.
//!
//! The [`Bridge`] is what the simulation's frame hook calls into. It owns
//! the cab and the reconciler (both live on the tick context) and the
//! forwarder that reports manual changes through the channel.

use std::sync::Arc;

use cablink_core::forward::ForwardOutcome;
use cablink_core::virtual_cab::VirtualCab;
use cablink_core::{EventForwarder, MessageSink, Reconciler, TargetStore, TickReport};
use tracing::trace;

/// What one frame event did.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    /// The reconciliation pass, if the event was a tick.
    pub report: Option<TickReport>,
    /// One outcome per value-change notification raised since the last
    /// frame.
    pub forwarded: Vec<ForwardOutcome>,
}

/// The tick-context half of the bridge.
pub struct Bridge<S: MessageSink> {
    cab: VirtualCab,
    reconciler: Reconciler<VirtualCab>,
    forwarder: EventForwarder<S>,
}

impl<S: MessageSink> Bridge<S> {
    /// Wire a cab to the shared target store and an outgoing sink.
    pub fn new(cab: VirtualCab, store: Arc<TargetStore>, sink: S) -> Self {
        Self {
            cab,
            reconciler: Reconciler::new(store),
            forwarder: EventForwarder::new(sink),
        }
    }

    /// The simulated cab.
    #[cfg(test)]
    pub const fn cab(&self) -> &VirtualCab {
        &self.cab
    }

    /// Mutable access to the cab, standing in for player input.
    #[cfg(test)]
    pub const fn cab_mut(&mut self) -> &mut VirtualCab {
        &mut self.cab
    }

    /// The outgoing sink.
    #[cfg(test)]
    pub const fn sink(&self) -> &S {
        self.forwarder.sink()
    }

    /// Handle one frame event: reconcile on ticks, then forward every
    /// pending value-change notification.
    pub fn on_frame(&mut self, event: &str) -> FrameSummary {
        let report = self.reconciler.on_frame_event(event, &mut self.cab);
        if let Some(report) = &report {
            trace!(
                tick = report.tick,
                targets = report.outcomes.len(),
                released = report.released.len(),
                removed = report.removed,
                "Tick reconciled"
            );
        }

        let changes = self.cab.drain_value_changes();
        let forwarded = self.forwarder.forward_all(&self.cab, &changes);
        FrameSummary { report, forwarded }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::cell::RefCell;

    use cablink_core::directory::ControlStyle;
    use cablink_core::forward::SinkError;
    use cablink_core::inbound::receive_message;
    use cablink_core::virtual_cab::{ActuatorSpec, Controller};
    use cablink_core::{TICK_EVENT, TargetOutcome};

    use super::*;

    #[derive(Default)]
    struct Outbox(RefCell<Vec<String>>);

    impl MessageSink for Outbox {
        fn send(&self, message: String) -> Result<(), SinkError> {
            self.0.borrow_mut().push(message);
            Ok(())
        }
    }

    fn bridge() -> (Bridge<Outbox>, Arc<TargetStore>) {
        let mut cab = VirtualCab::new(Some(1));
        cab.add_actuator(ActuatorSpec::new("throttle_B", "throttle", ControlStyle::Continuous));
        cab.add_actuator(ActuatorSpec::new("wiper", "wiper", ControlStyle::Continuous));
        let store = Arc::new(TargetStore::new());
        (Bridge::new(cab, Arc::clone(&store), Outbox::default()), store)
    }

    #[test]
    fn non_tick_frames_only_forward() {
        let (mut bridge, store) = bridge();
        receive_message(&store, "direct_control,throttle_{SIDE},0.75,hold");

        let summary = bridge.on_frame("Render");
        assert!(summary.report.is_none());
        assert!(summary.forwarded.is_empty());
        assert_eq!(bridge.cab().value("throttle_B"), Some(0.0));
    }

    #[test]
    fn remote_targets_are_applied_but_not_echoed() {
        let (mut bridge, store) = bridge();
        receive_message(&store, "direct_control,throttle_{SIDE},0.75,hold");

        bridge.on_frame(TICK_EVENT);
        let summary = bridge.on_frame(TICK_EVENT);
        assert_eq!(
            summary.report.unwrap().outcome("throttle_{SIDE}"),
            Some(&TargetOutcome::Held { target: 0.75 })
        );
        assert_eq!(bridge.cab().value("throttle_B"), Some(0.75));
        assert!(bridge.sink().0.borrow().is_empty());
    }

    #[test]
    fn manual_changes_are_reported() {
        let (mut bridge, _store) = bridge();
        bridge.cab_mut().drag("wiper", 1.0, Controller::LocalPlayer);

        let summary = bridge.on_frame(TICK_EVENT);
        assert_eq!(
            summary.forwarded,
            vec![ForwardOutcome::Sent("wiper,1.0".to_owned())]
        );
        assert_eq!(*bridge.sink().0.borrow(), vec!["wiper,1.0".to_owned()]);

        let summary = bridge.on_frame(TICK_EVENT);
        assert!(summary.forwarded.is_empty());
    }
}
