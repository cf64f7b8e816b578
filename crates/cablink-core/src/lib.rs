//! Target store, acquisition tracking, and tick reconciliation for cablink.
//!
//! Desired control targets arrive asynchronously from the message channel and
//! are driven onto simulation actuators exactly once per simulation tick.
//!
//! # Modules
//!
//! - [`directory`] -- [`ActuatorDirectory`] trait: the simulation's object
//!   graph as seen by the reconciler.
//! - [`store`] -- [`TargetStore`], the concurrently written set of desired
//!   targets.
//! - [`tracker`] -- [`AcquisitionTracker`], the actuators currently held
//!   under exclusive control.
//! - [`naming`] -- Seat-side substitution of the `{SIDE}` placeholder.
//! - [`reconcile`] -- [`Reconciler`], the per-tick control loop.
//! - [`forward`] -- [`EventForwarder`], reporting manual changes outward.
//! - [`inbound`] -- Routing received wire messages into the store.
//! - [`config`] -- Configuration loading from `cablink.yaml`.
//! - [`virtual_cab`] -- [`VirtualCab`], an in-memory actuator directory.
//!
//! [`ActuatorDirectory`]: directory::ActuatorDirectory
//! [`TargetStore`]: store::TargetStore
//! [`AcquisitionTracker`]: tracker::AcquisitionTracker
//! [`Reconciler`]: reconcile::Reconciler
//! [`EventForwarder`]: forward::EventForwarder
//! [`VirtualCab`]: virtual_cab::VirtualCab

pub mod config;
pub mod directory;
pub mod forward;
pub mod inbound;
pub mod naming;
pub mod reconcile;
pub mod store;
pub mod tracker;
pub mod virtual_cab;

pub use directory::{ActuatorDirectory, ControlStyle, ValueChanged};
pub use forward::{EventForwarder, ForwardOutcome, MessageSink, SinkError};
pub use reconcile::{Reconciler, TICK_EVENT, TargetOutcome, TickReport};
pub use store::TargetStore;
pub use tracker::AcquisitionTracker;
pub use virtual_cab::VirtualCab;
