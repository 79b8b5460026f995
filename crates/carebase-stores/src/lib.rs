//! # Carebase Stores
//!
//! Observable feature state for the Carebase client.
//!
//! This crate provides:
//! - ActionStore, the status/error bookkeeping every feature store uses
//! - In-process NotificationBus with per-kind delayed delivery
//! - Notifier, the producer API over the bus
//! - Feature stores (allergies, vitals, education, prescriptions, practices,
//!   settings, messages, users) bundled for injection

mod action_store;
mod features;
mod notification_bus;
mod notifier;

pub use action_store::{ActionStore, ErrorPayload};
pub use features::{
    AllergyStore, EducationStore, MessageStore, PracticeStore, PrescriptionStore, SettingsStore,
    StoreBundle, UserStore, VitalStore,
};
pub use notification_bus::BroadcastNotificationBus;
pub use notifier::Notifier;

// Re-export core types for convenience
pub use carebase_core::{
    ActionState, ActionStatus, ErrorRecord, Notification, NotificationBus, NotificationKind,
    NotificationPayload, Subscription,
};
