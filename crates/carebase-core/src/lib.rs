//! # Carebase Core
//!
//! Domain types shared by every Carebase crate.
//!
//! This crate contains:
//! - Action status / error record / observable action state
//! - Notification messages and the NotificationBus abstraction
//! - Clinical entity models (allergies, vitals, prescriptions, ...)
//!
//! This crate does NOT care about:
//! - How requests reach the backend
//! - How notifications are scheduled or rendered
//! - Which runtime drives the futures

pub mod error;
pub mod models;
pub mod notification;
pub mod status;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::StoreError;
    pub use crate::models::{
        Allergy, EducationRecord, Message, NewAllergy, NewMessage, NewPrescription, NewVital,
        Practice, PracticeSettings, Prescription, UserAccount, Vital,
    };
    pub use crate::notification::{
        Notification, NotificationBus, NotificationHandler, NotificationId, NotificationKind,
        NotificationPayload, Subscription,
    };
    pub use crate::status::{ActionState, ActionStatus, ErrorRecord};
}

// Re-export key types at crate root
pub use error::StoreError;
pub use notification::{
    Notification, NotificationBus, NotificationHandler, NotificationId, NotificationKind,
    NotificationPayload, Subscription,
};
pub use status::{ActionState, ActionStatus, ErrorRecord};
