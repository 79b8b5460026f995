//! Feature stores.
//!
//! Every store pairs an [`ActionStore`] with the resources it reads. Reads
//! replace the data wholesale; writes go to the backend and then refetch.
//! When a [`Notifier`] is attached, writes announce their outcome.

mod allergy;
mod education;
mod message;
mod practice;
mod prescription;
mod settings;
mod user;
mod vital;

#[cfg(test)]
pub(crate) mod test_support;

pub use allergy::AllergyStore;
pub use education::EducationStore;
pub use message::MessageStore;
pub use practice::PracticeStore;
pub use prescription::PrescriptionStore;
pub use settings::SettingsStore;
pub use user::UserStore;
pub use vital::VitalStore;

use std::sync::Arc;

use carebase_core::{ActionStatus, NotificationPayload};
use carebase_http::ResourceCatalog;

use crate::{ActionStore, Notifier};

/// All feature stores, built once and injected at the composition root.
#[derive(Clone)]
pub struct StoreBundle {
    pub allergies: Arc<AllergyStore>,
    pub vitals: Arc<VitalStore>,
    pub education: Arc<EducationStore>,
    pub prescriptions: Arc<PrescriptionStore>,
    pub practices: Arc<PracticeStore>,
    pub settings: Arc<SettingsStore>,
    pub messages: Arc<MessageStore>,
    pub users: Arc<UserStore>,
}

impl StoreBundle {
    pub fn new(resources: ResourceCatalog, notifier: Option<Notifier>) -> Self {
        Self {
            allergies: Arc::new(AllergyStore::new(resources.clone(), notifier.clone())),
            vitals: Arc::new(VitalStore::new(resources.clone(), notifier.clone())),
            education: Arc::new(EducationStore::new(resources.clone())),
            prescriptions: Arc::new(PrescriptionStore::new(resources.clone(), notifier.clone())),
            practices: Arc::new(PracticeStore::new(resources.clone(), notifier.clone())),
            settings: Arc::new(SettingsStore::new(resources.clone(), notifier.clone())),
            messages: Arc::new(MessageStore::new(resources.clone(), notifier)),
            users: Arc::new(UserStore::new(resources)),
        }
    }
}

/// Tell the user how a write went.
pub(crate) fn announce<D>(
    notifier: Option<&Notifier>,
    store: &ActionStore<D>,
    operation: &str,
    status: ActionStatus,
    success_title: &str,
) where
    D: Clone + Send + Sync + 'static,
{
    let Some(notifier) = notifier else {
        return;
    };
    match status {
        ActionStatus::Fulfilled => {
            notifier.success(success_title);
        }
        ActionStatus::Rejected => {
            let mut payload = NotificationPayload::new(format!("Could not {operation} {}", store.name()));
            if let Some(message) = store.error_message(operation) {
                payload = payload.with_description(message);
            }
            notifier.error(payload);
        }
        ActionStatus::Initial | ActionStatus::Pending => {}
    }
}
