use serde_json::Value;

use carebase_core::models::{NewPrescription, Prescription};
use carebase_core::ActionStatus;
use carebase_http::{decode_first, ResourceCatalog};

use super::announce;
use crate::{ActionStore, Notifier};

pub struct PrescriptionStore {
    resources: ResourceCatalog,
    notifier: Option<Notifier>,
    state: ActionStore<Vec<Prescription>>,
}

impl PrescriptionStore {
    pub const GET_ALL: &'static str = "getAll";
    pub const CREATE: &'static str = "create";

    pub fn new(resources: ResourceCatalog, notifier: Option<Notifier>) -> Self {
        Self {
            resources,
            notifier,
            state: ActionStore::new("prescriptions", Vec::new()),
        }
    }

    pub fn state(&self) -> &ActionStore<Vec<Prescription>> {
        &self.state
    }

    pub fn prescriptions(&self) -> Vec<Prescription> {
        self.state.data()
    }

    pub async fn get_all(&self, patient_id: &str) -> ActionStatus {
        let stream = self.resources.prescriptions(patient_id).all();
        self.state
            .replace_with(Self::GET_ALL, decode_first(stream))
            .await
    }

    pub async fn create(&self, patient_id: &str, prescription: &NewPrescription) -> ActionStatus {
        let resource = self.resources.prescriptions(patient_id);
        let status = self
            .state
            .replace_with(Self::CREATE, async {
                decode_first::<Value>(resource.create(prescription)).await?;
                decode_first(resource.all()).await
            })
            .await;
        announce(
            self.notifier.as_ref(),
            &self.state,
            Self::CREATE,
            status,
            "Prescription created",
        );
        status
    }
}
