use serde_json::Value;

use carebase_core::models::{NewVital, Vital};
use carebase_core::ActionStatus;
use carebase_http::{decode_first, ResourceCatalog};

use super::announce;
use crate::{ActionStore, Notifier};

/// Vital sign readings for a patient, newest first as the backend returns them.
pub struct VitalStore {
    resources: ResourceCatalog,
    notifier: Option<Notifier>,
    state: ActionStore<Vec<Vital>>,
}

impl VitalStore {
    pub const GET_ALL: &'static str = "getAll";
    pub const CREATE: &'static str = "create";

    pub fn new(resources: ResourceCatalog, notifier: Option<Notifier>) -> Self {
        Self {
            resources,
            notifier,
            state: ActionStore::new("vitals", Vec::new()),
        }
    }

    pub fn state(&self) -> &ActionStore<Vec<Vital>> {
        &self.state
    }

    pub fn vitals(&self) -> Vec<Vital> {
        self.state.data()
    }

    pub async fn get_all(&self, patient_id: &str) -> ActionStatus {
        let stream = self.resources.vitals(patient_id).all();
        self.state
            .replace_with(Self::GET_ALL, decode_first(stream))
            .await
    }

    pub async fn create(&self, patient_id: &str, vital: &NewVital) -> ActionStatus {
        let resource = self.resources.vitals(patient_id);
        let status = self
            .state
            .replace_with(Self::CREATE, async {
                decode_first::<Value>(resource.create(vital)).await?;
                decode_first(resource.all()).await
            })
            .await;
        announce(
            self.notifier.as_ref(),
            &self.state,
            Self::CREATE,
            status,
            "Vitals recorded",
        );
        status
    }
}
