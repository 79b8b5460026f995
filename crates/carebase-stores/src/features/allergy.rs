use serde_json::Value;

use carebase_core::models::{Allergy, NewAllergy};
use carebase_core::ActionStatus;
use carebase_http::{decode_first, ResourceCatalog};

use super::announce;
use crate::{ActionStore, Notifier};

/// Patient allergies.
pub struct AllergyStore {
    resources: ResourceCatalog,
    notifier: Option<Notifier>,
    state: ActionStore<Vec<Allergy>>,
}

impl AllergyStore {
    pub const GET_ALL: &'static str = "getAll";
    pub const CREATE: &'static str = "create";
    pub const REMOVE: &'static str = "remove";

    pub fn new(resources: ResourceCatalog, notifier: Option<Notifier>) -> Self {
        Self {
            resources,
            notifier,
            state: ActionStore::new("allergies", Vec::new()),
        }
    }

    pub fn state(&self) -> &ActionStore<Vec<Allergy>> {
        &self.state
    }

    pub fn allergies(&self) -> Vec<Allergy> {
        self.state.data()
    }

    pub async fn get_all(&self, patient_id: &str) -> ActionStatus {
        let stream = self.resources.allergies(patient_id).all();
        self.state
            .replace_with(Self::GET_ALL, decode_first(stream))
            .await
    }

    pub async fn create(&self, patient_id: &str, allergy: &NewAllergy) -> ActionStatus {
        let resource = self.resources.allergies(patient_id);
        let status = self
            .state
            .replace_with(Self::CREATE, async {
                decode_first::<Value>(resource.create(allergy)).await?;
                decode_first(resource.all()).await
            })
            .await;
        announce(
            self.notifier.as_ref(),
            &self.state,
            Self::CREATE,
            status,
            "Allergy added",
        );
        status
    }

    pub async fn remove(&self, patient_id: &str, allergy_id: &str) -> ActionStatus {
        let resource = self.resources.allergies(patient_id);
        let status = self
            .state
            .replace_with(Self::REMOVE, async {
                decode_first::<Value>(resource.remove(allergy_id)).await?;
                decode_first(resource.all()).await
            })
            .await;
        announce(
            self.notifier.as_ref(),
            &self.state,
            Self::REMOVE,
            status,
            "Allergy removed",
        );
        status
    }
}
