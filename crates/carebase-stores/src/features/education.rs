use carebase_core::models::EducationRecord;
use carebase_core::ActionStatus;
use carebase_http::{decode_first, ResourceCatalog};

use crate::ActionStore;

/// Education material handed to a patient.
pub struct EducationStore {
    resources: ResourceCatalog,
    state: ActionStore<Vec<EducationRecord>>,
}

impl EducationStore {
    pub const GET_ALL: &'static str = "getAll";
    pub const SEARCH: &'static str = "search";

    pub fn new(resources: ResourceCatalog) -> Self {
        Self {
            resources,
            state: ActionStore::new("education", Vec::new()),
        }
    }

    pub fn state(&self) -> &ActionStore<Vec<EducationRecord>> {
        &self.state
    }

    pub fn records(&self) -> Vec<EducationRecord> {
        self.state.data()
    }

    pub async fn get_all(&self, patient_id: &str) -> ActionStatus {
        let stream = self.resources.education(patient_id).all();
        self.state
            .replace_with(Self::GET_ALL, decode_first(stream))
            .await
    }

    /// Replace the list with the records matching `query`.
    pub async fn search(&self, patient_id: &str, query: &str) -> ActionStatus {
        let stream = self
            .resources
            .education(patient_id)
            .list([("q", query.trim())]);
        self.state
            .replace_with(Self::SEARCH, decode_first(stream))
            .await
    }
}
