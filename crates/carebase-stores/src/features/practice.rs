use serde_json::Value;

use carebase_core::models::Practice;
use carebase_core::ActionStatus;
use carebase_http::{decode_first, ResourceCatalog};

use super::announce;
use crate::{ActionStore, Notifier};

pub struct PracticeStore {
    resources: ResourceCatalog,
    notifier: Option<Notifier>,
    state: ActionStore<Vec<Practice>>,
}

impl PracticeStore {
    pub const GET_ALL: &'static str = "getAll";
    pub const UPDATE: &'static str = "update";

    pub fn new(resources: ResourceCatalog, notifier: Option<Notifier>) -> Self {
        Self {
            resources,
            notifier,
            state: ActionStore::new("practices", Vec::new()),
        }
    }

    pub fn state(&self) -> &ActionStore<Vec<Practice>> {
        &self.state
    }

    pub fn practices(&self) -> Vec<Practice> {
        self.state.data()
    }

    pub async fn get_all(&self) -> ActionStatus {
        let stream = self.resources.practices().all();
        self.state
            .replace_with(Self::GET_ALL, decode_first(stream))
            .await
    }

    pub async fn update(&self, practice: &Practice) -> ActionStatus {
        let resource = self.resources.practices();
        let status = self
            .state
            .replace_with(Self::UPDATE, async {
                decode_first::<Value>(resource.update(&practice.id, practice)).await?;
                decode_first(resource.all()).await
            })
            .await;
        announce(
            self.notifier.as_ref(),
            &self.state,
            Self::UPDATE,
            status,
            "Practice updated",
        );
        status
    }
}
