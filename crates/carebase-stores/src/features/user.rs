use carebase_core::models::UserAccount;
use carebase_core::ActionStatus;
use carebase_http::{decode_first, ResourceCatalog};

use crate::ActionStore;

/// User administration list.
pub struct UserStore {
    resources: ResourceCatalog,
    state: ActionStore<Vec<UserAccount>>,
}

impl UserStore {
    pub const GET_ALL: &'static str = "getAll";
    pub const SEARCH: &'static str = "search";

    pub fn new(resources: ResourceCatalog) -> Self {
        Self {
            resources,
            state: ActionStore::new("users", Vec::new()),
        }
    }

    pub fn state(&self) -> &ActionStore<Vec<UserAccount>> {
        &self.state
    }

    pub fn users(&self) -> Vec<UserAccount> {
        self.state.data()
    }

    pub async fn get_all(&self) -> ActionStatus {
        let stream = self.resources.users().all();
        self.state
            .replace_with(Self::GET_ALL, decode_first(stream))
            .await
    }

    pub async fn search(&self, query: &str) -> ActionStatus {
        let stream = self.resources.users().list([("q", query.trim())]);
        self.state
            .replace_with(Self::SEARCH, decode_first(stream))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{catalog, ScriptedTransport};
    use carebase_core::models::UserRole;
    use carebase_http::Method;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_search_error_then_recovery() {
        let transport = Arc::new(ScriptedTransport::default());
        transport
            .fail(
                Method::GET,
                "/users",
                503,
                Some(json!({"message": "directory unavailable", "errorId": "DIR-1"})),
            )
            .reply(
                Method::GET,
                "/users",
                json!([{"id": "u1", "email": "a@clinic.test", "firstName": "Ada", "role": "provider"}]),
            );
        let store = UserStore::new(catalog(&transport));

        assert_eq!(store.search("ada").await, ActionStatus::Rejected);
        let record = store.state().error(UserStore::SEARCH).unwrap();
        assert_eq!(record.id.as_deref(), Some("DIR-1"));

        assert_eq!(store.search("ada").await, ActionStatus::Fulfilled);
        assert!(store.state().error(UserStore::SEARCH).is_none());
        let users = store.users();
        assert_eq!(users[0].role, Some(UserRole::Provider));
        assert_eq!(users[0].display_name(), "Ada");
    }
}
