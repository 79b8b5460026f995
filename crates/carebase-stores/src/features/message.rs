use serde_json::Value;

use carebase_core::models::{Message, NewMessage};
use carebase_core::ActionStatus;
use carebase_http::{decode_first, ResourceCatalog};

use super::announce;
use crate::{ActionStore, Notifier};

/// Inbox of one user.
pub struct MessageStore {
    resources: ResourceCatalog,
    notifier: Option<Notifier>,
    state: ActionStore<Vec<Message>>,
}

impl MessageStore {
    pub const GET_ALL: &'static str = "getAll";
    pub const SEND: &'static str = "send";

    pub fn new(resources: ResourceCatalog, notifier: Option<Notifier>) -> Self {
        Self {
            resources,
            notifier,
            state: ActionStore::new("messages", Vec::new()),
        }
    }

    pub fn state(&self) -> &ActionStore<Vec<Message>> {
        &self.state
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.data()
    }

    pub fn unread_count(&self) -> usize {
        self.state
            .snapshot()
            .data
            .iter()
            .filter(|m| !m.read)
            .count()
    }

    pub async fn get_all(&self, user_id: &str) -> ActionStatus {
        let stream = self.resources.messages().list([("userId", user_id)]);
        self.state
            .replace_with(Self::GET_ALL, decode_first(stream))
            .await
    }

    /// Send a message, then reload `user_id`'s messages.
    pub async fn send(&self, user_id: &str, message: &NewMessage) -> ActionStatus {
        let resource = self.resources.messages();
        let status = self
            .state
            .replace_with(Self::SEND, async {
                decode_first::<Value>(resource.create(message)).await?;
                decode_first(resource.list([("userId", user_id)])).await
            })
            .await;
        announce(
            self.notifier.as_ref(),
            &self.state,
            Self::SEND,
            status,
            "Message sent",
        );
        status
    }
}
