use carebase_core::models::PracticeSettings;
use carebase_core::ActionStatus;
use carebase_http::{decode_first, ResourceCatalog};

use super::announce;
use crate::{ActionStore, Notifier};

/// Practice-wide settings. Holds a single record rather than a list.
pub struct SettingsStore {
    resources: ResourceCatalog,
    notifier: Option<Notifier>,
    state: ActionStore<Option<PracticeSettings>>,
}

impl SettingsStore {
    pub const GET: &'static str = "get";
    pub const UPDATE: &'static str = "update";

    pub fn new(resources: ResourceCatalog, notifier: Option<Notifier>) -> Self {
        Self {
            resources,
            notifier,
            state: ActionStore::new("settings", None),
        }
    }

    pub fn state(&self) -> &ActionStore<Option<PracticeSettings>> {
        &self.state
    }

    pub fn settings(&self) -> Option<PracticeSettings> {
        self.state.data()
    }

    pub async fn get(&self) -> ActionStatus {
        let stream = self.resources.settings().all();
        self.state
            .run(Self::GET, decode_first::<PracticeSettings>(stream), |data, settings| {
                *data = Some(settings)
            })
            .await
    }

    /// Store the settings the backend echoes back.
    pub async fn update(&self, settings: &PracticeSettings) -> ActionStatus {
        let stream = self.resources.settings().replace(settings);
        let status = self
            .state
            .run(Self::UPDATE, decode_first::<PracticeSettings>(stream), |data, saved| {
                *data = Some(saved)
            })
            .await;
        announce(
            self.notifier.as_ref(),
            &self.state,
            Self::UPDATE,
            status,
            "Settings saved",
        );
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{catalog, ScriptedTransport};
    use carebase_http::Method;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_then_update() {
        let transport = Arc::new(ScriptedTransport::default());
        transport
            .reply(
                Method::GET,
                "/settings",
                json!({"practiceId": "pr1", "appointmentLengthMinutes": 15}),
            )
            .reply(
                Method::PUT,
                "/settings",
                json!({"practiceId": "pr1", "appointmentLengthMinutes": 20, "twoFactorRequired": true}),
            );
        let store = SettingsStore::new(catalog(&transport), None);
        assert!(store.settings().is_none());

        assert_eq!(store.get().await, ActionStatus::Fulfilled);
        let mut settings = store.settings().unwrap();
        assert_eq!(settings.appointment_length_minutes, Some(15));

        settings.appointment_length_minutes = Some(20);
        settings.two_factor_required = true;
        assert_eq!(store.update(&settings).await, ActionStatus::Fulfilled);
        assert_eq!(store.settings(), Some(settings));
    }

    #[tokio::test]
    async fn test_update_failure_keeps_loaded_settings() {
        let transport = Arc::new(ScriptedTransport::default());
        transport
            .reply(Method::GET, "/settings", json!({"practiceId": "pr1"}))
            .fail(Method::PUT, "/settings", 500, None);
        let store = SettingsStore::new(catalog(&transport), None);

        store.get().await;
        let status = store.update(&PracticeSettings::default()).await;
        assert_eq!(status, ActionStatus::Rejected);
        assert!(store.state().error_message(SettingsStore::UPDATE).is_none());
        assert_eq!(
            store.settings().and_then(|s| s.practice_id).as_deref(),
            Some("pr1")
        );
    }
}
