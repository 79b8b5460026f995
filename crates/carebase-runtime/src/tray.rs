//! NotificationTray - what the notification area currently shows.
//!
//! The tray is the single rendering subscriber. It caps how many messages are
//! visible at once, evicting the oldest, and lets the user close closable
//! ones. The bus itself never drops anything.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use carebase_core::{Notification, NotificationId, StoreError, Subscription};
use carebase_stores::Notifier;

pub struct NotificationTray {
    max_visible: usize,
    visible: RwLock<VecDeque<Notification>>,
}

impl NotificationTray {
    pub fn new(max_visible: usize) -> Self {
        Self {
            max_visible: max_visible.max(1),
            visible: RwLock::new(VecDeque::new()),
        }
    }

    pub fn max_visible(&self) -> usize {
        self.max_visible
    }

    /// Subscribe the tray to `notifier`'s bus.
    pub fn attach(self: &Arc<Self>, notifier: &Notifier) -> Subscription {
        let tray = Arc::clone(self);
        notifier.subscribe(Arc::new(move |notification: &Notification| {
            if let Err(err) = tray.push(notification.clone()) {
                tracing::warn!(error = %err, "notification tray rejected message");
            }
        }))
    }

    pub fn push(&self, notification: Notification) -> Result<(), StoreError> {
        let mut visible = self
            .visible
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        visible.push_back(notification);
        while visible.len() > self.max_visible {
            if let Some(evicted) = visible.pop_front() {
                tracing::debug!(id = %evicted.id, kind = %evicted.kind, "evicted notification");
            }
        }
        Ok(())
    }

    /// Close a notification. Non-closable ones stay.
    pub fn close(&self, id: NotificationId) -> Result<bool, StoreError> {
        let mut visible = self
            .visible
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let Some(index) = visible.iter().position(|n| n.id == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        if !visible[index].payload.is_closable() {
            return Ok(false);
        }
        visible.remove(index);
        Ok(true)
    }

    pub fn visible(&self) -> Result<Vec<Notification>, StoreError> {
        let visible = self
            .visible
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(visible.iter().cloned().collect())
    }
}
