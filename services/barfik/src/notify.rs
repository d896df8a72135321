//! Transient error notifications
//!
//! A notification is removed automatically once `dismiss_after` has
//! elapsed. The timer runs on the tokio runtime, so `show_error` must be
//! called from within one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::config::NotificationConfig;
use crate::error::BarfikError;
use crate::validation::ValidationErrors;

pub const DEFAULT_ERROR_TITLE: &str = "Błąd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    active: Mutex<Vec<Notification>>,
}

/// Queue of visible notifications, shared by clones
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
    dismiss_after: Duration,
}

impl NotificationCenter {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            dismiss_after: config.dismiss_after,
        }
    }

    /// Show an error and schedule its removal; returns its id
    pub fn show_error(&self, message: &str, title: Option<&str>) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let notification = Notification {
            id,
            title: title.unwrap_or(DEFAULT_ERROR_TITLE).to_string(),
            message: message.to_string(),
        };
        debug!("Showing notification {}: {}", id, notification.message);
        self.lock().push(notification);

        let center = self.clone();
        let delay = self.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            center.dismiss(id);
        });
        id
    }

    /// Remove a notification before its timer fires
    pub fn dismiss(&self, id: u64) -> bool {
        let mut active = self.lock();
        let before = active.len();
        active.retain(|notification| notification.id != id);
        before != active.len()
    }

    /// Notifications currently visible, oldest first
    pub fn active(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Route an error to the user
    ///
    /// Errors with per-field messages are handed back for the form to
    /// display; everything else becomes a notification.
    pub fn report(&self, error: &BarfikError) -> Option<ValidationErrors> {
        if let BarfikError::Validation(errors) = error {
            if errors.has_field_errors() {
                return Some(errors.clone());
            }
        }
        self.show_error(&error.user_message(), None);
        None
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
