use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Visible notifications are capped; the oldest is dropped on overflow.
pub const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotificationStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Notification queue shown to the user. Can be saved to and loaded from a
/// JSON file so the queue outlives one CLI invocation.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notifier {
    visible: VecDeque<Notification>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a saved queue. A missing file is an empty queue.
    pub fn load(path: &Path) -> Result<Self, NotificationStoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), NotificationStoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn enqueue(&mut self, severity: Severity, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        let notification = Notification {
            id: self.next_id,
            severity,
            message: message.into(),
            created_at: Utc::now(),
        };
        match severity {
            Severity::Error => log::error!("{}", notification.message),
            Severity::Warning => log::warn!("{}", notification.message),
            Severity::Success | Severity::Info => log::info!("{}", notification.message),
        }
        self.visible.push_back(notification);
        while self.visible.len() > MAX_VISIBLE {
            self.visible.pop_front();
        }
        self.next_id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.enqueue(Severity::Success, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> u64 {
        self.enqueue(Severity::Warning, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.enqueue(Severity::Error, message)
    }

    /// Returns false when `id` is no longer visible.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.visible.len();
        self.visible.retain(|n| n.id != id);
        self.visible.len() != before
    }

    /// Oldest first.
    pub fn visible(&self) -> Vec<Notification> {
        self.visible.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Move notifications raised elsewhere into this queue, keeping their
    /// timestamps. Ids are reassigned.
    pub fn extend(&mut self, notifications: impl IntoIterator<Item = Notification>) {
        for mut notification in notifications {
            self.next_id += 1;
            notification.id = self.next_id;
            self.visible.push_back(notification);
        }
        while self.visible.len() > MAX_VISIBLE {
            self.visible.pop_front();
        }
    }

    /// Remove and return everything currently visible.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.visible.drain(..).collect()
    }
}
