//! Singleton progress notifications keyed by id.
//!
//! Data-fetch callbacks report "Loading Workflows" / "Saving Workflow"
//! through one shared toast so repeated fetches update a single
//! notification instead of stacking new ones.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::store::lock;

/// Id shared by every load/save notification.
pub const TOAST_ID: &str = "orca-loading";

/// Toast status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastStatus {
    /// Operation in progress
    Pending,
    /// Operation finished
    Done,
}

impl std::fmt::Display for ToastStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToastStatus::Pending => write!(f, "pending"),
            ToastStatus::Done => write!(f, "done"),
        }
    }
}

/// A notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Key
    pub id: String,

    /// Text shown
    pub message: String,

    /// Current status
    pub status: ToastStatus,

    /// Last change
    pub updated_at: DateTime<Utc>,
}

/// Keyed toast registry. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct ToastCenter {
    toasts: Arc<Mutex<HashMap<String, Toast>>>,
}

impl ToastCenter {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message` under `id`, replacing any toast already there.
    pub fn create_or_update(&self, id: &str, message: &str) {
        let mut toasts = lock(&self.toasts);
        let toast = Toast {
            id: id.to_string(),
            message: message.to_string(),
            status: ToastStatus::Pending,
            updated_at: Utc::now(),
        };
        if toasts.insert(id.to_string(), toast).is_some() {
            info!(toast = id, text = message, "toast updated");
        } else {
            info!(toast = id, text = message, "toast created");
        }
    }

    /// Mark the toast finished. Unknown ids are ignored.
    pub fn done(&self, id: &str) {
        match lock(&self.toasts).get_mut(id) {
            Some(toast) => {
                toast.status = ToastStatus::Done;
                toast.updated_at = Utc::now();
                info!(toast = id, text = %toast.message, "toast done");
            }
            None => debug!(toast = id, "done for unknown toast"),
        }
    }

    /// Remove the toast.
    pub fn dismiss(&self, id: &str) -> Option<Toast> {
        lock(&self.toasts).remove(id)
    }

    /// Current toast under `id`.
    pub fn get(&self, id: &str) -> Option<Toast> {
        lock(&self.toasts).get(id).cloned()
    }

    /// All toasts, oldest change first.
    pub fn list(&self) -> Vec<Toast> {
        let mut toasts: Vec<_> = lock(&self.toasts).values().cloned().collect();
        toasts.sort_by_key(|toast| toast.updated_at);
        toasts
    }

    /// Show `message` while `operation` runs, then mark it done.
    ///
    /// A failed operation is logged and its toast left pending.
    pub async fn track<T, E, F>(&self, id: &str, message: &str, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.create_or_update(id, message);
        let result = operation.await;
        match &result {
            Ok(_) => self.done(id),
            Err(e) => warn!(toast = id, error = %e, "tracked operation failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_update_keeps_one_toast() {
        let toasts = ToastCenter::new();
        toasts.create_or_update(TOAST_ID, "Loading Workflows");
        toasts.done(TOAST_ID);
        toasts.create_or_update(TOAST_ID, "Saving Workflow");

        let toast = toasts.get(TOAST_ID).unwrap();
        assert_eq!(toast.message, "Saving Workflow");
        assert_eq!(toast.status, ToastStatus::Pending);
        assert_eq!(toasts.list().len(), 1);
    }

    #[test]
    fn test_done_and_dismiss() {
        let toasts = ToastCenter::new();
        toasts.done("missing");
        assert!(toasts.get("missing").is_none());

        toasts.create_or_update(TOAST_ID, "Loading Workflow");
        toasts.done(TOAST_ID);
        assert_eq!(toasts.get(TOAST_ID).unwrap().status, ToastStatus::Done);

        assert!(toasts.dismiss(TOAST_ID).is_some());
        assert!(toasts.list().is_empty());
    }

    #[tokio::test]
    async fn test_track_marks_done_on_success() {
        let toasts = ToastCenter::new();
        let result: Result<u32, String> = toasts
            .track(TOAST_ID, "Loading Workflows", async { Ok(3) })
            .await;
        assert_eq!(result, Ok(3));
        assert_eq!(toasts.get(TOAST_ID).unwrap().status, ToastStatus::Done);
    }

    #[tokio::test]
    async fn test_track_leaves_failed_toast_pending() {
        let toasts = ToastCenter::new();
        let result: Result<u32, String> = toasts
            .track(TOAST_ID, "Saving Workflow", async { Err("offline".to_string()) })
            .await;
        assert!(result.is_err());
        assert_eq!(toasts.get(TOAST_ID).unwrap().status, ToastStatus::Pending);
    }
}
