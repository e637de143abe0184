//! Bridges data-fetch status flags to orchestrator transitions.

use async_trait::async_trait;
use orca_core::{QueryError, QueryStatus, Result};
use tracing::{debug, warn};

use crate::orchestrator::LoadingOrchestrator;
use crate::toast::{ToastCenter, TOAST_ID};

/// A data source the bridge can drive.
#[async_trait]
pub trait QuerySource<T: Send>: Send + Sync {
    /// Fetch the data once.
    async fn fetch(&self) -> std::result::Result<T, QueryError>;
}

/// What to do when a query settles with an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Leave loading so the view can render its error state
    #[default]
    Complete,
    /// Keep the fallback up indefinitely
    StayLoading,
}

/// Maps [`QueryStatus`] flags onto `loading()` / `complete()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBridge {
    policy: ErrorPolicy,
}

impl QueryBridge {
    /// Bridge with the given error policy.
    pub fn new(policy: ErrorPolicy) -> Self {
        Self { policy }
    }

    /// Error policy in use.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Apply one status observation.
    pub fn sync<T>(&self, orchestrator: &LoadingOrchestrator, status: &QueryStatus<T>) -> Result<()> {
        if status.is_pending() {
            return orchestrator.loading(None);
        }

        if let Some(error) = &status.error {
            warn!(error = %error, policy = ?self.policy, "query settled with error");
            return match self.policy {
                ErrorPolicy::Complete => orchestrator.complete(),
                ErrorPolicy::StayLoading => Ok(()),
            };
        }

        if status.data.is_none() {
            debug!("query settled without data");
        }
        orchestrator.complete()
    }

    /// Run one fetch cycle: enter loading, fetch under the shared toast,
    /// then bridge the settled status.
    pub async fn drive<T, S>(
        &self,
        orchestrator: &LoadingOrchestrator,
        source: &S,
        toasts: &ToastCenter,
        message: &str,
    ) -> Result<QueryStatus<T>>
    where
        T: Send,
        S: QuerySource<T> + ?Sized,
    {
        self.sync(orchestrator, &QueryStatus::<T>::loading())?;

        let status: QueryStatus<T> = toasts.track(TOAST_ID, message, source.fetch()).await.into();
        self.sync(orchestrator, &status)?;
        Ok(status)
    }
}
