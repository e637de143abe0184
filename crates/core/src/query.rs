//! Data-fetch collaborator status.

use crate::error::QueryError;

/// Flags a data source exposes about one query.
///
/// Views bridge these flags to `loading()`/`complete()`; nothing here polls.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStatus<T> {
    /// First load in flight
    pub is_loading: bool,

    /// Query has not started yet
    pub is_uninitialized: bool,

    /// Any fetch (including refetch) in flight
    pub is_fetching: bool,

    /// Last successful result
    pub data: Option<T>,

    /// Last failure
    pub error: Option<QueryError>,
}

impl<T> QueryStatus<T> {
    /// Query that has not started.
    pub fn uninitialized() -> Self {
        Self {
            is_loading: false,
            is_uninitialized: true,
            is_fetching: false,
            data: None,
            error: None,
        }
    }

    /// First fetch in flight.
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            is_uninitialized: false,
            is_fetching: true,
            data: None,
            error: None,
        }
    }

    /// Fetch succeeded.
    pub fn success(data: T) -> Self {
        Self {
            is_loading: false,
            is_uninitialized: false,
            is_fetching: false,
            data: Some(data),
            error: None,
        }
    }

    /// Fetch failed.
    pub fn failure(error: QueryError) -> Self {
        Self {
            is_loading: false,
            is_uninitialized: false,
            is_fetching: false,
            data: None,
            error: Some(error),
        }
    }

    /// Refetch of existing data in flight.
    pub fn refetching(mut self) -> Self {
        self.is_fetching = true;
        self
    }

    /// Anything pending that should keep the fallback up.
    pub fn is_pending(&self) -> bool {
        self.is_loading || self.is_fetching || self.is_uninitialized
    }
}

impl<T> Default for QueryStatus<T> {
    fn default() -> Self {
        Self::uninitialized()
    }
}

impl<T> From<Result<T, QueryError>> for QueryStatus<T> {
    fn from(result: Result<T, QueryError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => Self::failure(error),
        }
    }
}
