//! The `{ model, list }` state shape kept for every resource.
//!
//! This is the only structure the rest of an application observes, so its
//! JSON form keeps the field names UI layers read: `model.isLoading`,
//! `list.isFetchLoading`, `list.isCountLoading`.

use serde::{Deserialize, Serialize};

/// Single-record view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelState<T> {
    /// The current record (or the default value)
    pub data: T,
    /// A create, fetch, update or delete is in flight
    pub is_loading: bool,
}

/// Collection view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListState<T> {
    /// The last listed page
    pub data: Vec<T>,
    /// The last counted total
    pub count: u64,
    /// A list request is in flight
    pub is_fetch_loading: bool,
    /// A count request is in flight
    pub is_count_loading: bool,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            count: 0,
            is_fetch_loading: false,
            is_count_loading: false,
        }
    }
}

/// State of one resource: a model view and a list view, updated
/// independently of each other.
///
/// # Example
///
/// ```
/// use crud_store_core::state::ResourceState;
///
/// let state = ResourceState::initial(String::new());
/// assert!(!state.model.is_loading);
/// assert!(state.list.data.is_empty());
/// assert_eq!(state.list.count, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceState<T> {
    /// Single-record view
    pub model: ModelState<T>,
    /// Collection view
    pub list: ListState<T>,
}

impl<T> ResourceState<T> {
    /// Initial state around a default domain value.
    #[must_use]
    pub fn initial(data: T) -> Self {
        Self {
            model: ModelState {
                data,
                is_loading: false,
            },
            list: ListState::default(),
        }
    }

    /// Whether any operation on this resource is in flight
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.model.is_loading || self.list.is_fetch_loading || self.list.is_count_loading
    }
}

impl<T: Default> Default for ResourceState<T> {
    fn default() -> Self {
        Self::initial(T::default())
    }
}
