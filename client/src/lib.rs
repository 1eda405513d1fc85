//! Client-side mirror of a user's task list and its aggregate statistics.
//!
//! [`store::TasksStore`] issues operations against the task service through
//! the [`api::TasksApi`] seam and keeps a [`store::TasksState`] mirror
//! consistent with the responses, adjusting the aggregate counts
//! incrementally instead of re-fetching them after every mutation.
pub mod api;
pub mod store;

pub use api::{ApiError, HttpTasksApi, TasksApi};
pub use store::{TasksState, TasksStore};
