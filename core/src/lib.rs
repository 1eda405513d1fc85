//! Shared task domain types for the taskboard server and client.
pub mod task;

pub use task::{
    FieldError, InvalidStatus, MAX_TITLE_LENGTH, Stats, Task, TaskStatus, validate_title,
};
