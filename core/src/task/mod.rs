use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters allowed in a task title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// All lifecycle states a task can be in.
///
/// The serialized spellings (`"Todo"`, `"In Progress"`, `"Completed"`) are the
/// wire format shared by the API and the client cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum TaskStatus {
    #[default]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

/// Error returned when a string does not name one of the three statuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status: '{0}'")]
pub struct InvalidStatus(pub String);

impl TaskStatus {
    /// Returns the wire spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Todo" => Ok(TaskStatus::Todo),
            "In Progress" => Ok(TaskStatus::InProgress),
            "Completed" => Ok(TaskStatus::Completed),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// A single to-do item owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub status: TaskStatus,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A field-level validation failure, reported to the caller as part of a
/// 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Validates a task title. Callers are expected to trim the title first.
pub fn validate_title(title: &str) -> Result<(), FieldError> {
    if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
        return Err(FieldError::new(
            "title",
            "Title must be between 1 and 200 characters",
        ));
    }
    Ok(())
}

/// Aggregate counts of one user's tasks by status.
///
/// This is the single home of the bucket-mapping rule: the server recomputes
/// stats by folding statuses through [`Stats::record`], and the client cache
/// adjusts its mirror through [`Stats::record`], [`Stats::remove`] and
/// [`Stats::transition`]. Both sides therefore count identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Stats {
    pub total: u64,
    pub todo: u64,
    pub in_progress: u64,
    pub completed: u64,
}

impl Stats {
    /// Computes the aggregate from scratch over a set of statuses.
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = TaskStatus>,
    {
        let mut stats = Stats::default();
        for status in statuses {
            stats.record(status);
        }
        stats
    }

    /// Counts one new task with the given status.
    pub fn record(&mut self, status: TaskStatus) {
        self.total += 1;
        *self.bucket_mut(status) += 1;
    }

    /// Removes one task with the given status from the counts.
    pub fn remove(&mut self, status: TaskStatus) {
        self.total = self.total.saturating_sub(1);
        let bucket = self.bucket_mut(status);
        *bucket = bucket.saturating_sub(1);
    }

    /// Moves one task between status buckets. `total` is unaffected; a
    /// transition to the same status is a no-op.
    pub fn transition(&mut self, from: TaskStatus, to: TaskStatus) {
        if from == to {
            return;
        }
        let old = self.bucket_mut(from);
        *old = old.saturating_sub(1);
        *self.bucket_mut(to) += 1;
    }

    /// Whether `total` equals the sum of the per-status buckets.
    pub fn is_consistent(&self) -> bool {
        self.total == self.todo + self.in_progress + self.completed
    }

    fn bucket_mut(&mut self, status: TaskStatus) -> &mut u64 {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Completed => &mut self.completed,
        }
    }
}
