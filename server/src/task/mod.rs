use std::str::FromStr;

use chrono::Utc;
use sea_orm::*;
use taskboard_core::{FieldError, Stats, Task, TaskStatus, validate_title};

use crate::entities::*;

pub mod api;

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// One or more request fields failed validation; nothing was persisted.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    /// Represents a task not found error. Also returned when the task exists
    /// but belongs to another user, so ownership is never leaked.
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// Represents malformed data stored in the task table.
    #[error("Malformed data: {0}")]
    MalformedData(String),
}

impl TryFrom<task::Model> for Task {
    type Error = TaskServiceError;

    fn try_from(model: task::Model) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_str(&model.status)
            .map_err(|err| TaskServiceError::MalformedData(err.to_string()))?;
        Ok(Task {
            id: model.id,
            title: model.title,
            status,
            user_id: model.user_id,
            created_at: model.created_at,
        })
    }
}

/// Validates a submitted title, pushing a field error on failure.
/// Returns the trimmed title when it is valid.
fn validated_title(title: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let trimmed = title.trim();
    match validate_title(trimmed) {
        Ok(()) => Some(trimmed.to_string()),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

/// Parses a submitted status, pushing a field error when it is not one of the
/// three recognized spellings.
fn parsed_status(status: Option<&str>, errors: &mut Vec<FieldError>) -> Option<TaskStatus> {
    let raw = status?;
    match TaskStatus::from_str(raw) {
        Ok(status) => Some(status),
        Err(_) => {
            errors.push(FieldError::new("status", "Invalid status"));
            None
        }
    }
}

/// Per-user-scoped CRUD surface over task records. Every query filters on the
/// owning user's ID.
pub struct TaskService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl TaskService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> TaskService {
        TaskService { db }
    }

    /// Retrieves all tasks owned by the given user, newest first.
    ///
    /// # Returns
    ///
    /// A `Result` containing a vector of `Task` ordered by creation time
    /// descending if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, TaskServiceError> {
        let models = task::Entity::find()
            .filter(task::Column::UserId.eq(user_id))
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(self.db)
            .await?;
        models.into_iter().map(Task::try_from).collect()
    }

    /// Retrieves a single task owned by the given user.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_by_id(&self, user_id: &str, id: i32) -> Result<Task, TaskServiceError> {
        let model = self.find_owned_task(user_id, id).await?;
        Task::try_from(model)
    }

    /// Creates a new task for the given user.
    ///
    /// The title is trimmed and validated; the status defaults to `Todo` when
    /// omitted. The creation timestamp is assigned here, server-side.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task` if successful, or an error
    /// otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        user_id: &str,
        title: &str,
        status: Option<&str>,
    ) -> Result<Task, TaskServiceError> {
        let mut errors = Vec::new();
        let trimmed_title = title.trim();
        if let Err(err) = validate_title(trimmed_title) {
            errors.push(err);
        }
        let status = parsed_status(status, &mut errors);
        if !errors.is_empty() {
            return Err(TaskServiceError::Validation(errors));
        }

        let active_model = task::ActiveModel {
            title: ActiveValue::Set(trimmed_title.to_string()),
            status: ActiveValue::Set(status.unwrap_or_default().as_str().to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        Task::try_from(created_model)
    }

    /// Updates a task owned by the given user, applying only the provided
    /// fields and leaving the others unchanged.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task` if successful, or an error
    /// otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        user_id: &str,
        id: i32,
        new_title: Option<&str>,
        new_status: Option<&str>,
    ) -> Result<Task, TaskServiceError> {
        let mut errors = Vec::new();
        let new_title = new_title.and_then(|title| validated_title(title, &mut errors));
        let new_status = parsed_status(new_status, &mut errors);
        if !errors.is_empty() {
            return Err(TaskServiceError::Validation(errors));
        }

        let task_to_update = self.find_owned_task(user_id, id).await?;
        let mut active_model: task::ActiveModel = task_to_update.into();
        if let Some(title) = new_title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(status) = new_status {
            active_model.status = ActiveValue::Set(status.as_str().to_string());
        }
        let updated_model = active_model.update(self.db).await?;
        Task::try_from(updated_model)
    }

    /// Deletes a task owned by the given user.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `Task` if successful, or an error
    /// otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task_by_id(
        &self,
        user_id: &str,
        id: i32,
    ) -> Result<Task, TaskServiceError> {
        let task_to_delete = self.find_owned_task(user_id, id).await?;
        let deleted = Task::try_from(task_to_delete)?;
        task::Entity::delete_by_id(id).exec(self.db).await?;
        Ok(deleted)
    }

    /// Recomputes the aggregate counts over the user's full current task set.
    /// Never cached; this is the authoritative aggregate.
    #[tracing::instrument(skip(self))]
    pub async fn task_stats(&self, user_id: &str) -> Result<Stats, TaskServiceError> {
        let models = task::Entity::find()
            .filter(task::Column::UserId.eq(user_id))
            .all(self.db)
            .await?;
        let statuses = models
            .into_iter()
            .map(|model| {
                TaskStatus::from_str(&model.status)
                    .map_err(|err| TaskServiceError::MalformedData(err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Stats::from_statuses(statuses))
    }

    /// Looks up a task by ID, scoped to the owning user.
    async fn find_owned_task(
        &self,
        user_id: &str,
        id: i32,
    ) -> Result<task::Model, TaskServiceError> {
        task::Entity::find_by_id(id)
            .filter(task::Column::UserId.eq(user_id))
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }
}
