use crate::auth::CurrentUser;
use crate::task::{TaskService, TaskServiceError};
use axum::{
    Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskboard_core::{FieldError, Stats, Task};
use utoipa::ToSchema;

/// Shared state for task API handlers.
#[derive(Clone)]
pub struct TaskState {
    pub db: Arc<DatabaseConnection>,
}

/// JSON request payload for creating a task.
///
/// `status` is accepted as a raw string so that an unrecognized value surfaces
/// as a field-level validation error rather than a body deserialization
/// failure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// JSON request payload for updating a task. Absent fields are left unchanged.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// JSON response for task API errors.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// JSON response carrying field-level validation errors.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorsResponse {
    pub errors: Vec<FieldError>,
}

/// JSON confirmation for a successful delete.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteTaskResponse {
    pub message: String,
}

/// Error type for task API handlers, mapping service outcomes to responses.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// Represents a task service error.
    #[error("Task service error: {0}")]
    Service(#[from] TaskServiceError),
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        match self {
            TaskApiError::Service(TaskServiceError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationErrorsResponse { errors }),
            )
                .into_response(),
            TaskApiError::Service(TaskServiceError::TaskNotFound(_)) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Task not found".to_string(),
                }),
            )
                .into_response(),
            TaskApiError::Service(err) => {
                // Full cause goes to the operator log, never to the caller.
                tracing::error!("Task operation failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Operation failed".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Handler for GET /api/v1/tasks - Returns the caller's tasks, newest first.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = Vec<Task>),
        (status = 401, description = "Authentication required"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_tasks_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Task>>, TaskApiError> {
    let service = TaskService::new(&state.db);
    let tasks = service.list_tasks(&user.user_id).await?;
    Ok(Json(tasks))
}

/// Handler for GET /api/v1/tasks/stats - Returns the caller's aggregate
/// counts, recomputed from the store.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/stats",
    responses(
        (status = 200, description = "Successfully retrieved statistics", body = Stats),
        (status = 401, description = "Authentication required"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_stats_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Stats>, TaskApiError> {
    let service = TaskService::new(&state.db);
    let stats = service.task_stats(&user.user_id).await?;
    Ok(Json(stats))
}

/// Handler for GET /api/v1/tasks/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "Successfully retrieved task", body = Task),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<Task>, TaskApiError> {
    let service = TaskService::new(&state.db);
    let task = service.get_task_by_id(&user.user_id, id).await?;
    Ok(Json(task))
}

/// Handler for POST /api/v1/tasks - Creates a task for the caller.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Validation failed", body = ValidationErrorsResponse),
        (status = 401, description = "Authentication required"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), TaskApiError> {
    let service = TaskService::new(&state.db);
    let task = service
        .create_task(&user.user_id, &payload.title, payload.status.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for PUT /api/v1/tasks/{id} - Applies the provided fields to a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "ID of the task")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Validation failed", body = ValidationErrorsResponse),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, TaskApiError> {
    let service = TaskService::new(&state.db);
    let task = service
        .update_task(
            &user.user_id,
            id,
            payload.title.as_deref(),
            payload.status.as_deref(),
        )
        .await?;
    Ok(Json(task))
}

/// Handler for DELETE /api/v1/tasks/{id} - Permanently removes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "Task deleted", body = DeleteTaskResponse),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteTaskResponse>, TaskApiError> {
    let service = TaskService::new(&state.db);
    service.delete_task_by_id(&user.user_id, id).await?;
    Ok(Json(DeleteTaskResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(get_tasks_handler).post(create_task_handler))
        .route("/tasks/stats", get(get_stats_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
