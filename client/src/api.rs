use async_trait::async_trait;
use serde::Serialize;
use taskboard_core::{Stats, Task, TaskStatus};

/// Error surfaced to the state mirror when an operation fails.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service reported an error message.
    #[error("{0}")]
    Api(String),
    /// The request never produced a service response.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The task operations the state cache can issue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TasksApi: Send + Sync {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, ApiError>;
    async fn fetch_stats(&self) -> Result<Stats, ApiError>;
    async fn create_task(
        &self,
        title: String,
        status: Option<TaskStatus>,
    ) -> Result<Task, ApiError>;
    async fn update_task(
        &self,
        id: i32,
        title: Option<String>,
        status: Option<TaskStatus>,
    ) -> Result<Task, ApiError>;
    /// Deletes a task and returns its ID so the mirror can drop it.
    async fn delete_task(&self, id: i32) -> Result<i32, ApiError>;
}

/// Shape of the service's `{"error": ...}` failure bodies.
#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct CreateTaskBody {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
}

#[derive(Serialize)]
struct UpdateTaskBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
}

/// [`TasksApi`] implementation over the task service's JSON API.
pub struct HttpTasksApi {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpTasksApi {
    /// Creates a client against the given API base URL (e.g.
    /// `http://localhost:8080/api/v1`) using the given bearer token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Parses a successful response body, or surfaces the service's error
    /// message, falling back to the operation-specific message when the body
    /// carries none.
    async fn parse<T>(response: reqwest::Response, fallback: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(Self::error_from(response, fallback).await)
        }
    }

    async fn error_from(response: reqwest::Response, fallback: &str) -> ApiError {
        match response.json::<ErrorBody>().await {
            Ok(body) => ApiError::Api(body.error),
            Err(_) => ApiError::Api(fallback.to_string()),
        }
    }
}

#[async_trait]
impl TasksApi for HttpTasksApi {
    #[tracing::instrument(skip(self))]
    async fn fetch_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let response = self
            .http
            .get(self.url("/tasks"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::parse(response, "Failed to fetch tasks").await
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_stats(&self) -> Result<Stats, ApiError> {
        let response = self
            .http
            .get(self.url("/tasks/stats"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::parse(response, "Failed to fetch statistics").await
    }

    #[tracing::instrument(skip(self))]
    async fn create_task(
        &self,
        title: String,
        status: Option<TaskStatus>,
    ) -> Result<Task, ApiError> {
        let response = self
            .http
            .post(self.url("/tasks"))
            .bearer_auth(&self.token)
            .json(&CreateTaskBody { title, status })
            .send()
            .await?;
        Self::parse(response, "Failed to create task").await
    }

    #[tracing::instrument(skip(self))]
    async fn update_task(
        &self,
        id: i32,
        title: Option<String>,
        status: Option<TaskStatus>,
    ) -> Result<Task, ApiError> {
        let response = self
            .http
            .put(self.url(&format!("/tasks/{}", id)))
            .bearer_auth(&self.token)
            .json(&UpdateTaskBody { title, status })
            .send()
            .await?;
        Self::parse(response, "Failed to update task").await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_task(&self, id: i32) -> Result<i32, ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/tasks/{}", id)))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(id)
        } else {
            Err(Self::error_from(response, "Failed to delete task").await)
        }
    }
}
