use axum::Json;
use axum::middleware::{from_fn, from_fn_with_state};
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::auth::{self, AuthState};
use crate::config;
use crate::task::{self, api::v1::TaskState};

/// OpenAPI documentation for the JSON API.
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::api::v1::json_login_handler,
        task::api::v1::get_tasks_handler,
        task::api::v1::get_stats_handler,
        task::api::v1::get_task_handler,
        task::api::v1::create_task_handler,
        task::api::v1::update_task_handler,
        task::api::v1::delete_task_handler,
    ),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Tasks", description = "Per-user task management endpoints")
    )
)]
pub struct ApiDoc;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: config::Config) -> anyhow::Result<()> {
    use axum::Router;

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let auth_state = Arc::new(AuthState::from_config(&config));
    let task_state = Arc::new(TaskState { db: Arc::new(db) });

    let app = Router::new()
        .merge(create_api_router(auth_state, task_state))
        .route("/health", axum::routing::get(health_check_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Creates the JSON API routes under `/api/v1`.
///
/// The login route and the OpenAPI document are public; every task route sits
/// behind the require-auth middleware. The user-resolving middleware wraps
/// both so handlers can observe the caller's identity.
pub fn create_api_router(auth_state: Arc<AuthState>, task_state: Arc<TaskState>) -> axum::Router {
    let login_router = auth::api::v1::create_api_router(auth_state.clone());
    let tasks_router = task::api::v1::create_api_router(task_state);
    let protected_routes = tasks_router
        .layer(ServiceBuilder::new().layer(from_fn(auth::api::v1::require_auth_middleware)));
    let public_routes =
        login_router.route("/openapi.json", axum::routing::get(openapi_handler));
    let api_routes = public_routes.merge(protected_routes);
    axum::Router::new()
        .nest("/api/v1", api_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::api::v1::auth_user_middleware,
        )))
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

/// Serves the generated OpenAPI document.
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_check_reports_ok() {
        let app = axum::Router::new()
            .route("/health", axum::routing::get(health_check_handler));

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn openapi_document_lists_the_task_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        assert!(paths.contains(&"/api/v1/tasks"));
        assert!(paths.contains(&"/api/v1/tasks/stats"));
        assert!(paths.contains(&"/api/v1/tasks/{id}"));
        assert!(paths.contains(&"/api/v1/login"));
    }
}
