use sea_orm::DatabaseConnection;
use taskboard_core::{Stats, TaskStatus};
use taskboard_server::task::{TaskService, TaskServiceError};

mod common;

async fn setup() -> anyhow::Result<DatabaseConnection> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    common::setup_db().await
}

#[tokio::test]
async fn create_defaults_to_todo() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "Buy milk", None)
        .await
        .expect("Failed to create task");

    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.status, TaskStatus::Todo);
    assert_eq!(created.user_id, "alice");
}

#[tokio::test]
async fn create_accepts_an_explicit_status() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "Ship release", Some("In Progress"))
        .await
        .expect("Failed to create task");

    assert_eq!(created.status, TaskStatus::InProgress);
}

#[tokio::test]
async fn create_trims_the_title() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "  Buy milk  ", None)
        .await
        .expect("Failed to create task");

    assert_eq!(created.title, "Buy milk");
}

#[tokio::test]
async fn create_rejects_an_empty_title_and_persists_nothing() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let result = service.create_task("alice", "   ", None).await;

    let Err(TaskServiceError::Validation(errors)) = result else {
        panic!("Expected a validation error");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "title");

    let tasks = service.list_tasks("alice").await.expect("Failed to list");
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn create_rejects_an_overlong_title() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let at_limit = "a".repeat(200);
    let over_limit = "a".repeat(201);

    assert!(service.create_task("alice", &at_limit, None).await.is_ok());
    let result = service.create_task("alice", &over_limit, None).await;
    assert!(matches!(result, Err(TaskServiceError::Validation(_))));
}

#[tokio::test]
async fn create_rejects_an_unknown_status() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let result = service.create_task("alice", "Buy milk", Some("Later")).await;

    let Err(TaskServiceError::Validation(errors)) = result else {
        panic!("Expected a validation error");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "status");

    let tasks = service.list_tasks("alice").await.expect("Failed to list");
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn list_is_newest_first_and_scoped_to_the_user() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let first = service
        .create_task("alice", "First", None)
        .await
        .expect("Failed to create task");
    let second = service
        .create_task("alice", "Second", None)
        .await
        .expect("Failed to create task");
    service
        .create_task("bob", "Bob's task", None)
        .await
        .expect("Failed to create task");

    let tasks = service.list_tasks("alice").await.expect("Failed to list");

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, second.id);
    assert_eq!(tasks[1].id, first.id);
    assert!(tasks.iter().all(|task| task.user_id == "alice"));
}

#[tokio::test]
async fn list_is_empty_for_a_user_with_no_tasks() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let tasks = service.list_tasks("alice").await.expect("Failed to list");
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn get_cannot_see_another_users_task() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "Private", None)
        .await
        .expect("Failed to create task");

    let owned = service.get_task_by_id("alice", created.id).await;
    assert!(owned.is_ok());

    let probed = service.get_task_by_id("bob", created.id).await;
    assert!(matches!(probed, Err(TaskServiceError::TaskNotFound(id)) if id == created.id));
}

#[tokio::test]
async fn update_applies_only_the_provided_fields() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "Original", None)
        .await
        .expect("Failed to create task");

    let renamed = service
        .update_task("alice", created.id, Some("Renamed"), None)
        .await
        .expect("Failed to update task");
    assert_eq!(renamed.title, "Renamed");
    assert_eq!(renamed.status, TaskStatus::Todo);

    let completed = service
        .update_task("alice", created.id, None, Some("Completed"))
        .await
        .expect("Failed to update task");
    assert_eq!(completed.title, "Renamed");
    assert_eq!(completed.status, TaskStatus::Completed);
    assert_eq!(completed.created_at, created.created_at);
}

#[tokio::test]
async fn update_of_a_nonexistent_task_returns_not_found() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let result = service.update_task("alice", 42, Some("Anything"), None).await;
    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(42))));
}

#[tokio::test]
async fn update_cannot_touch_another_users_task() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "Private", None)
        .await
        .expect("Failed to create task");

    let result = service
        .update_task("bob", created.id, Some("Hijacked"), None)
        .await;
    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(_))));

    let unchanged = service
        .get_task_by_id("alice", created.id)
        .await
        .expect("Failed to get task");
    assert_eq!(unchanged.title, "Private");
}

#[tokio::test]
async fn update_validates_before_touching_the_store() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "Original", None)
        .await
        .expect("Failed to create task");

    let result = service
        .update_task("alice", created.id, Some(""), Some("Done"))
        .await;

    let Err(TaskServiceError::Validation(errors)) = result else {
        panic!("Expected a validation error");
    };
    assert_eq!(errors.len(), 2);

    let unchanged = service
        .get_task_by_id("alice", created.id)
        .await
        .expect("Failed to get task");
    assert_eq!(unchanged.title, "Original");
    assert_eq!(unchanged.status, TaskStatus::Todo);
}

#[tokio::test]
async fn delete_removes_the_task_permanently() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "Ephemeral", None)
        .await
        .expect("Failed to create task");

    let deleted = service
        .delete_task_by_id("alice", created.id)
        .await
        .expect("Failed to delete task");
    assert_eq!(deleted.id, created.id);

    let tasks = service.list_tasks("alice").await.expect("Failed to list");
    assert!(tasks.is_empty());

    let again = service.delete_task_by_id("alice", created.id).await;
    assert!(matches!(again, Err(TaskServiceError::TaskNotFound(_))));
}

#[tokio::test]
async fn delete_cannot_touch_another_users_task() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "Private", None)
        .await
        .expect("Failed to create task");

    let result = service.delete_task_by_id("bob", created.id).await;
    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(_))));

    let tasks = service.list_tasks("alice").await.expect("Failed to list");
    assert_eq!(tasks.len(), 1);
}

#[tokio::test]
async fn stats_recomputes_from_the_full_current_set() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    service
        .create_task("alice", "One", None)
        .await
        .expect("Failed to create task");
    service
        .create_task("alice", "Two", Some("In Progress"))
        .await
        .expect("Failed to create task");
    service
        .create_task("alice", "Three", Some("Completed"))
        .await
        .expect("Failed to create task");
    service
        .create_task("bob", "Elsewhere", None)
        .await
        .expect("Failed to create task");

    let stats = service
        .task_stats("alice")
        .await
        .expect("Failed to compute stats");

    assert_eq!(
        stats,
        Stats {
            total: 3,
            todo: 1,
            in_progress: 1,
            completed: 1,
        }
    );
    assert!(stats.is_consistent());
}

#[tokio::test]
async fn stats_is_all_zero_for_a_user_with_no_tasks() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let stats = service
        .task_stats("alice")
        .await
        .expect("Failed to compute stats");
    assert_eq!(stats, Stats::default());
}

#[tokio::test]
async fn full_lifecycle_keeps_stats_consistent() {
    let db = setup().await.expect("Failed to setup test database");
    let service = TaskService::new(&db);

    let created = service
        .create_task("alice", "Buy milk", None)
        .await
        .expect("Failed to create task");
    assert_eq!(created.status, TaskStatus::Todo);

    let stats = service.task_stats("alice").await.expect("Failed stats");
    assert_eq!(
        stats,
        Stats {
            total: 1,
            todo: 1,
            in_progress: 0,
            completed: 0,
        }
    );

    service
        .update_task("alice", created.id, None, Some("Completed"))
        .await
        .expect("Failed to update task");

    let stats = service.task_stats("alice").await.expect("Failed stats");
    assert_eq!(
        stats,
        Stats {
            total: 1,
            todo: 0,
            in_progress: 0,
            completed: 1,
        }
    );

    service
        .delete_task_by_id("alice", created.id)
        .await
        .expect("Failed to delete task");

    let tasks = service.list_tasks("alice").await.expect("Failed to list");
    assert!(tasks.is_empty());
    let stats = service.task_stats("alice").await.expect("Failed stats");
    assert_eq!(stats, Stats::default());
}
