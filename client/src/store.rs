use taskboard_core::{Stats, Task, TaskStatus};

use crate::api::TasksApi;

/// The UI-facing mirror of the task list and its derived statistics.
///
/// The mirror is empty on load, populated by the list fetch, incrementally
/// patched by each successful create/update/delete response, and fully
/// replaceable by a re-fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TasksState {
    pub items: Vec<Task>,
    pub stats: Stats,
    pub loading: bool,
    pub error: Option<String>,
}

impl TasksState {
    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish(&mut self) {
        self.loading = false;
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    /// Clears the last error without touching the rest of the mirror.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Replaces the item list wholesale with a fresh fetch result.
    pub fn apply_fetched_tasks(&mut self, tasks: Vec<Task>) {
        self.items = tasks;
    }

    /// Replaces the aggregate with the authoritative server recompute.
    pub fn apply_fetched_stats(&mut self, stats: Stats) {
        self.stats = stats;
    }

    /// Prepends a newly created task, preserving newest-first order without
    /// re-sorting, and counts it as a Todo-state increment to match the
    /// store's default status.
    pub fn apply_created(&mut self, task: Task) {
        self.items.insert(0, task);
        self.stats.record(TaskStatus::Todo);
    }

    /// Replaces an updated task in place, moving one count between status
    /// buckets when the status changed.
    ///
    /// The adjustment is computed against the locally cached previous status;
    /// if two updates to the same task race, the later one applies a stale
    /// transition until the next full stats fetch reconciles the mirror. If
    /// the task is not in the mirror, the stats adjustment is skipped.
    pub fn apply_updated(&mut self, task: Task) {
        if let Some(index) = self.items.iter().position(|item| item.id == task.id) {
            let old_status = self.items[index].status;
            self.stats.transition(old_status, task.status);
            self.items[index] = task;
        }
    }

    /// Removes a deleted task along with its contribution to the counts.
    /// Skipped when the task is not in the mirror.
    pub fn apply_deleted(&mut self, id: i32) {
        if let Some(index) = self.items.iter().position(|item| item.id == id) {
            let status = self.items[index].status;
            self.stats.remove(status);
            self.items.remove(index);
        }
    }
}

/// Owns the mirror and an API handle. Each operation runs three phases:
/// pending (loading set, prior error cleared), then either fulfilled (mirror
/// mutated per the operation) or rejected (error recorded, mirror untouched).
pub struct TasksStore<A: TasksApi> {
    api: A,
    state: TasksState,
}

impl<A: TasksApi> TasksStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: TasksState::default(),
        }
    }

    /// The current mirror, as the view layer should render it.
    pub fn state(&self) -> &TasksState {
        &self.state
    }

    pub fn clear_error(&mut self) {
        self.state.clear_error();
    }

    pub async fn fetch_tasks(&mut self) {
        self.state.begin();
        match self.api.fetch_tasks().await {
            Ok(tasks) => {
                self.state.finish();
                self.state.apply_fetched_tasks(tasks);
            }
            Err(err) => self.state.fail(err.to_string()),
        }
    }

    pub async fn fetch_stats(&mut self) {
        self.state.begin();
        match self.api.fetch_stats().await {
            Ok(stats) => {
                self.state.finish();
                self.state.apply_fetched_stats(stats);
            }
            Err(err) => self.state.fail(err.to_string()),
        }
    }

    pub async fn create_task(&mut self, title: String, status: Option<TaskStatus>) {
        self.state.begin();
        match self.api.create_task(title, status).await {
            Ok(task) => {
                self.state.finish();
                self.state.apply_created(task);
            }
            Err(err) => self.state.fail(err.to_string()),
        }
    }

    pub async fn update_task(
        &mut self,
        id: i32,
        title: Option<String>,
        status: Option<TaskStatus>,
    ) {
        self.state.begin();
        match self.api.update_task(id, title, status).await {
            Ok(task) => {
                self.state.finish();
                self.state.apply_updated(task);
            }
            Err(err) => self.state.fail(err.to_string()),
        }
    }

    pub async fn delete_task(&mut self, id: i32) {
        self.state.begin();
        match self.api.delete_task(id).await {
            Ok(id) => {
                self.state.finish();
                self.state.apply_deleted(id);
            }
            Err(err) => self.state.fail(err.to_string()),
        }
    }
}
