//! Persistent per-user task store
//!
//! Owns the current user's in-memory task list and mirrors it to the
//! key-value store under the `tasks` key. The persisted collection holds
//! every user's tasks, so writes are read-merge-write: entries owned by
//! other users are never clobbered.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::event::{EventSink, Notification};
use crate::session::User;
use crate::storage::{keys, KeyValueStore};
use crate::{Error, Result};

use super::model::{Task, TaskDraft, TaskFilter, TaskPatch};

/// Thread-safe task store scoped to one authenticated user at a time
#[derive(Clone)]
pub struct TaskStore {
    store: Arc<dyn KeyValueStore>,
    sink: Arc<dyn EventSink>,
    tasks: Arc<RwLock<Vec<Task>>>,
    user_id: Arc<RwLock<Option<String>>>,
}

impl TaskStore {
    pub fn new(store: Arc<dyn KeyValueStore>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            sink,
            tasks: Arc::new(RwLock::new(Vec::new())),
            user_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Load the given user's tasks from the store.
    ///
    /// An absent collection yields an empty list. An unparsable collection
    /// is reset: the store entry is removed, the in-memory list is emptied,
    /// and a `Corrupted` error is returned — the store stays usable with
    /// zero tasks.
    pub async fn load(&self, user: &User) -> Result<Vec<Task>> {
        *self.user_id.write().await = Some(user.id.clone());

        let all: Vec<Task> = match self.store.get(keys::TASKS).await? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(tasks) => tasks,
                Err(err) => {
                    tracing::warn!("Resetting corrupt task collection: {}", err);
                    self.store.remove(keys::TASKS).await?;
                    self.tasks.write().await.clear();
                    self.sink.notify(Notification::destructive(
                        "Error",
                        "Failed to load tasks. Starting with an empty list.",
                    ));
                    return Err(Error::Corrupted(err.to_string()));
                }
            },
        };

        let mut mine: Vec<Task> = all
            .into_iter()
            .filter(|task| task.user_id == user.id)
            .collect();
        mine.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        tracing::debug!("Loaded {} task(s) for {}", mine.len(), user.email);
        *self.tasks.write().await = mine.clone();
        Ok(mine)
    }

    /// Create a task owned by the loaded user
    pub async fn add(&self, draft: TaskDraft) -> Result<Task> {
        let user_id = self.require_user().await?;
        if draft.title.trim().is_empty() {
            return Err(Error::Validation(
                "Task title cannot be empty".to_string(),
            ));
        }

        let task = Task::new(user_id, draft);
        self.tasks.write().await.push(task.clone());
        self.persist().await?;

        self.sink.notify(Notification::normal(
            "Task Added",
            format!("\"{}\" has been added to your tasks.", task.title),
        ));
        Ok(task)
    }

    /// Merge partial fields into the task matching `id`
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.require_user().await?;

        let updated = {
            let mut tasks = self.tasks.write().await;
            let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
                return Err(Error::TaskNotFound(id.to_string()));
            };
            task.apply(patch);
            task.clone()
        };
        self.persist().await?;

        self.sink.notify(Notification::normal(
            "Task Updated",
            "Task has been updated successfully.",
        ));
        Ok(updated)
    }

    /// Remove the task matching `id`
    pub async fn delete(&self, id: &str) -> Result<Task> {
        self.require_user().await?;

        let removed = {
            let mut tasks = self.tasks.write().await;
            let Some(position) = tasks.iter().position(|task| task.id == id) else {
                return Err(Error::TaskNotFound(id.to_string()));
            };
            tasks.remove(position)
        };
        self.persist().await?;

        self.sink.notify(Notification::normal(
            "Task Deleted",
            "Task has been deleted successfully.",
        ));
        Ok(removed)
    }

    /// Flip the completion flag of the task matching `id`
    pub async fn toggle(&self, id: &str) -> Result<Task> {
        self.require_user().await?;

        let toggled = {
            let mut tasks = self.tasks.write().await;
            let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
                return Err(Error::TaskNotFound(id.to_string()));
            };
            task.completed = !task.completed;
            task.clone()
        };
        self.persist().await?;
        Ok(toggled)
    }

    /// The loaded user's tasks, in creation order
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// Derived view of the in-memory list; does not mutate or persist
    pub async fn filtered(&self, filter: TaskFilter) -> Vec<Task> {
        self.tasks
            .read()
            .await
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect()
    }

    /// Drop the in-memory list and user context (logout companion)
    pub async fn clear(&self) {
        self.tasks.write().await.clear();
        *self.user_id.write().await = None;
    }

    async fn require_user(&self) -> Result<String> {
        self.user_id.read().await.clone().ok_or(Error::NoSession)
    }

    /// Write the in-memory list back, merged with other users' tasks.
    ///
    /// A corrupt persisted collection is treated as empty here; the loaded
    /// user's list is the source of truth for their own entries.
    async fn persist(&self) -> Result<()> {
        let user_id = self.require_user().await?;
        let mine = self.tasks.read().await.clone();

        let mut all: Vec<Task> = match self.store.get(keys::TASKS).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            None => Vec::new(),
        };
        all.retain(|task| task.user_id != user_id);
        all.extend(mine);

        let content = serde_json::to_string_pretty(&all)?;
        self.store.set(keys::TASKS, &content).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::event::NullSink;
    use crate::storage::MemoryStore;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: id.to_string(),
            email: format!("{}@example.com", id),
        }
    }

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn build_store() -> (TaskStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let tasks = TaskStore::new(store.clone(), Arc::new(NullSink));
        (tasks, store)
    }

    #[tokio::test]
    async fn test_add_and_load_round_trip() {
        let (tasks, store) = build_store();
        let demo = user("user-demo");

        tasks.load(&demo).await.unwrap();
        let created = tasks
            .add(TaskDraft::new("Buy milk", due()).with_description("2 liters"))
            .await
            .unwrap();

        // A fresh store over the same backing data sees the same task
        let reloaded = TaskStore::new(store, Arc::new(NullSink));
        let list = reloaded.load(&demo).await.unwrap();
        assert_eq!(list, vec![created]);
    }

    #[tokio::test]
    async fn test_load_filters_by_user() {
        let (tasks, _store) = build_store();
        let alice = user("alice");
        let bob = user("bob");

        tasks.load(&alice).await.unwrap();
        let hers = tasks.add(TaskDraft::new("Alice's task", due())).await.unwrap();

        let his_list = tasks.load(&bob).await.unwrap();
        assert!(his_list.is_empty());

        let her_list = tasks.load(&alice).await.unwrap();
        assert_eq!(her_list, vec![hers]);
    }

    #[tokio::test]
    async fn test_persist_preserves_other_users_tasks() {
        let (tasks, store) = build_store();
        let alice = user("alice");
        let bob = user("bob");

        tasks.load(&alice).await.unwrap();
        tasks.add(TaskDraft::new("Alice's task", due())).await.unwrap();

        // Bob's mutations must not clobber Alice's stored entries
        tasks.load(&bob).await.unwrap();
        let his = tasks.add(TaskDraft::new("Bob's task", due())).await.unwrap();
        tasks.toggle(&his.id).await.unwrap();

        let raw = store.get(keys::TASKS).await.unwrap().unwrap();
        let all: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|task| task.user_id == "alice"));
        assert!(all.iter().any(|task| task.user_id == "bob" && task.completed));
    }

    #[tokio::test]
    async fn test_operations_without_session_are_rejected() {
        let (tasks, store) = build_store();

        let result = tasks.add(TaskDraft::new("Orphan", due())).await;
        assert!(matches!(result, Err(Error::NoSession)));

        // Nothing was written
        assert!(store.get(keys::TASKS).await.unwrap().is_none());
        assert!(matches!(
            tasks.toggle("some-id").await,
            Err(Error::NoSession)
        ));
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let (tasks, _store) = build_store();
        tasks.load(&user("user-demo")).await.unwrap();

        let result = tasks.add(TaskDraft::new("   ", due())).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(tasks.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_partial_fields() {
        let (tasks, _store) = build_store();
        tasks.load(&user("user-demo")).await.unwrap();

        let created = tasks
            .add(TaskDraft::new("Original", due()).with_description("Keep me"))
            .await
            .unwrap();
        let updated = tasks
            .update(
                &created.id,
                TaskPatch {
                    title: Some("Renamed".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description, "Keep me");
        assert_eq!(updated.user_id, created.user_id);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_original_flag() {
        let (tasks, _store) = build_store();
        tasks.load(&user("user-demo")).await.unwrap();

        let created = tasks.add(TaskDraft::new("Buy milk", due())).await.unwrap();
        let other = tasks.add(TaskDraft::new("Walk dog", due())).await.unwrap();

        let once = tasks.toggle(&created.id).await.unwrap();
        assert!(once.completed);
        let twice = tasks.toggle(&created.id).await.unwrap();
        assert_eq!(twice.completed, created.completed);

        // Only the targeted task was touched
        let list = tasks.tasks().await;
        let untouched = list.iter().find(|task| task.id == other.id).unwrap();
        assert!(!untouched.completed);
    }

    #[tokio::test]
    async fn test_delete_then_update_is_not_found() {
        let (tasks, _store) = build_store();
        tasks.load(&user("user-demo")).await.unwrap();

        let created = tasks.add(TaskDraft::new("Ephemeral", due())).await.unwrap();
        tasks.delete(&created.id).await.unwrap();

        let result = tasks.update(&created.id, TaskPatch::default()).await;
        assert!(matches!(result, Err(Error::TaskNotFound(_))));

        let again = tasks.delete(&created.id).await;
        assert!(matches!(again, Err(Error::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_collection_resets_to_empty() {
        let (tasks, store) = build_store();
        store.set(keys::TASKS, "{definitely not json").await.unwrap();

        let result = tasks.load(&user("user-demo")).await;
        assert!(matches!(result, Err(Error::Corrupted(_))));

        // The store stays usable with zero tasks
        assert!(store.get(keys::TASKS).await.unwrap().is_none());
        assert!(tasks.tasks().await.is_empty());
        let created = tasks.add(TaskDraft::new("Recovered", due())).await.unwrap();
        assert_eq!(tasks.tasks().await, vec![created]);
    }

    #[tokio::test]
    async fn test_filtered_views_are_pure() {
        let (tasks, store) = build_store();
        tasks.load(&user("user-demo")).await.unwrap();

        let a = tasks.add(TaskDraft::new("A", due())).await.unwrap();
        tasks.add(TaskDraft::new("B", due())).await.unwrap();
        tasks.toggle(&a.id).await.unwrap();

        let before = store.get(keys::TASKS).await.unwrap();

        let completed = tasks.filtered(TaskFilter::Completed).await;
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, a.id);
        assert_eq!(tasks.filtered(TaskFilter::Pending).await.len(), 1);
        assert_eq!(tasks.filtered(TaskFilter::All).await.len(), 2);

        // Filtering never persists
        assert_eq!(store.get(keys::TASKS).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_clear_drops_state() {
        let (tasks, _store) = build_store();
        tasks.load(&user("user-demo")).await.unwrap();
        tasks.add(TaskDraft::new("Buy milk", due())).await.unwrap();

        tasks.clear().await;
        assert!(tasks.tasks().await.is_empty());
        assert!(matches!(
            tasks.add(TaskDraft::new("Late", due())).await,
            Err(Error::NoSession)
        ));
    }
}
