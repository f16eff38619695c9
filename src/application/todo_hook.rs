//! State synchronization between a [`TodoService`] and the presentation layer.
//!
//! [`TodoHook`] keeps an in-memory copy of the collection plus a loading flag
//! and the last error, published through a `watch` channel. Its operations
//! call the service and reconcile the copy on success. Failures become a
//! display string in [`TodoState::error`]; nothing propagates to the caller.
//!
//! Only the initial load toggles `is_loading`. Every operation clears the
//! previous error before calling the service, so the error slot always
//! reflects the most recent operation.
//!
//! After [`TodoHook::dispose`] no state write happens, including writes from
//! operations whose service call was already in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::service::TodoService;
use crate::domain::{AppError, CreateTodoInput, Todo};

/// Snapshot of what the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoState {
    pub todos: Vec<Todo>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for TodoState {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            is_loading: true,
            error: None,
        }
    }
}

struct Shared {
    service: Arc<dyn TodoService>,
    state: watch::Sender<TodoState>,
    disposed: AtomicBool,
    load_task: Mutex<Option<JoinHandle<()>>>,
}

/// Observable todo list bound to one service.
///
/// Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct TodoHook {
    shared: Arc<Shared>,
}

impl TodoHook {
    /// Create a hook in its initial loading state without fetching.
    #[must_use]
    pub fn new(service: Arc<dyn TodoService>) -> Self {
        let (state, _) = watch::channel(TodoState::default());
        Self {
            shared: Arc::new(Shared {
                service,
                state,
                disposed: AtomicBool::new(false),
                load_task: Mutex::new(None),
            }),
        }
    }

    /// Create a hook and immediately start the initial load in the background.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn mount(service: Arc<dyn TodoService>) -> Self {
        let hook = Self::new(service);

        let task = tokio::spawn({
            let hook = hook.clone();
            async move { hook.load().await }
        });
        if let Ok(mut slot) = hook.shared.load_task.lock() {
            *slot = Some(task);
        }

        hook
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> TodoState {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TodoState> {
        self.shared.state.subscribe()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    /// Tear the hook down. Pending results are discarded from now on.
    pub fn dispose(&self) {
        // Flip the flag under the channel lock so no `apply` straddles it.
        let mut first = false;
        self.shared.state.send_if_modified(|_| {
            first = !self.shared.disposed.swap(true, Ordering::AcqRel);
            false
        });
        if !first {
            return;
        }

        if let Ok(mut slot) = self.shared.load_task.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }

        tracing::debug!("Todo hook disposed");
    }

    /// Fetch the whole collection, replacing the in-memory copy.
    pub async fn load(&self) {
        self.apply(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let result = self.shared.service.get_all().await;

        self.apply(|s| {
            match result {
                Ok(todos) => {
                    tracing::debug!(count = todos.len(), "Loaded todos");
                    s.todos = todos;
                }
                Err(e) => s.error = Some(describe(&e, "Failed to fetch todos")),
            }
            s.is_loading = false;
        });
    }

    /// Create a todo and append it to the list.
    pub async fn add_todo(&self, title: &str) {
        self.clear_error();

        let result = self
            .shared
            .service
            .create(CreateTodoInput::new(title))
            .await;

        self.apply(|s| match result {
            Ok(todo) => s.todos.push(todo),
            Err(e) => s.error = Some(describe(&e, "Failed to add todo")),
        });
    }

    /// Flip a todo's completed flag. Unknown ids are ignored.
    pub async fn toggle_todo(&self, id: &str) {
        self.clear_error();

        let result = self.shared.service.toggle_complete(id).await;

        self.apply(|s| match result {
            Ok(Some(updated)) => {
                if let Some(slot) = s.todos.iter_mut().find(|t| t.id == id) {
                    *slot = updated;
                }
            }
            Ok(None) => tracing::debug!(id, "Toggle target not in store"),
            Err(e) => s.error = Some(describe(&e, "Failed to toggle todo")),
        });
    }

    /// Delete a todo. Unknown ids are ignored.
    pub async fn delete_todo(&self, id: &str) {
        self.clear_error();

        let result = self.shared.service.delete(id).await;

        self.apply(|s| match result {
            Ok(true) => s.todos.retain(|t| t.id != id),
            Ok(false) => tracing::debug!(id, "Delete target not in store"),
            Err(e) => s.error = Some(describe(&e, "Failed to delete todo")),
        });
    }

    fn clear_error(&self) {
        self.apply(|s| s.error = None);
    }

    /// Apply `f` unless the hook has been disposed.
    ///
    /// The check runs under the channel's write lock, the same lock
    /// `dispose` takes to set the flag.
    fn apply(&self, f: impl FnOnce(&mut TodoState)) {
        let applied = self.shared.state.send_if_modified(|state| {
            if self.is_disposed() {
                return false;
            }
            f(state);
            true
        });
        if !applied {
            tracing::trace!("Dropping state update after dispose");
        }
    }
}

fn describe(err: &AppError, fallback: &str) -> String {
    tracing::warn!(error = %err, "Todo operation failed");
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::domain::{Result, UpdateTodoInput};

    /// In-memory service that records calls and can be told to fail.
    #[derive(Default)]
    struct FakeService {
        todos: Mutex<Vec<Todo>>,
        calls: Mutex<Vec<String>>,
        failing: Mutex<HashSet<&'static str>>,
        gated: AtomicBool,
        gate: Notify,
    }

    impl FakeService {
        fn with_todos(todos: Vec<Todo>) -> Arc<Self> {
            Arc::new(Self {
                todos: Mutex::new(todos),
                ..Self::default()
            })
        }

        fn fail(&self, op: &'static str) {
            self.failing.lock().unwrap().insert(op);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn enter(&self, op: &'static str, arg: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("{op}({arg})"));
            if self.gated.load(Ordering::SeqCst) {
                self.gate.notified().await;
            }
            let should_fail = self.failing.lock().unwrap().contains(op);
            if should_fail {
                return Err(AppError::storage(format!("{op} rejected")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TodoService for FakeService {
        async fn get_all(&self) -> Result<Vec<Todo>> {
            self.enter("get_all", "").await?;
            Ok(self.todos.lock().unwrap().clone())
        }

        async fn get_by_id(&self, id: &str) -> Result<Option<Todo>> {
            self.enter("get_by_id", id).await?;
            Ok(self.todos.lock().unwrap().iter().find(|t| t.id == id).cloned())
        }

        async fn create(&self, input: CreateTodoInput) -> Result<Todo> {
            self.enter("create", &input.title).await?;
            let mut todos = self.todos.lock().unwrap();
            let todo = Todo::new(format!("id-{}", todos.len() + 1), input.title);
            todos.push(todo.clone());
            Ok(todo)
        }

        async fn update(&self, id: &str, input: UpdateTodoInput) -> Result<Option<Todo>> {
            self.enter("update", id).await?;
            let mut todos = self.todos.lock().unwrap();
            Ok(todos.iter_mut().find(|t| t.id == id).map(|t| {
                t.apply(input);
                t.clone()
            }))
        }

        async fn delete(&self, id: &str) -> Result<bool> {
            self.enter("delete", id).await?;
            let mut todos = self.todos.lock().unwrap();
            let before = todos.len();
            todos.retain(|t| t.id != id);
            Ok(todos.len() != before)
        }

        async fn toggle_complete(&self, id: &str) -> Result<Option<Todo>> {
            self.enter("toggle_complete", id).await?;
            let mut todos = self.todos.lock().unwrap();
            Ok(todos.iter_mut().find(|t| t.id == id).map(|t| {
                t.toggle();
                t.clone()
            }))
        }
    }

    async fn loaded(service: &Arc<FakeService>) -> TodoHook {
        let hook = TodoHook::new(service.clone());
        hook.load().await;
        hook
    }

    #[test]
    fn test_initial_state() {
        let hook = TodoHook::new(FakeService::with_todos(Vec::new()));
        let state = hook.state();

        assert!(state.is_loading);
        assert!(state.todos.is_empty());
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_mount_fetches_once() {
        let service = FakeService::with_todos(vec![Todo::new("1", "Test Todo")]);
        let hook = TodoHook::mount(service.clone());
        assert!(hook.state().is_loading);

        let state = hook
            .subscribe()
            .wait_for(|s| !s.is_loading)
            .await
            .unwrap()
            .clone();

        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.todos[0].title, "Test Todo");
        assert_eq!(service.calls(), ["get_all()"]);
    }

    #[tokio::test]
    async fn test_empty_store_load() {
        let service = FakeService::with_todos(Vec::new());
        let hook = TodoHook::new(service.clone());
        let mut rx = hook.subscribe();

        hook.load().await;

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert!(!state.is_loading);
        assert!(state.todos.is_empty());
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_load_failure_sets_error() {
        let service = FakeService::with_todos(vec![Todo::new("1", "Hidden")]);
        service.fail("get_all");

        let state = loaded(&service).await.state();

        assert!(!state.is_loading);
        assert!(state.todos.is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some("Storage error: get_all rejected")
        );
    }

    #[tokio::test]
    async fn test_add_todo_appends() {
        let service = FakeService::with_todos(vec![Todo::new("0", "Existing")]);
        let hook = loaded(&service).await;

        hook.add_todo("Buy milk").await;

        let state = hook.state();
        assert_eq!(state.todos.len(), 2);
        let last = state.todos.last().unwrap();
        assert_eq!(last.title, "Buy milk");
        assert!(!last.completed);
        assert_eq!(service.calls().last().unwrap(), "create(Buy milk)");
    }

    #[tokio::test]
    async fn test_toggle_todo_replaces_in_place() {
        let service = FakeService::with_todos(vec![
            Todo::new("1", "Toggle Me"),
            Todo::new("2", "Leave Me"),
        ]);
        let hook = loaded(&service).await;

        hook.toggle_todo("1").await;

        let state = hook.state();
        assert!(state.todos[0].completed);
        assert_eq!(state.todos[0].title, "Toggle Me");
        assert!(!state.todos[1].completed);
        assert_eq!(service.calls().last().unwrap(), "toggle_complete(1)");
    }

    #[tokio::test]
    async fn test_delete_todo_removes_match() {
        let service = FakeService::with_todos(vec![
            Todo::new("1", "Delete Me"),
            Todo::new("2", "Keep Me"),
        ]);
        let hook = loaded(&service).await;

        hook.delete_todo("1").await;

        let ids: Vec<String> = hook.state().todos.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["2"]);
        assert_eq!(service.calls().last().unwrap(), "delete(1)");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_silent() {
        let service = FakeService::with_todos(vec![Todo::new("1", "Only")]);
        let hook = loaded(&service).await;
        let before = hook.state();

        hook.toggle_todo("missing").await;
        hook.delete_todo("missing").await;

        assert_eq!(hook.state(), before);
    }

    #[tokio::test]
    async fn test_toggle_failure_sets_error() {
        let service = FakeService::with_todos(vec![Todo::new("1", "Stuck")]);
        let hook = loaded(&service).await;
        service.fail("toggle_complete");

        hook.toggle_todo("1").await;

        let state = hook.state();
        assert_eq!(
            state.error.as_deref(),
            Some("Storage error: toggle_complete rejected")
        );
        assert_eq!(state.todos.len(), 1);
        assert!(!state.todos[0].completed);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_create_failure_keeps_items() {
        let service = FakeService::with_todos(vec![Todo::new("1", "Stay")]);
        let hook = loaded(&service).await;
        service.fail("create");

        hook.add_todo("Nope").await;

        let state = hook.state();
        assert!(state.error.is_some());
        assert_eq!(state.todos.len(), 1);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_next_operation_clears_error() {
        let service = FakeService::with_todos(vec![Todo::new("1", "Item")]);
        let hook = loaded(&service).await;

        service.fail("delete");
        hook.delete_todo("1").await;
        assert!(hook.state().error.is_some());

        hook.toggle_todo("1").await;
        let state = hook.state();
        assert_eq!(state.error, None);
        assert!(state.todos[0].completed);
    }

    #[tokio::test]
    async fn test_no_update_after_dispose() {
        let service = FakeService::with_todos(Vec::new());
        let hook = loaded(&service).await;
        service.gated.store(true, Ordering::SeqCst);

        let pending = tokio::spawn({
            let hook = hook.clone();
            async move { hook.add_todo("Too late").await }
        });
        tokio::task::yield_now().await;

        hook.dispose();
        service.gate.notify_one();
        pending.await.unwrap();

        assert!(hook.is_disposed());
        assert!(hook.state().todos.is_empty());
        assert_eq!(service.todos.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_disposed_hook_publishes_nothing() {
        let service = FakeService::with_todos(vec![Todo::new("1", "Item")]);
        let hook = loaded(&service).await;
        let before = hook.state();
        let mut rx = hook.subscribe();

        hook.dispose();
        hook.dispose();
        hook.load().await;
        hook.add_todo("Ignored").await;
        hook.toggle_todo("1").await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(hook.state(), before);
    }

    #[tokio::test]
    async fn test_dispose_aborts_mount_load() {
        let service = FakeService::with_todos(vec![Todo::new("1", "Never shown")]);
        service.gated.store(true, Ordering::SeqCst);

        let hook = TodoHook::mount(service.clone());
        tokio::task::yield_now().await;
        hook.dispose();
        service.gate.notify_one();
        tokio::task::yield_now().await;

        let state = hook.state();
        assert!(state.is_loading);
        assert!(state.todos.is_empty());
    }
}
