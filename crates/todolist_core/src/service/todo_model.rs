//! Todo list state owner.
//!
//! # Responsibility
//! - Hold the authoritative in-memory todo list and ID counter.
//! - Apply mutations, persist the full snapshot, then notify subscribers.
//!
//! # Invariants
//! - IDs are issued from `next_id`, which only ever grows.
//! - Stored text is trimmed and non-empty.
//! - Display order is insertion order; no operation reorders todos.
//! - A mutation is visible in memory even when persisting it failed.
//! - Delete and bulk-clear operations persist and notify even when
//!   nothing matched.
//! - Subscribers run in registration order; a panicking subscriber does not
//!   stop delivery to the rest.

use crate::model::todo::{Importance, Todo, TodoId, TodoSnapshot, FIRST_TODO_ID};
use crate::store::PersistenceAdapter;
use chrono::{SecondsFormat, Utc};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Logical key holding the todo array.
pub const ITEMS_KEY: &str = "items";
/// Logical key holding the ID counter.
pub const NEXT_ID_KEY: &str = "nextId";

/// Subscriber callback invoked after each mutation.
pub type Listener = Box<dyn FnMut()>;

/// Timestamp source for `created_at`.
pub type Clock = Box<dyn Fn() -> String>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Read-only view selection. Filtering never reorders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    /// Whether `todo` belongs in this view.
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

/// Returns the current UTC time in `toISOString` shape.
pub fn iso_timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Authoritative todo list with flush-on-write persistence.
pub struct TodoModel<S: PersistenceAdapter> {
    storage: S,
    todos: Vec<Todo>,
    next_id: TodoId,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    clock: Clock,
}

impl<S: PersistenceAdapter> TodoModel<S> {
    /// Loads the list and counter from `storage`.
    ///
    /// Missing or undecodable values fall back to an empty list and
    /// counter `1`.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Box::new(iso_timestamp_now))
    }

    /// Same as `new`, with an injected `created_at` source.
    pub fn with_clock(storage: S, clock: Clock) -> Self {
        let snapshot = load_snapshot(&storage);
        info!(
            "event=model_load module=model status=ok items={} next_id={}",
            snapshot.items.len(),
            snapshot.next_id
        );
        Self {
            storage,
            todos: snapshot.items,
            next_id: snapshot.next_id,
            listeners: Vec::new(),
            next_subscription: 0,
            clock,
        }
    }

    /// Registers a subscriber called after every successful mutation.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a subscriber. Returns `false` when `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    /// Number of registered subscribers.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Appends a todo built from trimmed `text`.
    ///
    /// Returns `None` (no persistence, no notification) for empty or
    /// whitespace-only input, and when the ID space is exhausted.
    pub fn add_todo(&mut self, text: &str) -> Option<TodoId> {
        let text = text.trim();
        if text.is_empty() {
            debug!("event=todo_add module=model status=skipped reason=empty_text");
            return None;
        }

        let id = self.next_id;
        let Some(next_id) = id.checked_add(1) else {
            error!("event=todo_add module=model status=error error_code=id_exhausted next_id={id}");
            return None;
        };
        self.next_id = next_id;
        self.todos.push(Todo::new(id, text, (self.clock)()));
        debug!("event=todo_add module=model status=ok todo_id={id}");
        self.commit();
        Some(id)
    }

    /// Flips `completed` on the matching todo.
    pub fn toggle_complete(&mut self, id: TodoId) -> bool {
        let Some(todo) = self.find_mut(id) else {
            return false;
        };
        todo.completed = !todo.completed;
        debug!(
            "event=todo_toggle module=model status=ok todo_id={id} completed={}",
            todo.completed
        );
        self.commit();
        true
    }

    /// Removes the matching todo. Persists and notifies even on a miss.
    pub fn delete_todo(&mut self, id: TodoId) {
        let before = self.todos.len();
        self.todos.retain(|todo| todo.id != id);
        debug!(
            "event=todo_delete module=model status=ok todo_id={id} removed={}",
            before - self.todos.len()
        );
        self.commit();
    }

    /// Replaces the text with trimmed `new_text`.
    ///
    /// Unknown IDs and blank text are ignored without side effects.
    pub fn update_todo(&mut self, id: TodoId, new_text: &str) -> bool {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return false;
        }
        let Some(todo) = self.find_mut(id) else {
            return false;
        };
        todo.text = new_text.to_string();
        debug!("event=todo_update module=model status=ok todo_id={id}");
        self.commit();
        true
    }

    /// Stores `due_date` verbatim; the empty string clears it.
    pub fn update_due_date(&mut self, id: TodoId, due_date: &str) -> bool {
        let Some(todo) = self.find_mut(id) else {
            return false;
        };
        todo.due_date = due_date.to_string();
        debug!("event=todo_due_date module=model status=ok todo_id={id}");
        self.commit();
        true
    }

    /// Stores `importance` verbatim.
    pub fn update_importance(&mut self, id: TodoId, importance: impl Into<Importance>) -> bool {
        let importance = importance.into();
        let Some(todo) = self.find_mut(id) else {
            return false;
        };
        debug!(
            "event=todo_importance module=model status=ok todo_id={id} importance={importance}"
        );
        todo.importance = importance;
        self.commit();
        true
    }

    /// Drops every completed todo. Always persists and notifies.
    pub fn clear_completed(&mut self) {
        let before = self.todos.len();
        self.todos.retain(Todo::is_active);
        debug!(
            "event=todo_clear_completed module=model status=ok removed={}",
            before - self.todos.len()
        );
        self.commit();
    }

    /// Marks every todo as not completed. Always persists and notifies.
    pub fn uncheck_all_remaining(&mut self) {
        for todo in &mut self.todos {
            todo.completed = false;
        }
        debug!("event=todo_uncheck_all module=model status=ok");
        self.commit();
    }

    /// Empties the list. `next_id` is kept so IDs are never reissued.
    pub fn clear_all(&mut self) {
        self.todos.clear();
        debug!(
            "event=todo_clear_all module=model status=ok next_id={}",
            self.next_id
        );
        self.commit();
    }

    /// Number of todos not yet completed.
    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    /// Number of completed todos.
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|todo| todo.completed).count()
    }

    /// Todos in display order.
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// First todo with `id`, if any.
    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// ID the next `add_todo` will issue.
    pub fn next_id(&self) -> TodoId {
        self.next_id
    }

    /// New filtered view in display order.
    pub fn filtered(&self, filter: TodoFilter) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|todo| filter.matches(todo))
            .collect()
    }

    /// Copy of the persisted aggregate.
    pub fn snapshot(&self) -> TodoSnapshot {
        TodoSnapshot {
            items: self.todos.clone(),
            next_id: self.next_id,
        }
    }

    /// Adapter the model persists through.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the model and returns its adapter.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn find_mut(&mut self, id: TodoId) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id == id)
    }

    fn commit(&mut self) {
        self.save();
        self.notify();
    }

    fn save(&mut self) {
        let items = match serde_json::to_value(&self.todos) {
            Ok(items) => items,
            Err(err) => {
                error!("event=model_save module=model status=error error={err}");
                return;
            }
        };
        self.storage.save_all(&[
            (ITEMS_KEY, items),
            (NEXT_ID_KEY, Value::from(self.next_id)),
        ]);
    }

    fn notify(&mut self) {
        for (id, listener) in &mut self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                error!(
                    "event=listener_panic module=model status=error subscription={}",
                    id.0
                );
            }
        }
    }
}

fn load_snapshot<S: PersistenceAdapter>(storage: &S) -> TodoSnapshot {
    let items = match storage.load(ITEMS_KEY, Value::Array(Vec::new())) {
        Value::Array(records) => decode_items(records),
        Value::Null => Vec::new(),
        _ => {
            warn!("event=model_load module=model status=error error_code=items_not_array");
            Vec::new()
        }
    };

    let stored_next_id = storage.load(NEXT_ID_KEY, Value::from(FIRST_TODO_ID));
    let next_id = stored_next_id.as_u64().unwrap_or_else(|| {
        warn!("event=model_load module=model status=error error_code=invalid_next_id");
        FIRST_TODO_ID
    });

    let mut snapshot = TodoSnapshot { items, next_id };
    if snapshot.reconcile_next_id() {
        warn!(
            "event=model_load module=model status=repaired next_id={}",
            snapshot.next_id
        );
    }
    snapshot
}

/// Decodes records one by one so a single bad record only drops itself.
fn decode_items(records: Vec<Value>) -> Vec<Todo> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Todo>(record) {
            Ok(todo) => Some(todo),
            Err(err) => {
                warn!(
                    "event=model_load module=model status=error error_code=invalid_item index={index} error={err}"
                );
                None
            }
        })
        .collect()
}
