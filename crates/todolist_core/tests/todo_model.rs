use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use todolist_core::{
    Importance, MemoryBackend, PersistenceAdapter, StorageBackend, StorageService, TodoModel,
    ITEMS_KEY, NEXT_ID_KEY,
};

const FIXED_NOW: &str = "2025-06-01T08:30:00.000Z";

fn new_model() -> TodoModel<StorageService<MemoryBackend>> {
    TodoModel::with_clock(
        StorageService::new(MemoryBackend::new()),
        Box::new(|| FIXED_NOW.to_string()),
    )
}

fn counting_listener<S: PersistenceAdapter>(model: &mut TodoModel<S>) -> Rc<Cell<usize>> {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    model.subscribe(move || seen.set(seen.get() + 1));
    calls
}

/// Adapter whose contents stay readable from inside a subscriber.
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<HashMap<String, Value>>>);

impl SharedStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }
}

impl PersistenceAdapter for SharedStore {
    fn save(&mut self, key: &str, value: &Value) {
        self.0.borrow_mut().insert(key.to_string(), value.clone());
    }

    fn load(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    fn remove(&mut self, key: &str) {
        self.0.borrow_mut().remove(key);
    }

    fn clear(&mut self) {
        self.0.borrow_mut().clear();
    }
}

/// Records what the store held each time a subscriber ran.
fn observe_store_on_notify(
    model: &mut TodoModel<SharedStore>,
    store: &SharedStore,
) -> Rc<RefCell<Vec<(Option<Value>, Option<Value>)>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let store = store.clone();
    let log = Rc::clone(&seen);
    model.subscribe(move || {
        log.borrow_mut()
            .push((store.get(ITEMS_KEY), store.get(NEXT_ID_KEY)));
    });
    seen
}

fn ids<S: PersistenceAdapter>(model: &TodoModel<S>) -> Vec<u64> {
    model.todos().iter().map(|todo| todo.id).collect()
}

#[test]
fn add_todo_appends_with_defaults() {
    let mut model = new_model();

    let id = model.add_todo("  Test todo  ").unwrap();

    assert_eq!(id, 1);
    assert_eq!(model.todos().len(), 1);
    let todo = &model.todos()[0];
    assert_eq!(todo.text, "Test todo");
    assert!(!todo.completed);
    assert_eq!(todo.created_at, FIXED_NOW);
    assert_eq!(todo.due_date, "");
    assert_eq!(todo.importance, Importance::Unset);

    model.add_todo("Test todo 2");
    assert_eq!(model.todos().len(), 2);
    assert_eq!(model.todos()[1].text, "Test todo 2");
    assert!(!model.todos()[1].completed);
}

#[test]
fn blank_add_has_no_side_effects() {
    let mut model = new_model();
    let calls = counting_listener(&mut model);

    assert_eq!(model.add_todo(""), None);
    assert_eq!(model.add_todo("   "), None);
    assert_eq!(model.add_todo("\t\n"), None);

    assert!(model.todos().is_empty());
    assert_eq!(model.next_id(), 1);
    assert_eq!(calls.get(), 0);
    assert!(model.storage().backend().is_empty());
}

#[test]
fn ids_increase_regardless_of_deletions() {
    let mut model = new_model();
    model.add_todo("a");
    model.add_todo("b");
    model.delete_todo(2);
    model.delete_todo(1);

    assert_eq!(model.add_todo("c"), Some(3));
    assert_eq!(model.add_todo("d"), Some(4));
}

#[test]
fn toggle_twice_restores_completion() {
    let mut model = new_model();
    model.add_todo("flip me");

    assert!(model.toggle_complete(1));
    assert!(model.todos()[0].completed);
    assert!(model.toggle_complete(1));
    assert!(!model.todos()[0].completed);
}

#[test]
fn toggle_unknown_id_is_silent_no_op() {
    let mut model = new_model();
    model.add_todo("only");
    let calls = counting_listener(&mut model);

    assert!(!model.toggle_complete(42));
    assert_eq!(calls.get(), 0);
    assert!(!model.todos()[0].completed);
}

#[test]
fn delete_removes_exact_entry_and_keeps_order() {
    let mut model = new_model();
    for text in ["one", "two", "three", "four"] {
        model.add_todo(text);
    }

    model.delete_todo(2);

    assert_eq!(ids(&model), vec![1, 3, 4]);
    assert_eq!(model.todos()[1].text, "three");
}

#[test]
fn delete_of_missing_id_still_persists_and_notifies() {
    let mut model = new_model();
    let calls = counting_listener(&mut model);

    model.delete_todo(99);

    assert_eq!(calls.get(), 1);
    assert_eq!(model.storage().load(ITEMS_KEY, json!(null)), json!([]));
    assert_eq!(model.storage().load(NEXT_ID_KEY, json!(null)), json!(1));
}

#[test]
fn update_todo_trims_and_rejects_blank_text() {
    let mut model = new_model();
    model.add_todo("Test todo");
    let calls = counting_listener(&mut model);

    assert!(model.update_todo(1, "  Test todo (edited) "));
    assert_eq!(model.todos()[0].text, "Test todo (edited)");
    assert!(!model.todos()[0].completed);

    assert!(!model.update_todo(1, ""));
    assert!(!model.update_todo(1, "   "));
    assert!(!model.update_todo(7, "ghost"));
    assert_eq!(model.todos()[0].text, "Test todo (edited)");
    assert_eq!(calls.get(), 1);
}

#[test]
fn due_date_is_stored_verbatim() {
    let mut model = new_model();
    model.add_todo("Task with a deadline");

    assert!(model.update_due_date(1, "2025-12-31"));
    let todo = &model.todos()[0];
    assert_eq!(todo.due_date, "2025-12-31");
    assert_eq!(todo.text, "Task with a deadline");
    assert!(!todo.completed);

    assert!(model.update_due_date(1, " not a date "));
    assert_eq!(model.todos()[0].due_date, " not a date ");

    assert!(model.update_due_date(1, ""));
    assert!(!model.todos()[0].has_due_date());

    assert!(!model.update_due_date(5, "2025-01-01"));
}

#[test]
fn importance_is_stored_verbatim() {
    let mut model = new_model();
    model.add_todo("Urgent Task");

    assert!(model.update_importance(1, "high-value"));
    assert_eq!(model.todos()[0].importance.as_str(), "high-value");
    assert_eq!(model.todos()[0].text, "Urgent Task");

    assert!(model.update_importance(1, Importance::Low));
    assert_eq!(model.todos()[0].importance, Importance::Low);

    assert!(model.update_importance(1, ""));
    assert_eq!(model.todos()[0].importance.as_str(), "");
    assert!(model.todos()[0].importance.is_unset());

    assert!(!model.update_importance(2, "high"));
}

#[test]
fn clear_completed_keeps_only_active() {
    let mut model = new_model();
    for text in ["a", "b", "c"] {
        model.add_todo(text);
    }
    model.toggle_complete(1);
    model.toggle_complete(3);

    model.clear_completed();

    assert_eq!(ids(&model), vec![2]);
    assert_eq!(model.completed_count(), 0);
}

#[test]
fn clear_completed_without_matches_still_notifies() {
    let mut model = new_model();
    model.add_todo("active");
    let calls = counting_listener(&mut model);

    model.clear_completed();

    assert_eq!(calls.get(), 1);
    assert_eq!(model.todos().len(), 1);
}

#[test]
fn uncheck_all_only_changes_completion() {
    let mut model = new_model();
    model.add_todo("a");
    model.add_todo("b");
    model.update_due_date(1, "2025-02-02");
    model.update_importance(2, "medium");
    model.toggle_complete(1);
    model.toggle_complete(2);
    let before = model.todos().to_vec();

    model.uncheck_all_remaining();

    assert_eq!(model.active_count(), 2);
    for (after, before) in model.todos().iter().zip(before.iter()) {
        assert!(!after.completed);
        assert_eq!(after.id, before.id);
        assert_eq!(after.text, before.text);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.due_date, before.due_date);
        assert_eq!(after.importance, before.importance);
    }
}

#[test]
fn clear_all_empties_list_and_keeps_counter() {
    let mut model = new_model();
    model.add_todo("a");
    model.add_todo("b");
    let calls = counting_listener(&mut model);

    model.clear_all();

    assert!(model.todos().is_empty());
    assert_eq!(model.next_id(), 3);
    assert_eq!(calls.get(), 1);
    assert_eq!(model.storage().load(NEXT_ID_KEY, json!(null)), json!(3));
}

#[test]
fn scenario_from_empty_store() {
    let mut model = new_model();

    model.add_todo("Buy milk");
    assert_eq!(model.todos().len(), 1);
    assert_eq!(model.todos()[0].id, 1);
    assert_eq!(model.todos()[0].text, "Buy milk");

    assert_eq!(model.add_todo("Walk dog"), Some(2));

    model.toggle_complete(1);
    assert!(model.todos()[0].completed);
    assert_eq!(model.active_count(), 1);
    assert_eq!(model.completed_count(), 1);

    model.delete_todo(1);
    assert_eq!(model.todos().len(), 1);
    assert_eq!(model.todos()[0].id, 2);

    model.clear_all();
    assert!(model.todos().is_empty());
    assert_eq!(model.add_todo("x"), Some(3));
}

#[test]
fn every_mutation_writes_full_snapshot() {
    let mut model = new_model();
    model.add_todo("persist me");
    model.update_importance(1, "high");

    let backend = model.storage().backend();
    assert_eq!(backend.raw("todos_nextId"), Some("2"));
    let items: serde_json::Value =
        serde_json::from_str(backend.raw("todos_items").unwrap()).unwrap();
    assert_eq!(
        items,
        json!([{
            "id": 1,
            "text": "persist me",
            "completed": false,
            "createdAt": FIXED_NOW,
            "dueDate": "",
            "importance": "high"
        }])
    );
}

#[test]
fn subscribers_run_in_registration_order() {
    let mut model = new_model();
    let order = Rc::new(RefCell::new(Vec::new()));

    for tag in ["first", "second", "third"] {
        let order = Rc::clone(&order);
        model.subscribe(move || order.borrow_mut().push(tag));
    }

    model.add_todo("notify");

    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn subscribers_see_the_store_already_written() {
    let store = SharedStore::default();
    let mut model = TodoModel::new(store.clone());
    let seen = observe_store_on_notify(&mut model, &store);

    model.add_todo("written first");
    model.toggle_complete(1);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    let (items, next_id) = &seen[0];
    assert_eq!(items.as_ref().unwrap()[0]["text"], json!("written first"));
    assert_eq!(items.as_ref().unwrap()[0]["completed"], json!(false));
    assert_eq!(next_id, &Some(json!(2)));
    let (items, _) = &seen[1];
    assert_eq!(items.as_ref().unwrap()[0]["completed"], json!(true));
}

#[test]
fn uncheck_all_on_empty_list_still_persists_and_notifies() {
    let store = SharedStore::default();
    let mut model = TodoModel::new(store.clone());
    let seen = observe_store_on_notify(&mut model, &store);

    model.uncheck_all_remaining();

    assert!(model.todos().is_empty());
    assert_eq!(*seen.borrow(), vec![(Some(json!([])), Some(json!(1)))]);
}

#[test]
fn panicking_subscriber_does_not_block_others() {
    let mut model = new_model();
    model.subscribe(|| panic!("view failed to render"));
    let calls = counting_listener(&mut model);

    model.add_todo("still delivered");
    model.toggle_complete(1);

    assert_eq!(calls.get(), 2);
    assert!(model.todos()[0].completed);
}

#[test]
fn unsubscribed_listener_is_not_called() {
    let mut model = new_model();
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let id = model.subscribe(move || seen.set(seen.get() + 1));

    model.add_todo("one");
    assert!(model.unsubscribe(id));
    model.add_todo("two");

    assert_eq!(calls.get(), 1);
}

#[test]
fn storage_failure_keeps_in_memory_mutation() {
    let mut model = TodoModel::new(StorageService::new(MemoryBackend::with_quota(8)));
    let calls = counting_listener(&mut model);

    assert_eq!(model.add_todo("cannot be persisted"), Some(1));

    assert_eq!(model.todos().len(), 1);
    assert_eq!(calls.get(), 1);
    assert!(model.storage().backend().is_empty());
}

#[test]
fn exhausted_id_space_rejects_add_without_side_effects() {
    let mut backend = MemoryBackend::new();
    backend
        .set(
            "todos_items",
            &json!([{"id": u64::MAX, "text": "last"}]).to_string(),
        )
        .unwrap();
    backend.set("todos_nextId", &u64::MAX.to_string()).unwrap();
    let mut model = TodoModel::new(StorageService::new(backend));
    let calls = counting_listener(&mut model);
    let stored_before = model.storage().load(ITEMS_KEY, json!(null));

    assert_eq!(model.add_todo("one too many"), None);

    assert_eq!(model.todos().len(), 1);
    assert_eq!(model.next_id(), u64::MAX);
    assert_eq!(calls.get(), 0);
    assert_eq!(model.storage().load(ITEMS_KEY, json!(null)), stored_before);
}

#[test]
fn last_id_below_the_limit_is_still_issued() {
    let mut backend = MemoryBackend::new();
    backend
        .set("todos_nextId", &(u64::MAX - 1).to_string())
        .unwrap();
    let mut model = TodoModel::new(StorageService::new(backend));

    assert_eq!(model.add_todo("penultimate"), Some(u64::MAX - 1));
    assert_eq!(model.next_id(), u64::MAX);
    assert_eq!(model.add_todo("overflow"), None);
    assert_eq!(model.todos().len(), 1);
}
