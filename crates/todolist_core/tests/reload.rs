use serde_json::json;
use todolist_core::{
    open_storage, AppConfig, Importance, MemoryBackend, PersistenceAdapter, SqliteBackend,
    StorageBackend, StorageService, TodoModel,
};

#[test]
fn reload_from_memory_backend_reproduces_list_and_counter() {
    let mut model = TodoModel::new(StorageService::new(MemoryBackend::new()));
    model.add_todo("Buy milk");
    model.add_todo("Walk dog");
    model.toggle_complete(1);
    model.update_due_date(2, "2025-03-04");
    model.update_importance(2, "low");
    model.delete_todo(1);
    let before = model.snapshot();

    let reloaded = TodoModel::new(model.into_storage());

    assert_eq!(reloaded.snapshot(), before);
    assert_eq!(reloaded.next_id(), 3);
    assert_eq!(reloaded.todos()[0].importance, Importance::Low);
}

#[test]
fn reload_from_sqlite_file_continues_id_assignment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.sqlite3");

    {
        let mut model = TodoModel::new(StorageService::new(SqliteBackend::open(&path).unwrap()));
        model.add_todo("first");
        model.add_todo("second");
        model.clear_all();
        model.add_todo("third");
    }

    let mut model = TodoModel::new(StorageService::new(SqliteBackend::open(&path).unwrap()));
    assert_eq!(model.todos().len(), 1);
    assert_eq!(model.todos()[0].id, 3);
    assert_eq!(model.todos()[0].text, "third");
    assert_eq!(model.add_todo("fourth"), Some(4));
}

#[test]
fn empty_store_starts_at_first_id() {
    let model = TodoModel::new(StorageService::new(SqliteBackend::open_in_memory().unwrap()));
    assert!(model.todos().is_empty());
    assert_eq!(model.next_id(), 1);
}

#[test]
fn loads_legacy_layout_written_by_other_clients() {
    let mut backend = MemoryBackend::new();
    backend
        .set(
            "todos_items",
            r#"[{"id":4,"text":"legacy","completed":true,"createdAt":"2024-01-01T00:00:00.000Z","dueDate":"","importance":"medium-value"}]"#,
        )
        .unwrap();
    backend.set("todos_nextId", "5").unwrap();

    let model = TodoModel::new(StorageService::new(backend));

    assert_eq!(model.completed_count(), 1);
    assert_eq!(model.todos()[0].importance.as_str(), "medium-value");
    assert_eq!(model.next_id(), 5);
}

#[test]
fn corrupt_items_fall_back_to_empty_list() {
    let mut backend = MemoryBackend::new();
    backend.set("todos_items", "{broken").unwrap();
    backend.set("todos_nextId", "8").unwrap();

    let model = TodoModel::new(StorageService::new(backend));

    assert!(model.todos().is_empty());
    assert_eq!(model.next_id(), 8);
}

#[test]
fn malformed_record_is_skipped_without_losing_its_neighbours() {
    let mut backend = MemoryBackend::new();
    backend
        .set(
            "todos_items",
            &json!([
                {"id": 1, "text": "good", "completed": true, "createdAt": "2024-01-01T00:00:00.000Z", "dueDate": "", "importance": "high"},
                {"id": 2, "text": "nulls", "completed": null, "createdAt": null, "dueDate": null},
                {"id": "three", "text": "bad id"},
                {"id": 4}
            ])
            .to_string(),
        )
        .unwrap();
    backend.set("todos_nextId", "5").unwrap();

    let mut model = TodoModel::new(StorageService::new(backend));

    let ids = model.todos().iter().map(|todo| todo.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2]);
    assert!(model.todos()[0].completed);
    assert_eq!(model.todos()[1].due_date, "");
    assert_eq!(model.next_id(), 5);

    assert_eq!(model.add_todo("after reload"), Some(5));
    let stored = model.storage().load("items", json!(null));
    let stored_ids = stored
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(stored_ids, vec![1, 2, 5]);
}

#[test]
fn non_array_items_fall_back_to_empty_list() {
    let mut backend = MemoryBackend::new();
    backend.set("todos_items", r#"{"id":1,"text":"not a list"}"#).unwrap();

    let model = TodoModel::new(StorageService::new(backend));

    assert!(model.todos().is_empty());
    assert_eq!(model.next_id(), 1);
}

#[test]
fn stale_counter_is_raised_above_stored_ids() {
    let mut storage = StorageService::new(MemoryBackend::new());
    storage.save(
        "items",
        &json!([{"id": 6, "text": "kept", "createdAt": "2024-01-01T00:00:00.000Z"}]),
    );
    storage.save("nextId", &json!(2));

    let mut model = TodoModel::new(storage);

    assert_eq!(model.add_todo("new"), Some(7));
}

#[test]
fn prefixes_isolate_independent_lists() {
    let mut work = TodoModel::new(StorageService::with_prefix(MemoryBackend::new(), "work"));
    work.add_todo("ship release");
    let backend = work.into_storage().into_backend();

    let home = TodoModel::new(StorageService::with_prefix(backend, "home"));
    assert!(home.todos().is_empty());
    assert_eq!(home.next_id(), 1);
}

#[test]
fn open_storage_uses_sqlite_when_path_configured() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        storage_prefix: "cli".to_string(),
        db_path: Some(dir.path().join("cli.sqlite3")),
        ..AppConfig::default()
    };

    {
        let mut model = TodoModel::new(open_storage(&config).unwrap());
        model.add_todo("durable");
    }

    let model = TodoModel::new(open_storage(&config).unwrap());
    assert_eq!(model.todos()[0].text, "durable");
    assert_eq!(model.storage().prefix(), "cli");
}

#[test]
fn open_storage_without_path_is_ephemeral() {
    let config = AppConfig::default();

    {
        let mut model = TodoModel::new(open_storage(&config).unwrap());
        model.add_todo("gone after drop");
    }

    let model = TodoModel::new(open_storage(&config).unwrap());
    assert!(model.todos().is_empty());
}
