//! Plain-text rendering of model state.

use std::fmt::Write;
use todolist_core::{Importance, PersistenceAdapter, Todo, TodoFilter, TodoModel};

/// One line per todo in `filter`, then the active/completed totals.
pub fn render_list<S: PersistenceAdapter>(model: &TodoModel<S>, filter: TodoFilter) -> String {
    let mut out = String::new();
    for todo in model.filtered(filter) {
        out.push_str(&render_todo(todo));
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} active, {} completed",
        model.active_count(),
        model.completed_count()
    );
    out
}

fn render_todo(todo: &Todo) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    let mut line = format!("[{mark}] {:>3}  {}", todo.id, todo.text);
    if todo.has_due_date() {
        let _ = write!(line, "  due:{}", todo.due_date);
    }
    if !todo.importance.is_unset() {
        let _ = write!(line, "  {}", importance_badge(&todo.importance));
    }
    line
}

fn importance_badge(importance: &Importance) -> String {
    match importance {
        Importance::High => "!!!".to_string(),
        Importance::Medium => "!!".to_string(),
        Importance::Low => "!".to_string(),
        other => format!("[{other}]"),
    }
}
