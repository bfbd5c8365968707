//! View-event controller.
//!
//! # Responsibility
//! - Decode view-layer event payloads into typed `TodoEvent`s.
//! - Route each event to exactly one `TodoModel` call.
//!
//! # Invariants
//! - Event names and payload field names match the view contract
//!   (`add-todo`, `update-due-date`, `dueDate`, ...).
//! - Confirmation of destructive events happens before dispatch, in the view.

use crate::model::todo::{Importance, TodoId};
use crate::service::todo_model::TodoModel;
use crate::store::PersistenceAdapter;
use log::debug;
use serde::{Deserialize, Serialize};

/// Semantic intent emitted by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TodoEvent {
    AddTodo {
        text: String,
    },
    ToggleTodo {
        id: TodoId,
    },
    DeleteTodo {
        id: TodoId,
    },
    UpdateTodo {
        id: TodoId,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    UpdateDueDate {
        id: TodoId,
        due_date: String,
    },
    UpdateImportance {
        id: TodoId,
        importance: Importance,
    },
    ClearCompleted,
    #[serde(rename = "uncheck-all")]
    UncheckAllRemaining,
    ClearAll,
}

impl TodoEvent {
    /// Decodes one JSON event payload such as
    /// `{"type":"toggle-todo","id":3}`.
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTodo { .. } => "add-todo",
            Self::ToggleTodo { .. } => "toggle-todo",
            Self::DeleteTodo { .. } => "delete-todo",
            Self::UpdateTodo { .. } => "update-todo",
            Self::UpdateDueDate { .. } => "update-due-date",
            Self::UpdateImportance { .. } => "update-importance",
            Self::ClearCompleted => "clear-completed",
            Self::UncheckAllRemaining => "uncheck-all",
            Self::ClearAll => "clear-all",
        }
    }

    /// Whether a view must confirm with the user before emitting this.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::DeleteTodo { .. } | Self::ClearCompleted | Self::ClearAll
        )
    }
}

/// Result of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The model persisted and notified.
    Applied,
    /// The model ignored the event (blank text or unknown id).
    Ignored,
}

impl From<bool> for DispatchOutcome {
    fn from(applied: bool) -> Self {
        if applied {
            Self::Applied
        } else {
            Self::Ignored
        }
    }
}

/// Routes `event` to the matching model operation.
///
/// Delete and clear events always report `Applied`, matching the model's
/// unconditional persist-and-notify behavior.
pub fn dispatch<S: PersistenceAdapter>(
    model: &mut TodoModel<S>,
    event: TodoEvent,
) -> DispatchOutcome {
    let name = event.name();
    let outcome: DispatchOutcome = match event {
        TodoEvent::AddTodo { text } => model.add_todo(&text).is_some().into(),
        TodoEvent::ToggleTodo { id } => model.toggle_complete(id).into(),
        TodoEvent::DeleteTodo { id } => {
            model.delete_todo(id);
            DispatchOutcome::Applied
        }
        TodoEvent::UpdateTodo { id, text } => model.update_todo(id, &text).into(),
        TodoEvent::UpdateDueDate { id, due_date } => model.update_due_date(id, &due_date).into(),
        TodoEvent::UpdateImportance { id, importance } => {
            model.update_importance(id, importance).into()
        }
        TodoEvent::ClearCompleted => {
            model.clear_completed();
            DispatchOutcome::Applied
        }
        TodoEvent::UncheckAllRemaining => {
            model.uncheck_all_remaining();
            DispatchOutcome::Applied
        }
        TodoEvent::ClearAll => {
            model.clear_all();
            DispatchOutcome::Applied
        }
    };
    debug!("event=dispatch module=controller name={name} outcome={outcome:?}");
    outcome
}
