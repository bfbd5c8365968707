//! Todo domain model.
//!
//! # Responsibility
//! - Define the canonical todo record and its importance tag.
//! - Define the persisted aggregate (`items` + `nextId`).
//!
//! # Invariants
//! - `id` is never reused for another todo.
//! - `text` is trimmed and non-empty while stored.
//! - `created_at` is set once at creation and never rewritten.
//! - `due_date` and `importance` are stored verbatim.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Stable identifier for one todo.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TodoId = u64;

/// First ID issued by an empty store.
pub const FIRST_TODO_ID: TodoId = 1;

/// Placeholder tag older clients stored for "no importance chosen".
pub const LEGACY_UNSET_TAG: &str = "severity-value";

/// Importance tag attached to a todo.
///
/// Known levels serialize as `unset|high|medium|low`. Any other string is
/// kept as `Other` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Importance {
    /// No importance chosen.
    #[default]
    Unset,
    High,
    Medium,
    Low,
    /// Unrecognized tag preserved verbatim (including the empty string).
    Other(String),
}

impl Importance {
    /// Parses a tag, falling back to `Other` for unknown values.
    pub fn parse(value: &str) -> Self {
        match value {
            "unset" => Self::Unset,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire/storage representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unset => "unset",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Other(value) => value.as_str(),
        }
    }

    /// The empty string and the legacy placeholder tag also mean "unset".
    ///
    /// Both stay stored as `Other` so they are written back unchanged.
    pub fn is_unset(&self) -> bool {
        match self {
            Self::Unset => true,
            Self::Other(value) => value.is_empty() || value == LEGACY_UNSET_TAG,
            _ => false,
        }
    }
}

impl Display for Importance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Importance {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for Importance {
    fn from(value: String) -> Self {
        Self::parse(value.as_str())
    }
}

impl Serialize for Importance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Importance {
    /// Accepts any JSON value: `null` is unset, non-strings keep their JSON
    /// text as an `Other` tag.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(tag) => Self::from(tag),
            Value::Null => Self::Unset,
            other => Self::Other(other.to_string()),
        })
    }
}

/// Reads `null` as the field's default instead of rejecting the record.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One task record.
///
/// Field names serialize in camelCase to keep the stored JSON layout
/// (`createdAt`, `dueDate`) stable. Only `id` and `text` are required when
/// decoding; the other fields accept `null` or absence as their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    /// RFC 3339 UTC timestamp, millisecond precision. Empty when a stored
    /// record never had one.
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    /// Empty string means "no due date".
    #[serde(default, deserialize_with = "null_as_default")]
    pub due_date: String,
    #[serde(default)]
    pub importance: Importance,
}

impl Todo {
    /// Creates a todo with default status fields.
    ///
    /// # Invariants
    /// - `completed` starts as `false`.
    /// - `due_date` starts empty and `importance` starts unset.
    /// - This constructor does not trim or validate `text`.
    pub fn new(id: TodoId, text: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at: created_at.into(),
            due_date: String::new(),
            importance: Importance::Unset,
        }
    }

    /// Returns whether this todo still needs doing.
    pub fn is_active(&self) -> bool {
        !self.completed
    }

    /// Returns whether a due date has been set.
    pub fn has_due_date(&self) -> bool {
        !self.due_date.is_empty()
    }
}

/// Persisted aggregate: the list and the ID counter share one lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoSnapshot {
    pub items: Vec<Todo>,
    pub next_id: TodoId,
}

impl TodoSnapshot {
    /// Raises `next_id` above every stored ID.
    ///
    /// Returns `true` when the counter had to be repaired.
    pub fn reconcile_next_id(&mut self) -> bool {
        let floor = self
            .items
            .iter()
            .map(|todo| todo.id.saturating_add(1))
            .max()
            .unwrap_or(FIRST_TODO_ID)
            .max(FIRST_TODO_ID);
        if self.next_id < floor {
            self.next_id = floor;
            return true;
        }
        false
    }
}

impl Default for TodoSnapshot {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: FIRST_TODO_ID,
        }
    }
}
