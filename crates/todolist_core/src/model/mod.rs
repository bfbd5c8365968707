//! Domain model for the todo list.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the persisted shape identical to what views read.
//!
//! # Invariants
//! - Every todo is identified by a never-reused `TodoId`.
//! - The todo list and the ID counter are persisted as one aggregate.

pub mod todo;
