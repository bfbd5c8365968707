//! Core use-case services.
//!
//! # Responsibility
//! - Own todo list state and its mutation rules.
//! - Keep views and controllers decoupled from storage details.

pub mod todo_model;
