//! Task module
//!
//! This module contains task-related types and the task repository.

mod model;
mod repository;

pub use model::*;
pub use repository::TaskRepository;
