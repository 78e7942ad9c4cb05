//! Core library for Taskdeck
//!
//! This crate contains the task manager's business logic, including:
//! - Key-value storage backends and the dual-backend store adapter
//! - Task and category repositories with reactive collections
//! - The list filter/sort projection
//! - The task board service tying them together

pub mod board;
pub mod category;
pub mod config;
pub mod error;
pub mod filter;
pub mod storage;
pub mod task;

mod clock;
mod collection;

pub use board::TaskBoard;
pub use config::Config;
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
