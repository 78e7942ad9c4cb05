//! Category module
//!
//! Categories group tasks; a fresh install starts with three defaults.

mod model;
mod repository;

pub use model::*;
pub use repository::CategoryRepository;
