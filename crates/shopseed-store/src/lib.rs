//! Store adapters for the shopseed persistence boundary.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryStore, Tables};
pub use postgres::PostgresStore;
