//! Core contracts shared by the shopseed crates.
//!
//! Defines the retail entities, the persistence traits the seeder writes
//! through, and small helpers used by adapters and the CLI.

pub mod error;
pub mod model;
pub mod password;
pub mod redaction;
pub mod store;

pub use error::{EntityKind, StoreError, StoreResult};
pub use model::{
    Account, CATEGORY_NAMES, Category, Employee, Inventory, NewAccount, NewEmployee, NewInventory,
    NewProduct, NewSale, NewSupplier, Product, Sale, Size, Supplier,
};
pub use password::{DEFAULT_ITERATIONS, hash_password};
pub use redaction::redact_connection_string;
pub use store::{Store, StoreTx};
