//! Seeder for the retail-management schema.
//!
//! Populates employees, categories, suppliers, products, inventory and
//! sales through a [`shopseed_core::Store`], one unit of work per record.

pub mod engine;
pub mod errors;
pub mod fakers;
pub mod model;

pub use engine::{Seeder, phase_rng};
pub use errors::SeedError;
pub use model::{Phase, PhaseReport, RecordFailure, RecordOutcome, SeedOptions, SeedReport};
