use thiserror::Error;

use shopseed_core::StoreError;

/// Errors emitted by the seeder.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("no unused username found after {attempts} attempts")]
    UsernameExhausted { attempts: u32 },
}
