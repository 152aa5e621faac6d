use std::fmt;

use thiserror::Error;

/// Entity tables known to the persistence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Account,
    Employee,
    Category,
    Supplier,
    Product,
    Inventory,
    Sale,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Employee => "employee",
            Self::Category => "category",
            Self::Supplier => "supplier",
            Self::Product => "product",
            Self::Inventory => "inventory",
            Self::Sale => "sale",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column already holds the value.
    #[error("duplicate {entity}.{field}: '{value}'")]
    UniqueViolation {
        entity: EntityKind,
        field: &'static str,
        value: String,
    },
    /// A reference points at a row that does not exist.
    #[error("{entity} references missing {target} {id}")]
    ForeignKey {
        entity: EntityKind,
        target: EntityKind,
        id: i64,
    },
    /// A row would violate a column check.
    #[error("check violated on {entity}: {message}")]
    CheckViolation { entity: EntityKind, message: String },
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },
    /// Driver or connection failure.
    #[error("database error: {0}")]
    Db(String),
}

/// Convenience alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
