use std::fmt;

use shopseed_core::DEFAULT_ITERATIONS;

/// Options for a seeding run.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub employees: u64,
    pub suppliers: u64,
    pub products: u64,
    pub inventory: u64,
    pub sales: u64,
    /// Fixed RNG seed; a random one is drawn when absent.
    pub seed: Option<u64>,
    /// Placeholder password assigned to every generated account.
    pub password: String,
    /// PBKDF2 rounds used when hashing `password`.
    pub password_iterations: u32,
    /// Maximum username candidates tried for a single account.
    pub max_username_attempts: u32,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            employees: 50,
            suppliers: 50,
            products: 200,
            inventory: 200,
            sales: 1000,
            seed: None,
            password: "password123".to_string(),
            password_iterations: DEFAULT_ITERATIONS,
            max_username_attempts: 1000,
        }
    }
}

/// Generation phases in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Employees,
    Categories,
    Suppliers,
    Products,
    Inventory,
    Sales,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Employees,
        Phase::Categories,
        Phase::Suppliers,
        Phase::Products,
        Phase::Inventory,
        Phase::Sales,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employees => "employees",
            Self::Categories => "categories",
            Self::Suppliers => "suppliers",
            Self::Products => "products",
            Self::Inventory => "inventory",
            Self::Sales => "sales",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single record attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    /// The record was already present (idempotent creation).
    Existing,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub index: u64,
    pub reason: String,
}

/// Summary of one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub requested: u64,
    pub created: u64,
    pub existing: u64,
    pub skipped: u64,
    pub failed: u64,
    pub retries: u64,
    /// Missing-dependency message when the phase returned early.
    pub blocked: Option<String>,
    pub failures: Vec<RecordFailure>,
}

impl PhaseReport {
    pub fn new(phase: Phase, requested: u64) -> Self {
        Self {
            phase,
            requested,
            created: 0,
            existing: 0,
            skipped: 0,
            failed: 0,
            retries: 0,
            blocked: None,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, index: u64, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Existing => self.existing += 1,
            RecordOutcome::Skipped(_) => self.skipped += 1,
            RecordOutcome::Failed(reason) => {
                self.failed += 1;
                self.failures.push(RecordFailure { index, reason });
            }
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }
}

/// Report for a whole seeding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub seed: u64,
    pub phases: Vec<PhaseReport>,
    pub duration_ms: u64,
}

impl SeedReport {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            phases: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|report| report.phase == phase)
    }

    pub fn total_created(&self) -> u64 {
        self.phases.iter().map(|report| report.created).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.phases.iter().map(|report| report.failed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_folds_outcomes_into_counters() {
        let mut report = PhaseReport::new(Phase::Sales, 4);
        report.record(0, RecordOutcome::Created);
        report.record(1, RecordOutcome::Skipped("out of stock".to_string()));
        report.record(2, RecordOutcome::Failed("boom".to_string()));
        report.record(3, RecordOutcome::Created);

        assert_eq!(report.created, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(
            report.failures,
            vec![RecordFailure {
                index: 2,
                reason: "boom".to_string()
            }]
        );
    }

    #[test]
    fn defaults_match_fixed_batch_sizes() {
        let options = SeedOptions::default();
        assert_eq!(
            (
                options.employees,
                options.suppliers,
                options.products,
                options.inventory,
                options.sales
            ),
            (50, 50, 200, 200, 1000)
        );
    }
}
