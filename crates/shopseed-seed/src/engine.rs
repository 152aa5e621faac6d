use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use shopseed_core::{
    CATEGORY_NAMES, Category, Employee, EntityKind, NewAccount, NewEmployee, NewInventory,
    NewProduct, NewSale, NewSupplier, Product, Store, StoreError, StoreTx, Supplier,
    hash_password,
};

use crate::errors::SeedError;
use crate::fakers;
use crate::model::{Phase, PhaseReport, RecordOutcome, SeedOptions, SeedReport};

/// RNG for one phase of a run seeded with `seed`.
pub fn phase_rng(seed: u64, phase: Phase) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(hash_seed(seed, phase.as_str()))
}

/// Rows a phase draws foreign keys from. Never empty.
struct Pool<T>(Vec<T>);

impl<T> Pool<T> {
    fn new(values: Vec<T>) -> Option<Self> {
        (!values.is_empty()).then_some(Self(values))
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        &self.0[rng.random_range(0..self.0.len())]
    }
}

/// Populates a store phase by phase.
#[derive(Debug, Clone)]
pub struct Seeder {
    options: SeedOptions,
    seed: u64,
}

impl Seeder {
    pub fn new(options: SeedOptions) -> Self {
        let seed = options.seed.unwrap_or_else(rand::random);
        Self { options, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn options(&self) -> &SeedOptions {
        &self.options
    }

    /// Run every phase in dependency order.
    ///
    /// Record-level failures are folded into the phase reports. An error is
    /// returned only when a foreign-key pool cannot be loaded.
    pub async fn run<S: Store + ?Sized>(&self, store: &S) -> Result<SeedReport, SeedError> {
        let start = Instant::now();
        info!(
            event = "seed_started",
            seed = self.seed,
            engine = store.engine(),
            "starting fake data generation"
        );

        let mut report = SeedReport::new(self.seed);
        for phase in Phase::ALL {
            let phase_report = self.run_phase(store, phase).await?;
            report.phases.push(phase_report);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            event = "seed_finished",
            seed = self.seed,
            created = report.total_created(),
            failed = report.total_failed(),
            duration_ms = report.duration_ms,
            "successfully generated all fake data"
        );
        Ok(report)
    }

    pub async fn run_phase<S: Store + ?Sized>(
        &self,
        store: &S,
        phase: Phase,
    ) -> Result<PhaseReport, SeedError> {
        match phase {
            Phase::Employees => self.seed_employees(store).await,
            Phase::Categories => self.seed_categories(store).await,
            Phase::Suppliers => self.seed_suppliers(store).await,
            Phase::Products => self.seed_products(store).await,
            Phase::Inventory => self.seed_inventory(store).await,
            Phase::Sales => self.seed_sales(store).await,
        }
    }

    pub async fn seed_employees<S: Store + ?Sized>(
        &self,
        store: &S,
    ) -> Result<PhaseReport, SeedError> {
        let mut report = start_phase(Phase::Employees, self.options.employees);
        let mut rng = phase_rng(self.seed, Phase::Employees);

        for index in 0..self.options.employees {
            let outcome = self
                .create_employee(store, &mut rng, &mut report.retries)
                .await
                .map(|_| RecordOutcome::Created);
            record(&mut report, index, outcome);
        }

        Ok(finish_phase(report))
    }

    pub async fn seed_categories<S: Store + ?Sized>(
        &self,
        store: &S,
    ) -> Result<PhaseReport, SeedError> {
        let mut report = start_phase(Phase::Categories, CATEGORY_NAMES.len() as u64);

        for (index, name) in CATEGORY_NAMES.into_iter().enumerate() {
            let outcome = create_category(store, name).await.map(|(_, created)| {
                if created {
                    RecordOutcome::Created
                } else {
                    RecordOutcome::Existing
                }
            });
            record(&mut report, index as u64, outcome);
        }

        Ok(finish_phase(report))
    }

    pub async fn seed_suppliers<S: Store + ?Sized>(
        &self,
        store: &S,
    ) -> Result<PhaseReport, SeedError> {
        let mut report = start_phase(Phase::Suppliers, self.options.suppliers);
        let mut rng = phase_rng(self.seed, Phase::Suppliers);

        for index in 0..self.options.suppliers {
            let outcome = create_supplier(store, &mut rng)
                .await
                .map(|_| RecordOutcome::Created);
            record(&mut report, index, outcome);
        }

        Ok(finish_phase(report))
    }

    pub async fn seed_products<S: Store + ?Sized>(
        &self,
        store: &S,
    ) -> Result<PhaseReport, SeedError> {
        let mut report = start_phase(Phase::Products, self.options.products);
        let Some(categories) = Pool::new(load_categories(store).await?) else {
            return Ok(block_phase(
                report,
                "no categories found; create categories first",
            ));
        };

        let mut rng = phase_rng(self.seed, Phase::Products);
        for index in 0..self.options.products {
            let outcome = create_product(store, &mut rng, &categories)
                .await
                .map(|_| RecordOutcome::Created);
            record(&mut report, index, outcome);
        }

        Ok(finish_phase(report))
    }

    pub async fn seed_inventory<S: Store + ?Sized>(
        &self,
        store: &S,
    ) -> Result<PhaseReport, SeedError> {
        let mut report = start_phase(Phase::Inventory, self.options.inventory);
        let (products, suppliers) = load_inventory_pools(store).await?;
        let (Some(products), Some(suppliers)) = (Pool::new(products), Pool::new(suppliers)) else {
            return Ok(block_phase(
                report,
                "no products or suppliers found; create them first",
            ));
        };

        let mut rng = phase_rng(self.seed, Phase::Inventory);
        for index in 0..self.options.inventory {
            let outcome = create_inventory(store, &mut rng, &products, &suppliers)
                .await
                .map(|_| RecordOutcome::Created);
            record(&mut report, index, outcome);
        }

        Ok(finish_phase(report))
    }

    pub async fn seed_sales<S: Store + ?Sized>(&self, store: &S) -> Result<PhaseReport, SeedError> {
        let mut report = start_phase(Phase::Sales, self.options.sales);
        let (products, employees) = load_sale_pools(store).await?;
        let (Some(products), Some(employees)) = (Pool::new(products), Pool::new(employees)) else {
            return Ok(block_phase(
                report,
                "no products or employees found; create them first",
            ));
        };

        let mut rng = phase_rng(self.seed, Phase::Sales);
        for index in 0..self.options.sales {
            let outcome = create_sale(store, &mut rng, &products, &employees).await;
            record(&mut report, index, outcome);
        }

        Ok(finish_phase(report))
    }

    async fn create_employee<S: Store + ?Sized>(
        &self,
        store: &S,
        rng: &mut ChaCha8Rng,
        retries: &mut u64,
    ) -> Result<Employee, SeedError> {
        let mut tx = store.begin().await?;
        let username = self.unused_username(&mut *tx, rng, retries).await?;
        let email = fakers::email(rng);
        let salt = fakers::password_salt(rng);
        let name = fakers::person_name(rng);
        let (first_name, last_name) = fakers::split_name(&name);

        let account = tx
            .insert_account(NewAccount {
                username,
                first_name,
                last_name,
                email,
                password_hash: hash_password(
                    &self.options.password,
                    &salt,
                    self.options.password_iterations,
                ),
            })
            .await?;
        let employee = tx
            .insert_employee(NewEmployee {
                account_id: account.id,
                name,
                position: fakers::job_title(rng),
                phone: fakers::phone(rng),
                email: account.email,
            })
            .await?;
        tx.commit().await?;
        Ok(employee)
    }

    async fn unused_username(
        &self,
        tx: &mut dyn StoreTx,
        rng: &mut ChaCha8Rng,
        retries: &mut u64,
    ) -> Result<String, SeedError> {
        let attempts = self.options.max_username_attempts;
        for _ in 0..attempts {
            let candidate = fakers::username(rng);
            if !tx.username_exists(&candidate).await? {
                return Ok(candidate);
            }
            *retries += 1;
        }
        Err(SeedError::UsernameExhausted { attempts })
    }
}

async fn create_category<S: Store + ?Sized>(
    store: &S,
    name: &str,
) -> Result<(Category, bool), SeedError> {
    let mut tx = store.begin().await?;
    let category = tx.get_or_create_category(name).await?;
    tx.commit().await?;
    Ok(category)
}

async fn create_supplier<S: Store + ?Sized>(
    store: &S,
    rng: &mut ChaCha8Rng,
) -> Result<Supplier, SeedError> {
    let name = fakers::company_name(rng);
    let supplier = NewSupplier {
        contact_person: fakers::person_name(rng),
        phone: fakers::phone(rng),
        email: fakers::company_email(&name, rng),
        address: fakers::address(rng),
        name,
    };

    let mut tx = store.begin().await?;
    let supplier = tx.insert_supplier(supplier).await?;
    tx.commit().await?;
    Ok(supplier)
}

async fn create_product<S: Store + ?Sized>(
    store: &S,
    rng: &mut ChaCha8Rng,
    categories: &Pool<Category>,
) -> Result<Product, SeedError> {
    let name = fakers::product_name(rng);
    let category = categories.pick(rng);
    let product = NewProduct {
        name,
        category_id: category.id,
        size: fakers::size(rng),
        color: fakers::color_name(rng),
        price: fakers::price(rng),
        stock_quantity: fakers::stock_quantity(rng),
    };

    let mut tx = store.begin().await?;
    let product = tx.insert_product(product).await?;
    tx.commit().await?;
    Ok(product)
}

async fn create_inventory<S: Store + ?Sized>(
    store: &S,
    rng: &mut ChaCha8Rng,
    products: &Pool<i64>,
    suppliers: &Pool<i64>,
) -> Result<(), SeedError> {
    let product_id = *products.pick(rng);
    let quantity = fakers::inventory_quantity(rng);
    let supplier_id = *suppliers.pick(rng);

    let mut tx = store.begin().await?;
    let product = locked_product(&mut *tx, product_id).await?;
    tx.insert_inventory(NewInventory {
        product_id: product.id,
        supplier_id,
        quantity,
        unit_price: product.price,
    })
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Sell a product and decrement its stock in one unit.
async fn create_sale<S: Store + ?Sized>(
    store: &S,
    rng: &mut ChaCha8Rng,
    products: &Pool<i64>,
    employees: &Pool<i64>,
) -> Result<RecordOutcome, SeedError> {
    let product_id = *products.pick(rng);

    let mut tx = store.begin().await?;
    let mut product = locked_product(&mut *tx, product_id).await?;
    let Some(quantity) = fakers::sale_quantity(product.stock_quantity, rng) else {
        tx.rollback().await?;
        return Ok(RecordOutcome::Skipped(format!(
            "product {} is out of stock",
            product.id
        )));
    };
    let employee_id = *employees.pick(rng);

    tx.insert_sale(NewSale {
        product_id: product.id,
        employee_id,
        quantity,
        price: product.price,
    })
    .await?;
    product.stock_quantity -= quantity;
    tx.save_product(&product).await?;
    tx.commit().await?;
    Ok(RecordOutcome::Created)
}

async fn locked_product(tx: &mut dyn StoreTx, id: i64) -> Result<Product, SeedError> {
    tx.find_product(id).await?.ok_or_else(|| {
        SeedError::Store(StoreError::NotFound {
            entity: EntityKind::Product,
            id,
        })
    })
}

async fn load_categories<S: Store + ?Sized>(store: &S) -> Result<Vec<Category>, SeedError> {
    let mut tx = store.begin().await?;
    let categories = tx.list_categories().await?;
    tx.commit().await?;
    Ok(categories)
}

async fn load_inventory_pools<S: Store + ?Sized>(
    store: &S,
) -> Result<(Vec<i64>, Vec<i64>), SeedError> {
    let mut tx = store.begin().await?;
    let products = tx.list_products().await?;
    let suppliers = tx.list_suppliers().await?;
    tx.commit().await?;
    Ok((
        products.iter().map(|product| product.id).collect(),
        suppliers.iter().map(|supplier| supplier.id).collect(),
    ))
}

async fn load_sale_pools<S: Store + ?Sized>(
    store: &S,
) -> Result<(Vec<i64>, Vec<i64>), SeedError> {
    let mut tx = store.begin().await?;
    let products = tx.list_products().await?;
    let employees = tx.list_employees().await?;
    tx.commit().await?;
    Ok((
        products.iter().map(|product| product.id).collect(),
        employees.iter().map(|employee| employee.id).collect(),
    ))
}

fn start_phase(phase: Phase, requested: u64) -> PhaseReport {
    info!(event = "phase_started", phase = %phase, requested, "creating {phase}");
    PhaseReport::new(phase, requested)
}

fn record<T>(report: &mut PhaseReport, index: u64, outcome: Result<RecordOutcome, T>)
where
    T: std::fmt::Display,
{
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(
                event = "record_failed",
                phase = %report.phase,
                index,
                error = %err,
                "error creating {} record",
                report.phase
            );
            RecordOutcome::Failed(err.to_string())
        }
    };
    report.record(index, outcome);
}

fn block_phase(mut report: PhaseReport, message: &str) -> PhaseReport {
    warn!(event = "phase_blocked", phase = %report.phase, "{message}");
    report.blocked = Some(message.to_string());
    report
}

fn finish_phase(report: PhaseReport) -> PhaseReport {
    info!(
        event = "phase_finished",
        phase = %report.phase,
        created = report.created,
        existing = report.existing,
        skipped = report.skipped,
        failed = report.failed,
        retries = report.retries,
        "finished {}",
        report.phase
    );
    report
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
