use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use shopseed_core::{
    Account, Category, Employee, EntityKind, Inventory, NewAccount, NewEmployee, NewInventory,
    NewProduct, NewSale, NewSupplier, Product, Sale, Store, StoreError, StoreResult, StoreTx,
    Supplier,
};

/// Committed contents of an [`InMemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub accounts: Vec<Account>,
    pub employees: Vec<Employee>,
    pub categories: Vec<Category>,
    pub suppliers: Vec<Supplier>,
    pub products: Vec<Product>,
    pub inventory: Vec<Inventory>,
    pub sales: Vec<Sale>,
    sequences: BTreeMap<EntityKind, i64>,
}

impl Tables {
    pub fn product(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    fn next_id(&mut self, kind: EntityKind) -> i64 {
        let next = self.sequences.entry(kind).or_insert(0);
        *next += 1;
        *next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Op {
    Insert,
    List,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Insert => "insert",
            Op::List => "list",
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    attempts: BTreeMap<(Op, EntityKind), u64>,
    fail_at: BTreeMap<(Op, EntityKind), BTreeSet<u64>>,
}

impl Faults {
    fn arm(&mut self, op: Op, kind: EntityKind, nth: u64) {
        self.fail_at.entry((op, kind)).or_default().insert(nth);
    }

    fn check(&mut self, op: Op, kind: EntityKind) -> StoreResult<()> {
        let attempt = self.attempts.entry((op, kind)).or_insert(0);
        *attempt += 1;
        let attempt = *attempt;
        let hit = self
            .fail_at
            .get(&(op, kind))
            .is_some_and(|attempts| attempts.contains(&attempt));
        if hit {
            return Err(StoreError::Db(format!(
                "injected failure on {kind} {} #{attempt}",
                op.as_str()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Shared {
    tables: Tables,
    faults: Faults,
}

/// Process-local store used by tests and dry runs.
///
/// A unit of work holds the store lock for its whole lifetime and writes to
/// a staged copy of the tables that replaces the committed copy on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    shared: Arc<Mutex<Shared>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the committed tables.
    pub async fn snapshot(&self) -> Tables {
        self.shared.lock().await.tables.clone()
    }

    /// Make the `nth` (1-based) insert attempt of `kind` fail.
    ///
    /// Attempts are counted across units, including rolled-back ones.
    pub async fn fail_insert(&self, kind: EntityKind, nth: u64) {
        self.shared.lock().await.faults.arm(Op::Insert, kind, nth);
    }

    /// Make the `nth` (1-based) listing of `kind` fail.
    pub async fn fail_list(&self, kind: EntityKind, nth: u64) {
        self.shared.lock().await.faults.arm(Op::List, kind, nth);
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let shared = Arc::clone(&self.shared).lock_owned().await;
        let staged = shared.tables.clone();
        Ok(Box::new(MemoryTx { shared, staged }))
    }
}

struct MemoryTx {
    shared: OwnedMutexGuard<Shared>,
    staged: Tables,
}

impl MemoryTx {
    fn require(&self, entity: EntityKind, target: EntityKind, id: i64) -> StoreResult<()> {
        let exists = match target {
            EntityKind::Account => self.staged.accounts.iter().any(|row| row.id == id),
            EntityKind::Employee => self.staged.employees.iter().any(|row| row.id == id),
            EntityKind::Category => self.staged.categories.iter().any(|row| row.id == id),
            EntityKind::Supplier => self.staged.suppliers.iter().any(|row| row.id == id),
            EntityKind::Product => self.staged.products.iter().any(|row| row.id == id),
            EntityKind::Inventory => self.staged.inventory.iter().any(|row| row.id == id),
            EntityKind::Sale => self.staged.sales.iter().any(|row| row.id == id),
        };
        if exists {
            Ok(())
        } else {
            Err(StoreError::ForeignKey { entity, target, id })
        }
    }
}

fn check_positive(entity: EntityKind, field: &str, value: i32) -> StoreResult<()> {
    if value < 1 {
        return Err(StoreError::CheckViolation {
            entity,
            message: format!("{field} must be at least 1, got {value}"),
        });
    }
    Ok(())
}

fn check_stock(stock_quantity: i32) -> StoreResult<()> {
    if stock_quantity < 0 {
        return Err(StoreError::CheckViolation {
            entity: EntityKind::Product,
            message: format!("stock_quantity must not be negative, got {stock_quantity}"),
        });
    }
    Ok(())
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn username_exists(&mut self, username: &str) -> StoreResult<bool> {
        Ok(self
            .staged
            .accounts
            .iter()
            .any(|account| account.username == username))
    }

    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        self.shared.faults.check(Op::Insert, EntityKind::Account)?;
        if self.username_exists(&account.username).await? {
            return Err(StoreError::UniqueViolation {
                entity: EntityKind::Account,
                field: "username",
                value: account.username,
            });
        }
        let row = Account {
            id: self.staged.next_id(EntityKind::Account),
            username: account.username,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            password_hash: account.password_hash,
            date_joined: Utc::now(),
        };
        self.staged.accounts.push(row.clone());
        Ok(row)
    }

    async fn insert_employee(&mut self, employee: NewEmployee) -> StoreResult<Employee> {
        self.shared.faults.check(Op::Insert, EntityKind::Employee)?;
        self.require(EntityKind::Employee, EntityKind::Account, employee.account_id)?;
        let taken = self
            .staged
            .employees
            .iter()
            .any(|row| row.account_id == employee.account_id);
        if taken {
            return Err(StoreError::UniqueViolation {
                entity: EntityKind::Employee,
                field: "account_id",
                value: employee.account_id.to_string(),
            });
        }
        let row = Employee {
            id: self.staged.next_id(EntityKind::Employee),
            account_id: employee.account_id,
            name: employee.name,
            position: employee.position,
            phone: employee.phone,
            email: employee.email,
        };
        self.staged.employees.push(row.clone());
        Ok(row)
    }

    async fn get_or_create_category(&mut self, name: &str) -> StoreResult<(Category, bool)> {
        if let Some(existing) = self.staged.categories.iter().find(|row| row.name == name) {
            return Ok((existing.clone(), false));
        }
        self.shared.faults.check(Op::Insert, EntityKind::Category)?;
        let row = Category {
            id: self.staged.next_id(EntityKind::Category),
            name: name.to_string(),
        };
        self.staged.categories.push(row.clone());
        Ok((row, true))
    }

    async fn insert_supplier(&mut self, supplier: NewSupplier) -> StoreResult<Supplier> {
        self.shared.faults.check(Op::Insert, EntityKind::Supplier)?;
        let row = Supplier {
            id: self.staged.next_id(EntityKind::Supplier),
            name: supplier.name,
            contact_person: supplier.contact_person,
            phone: supplier.phone,
            email: supplier.email,
            address: supplier.address,
        };
        self.staged.suppliers.push(row.clone());
        Ok(row)
    }

    async fn insert_product(&mut self, product: NewProduct) -> StoreResult<Product> {
        self.shared.faults.check(Op::Insert, EntityKind::Product)?;
        self.require(EntityKind::Product, EntityKind::Category, product.category_id)?;
        check_stock(product.stock_quantity)?;
        let row = Product {
            id: self.staged.next_id(EntityKind::Product),
            name: product.name,
            category_id: product.category_id,
            size: product.size,
            color: product.color,
            price: product.price,
            stock_quantity: product.stock_quantity,
        };
        self.staged.products.push(row.clone());
        Ok(row)
    }

    async fn insert_inventory(&mut self, inventory: NewInventory) -> StoreResult<Inventory> {
        self.shared.faults.check(Op::Insert, EntityKind::Inventory)?;
        self.require(EntityKind::Inventory, EntityKind::Product, inventory.product_id)?;
        self.require(EntityKind::Inventory, EntityKind::Supplier, inventory.supplier_id)?;
        check_positive(EntityKind::Inventory, "quantity", inventory.quantity)?;
        let row = Inventory {
            id: self.staged.next_id(EntityKind::Inventory),
            product_id: inventory.product_id,
            supplier_id: inventory.supplier_id,
            quantity: inventory.quantity,
            unit_price: inventory.unit_price,
        };
        self.staged.inventory.push(row.clone());
        Ok(row)
    }

    async fn insert_sale(&mut self, sale: NewSale) -> StoreResult<Sale> {
        self.shared.faults.check(Op::Insert, EntityKind::Sale)?;
        self.require(EntityKind::Sale, EntityKind::Product, sale.product_id)?;
        self.require(EntityKind::Sale, EntityKind::Employee, sale.employee_id)?;
        check_positive(EntityKind::Sale, "quantity", sale.quantity)?;
        let row = Sale {
            id: self.staged.next_id(EntityKind::Sale),
            product_id: sale.product_id,
            employee_id: sale.employee_id,
            quantity: sale.quantity,
            price: sale.price,
            sold_at: Utc::now(),
        };
        self.staged.sales.push(row.clone());
        Ok(row)
    }

    async fn find_product(&mut self, id: i64) -> StoreResult<Option<Product>> {
        Ok(self.staged.product(id).cloned())
    }

    async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
        check_stock(product.stock_quantity)?;
        self.require(EntityKind::Product, EntityKind::Category, product.category_id)?;
        let slot = self
            .staged
            .products
            .iter_mut()
            .find(|row| row.id == product.id)
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Product,
                id: product.id,
            })?;
        *slot = product.clone();
        Ok(())
    }

    async fn list_categories(&mut self) -> StoreResult<Vec<Category>> {
        self.shared.faults.check(Op::List, EntityKind::Category)?;
        Ok(self.staged.categories.clone())
    }

    async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
        self.shared.faults.check(Op::List, EntityKind::Product)?;
        Ok(self.staged.products.clone())
    }

    async fn list_suppliers(&mut self) -> StoreResult<Vec<Supplier>> {
        self.shared.faults.check(Op::List, EntityKind::Supplier)?;
        Ok(self.staged.suppliers.clone())
    }

    async fn list_employees(&mut self) -> StoreResult<Vec<Employee>> {
        self.shared.faults.check(Op::List, EntityKind::Employee)?;
        Ok(self.staged.employees.clone())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut shared, staged } = *self;
        shared.tables = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
