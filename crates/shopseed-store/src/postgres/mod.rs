use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use shopseed_core::{
    Account, Category, Employee, Inventory, NewAccount, NewEmployee, NewInventory, NewProduct,
    NewSale, NewSupplier, Product, Sale, Store, StoreResult, StoreTx, Supplier,
};

mod queries;

/// Store backed by the retail application's PostgreSQL schema.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PostgresStore {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await.map_err(queries::db_error)?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

/// Unit of work over a single database transaction. sqlx rolls the
/// transaction back when it is dropped uncommitted.
struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn username_exists(&mut self, username: &str) -> StoreResult<bool> {
        queries::username_exists(&mut self.tx, username).await
    }

    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        queries::insert_account(&mut self.tx, account).await
    }

    async fn insert_employee(&mut self, employee: NewEmployee) -> StoreResult<Employee> {
        queries::insert_employee(&mut self.tx, employee).await
    }

    async fn get_or_create_category(&mut self, name: &str) -> StoreResult<(Category, bool)> {
        queries::get_or_create_category(&mut self.tx, name).await
    }

    async fn insert_supplier(&mut self, supplier: NewSupplier) -> StoreResult<Supplier> {
        queries::insert_supplier(&mut self.tx, supplier).await
    }

    async fn insert_product(&mut self, product: NewProduct) -> StoreResult<Product> {
        queries::insert_product(&mut self.tx, product).await
    }

    async fn insert_inventory(&mut self, inventory: NewInventory) -> StoreResult<Inventory> {
        queries::insert_inventory(&mut self.tx, inventory).await
    }

    async fn insert_sale(&mut self, sale: NewSale) -> StoreResult<Sale> {
        queries::insert_sale(&mut self.tx, sale).await
    }

    async fn find_product(&mut self, id: i64) -> StoreResult<Option<Product>> {
        queries::find_product_for_update(&mut self.tx, id).await
    }

    async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
        queries::update_product(&mut self.tx, product).await
    }

    async fn list_categories(&mut self) -> StoreResult<Vec<Category>> {
        queries::list_categories(&mut self.tx).await
    }

    async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
        queries::list_products(&mut self.tx).await
    }

    async fn list_suppliers(&mut self) -> StoreResult<Vec<Supplier>> {
        queries::list_suppliers(&mut self.tx).await
    }

    async fn list_employees(&mut self) -> StoreResult<Vec<Employee>> {
        queries::list_employees(&mut self.tx).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(queries::db_error)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await.map_err(queries::db_error)
    }
}
