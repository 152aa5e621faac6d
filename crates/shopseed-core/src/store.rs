use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{
    Account, Category, Employee, Inventory, NewAccount, NewEmployee, NewInventory, NewProduct,
    NewSale, NewSupplier, Product, Sale, Supplier,
};

/// Persistence backend the seeder writes through.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Open a unit of work. Writes become visible only after
    /// [`StoreTx::commit`]; a unit dropped without committing is rolled back.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// A scoped, all-or-nothing unit of work.
#[async_trait]
pub trait StoreTx: Send {
    async fn username_exists(&mut self, username: &str) -> StoreResult<bool>;

    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account>;

    async fn insert_employee(&mut self, employee: NewEmployee) -> StoreResult<Employee>;

    /// Returns the category with `name`, creating it when absent. The flag
    /// is `true` when the row was created by this call.
    async fn get_or_create_category(&mut self, name: &str) -> StoreResult<(Category, bool)>;

    async fn insert_supplier(&mut self, supplier: NewSupplier) -> StoreResult<Supplier>;

    async fn insert_product(&mut self, product: NewProduct) -> StoreResult<Product>;

    async fn insert_inventory(&mut self, inventory: NewInventory) -> StoreResult<Inventory>;

    async fn insert_sale(&mut self, sale: NewSale) -> StoreResult<Sale>;

    /// Fetch a product, locking the row for the rest of the unit where the
    /// backend supports row locks.
    async fn find_product(&mut self, id: i64) -> StoreResult<Option<Product>>;

    /// Persist every mutable field of an existing product.
    async fn save_product(&mut self, product: &Product) -> StoreResult<()>;

    async fn list_categories(&mut self) -> StoreResult<Vec<Category>>;

    async fn list_products(&mut self) -> StoreResult<Vec<Product>>;

    async fn list_suppliers(&mut self) -> StoreResult<Vec<Supplier>>;

    async fn list_employees(&mut self) -> StoreResult<Vec<Employee>>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
