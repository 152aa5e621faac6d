use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};

use shopseed_core::{
    Account, Category, Employee, EntityKind, Inventory, NewAccount, NewEmployee, NewInventory,
    NewProduct, NewSale, NewSupplier, Product, Sale, Size, StoreError, StoreResult, Supplier,
};

const UNIQUE_VIOLATION: &str = "23505";

pub fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Db(err.to_string())
}

fn unique_error(
    entity: EntityKind,
    field: &'static str,
    value: String,
) -> impl Fn(sqlx::Error) -> StoreError {
    move |err| {
        let duplicate = matches!(
            &err,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
        );
        if duplicate {
            StoreError::UniqueViolation {
                entity,
                field,
                value: value.clone(),
            }
        } else {
            db_error(err)
        }
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    date_joined: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password,
            date_joined: row.date_joined,
        }
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: i64,
    user_id: i64,
    name: String,
    position: String,
    phone: String,
    email: String,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: row.id,
            account_id: row.user_id,
            name: row.name,
            position: row.position,
            phone: row.phone,
            email: row.email,
        }
    }
}

#[derive(FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(FromRow)]
struct SupplierRow {
    id: i64,
    name: String,
    contact_person: String,
    phone: String,
    email: String,
    address: String,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            contact_person: row.contact_person,
            phone: row.phone,
            email: row.email,
            address: row.address,
        }
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    category_id: i64,
    size: String,
    color: String,
    price: Decimal,
    stock_quantity: i32,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> StoreResult<Self> {
        let size = row.size.parse::<Size>().map_err(|message| StoreError::CheckViolation {
            entity: EntityKind::Product,
            message,
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            size,
            color: row.color,
            price: row.price,
            stock_quantity: row.stock_quantity,
        })
    }
}

#[derive(FromRow)]
struct InventoryRow {
    id: i64,
    product_id: i64,
    supplier_id: i64,
    quantity: i32,
    unit_price: Decimal,
}

impl From<InventoryRow> for Inventory {
    fn from(row: InventoryRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            supplier_id: row.supplier_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[derive(FromRow)]
struct SaleRow {
    id: i64,
    product_id: i64,
    employee_id: i64,
    quantity: i32,
    price: Decimal,
    sold_at: DateTime<Utc>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            employee_id: row.employee_id,
            quantity: row.quantity,
            price: row.price,
            sold_at: row.sold_at,
        }
    }
}

pub async fn username_exists(conn: &mut PgConnection, username: &str) -> StoreResult<bool> {
    sqlx::query_scalar::<_, bool>("select exists(select 1 from auth_user where username = $1)")
        .bind(username)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error)
}

pub async fn insert_account(conn: &mut PgConnection, account: NewAccount) -> StoreResult<Account> {
    let row = sqlx::query_as::<_, AccountRow>(
        r#"
        insert into auth_user (
          password, is_superuser, username, first_name, last_name,
          email, is_staff, is_active, date_joined
        )
        values ($1, false, $2, $3, $4, $5, false, true, now())
        returning id::bigint as id, username, first_name, last_name,
          email, password, date_joined
        "#,
    )
    .bind(&account.password_hash)
    .bind(&account.username)
    .bind(&account.first_name)
    .bind(&account.last_name)
    .bind(&account.email)
    .fetch_one(&mut *conn)
    .await
    .map_err(unique_error(
        EntityKind::Account,
        "username",
        account.username.clone(),
    ))?;
    Ok(row.into())
}

pub async fn insert_employee(
    conn: &mut PgConnection,
    employee: NewEmployee,
) -> StoreResult<Employee> {
    let row = sqlx::query_as::<_, EmployeeRow>(
        r#"
        insert into main_employee (user_id, name, position, phone, email)
        values ($1, $2, $3, $4, $5)
        returning id::bigint as id, user_id::bigint as user_id, name, position, phone, email
        "#,
    )
    .bind(employee.account_id)
    .bind(&employee.name)
    .bind(&employee.position)
    .bind(&employee.phone)
    .bind(&employee.email)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;
    Ok(row.into())
}

pub async fn get_or_create_category(
    conn: &mut PgConnection,
    name: &str,
) -> StoreResult<(Category, bool)> {
    let created = sqlx::query_as::<_, CategoryRow>(
        r#"
        insert into main_category (name)
        values ($1)
        on conflict (name) do nothing
        returning id::bigint as id, name
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;

    if let Some(row) = created {
        return Ok((row.into(), true));
    }

    let existing = sqlx::query_as::<_, CategoryRow>(
        "select id::bigint as id, name from main_category where name = $1",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;
    Ok((existing.into(), false))
}

pub async fn insert_supplier(
    conn: &mut PgConnection,
    supplier: NewSupplier,
) -> StoreResult<Supplier> {
    let row = sqlx::query_as::<_, SupplierRow>(
        r#"
        insert into main_supplier (name, contact_person, phone, email, address)
        values ($1, $2, $3, $4, $5)
        returning id::bigint as id, name, contact_person, phone, email, address
        "#,
    )
    .bind(&supplier.name)
    .bind(&supplier.contact_person)
    .bind(&supplier.phone)
    .bind(&supplier.email)
    .bind(&supplier.address)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;
    Ok(row.into())
}

pub async fn insert_product(conn: &mut PgConnection, product: NewProduct) -> StoreResult<Product> {
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        insert into main_product (name, category_id, size, color, price, stock_quantity)
        values ($1, $2, $3, $4, $5, $6)
        returning id::bigint as id, name, category_id::bigint as category_id,
          size, color, price, stock_quantity
        "#,
    )
    .bind(&product.name)
    .bind(product.category_id)
    .bind(product.size.as_str())
    .bind(&product.color)
    .bind(product.price)
    .bind(product.stock_quantity)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;
    row.try_into()
}

pub async fn insert_inventory(
    conn: &mut PgConnection,
    inventory: NewInventory,
) -> StoreResult<Inventory> {
    let row = sqlx::query_as::<_, InventoryRow>(
        r#"
        insert into main_inventory (product_id, supplier_id, quantity, unit_price)
        values ($1, $2, $3, $4)
        returning id::bigint as id, product_id::bigint as product_id,
          supplier_id::bigint as supplier_id, quantity, unit_price
        "#,
    )
    .bind(inventory.product_id)
    .bind(inventory.supplier_id)
    .bind(inventory.quantity)
    .bind(inventory.unit_price)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;
    Ok(row.into())
}

pub async fn insert_sale(conn: &mut PgConnection, sale: NewSale) -> StoreResult<Sale> {
    let row = sqlx::query_as::<_, SaleRow>(
        r#"
        insert into main_sale (product_id, employee_id, quantity, price)
        values ($1, $2, $3, $4)
        returning id::bigint as id, product_id::bigint as product_id,
          employee_id::bigint as employee_id, quantity, price, sold_at
        "#,
    )
    .bind(sale.product_id)
    .bind(sale.employee_id)
    .bind(sale.quantity)
    .bind(sale.price)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;
    Ok(row.into())
}

pub async fn find_product_for_update(
    conn: &mut PgConnection,
    id: i64,
) -> StoreResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        select id::bigint as id, name, category_id::bigint as category_id,
          size, color, price, stock_quantity
        from main_product
        where id = $1
        for update
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;
    row.map(Product::try_from).transpose()
}

pub async fn update_product(conn: &mut PgConnection, product: &Product) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        update main_product
        set name = $2, category_id = $3, size = $4, color = $5, price = $6, stock_quantity = $7
        where id = $1
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(product.category_id)
    .bind(product.size.as_str())
    .bind(&product.color)
    .bind(product.price)
    .bind(product.stock_quantity)
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: EntityKind::Product,
            id: product.id,
        });
    }
    Ok(())
}

pub async fn list_categories(conn: &mut PgConnection) -> StoreResult<Vec<Category>> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "select id::bigint as id, name from main_category order by id",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;
    Ok(rows.into_iter().map(Category::from).collect())
}

pub async fn list_products(conn: &mut PgConnection) -> StoreResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(
        r#"
        select id::bigint as id, name, category_id::bigint as category_id,
          size, color, price, stock_quantity
        from main_product
        order by id
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;
    rows.into_iter().map(Product::try_from).collect()
}

pub async fn list_suppliers(conn: &mut PgConnection) -> StoreResult<Vec<Supplier>> {
    let rows = sqlx::query_as::<_, SupplierRow>(
        r#"
        select id::bigint as id, name, contact_person, phone, email, address
        from main_supplier
        order by id
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;
    Ok(rows.into_iter().map(Supplier::from).collect())
}

pub async fn list_employees(conn: &mut PgConnection) -> StoreResult<Vec<Employee>> {
    let rows = sqlx::query_as::<_, EmployeeRow>(
        r#"
        select id::bigint as id, user_id::bigint as user_id, name, position, phone, email
        from main_employee
        order by id
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;
    Ok(rows.into_iter().map(Employee::from).collect())
}
