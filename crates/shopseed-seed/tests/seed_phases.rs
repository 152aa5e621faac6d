use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;

use shopseed_core::{CATEGORY_NAMES, EntityKind, NewAccount, NewEmployee, NewProduct, Size, Store};
use shopseed_seed::fakers::{MAX_PRICE_CENTS, MIN_PRICE_CENTS};
use shopseed_seed::{Phase, SeedError, SeedOptions, Seeder, fakers, phase_rng};
use shopseed_store::InMemoryStore;

fn seeded(seed: u64) -> SeedOptions {
    SeedOptions {
        seed: Some(seed),
        password_iterations: 1_000,
        ..SeedOptions::default()
    }
}

fn small(seed: u64) -> SeedOptions {
    SeedOptions {
        employees: 5,
        suppliers: 5,
        products: 20,
        inventory: 20,
        sales: 100,
        ..seeded(seed)
    }
}

/// One category, one product with `stock` units and one employee.
async fn single_product_store(stock: i32) -> (InMemoryStore, i64) {
    let store = InMemoryStore::new();
    let mut tx = store.begin().await.expect("begin");
    let (category, _) = tx.get_or_create_category("Men").await.expect("category");
    let product = tx
        .insert_product(NewProduct {
            name: "Jacket Navy".to_string(),
            category_id: category.id,
            size: Size::L,
            color: "Navy".to_string(),
            price: Decimal::new(5990, 2),
            stock_quantity: stock,
        })
        .await
        .expect("product");
    let account = tx
        .insert_account(NewAccount {
            username: "cashier".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Lima".to_string(),
            email: "cashier@example.com".to_string(),
            password_hash: "pbkdf2_sha256$1000$seasalt$digest".to_string(),
        })
        .await
        .expect("account");
    tx.insert_employee(NewEmployee {
        account_id: account.id,
        name: "Ana Lima".to_string(),
        position: "Cashier".to_string(),
        phone: "555-0100".to_string(),
        email: account.email,
    })
    .await
    .expect("employee");
    tx.commit().await.expect("commit");
    (store, product.id)
}

#[tokio::test]
async fn full_run_produces_referentially_valid_rows() {
    let store = InMemoryStore::new();
    let report = Seeder::new(seeded(7)).run(&store).await.expect("run");
    let tables = store.snapshot().await;

    assert_eq!(report.phases.len(), Phase::ALL.len());
    assert!(report.phases.iter().all(|phase| !phase.is_blocked()));
    assert_eq!(report.total_failed(), 0);

    let usernames: HashSet<&str> = tables
        .accounts
        .iter()
        .map(|account| account.username.as_str())
        .collect();
    assert_eq!(tables.accounts.len(), 50);
    assert_eq!(usernames.len(), 50);
    assert_eq!(tables.employees.len(), 50);
    for employee in &tables.employees {
        let account = tables
            .accounts
            .iter()
            .find(|account| account.id == employee.account_id)
            .expect("linked account");
        assert_eq!(account.email, employee.email);
        assert!(account.password_hash.starts_with("pbkdf2_sha256$1000$"));
        assert_eq!(
            format!("{} {}", account.first_name, account.last_name),
            employee.name
        );
    }

    let mut names: Vec<&str> = tables.categories.iter().map(|c| c.name.as_str()).collect();
    names.sort_unstable();
    let mut expected = CATEGORY_NAMES.to_vec();
    expected.sort_unstable();
    assert_eq!(names, expected);

    assert_eq!(tables.suppliers.len(), 50);
    assert_eq!(tables.products.len(), 200);
    let min = Decimal::new(MIN_PRICE_CENTS, 2);
    let max = Decimal::new(MAX_PRICE_CENTS, 2);
    for product in &tables.products {
        assert!(product.price >= min && product.price <= max);
        assert!((0..=100).contains(&product.stock_quantity));
        assert!(Size::ALL.contains(&product.size));
    }

    assert_eq!(tables.inventory.len(), 200);
    for row in &tables.inventory {
        let product = tables.product(row.product_id).expect("product");
        assert_eq!(row.unit_price, product.price);
        assert!((1..=50).contains(&row.quantity));
    }

    let sales = report.phase(Phase::Sales).expect("sales report");
    assert_eq!(sales.created + sales.skipped, 1000);
    assert_eq!(tables.sales.len() as u64, sales.created);
    for sale in &tables.sales {
        let product = tables.product(sale.product_id).expect("product");
        assert!((1..=2).contains(&sale.quantity));
        assert_eq!(sale.price, product.price);
    }
}

#[tokio::test]
async fn sales_decrement_stock_by_quantity_sold() {
    let store = InMemoryStore::new();
    let seeder = Seeder::new(seeded(13));
    for phase in [
        Phase::Employees,
        Phase::Categories,
        Phase::Suppliers,
        Phase::Products,
    ] {
        seeder.run_phase(&store, phase).await.expect("phase");
    }
    let before: BTreeMap<i64, i32> = store
        .snapshot()
        .await
        .products
        .iter()
        .map(|product| (product.id, product.stock_quantity))
        .collect();

    seeder.seed_inventory(&store).await.expect("inventory");
    seeder.seed_sales(&store).await.expect("sales");
    let tables = store.snapshot().await;

    let mut sold: BTreeMap<i64, i32> = BTreeMap::new();
    for sale in &tables.sales {
        *sold.entry(sale.product_id).or_insert(0) += sale.quantity;
    }
    for product in &tables.products {
        let initial = before[&product.id];
        let units = sold.get(&product.id).copied().unwrap_or(0);
        assert!(product.stock_quantity >= 0);
        assert_eq!(product.stock_quantity, initial - units);
    }
}

#[tokio::test]
async fn repeated_category_phase_is_idempotent() {
    let store = InMemoryStore::new();
    let seeder = Seeder::new(seeded(1));

    let first = seeder.seed_categories(&store).await.expect("first");
    let second = seeder.seed_categories(&store).await.expect("second");

    assert_eq!(first.created, 5);
    assert_eq!(second.created, 0);
    assert_eq!(second.existing, 5);
    assert_eq!(store.snapshot().await.categories.len(), 5);
}

#[tokio::test]
async fn product_phase_without_categories_is_blocked() {
    let store = InMemoryStore::new();
    let report = Seeder::new(seeded(2))
        .seed_products(&store)
        .await
        .expect("blocked phase is not an error");

    assert!(report.is_blocked());
    assert_eq!(report.created, 0);
    assert!(store.snapshot().await.products.is_empty());
}

#[tokio::test]
async fn dependent_phases_block_without_their_pools() {
    let store = InMemoryStore::new();
    let seeder = Seeder::new(small(3));
    seeder.seed_categories(&store).await.expect("categories");
    seeder.seed_products(&store).await.expect("products");

    let inventory = seeder.seed_inventory(&store).await.expect("inventory");
    let sales = seeder.seed_sales(&store).await.expect("sales");

    assert!(inventory.is_blocked());
    assert!(sales.is_blocked());
    let tables = store.snapshot().await;
    assert!(tables.inventory.is_empty());
    assert!(tables.sales.is_empty());
}

#[tokio::test]
async fn out_of_stock_products_are_skipped() {
    let (store, product_id) = single_product_store(0).await;
    let seeder = Seeder::new(SeedOptions {
        sales: 10,
        ..seeded(4)
    });

    let report = seeder.seed_sales(&store).await.expect("sales");

    assert_eq!(report.skipped, 10);
    assert_eq!(report.created, 0);
    assert_eq!(report.failed, 0);
    let tables = store.snapshot().await;
    assert!(tables.sales.is_empty());
    assert_eq!(tables.product(product_id).map(|p| p.stock_quantity), Some(0));
}

#[tokio::test]
async fn stock_never_goes_negative_on_a_single_product() {
    let (store, product_id) = single_product_store(5).await;
    let seeder = Seeder::new(SeedOptions {
        sales: 50,
        ..seeded(5)
    });

    let report = seeder.seed_sales(&store).await.expect("sales");
    let tables = store.snapshot().await;

    let sold: i32 = tables.sales.iter().map(|sale| sale.quantity).sum();
    assert_eq!(sold, 5);
    assert_eq!(tables.product(product_id).map(|p| p.stock_quantity), Some(0));
    assert_eq!(report.created + report.skipped, 50);
    assert!(report.skipped > 0);
}

#[tokio::test]
async fn username_retry_converges_past_taken_names() {
    let seed = 6;
    let store = InMemoryStore::new();

    let mut rng = phase_rng(seed, Phase::Employees);
    let taken: HashSet<String> = (0..49).map(|_| fakers::username(&mut rng)).collect();
    let mut tx = store.begin().await.expect("begin");
    for username in &taken {
        tx.insert_account(NewAccount {
            username: username.clone(),
            first_name: "Taken".to_string(),
            last_name: "User".to_string(),
            email: format!("{username}@example.com"),
            password_hash: "pbkdf2_sha256$1000$seasalt$digest".to_string(),
        })
        .await
        .expect("prior account");
    }
    tx.commit().await.expect("commit");

    let report = Seeder::new(seeded(seed))
        .seed_employees(&store)
        .await
        .expect("employees");
    let tables = store.snapshot().await;

    assert_eq!(report.created, 50);
    assert_eq!(report.failed, 0);
    assert!(report.retries >= 49, "retries = {}", report.retries);
    assert_eq!(tables.employees.len(), 50);
    let usernames: HashSet<&str> = tables
        .accounts
        .iter()
        .map(|account| account.username.as_str())
        .collect();
    assert_eq!(usernames.len(), tables.accounts.len());
    assert_eq!(tables.accounts.len(), taken.len() + 50);
}

#[tokio::test]
async fn failed_employee_insert_leaves_no_orphan_account() {
    let store = InMemoryStore::new();
    store.fail_insert(EntityKind::Employee, 3).await;

    let report = Seeder::new(SeedOptions {
        employees: 10,
        ..seeded(8)
    })
    .seed_employees(&store)
    .await
    .expect("employees");
    let tables = store.snapshot().await;

    assert_eq!(report.created, 9);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].index, 2);
    assert_eq!(tables.accounts.len(), 9);
    assert_eq!(tables.employees.len(), 9);
}

#[tokio::test]
async fn failed_sale_insert_keeps_stock_unchanged() {
    let (store, product_id) = single_product_store(50).await;
    store.fail_insert(EntityKind::Sale, 1).await;

    let report = Seeder::new(SeedOptions {
        sales: 5,
        ..seeded(9)
    })
    .seed_sales(&store)
    .await
    .expect("sales");
    let tables = store.snapshot().await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.created, 4);
    let sold: i32 = tables.sales.iter().map(|sale| sale.quantity).sum();
    assert_eq!(
        tables.product(product_id).map(|p| p.stock_quantity),
        Some(50 - sold)
    );
}

#[tokio::test]
async fn pool_load_failure_aborts_run_before_dependent_phases() {
    let store = InMemoryStore::new();
    store.fail_list(EntityKind::Category, 1).await;

    let result = Seeder::new(small(11)).run(&store).await;
    let tables = store.snapshot().await;

    assert!(matches!(result, Err(SeedError::Store(_))));
    assert_eq!(tables.employees.len(), 5);
    assert_eq!(tables.categories.len(), CATEGORY_NAMES.len());
    assert_eq!(tables.suppliers.len(), 5);
    assert!(tables.products.is_empty());
    assert!(tables.inventory.is_empty());
    assert!(tables.sales.is_empty());
}

#[tokio::test]
async fn same_seed_generates_same_rows() {
    let left = InMemoryStore::new();
    let right = InMemoryStore::new();
    Seeder::new(small(10)).run(&left).await.expect("left");
    Seeder::new(small(10)).run(&right).await.expect("right");

    let left = left.snapshot().await;
    let right = right.snapshot().await;
    let usernames = |tables: &shopseed_store::Tables| -> Vec<String> {
        tables.accounts.iter().map(|a| a.username.clone()).collect()
    };
    assert_eq!(usernames(&left), usernames(&right));
    assert_eq!(left.products, right.products);
    assert_eq!(left.suppliers, right.suppliers);
    assert_eq!(left.inventory, right.inventory);
}
