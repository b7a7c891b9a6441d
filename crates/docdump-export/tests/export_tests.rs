//! End-to-end export tests against SQLite fixture databases

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use docdump_core::{
    Connection, ConnectionConfig, DocdumpError, QueryResult, SchemaIntrospection,
    StatementResult, Value,
};
use docdump_drivers::sqlite::{SqliteConnection, SqliteDriver};
use docdump_export::{
    DocValue, DocumentWriter, ExportError, ExportOptions, ExportOrchestrator, ExportPhase,
    ExportRequest, SkipKind, discovery, run, table_exporter,
};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const PRODUCT_PRICES: [f64; 12] = [
    699.99, 1299.99, 199.99, 89.99, 24.99, 149.99, 39.99, 49.99, 29.99, 79.99, 129.99, 34.99,
];

/// Build the example store catalog: customers (8), categories (6),
/// products (12), orders (50). Content is fixed so runs are comparable.
async fn create_catalog_db(path: &Path) {
    let conn = SqliteConnection::open(path.to_str().unwrap()).expect("Failed to create database");

    conn.execute_batch(
        r#"
        CREATE TABLE customers (
            customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            city TEXT,
            registration_date DATE,
            is_active BOOLEAN DEFAULT 1
        );
        CREATE TABLE categories (
            category_id INTEGER PRIMARY KEY AUTOINCREMENT,
            category_name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_date DATE,
            is_active BOOLEAN DEFAULT 1
        );
        CREATE TABLE products (
            product_id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_name TEXT NOT NULL,
            category_id INTEGER,
            price DECIMAL(10,2) NOT NULL,
            stock_quantity INTEGER DEFAULT 0,
            created_date DATE,
            is_active BOOLEAN DEFAULT 1,
            FOREIGN KEY (category_id) REFERENCES categories(category_id)
        );
        CREATE TABLE orders (
            order_id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            product_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price DECIMAL(10,2) NOT NULL,
            total_amount DECIMAL(10,2) NOT NULL,
            order_date DATETIME,
            status TEXT DEFAULT 'pending',
            FOREIGN KEY (customer_id) REFERENCES customers(customer_id),
            FOREIGN KEY (product_id) REFERENCES products(product_id)
        );
        CREATE VIEW big_orders AS SELECT * FROM orders WHERE total_amount > 1000;

        INSERT INTO customers (first_name, last_name, email, city, registration_date, is_active) VALUES
            ('John', 'Doe', 'john.doe@email.com', 'New York', '2023-01-15', 1),
            ('Jane', 'Smith', 'jane.smith@email.com', 'Los Angeles', '2023-02-20', 1),
            ('Bob', 'Johnson', 'bob.johnson@email.com', 'Chicago', '2023-03-10', 1),
            ('Alice', 'Williams', 'alice.williams@email.com', 'Houston', '2023-04-05', 1),
            ('Charlie', 'Brown', 'charlie.brown@email.com', 'Phoenix', '2023-05-12', 1),
            ('Diana', 'Davis', 'diana.davis@email.com', 'Philadelphia', '2023-06-18', 0),
            ('Eva', 'Müller', 'eva.mueller@email.com', 'São Paulo', '2023-07-22', 1),
            ('Frank', 'Wilson', 'frank.wilson@email.com', 'San Diego', NULL, 1);

        INSERT INTO categories (category_name, description, created_date, is_active) VALUES
            ('Electronics', 'Electronic devices and gadgets', '2023-01-01', 1),
            ('Clothing', 'Apparel and fashion items', '2023-01-01', 1),
            ('Books', 'Books and educational materials', '2023-01-01', 1),
            ('Home & Garden', 'Home improvement and gardening supplies', '2023-01-01', 1),
            ('Sports', 'Sports equipment and accessories', '2023-01-01', 1),
            ('Toys', 'Toys and games for all ages', '2023-01-01', 0);
        "#,
    )
    .await
    .expect("Failed to create schema");

    let product_names = [
        "Smartphone X1",
        "Laptop Pro",
        "Wireless Headphones",
        "Designer Jeans",
        "Cotton T-Shirt",
        "Winter Jacket",
        "Python Programming Guide",
        "Data Science Handbook",
        "Garden Hose",
        "Power Drill",
        "Tennis Racket",
        "Basketball",
    ];
    for (i, (name, price)) in product_names.iter().zip(PRODUCT_PRICES).enumerate() {
        conn.execute(
            "INSERT INTO products (product_name, category_id, price, stock_quantity, created_date) \
             VALUES (?, ?, ?, ?, ?)",
            &[
                Value::String(name.to_string()),
                Value::Int64((i / 3 + 1).min(5) as i64),
                Value::Float64(price),
                Value::Int64(20 + 5 * i as i64),
                Value::String(format!("2023-0{}-01", i / 3 + 1)),
            ],
        )
        .await
        .expect("Failed to insert product");
    }

    let statuses = ["pending", "processing", "shipped", "delivered", "cancelled"];
    let first_day = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
    for i in 0..50_i64 {
        let product = (i * 5 % 12) as usize;
        let quantity = i % 5 + 1;
        let unit_price = PRODUCT_PRICES[product];
        let order_date = (first_day + Duration::days(i * 3))
            .and_hms_opt(9, (i % 60) as u32, 0)
            .unwrap();
        conn.execute(
            "INSERT INTO orders (customer_id, product_id, quantity, unit_price, total_amount, order_date, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            &[
                Value::Int64(i % 8 + 1),
                Value::Int64(product as i64 + 1),
                Value::Int64(quantity),
                Value::Float64(unit_price),
                Value::Float64(unit_price * quantity as f64),
                Value::String(order_date.format("%Y-%m-%d %H:%M:%S").to_string()),
                Value::String(statuses[(i % 5) as usize].to_string()),
            ],
        )
        .await
        .expect("Failed to insert order");
    }

    conn.close().await.expect("Failed to close fixture connection");
}

async fn catalog() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("example.db");
    create_catalog_db(&path).await;
    (dir, path)
}

fn read_only_config(path: &Path) -> ConnectionConfig {
    ConnectionConfig::new_sqlite(path.to_str().unwrap()).with_param("read_only", true)
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_full_export_of_example_catalog() {
    let (dir, db) = catalog().await;
    let output = dir.path().join("export.json");

    let request = ExportRequest::new(DocumentWriter::new(db.to_str().unwrap())).with_output(&output);
    let report = run(&SqliteDriver::new(), &read_only_config(&db), request)
        .await
        .unwrap();

    assert_eq!(report.output_path, output);
    assert!(report.skipped.is_empty());
    let counts: Vec<(&str, usize)> = report
        .tables
        .iter()
        .map(|t| (t.name.as_str(), t.rows))
        .collect();
    assert_eq!(
        counts,
        vec![("customers", 8), ("categories", 6), ("products", 12), ("orders", 50)]
    );
    assert_eq!(report.total_rows(), 76);

    let json = read_json(&output);
    let object = json.as_object().unwrap();
    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    let mut expected = vec!["customers", "categories", "products", "orders"];
    let mut sorted_keys = keys.clone();
    sorted_keys.sort_unstable();
    expected.sort_unstable();
    assert_eq!(sorted_keys, expected);
    assert_eq!(json["customers"].as_array().unwrap().len(), 8);
    assert_eq!(json["categories"].as_array().unwrap().len(), 6);
    assert_eq!(json["products"].as_array().unwrap().len(), 12);
    assert_eq!(json["orders"].as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn test_documents_carry_normalized_values() {
    let (_dir, db) = catalog().await;
    let conn = SqliteConnection::open_read_only(db.to_str().unwrap()).unwrap();
    let options = ExportOptions::default();

    let customers = table_exporter::export_table(&conn, "customers", &options.normalize)
        .await
        .unwrap();
    let diana = &customers[5];
    let columns: Vec<&str> = diana.keys().map(String::as_str).collect();
    assert_eq!(
        columns,
        vec!["customer_id", "first_name", "last_name", "email", "city", "registration_date", "is_active"]
    );
    assert_eq!(diana["registration_date"], DocValue::String("2023-06-18".into()));
    assert_eq!(diana["is_active"], DocValue::Integer(0));
    assert_eq!(customers[6]["city"], DocValue::String("São Paulo".into()));
    assert_eq!(customers[7]["registration_date"], DocValue::Null);

    let products = table_exporter::export_table(&conn, "products", &options.normalize)
        .await
        .unwrap();
    assert_eq!(products[0]["price"], DocValue::String("699.99".into()));

    let orders = table_exporter::export_table(&conn, "orders", &options.normalize)
        .await
        .unwrap();
    // order 13: three Smartphone X1 at 699.99
    assert_eq!(orders[12]["quantity"], DocValue::Integer(3));
    assert_eq!(orders[12]["total_amount"], DocValue::String("2099.97".into()));
    assert_eq!(
        orders[0]["order_date"],
        DocValue::String("2023-03-01 09:00:00".into())
    );
}

#[tokio::test]
async fn test_row_counts_match_store() {
    let (_dir, db) = catalog().await;
    let conn = SqliteConnection::open_read_only(db.to_str().unwrap()).unwrap();

    for table in discovery::list_tables(&conn).await.unwrap() {
        let count = conn
            .query(&format!("SELECT COUNT(*) FROM \"{}\"", table), &[])
            .await
            .unwrap()
            .rows[0]
            .get(0)
            .and_then(|v| v.as_i64())
            .unwrap();
        let documents = table_exporter::export_table(&conn, &table, &Default::default())
            .await
            .unwrap();
        assert_eq!(documents.len() as i64, count, "{table}");
    }
}

#[tokio::test]
async fn test_discovery_excludes_internal_tables_and_views() {
    let (_dir, db) = catalog().await;
    let conn = SqliteConnection::open_read_only(db.to_str().unwrap()).unwrap();

    let tables = discovery::list_tables(&conn).await.unwrap();
    assert_eq!(tables, vec!["customers", "categories", "products", "orders"]);
}

#[tokio::test]
async fn test_empty_store_exports_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("empty.db");
    SqliteConnection::open(db.to_str().unwrap())
        .unwrap()
        .close()
        .await
        .unwrap();

    let conn = SqliteConnection::open_read_only(db.to_str().unwrap()).unwrap();
    assert!(discovery::list_tables(&conn).await.unwrap().is_empty());

    let output = dir.path().join("empty.json");
    let request = ExportRequest::new(DocumentWriter::new("empty.db")).with_output(&output);
    let report = run(&SqliteDriver::new(), &read_only_config(&db), request)
        .await
        .unwrap();
    assert!(report.tables.is_empty());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "{}\n");
}

#[tokio::test]
async fn test_missing_table_is_skipped_not_fatal() {
    let (_dir, db) = catalog().await;
    let conn = Arc::new(SqliteConnection::open_read_only(db.to_str().unwrap()).unwrap());

    let tables = vec!["customers".to_string(), "ghosts".to_string()];
    let outcome = ExportOrchestrator::new(conn)
        .export_all(Some(&tables))
        .await
        .unwrap();

    assert_eq!(outcome.result.table_names().collect::<Vec<_>>(), vec!["customers"]);
    assert_eq!(outcome.result.get("customers").unwrap().len(), 8);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].name, "ghosts");
    assert_eq!(outcome.skipped[0].kind, SkipKind::NotFound);
    assert!(outcome.skipped[0].reason.contains("not found"), "{}", outcome.skipped[0].reason);
}

#[tokio::test]
async fn test_explicit_list_keeps_order_and_drops_repeats() {
    let (_dir, db) = catalog().await;
    let conn = Arc::new(SqliteConnection::open_read_only(db.to_str().unwrap()).unwrap());

    let tables: Vec<String> = ["orders", "customers", "orders", "categories"]
        .iter()
        .map(|t| t.to_string())
        .collect();
    let options = ExportOptions::default().with_exclude(vec!["categories".into()]);
    let outcome = ExportOrchestrator::new(conn)
        .with_options(options)
        .export_all(Some(&tables))
        .await
        .unwrap();

    assert_eq!(
        outcome.result.table_names().collect::<Vec<_>>(),
        vec!["orders", "customers"]
    );
    assert!(outcome.skipped.is_empty());
}

/// Connection wrapper that drops one table right before it is read
struct DroppingConnection {
    inner: SqliteConnection,
    victim: String,
    dropped: AtomicBool,
}

#[async_trait]
impl Connection for DroppingConnection {
    fn driver_name(&self) -> &str {
        self.inner.driver_name()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> docdump_core::Result<StatementResult> {
        self.inner.execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> docdump_core::Result<QueryResult> {
        if sql.contains(&format!("\"{}\"", self.victim)) && !self.dropped.swap(true, Ordering::SeqCst) {
            self.inner
                .execute(&format!("DROP TABLE \"{}\"", self.victim), &[])
                .await?;
        }
        self.inner.query(sql, params).await
    }

    async fn close(&self) -> docdump_core::Result<()> {
        self.inner.close().await
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn as_schema_introspection(&self) -> Option<&dyn SchemaIntrospection> {
        Some(&self.inner)
    }
}

#[tokio::test]
async fn test_table_dropped_mid_run_is_isolated() {
    let (_dir, db) = catalog().await;
    let conn = Arc::new(DroppingConnection {
        inner: SqliteConnection::open(db.to_str().unwrap()).unwrap(),
        victim: "orders".into(),
        dropped: AtomicBool::new(false),
    });

    let phases = Arc::new(Mutex::new(Vec::new()));
    let recorder = phases.clone();
    let outcome = ExportOrchestrator::new(conn)
        .with_progress(Box::new(move |p| recorder.lock().unwrap().push(p.phase)))
        .export_all(None)
        .await
        .unwrap();

    assert_eq!(
        outcome.result.table_names().collect::<Vec<_>>(),
        vec!["customers", "categories", "products"]
    );
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].name, "orders");
    assert_eq!(outcome.skipped[0].kind, SkipKind::NotFound);

    let phases = phases.lock().unwrap();
    assert_eq!(phases.first(), Some(&ExportPhase::Starting));
    assert_eq!(phases[1], ExportPhase::DiscoveringTables);
    assert_eq!(
        phases.iter().filter(|p| **p == ExportPhase::TableExported).count(),
        3
    );
    assert_eq!(phases.last(), Some(&ExportPhase::TableSkipped));
}

#[tokio::test]
async fn test_repeated_runs_are_byte_identical() {
    let (dir, db) = catalog().await;
    let output = dir.path().join("stable.json");

    let mut contents = Vec::new();
    for _ in 0..2 {
        let request =
            ExportRequest::new(DocumentWriter::new(db.to_str().unwrap())).with_output(&output);
        run(&SqliteDriver::new(), &read_only_config(&db), request)
            .await
            .unwrap();
        contents.push(std::fs::read(&output).unwrap());
    }

    assert_eq!(contents[0], contents[1]);
}

#[tokio::test]
async fn test_exported_dates_round_trip() {
    let (dir, db) = catalog().await;
    let output = dir.path().join("dates.json");

    let request = ExportRequest::new(DocumentWriter::new(db.to_str().unwrap()))
        .with_tables(vec!["customers".into()])
        .with_output(&output);
    run(&SqliteDriver::new(), &read_only_config(&db), request)
        .await
        .unwrap();

    let json = read_json(&output);
    let text = json["customers"][5]["registration_date"].as_str().unwrap();
    assert_eq!(
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap(),
        NaiveDate::from_ymd_opt(2023, 6, 18).unwrap()
    );
}

#[tokio::test]
async fn test_missing_database_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("nope.db");
    let output = dir.path().join("out.json");

    let request = ExportRequest::new(DocumentWriter::new("nope.db")).with_output(&output);
    let err = run(&SqliteDriver::new(), &read_only_config(&db), request)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Connection(_)), "got {err:?}");
    assert!(!output.exists());
    assert!(!db.exists());
}

#[tokio::test]
async fn test_closed_connection_aborts_the_run() {
    let (_dir, db) = catalog().await;
    let conn = Arc::new(SqliteConnection::open_read_only(db.to_str().unwrap()).unwrap());
    conn.close().await.unwrap();

    let orchestrator = ExportOrchestrator::new(conn);
    let err = orchestrator.export_all(None).await.unwrap_err();
    assert!(matches!(err, ExportError::Connection(_)), "got {err:?}");

    let tables = vec!["customers".to_string()];
    let err = orchestrator.export_all(Some(&tables)).await.unwrap_err();
    assert!(matches!(err, ExportError::Connection(_)), "got {err:?}");
}

#[tokio::test]
async fn test_write_failure_is_reported() {
    let (dir, db) = catalog().await;
    let output = dir.path().join("no-such-dir").join("out.json");

    let request = ExportRequest::new(DocumentWriter::new(db.to_str().unwrap())).with_output(&output);
    let err = run(&SqliteDriver::new(), &read_only_config(&db), request)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Write { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_typed_booleans_and_binary_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("blobs.db");
    let setup = SqliteConnection::open(db.to_str().unwrap()).unwrap();
    setup
        .execute_batch(
            "CREATE TABLE files (name TEXT, data BLOB, public BOOLEAN);
             INSERT INTO files VALUES ('a.bin', X'DEADBEEF', 1);",
        )
        .await
        .unwrap();
    setup.close().await.unwrap();

    let output = dir.path().join("files.json");
    let options = ExportOptions::default().with_normalize(
        docdump_export::NormalizeOptions::default().with_binary(docdump_export::BinaryEncoding::Hex),
    );
    let request = ExportRequest::new(DocumentWriter::new("blobs.db").with_indent(0))
        .with_options(options)
        .with_output(&output);
    let config = read_only_config(&db).with_param("typed_booleans", true);
    run(&SqliteDriver::new(), &config, request).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "{\"files\":[{\"name\":\"a.bin\",\"data\":\"deadbeef\",\"public\":true}]}\n"
    );
}

#[test]
fn test_store_error_conversion_keeps_connection_failures_fatal() {
    let err: ExportError = DocdumpError::Connection("closed".into()).into();
    assert!(!err.is_table_scoped());
}
