//! The static dataset catalog: tables, predefined queries and their
//! pre-baked result sets. This is pure data, authored once at startup and
//! never mutated at runtime.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::{cmp::Ordering, fmt, sync::LazyLock};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// A scalar cell value of a result record.
///
/// Timestamps are kept as `OffsetDateTime` and rendered as RFC 3339 instants
/// wherever a textual form is needed (grid cells, CSV fields, JSON export).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(OffsetDateTime),
    Null,
}

impl Value {
    /// Returns the value as displayed in the result grid. Nulls render empty.
    pub fn display(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::Timestamp(ts) => ts
                .format(&Rfc3339)
                .unwrap_or_else(|_| ts.to_string()),
            Value::Null => String::new(),
        }
    }

    /// Numeric view of the value, used for value-aware sorting.
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Total ordering used by the result grid sort: nulls first, then
    /// numbers (Int and Float compared together), then everything else by
    /// its display text.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => self.display().cmp(&other.display()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl Serialize for Value {
    /// Serializes to the natural JSON form: numbers as numbers, timestamps
    /// as RFC 3339 strings, nulls as `null`.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => {
                let text = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&text)
            }
            Value::Null => serializer.serialize_unit(),
        }
    }
}

/// One result row: an ordered list of `(column, value)` pairs.
///
/// Insertion order is the column order of the authored dataset, so the keys
/// of the first record determine export header order (first-seen order).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(Vec<(String, Value)>);

impl Record {
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Record(pairs)
    }

    /// Looks a value up by column name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Column names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Serialize for Record {
    /// Serializes as a JSON object preserving insertion order.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A predefined query: id unique within its table, display name, literal SQL
/// text and the literal result set returned when it is pseudo-executed.
#[derive(Debug, Clone)]
pub struct QueryDef {
    pub id: String,
    pub name: String,
    pub sql: String,
    pub results: Vec<Record>,
}

/// A catalog entry: table name, ordered column labels and predefined queries.
///
/// A column label may carry a type suffix after the last space
/// (e.g. `"total_amount numeric"`); see [`split_column_label`].
#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<String>,
    pub queries: Vec<QueryDef>,
}

impl TableDef {
    /// First query of the table, if any. Selecting a table resets the
    /// selection to this query.
    pub fn first_query(&self) -> Option<&QueryDef> {
        self.queries.first()
    }

    pub fn query_by_id(&self, id: &str) -> Option<&QueryDef> {
        self.queries.iter().find(|q| q.id == id)
    }

    /// Finds the first query whose trimmed SQL equals the trimmed input.
    /// This is the equality gate of the pseudo-execution step: matching is
    /// by query text, not by the selected query id.
    pub fn query_by_text(&self, text: &str) -> Option<&QueryDef> {
        let trimmed = text.trim();
        self.queries.iter().find(|q| q.sql.trim() == trimmed)
    }
}

/// Splits a column label into `(name, type suffix)`. The suffix is the part
/// after the last space, or `None` for single-word labels.
pub fn split_column_label(label: &str) -> (&str, Option<&str>) {
    match label.rsplit_once(' ') {
        Some((name, suffix)) => (name, Some(suffix)),
        None => (label, None),
    }
}

/// The table catalog, keyed by table name. Immutable after load.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<TableDef>,
}

impl Catalog {
    pub fn new(tables: Vec<TableDef>) -> Self {
        Catalog { tables }
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn first_table(&self) -> Option<&TableDef> {
        self.tables.first()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Builds one record from `column => value` pairs.
macro_rules! record {
    ( $( $key:literal => $val:expr ),* $(,)? ) => {
        Record::from_pairs(vec![ $( ($key.to_string(), Value::from($val)) ),* ])
    };
}

/// The builtin catalog used by the application. Lazily initialized once.
pub static CATALOG: LazyLock<Catalog> = LazyLock::new(builtin_catalog);

fn builtin_catalog() -> Catalog {
    Catalog::new(vec![
        customers_table(),
        orders_table(),
        products_table(),
        employees_table(),
        large_dataset_table(),
    ])
}

fn customers_table() -> TableDef {
    TableDef {
        name: "customers".to_string(),
        columns: ["id", "name", "email", "country", "created_at", "status"]
            .map(String::from)
            .to_vec(),
        queries: vec![
            QueryDef {
                id: "customers_all".to_string(),
                name: "All Customers".to_string(),
                sql: "SELECT * FROM customers;".to_string(),
                results: vec![
                    record! { "id" => 1, "name" => "John Doe", "email" => "john@example.com", "country" => "USA", "created_at" => "2023-01-15", "status" => "active" },
                    record! { "id" => 2, "name" => "Jane Smith", "email" => "jane@example.com", "country" => "Canada", "created_at" => "2023-02-20", "status" => "active" },
                    record! { "id" => 3, "name" => "Robert Johnson", "email" => "robert@example.com", "country" => "UK", "created_at" => "2023-03-10", "status" => "inactive" },
                    record! { "id" => 4, "name" => "Emily Davis", "email" => "emily@example.com", "country" => "Australia", "created_at" => "2023-04-05", "status" => "active" },
                    record! { "id" => 5, "name" => "Michael Brown", "email" => "michael@example.com", "country" => "USA", "created_at" => "2023-05-12", "status" => "active" },
                ],
            },
            QueryDef {
                id: "customers_active".to_string(),
                name: "Active Customers".to_string(),
                sql: "SELECT * FROM customers WHERE status = 'active';".to_string(),
                results: vec![
                    record! { "id" => 1, "name" => "John Doe", "email" => "john@example.com", "country" => "USA", "created_at" => "2023-01-15", "status" => "active" },
                    record! { "id" => 2, "name" => "Jane Smith", "email" => "jane@example.com", "country" => "Canada", "created_at" => "2023-02-20", "status" => "active" },
                    record! { "id" => 4, "name" => "Emily Davis", "email" => "emily@example.com", "country" => "Australia", "created_at" => "2023-04-05", "status" => "active" },
                    record! { "id" => 5, "name" => "Michael Brown", "email" => "michael@example.com", "country" => "USA", "created_at" => "2023-05-12", "status" => "active" },
                ],
            },
            QueryDef {
                id: "customers_by_country".to_string(),
                name: "Customers by Country".to_string(),
                sql: "SELECT country, COUNT(*) as customer_count FROM customers GROUP BY country;"
                    .to_string(),
                results: vec![
                    record! { "country" => "USA", "customer_count" => 2 },
                    record! { "country" => "Canada", "customer_count" => 1 },
                    record! { "country" => "UK", "customer_count" => 1 },
                    record! { "country" => "Australia", "customer_count" => 1 },
                ],
            },
        ],
    }
}

fn orders_table() -> TableDef {
    TableDef {
        name: "orders".to_string(),
        columns: [
            "id",
            "customer_id",
            "product_id",
            "quantity",
            "total_amount",
            "order_date",
            "status",
        ]
        .map(String::from)
        .to_vec(),
        queries: vec![
            QueryDef {
                id: "orders_all".to_string(),
                name: "All Orders".to_string(),
                sql: "SELECT * FROM orders;".to_string(),
                results: vec![
                    record! { "id" => 101, "customer_id" => 1, "product_id" => 5, "quantity" => 2, "total_amount" => 159.98, "order_date" => "2023-06-10", "status" => "delivered" },
                    record! { "id" => 102, "customer_id" => 2, "product_id" => 3, "quantity" => 1, "total_amount" => 49.99, "order_date" => "2023-06-12", "status" => "shipped" },
                    record! { "id" => 103, "customer_id" => 3, "product_id" => 7, "quantity" => 3, "total_amount" => 89.97, "order_date" => "2023-06-15", "status" => "processing" },
                    record! { "id" => 104, "customer_id" => 1, "product_id" => 2, "quantity" => 1, "total_amount" => 199.99, "order_date" => "2023-06-18", "status" => "delivered" },
                    record! { "id" => 105, "customer_id" => 4, "product_id" => 9, "quantity" => 2, "total_amount" => 119.98, "order_date" => "2023-06-20", "status" => "shipped" },
                ],
            },
            QueryDef {
                id: "orders_by_status".to_string(),
                name: "Orders by Status".to_string(),
                sql: "SELECT status, COUNT(*) as order_count, SUM(total_amount) as total_sales FROM orders GROUP BY status;".to_string(),
                results: vec![
                    record! { "status" => "delivered", "order_count" => 2, "total_sales" => 359.97 },
                    record! { "status" => "shipped", "order_count" => 2, "total_sales" => 169.97 },
                    record! { "status" => "processing", "order_count" => 1, "total_sales" => 89.97 },
                ],
            },
            QueryDef {
                id: "customer_orders".to_string(),
                name: "Customer Orders".to_string(),
                sql: "SELECT c.name, COUNT(o.id) as order_count, SUM(o.total_amount) as total_spent FROM customers c JOIN orders o ON c.id = o.customer_id GROUP BY c.id;".to_string(),
                results: vec![
                    record! { "name" => "John Doe", "order_count" => 2, "total_spent" => 359.97 },
                    record! { "name" => "Jane Smith", "order_count" => 1, "total_spent" => 49.99 },
                    record! { "name" => "Robert Johnson", "order_count" => 1, "total_spent" => 89.97 },
                    record! { "name" => "Emily Davis", "order_count" => 1, "total_spent" => 119.98 },
                ],
            },
        ],
    }
}

fn products_table() -> TableDef {
    TableDef {
        name: "products".to_string(),
        columns: ["id", "name", "category", "price", "stock", "supplier_id"]
            .map(String::from)
            .to_vec(),
        queries: vec![
            QueryDef {
                id: "products_all".to_string(),
                name: "All Products".to_string(),
                sql: "SELECT * FROM products;".to_string(),
                results: vec![
                    record! { "id" => 1, "name" => "Laptop", "category" => "Electronics", "price" => 999.99, "stock" => 45, "supplier_id" => 5 },
                    record! { "id" => 2, "name" => "Smartphone", "category" => "Electronics", "price" => 699.99, "stock" => 120, "supplier_id" => 5 },
                    record! { "id" => 3, "name" => "Headphones", "category" => "Electronics", "price" => 149.99, "stock" => 75, "supplier_id" => 2 },
                    record! { "id" => 4, "name" => "T-shirt", "category" => "Clothing", "price" => 19.99, "stock" => 200, "supplier_id" => 3 },
                    record! { "id" => 5, "name" => "Jeans", "category" => "Clothing", "price" => 49.99, "stock" => 150, "supplier_id" => 3 },
                ],
            },
            QueryDef {
                id: "products_by_category".to_string(),
                name: "Products by Category".to_string(),
                sql: "SELECT category, COUNT(*) as product_count, AVG(price) as avg_price FROM products GROUP BY category;".to_string(),
                results: vec![
                    record! { "category" => "Electronics", "product_count" => 3, "avg_price" => 616.66 },
                    record! { "category" => "Clothing", "product_count" => 2, "avg_price" => 34.99 },
                ],
            },
            QueryDef {
                id: "low_stock_products".to_string(),
                name: "Low Stock Products".to_string(),
                sql: "SELECT * FROM products WHERE stock < 50;".to_string(),
                results: vec![
                    record! { "id" => 1, "name" => "Laptop", "category" => "Electronics", "price" => 999.99, "stock" => 45, "supplier_id" => 5 },
                ],
            },
        ],
    }
}

fn employees_table() -> TableDef {
    TableDef {
        name: "employees".to_string(),
        columns: [
            "id",
            "first_name",
            "last_name",
            "department",
            "salary",
            "hire_date",
        ]
        .map(String::from)
        .to_vec(),
        queries: vec![
            QueryDef {
                id: "employees_all".to_string(),
                name: "All Employees".to_string(),
                sql: "SELECT * FROM employees;".to_string(),
                results: vec![
                    record! { "id" => 1, "first_name" => "Alice", "last_name" => "Johnson", "department" => "Sales", "salary" => 65000, "hire_date" => "2022-03-15" },
                    record! { "id" => 2, "first_name" => "Bob", "last_name" => "Smith", "department" => "Marketing", "salary" => 70000, "hire_date" => "2021-11-05" },
                    record! { "id" => 3, "first_name" => "Charlie", "last_name" => "Davis", "department" => "Engineering", "salary" => 85000, "hire_date" => "2022-01-20" },
                    record! { "id" => 4, "first_name" => "Diana", "last_name" => "Wilson", "department" => "HR", "salary" => 60000, "hire_date" => "2022-05-10" },
                    record! { "id" => 5, "first_name" => "Edward", "last_name" => "Miller", "department" => "Engineering", "salary" => 90000, "hire_date" => "2021-08-22" },
                ],
            },
            QueryDef {
                id: "employees_by_department".to_string(),
                name: "Employees by Department".to_string(),
                sql: "SELECT department, COUNT(*) as employee_count, AVG(salary) as avg_salary FROM employees GROUP BY department;".to_string(),
                results: vec![
                    record! { "department" => "Sales", "employee_count" => 1, "avg_salary" => 65000 },
                    record! { "department" => "Marketing", "employee_count" => 1, "avg_salary" => 70000 },
                    record! { "department" => "Engineering", "employee_count" => 2, "avg_salary" => 87500 },
                    record! { "department" => "HR", "employee_count" => 1, "avg_salary" => 60000 },
                ],
            },
            QueryDef {
                id: "high_salary_employees".to_string(),
                name: "High Salary Employees".to_string(),
                sql: "SELECT * FROM employees WHERE salary > 75000;".to_string(),
                results: vec![
                    record! { "id" => 3, "first_name" => "Charlie", "last_name" => "Davis", "department" => "Engineering", "salary" => 85000, "hire_date" => "2022-01-20" },
                    record! { "id" => 5, "first_name" => "Edward", "last_name" => "Miller", "department" => "Engineering", "salary" => 90000, "hire_date" => "2021-08-22" },
                ],
            },
        ],
    }
}

fn large_dataset_table() -> TableDef {
    TableDef {
        name: "large_dataset".to_string(),
        columns: ["id", "name", "value", "created_at", "status"]
            .map(String::from)
            .to_vec(),
        queries: vec![
            QueryDef {
                id: "large_dataset_all".to_string(),
                name: "All Large Dataset Records".to_string(),
                sql: "SELECT * FROM large_dataset;".to_string(),
                results: generated_rows(1000, "Item", None),
            },
            QueryDef {
                id: "large_dataset_active".to_string(),
                name: "Active Large Dataset Records".to_string(),
                sql: "SELECT * FROM large_dataset WHERE status = 'active';".to_string(),
                results: generated_rows(300, "Active Item", Some("active")),
            },
            QueryDef {
                id: "large_dataset_summary".to_string(),
                name: "Large Dataset Summary".to_string(),
                sql: "SELECT status, COUNT(*) as record_count, AVG(value) as avg_value FROM large_dataset GROUP BY status;".to_string(),
                results: vec![
                    record! { "status" => "active", "record_count" => 334, "avg_value" => 49.87 },
                    record! { "status" => "pending", "record_count" => 333, "avg_value" => 51.23 },
                    record! { "status" => "completed", "record_count" => 333, "avg_value" => 50.45 },
                ],
            },
        ],
    }
}

/// SplitMix64 finalizer. Used to derive stable pseudo-random sample values,
/// so the generated dataset (and tests over it) is identical on every run.
fn mix(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

const STATUSES: [&str; 3] = ["active", "pending", "completed"];

/// Generates the rows of the `large_dataset` table deterministically.
/// `fixed_status` pins the status column (the "active only" query variant);
/// otherwise the status is derived from the row seed.
fn generated_rows(count: usize, name_prefix: &str, fixed_status: Option<&str>) -> Vec<Record> {
    (1..=count as u64)
        .map(|i| {
            let value = (mix(i) % 10_000) as f64 / 100.0;
            let month = 1 + mix(i ^ 0x55) % 12;
            let day = 1 + mix(i ^ 0xAA) % 28;
            let status = match fixed_status {
                Some(s) => s,
                None => STATUSES[(mix(i ^ 0xFF) % 3) as usize],
            };

            record! {
                "id" => i as i64,
                "name" => format!("{name_prefix} {i}"),
                "value" => value,
                "created_at" => format!("2023-{month:02}-{day:02}"),
                "status" => status,
            }
        })
        .collect()
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// `cargo test -- --show-output tests_catalog`
#[cfg(test)]
mod tests_catalog {
    use super::*;

    #[test]
    fn builtin_catalog_shape() {
        let catalog = &*CATALOG;
        let names: Vec<&str> = catalog.table_names().collect();
        assert_eq!(
            names,
            ["customers", "orders", "products", "employees", "large_dataset"]
        );

        // Every table has queries and its first query id resolves.
        for name in names {
            let table = catalog.get(name).unwrap();
            let first = table.first_query().unwrap();
            assert!(table.query_by_id(&first.id).is_some());
        }
    }

    #[test]
    fn customers_all_has_five_rows() {
        let table = CATALOG.get("customers").unwrap();
        let query = table.query_by_id("customers_all").unwrap();
        assert_eq!(query.results.len(), 5);
        assert_eq!(
            query.results[0].get("name"),
            Some(&Value::Str("John Doe".to_string()))
        );
    }

    #[test]
    fn text_match_is_trim_insensitive() {
        let table = CATALOG.get("customers").unwrap();
        let hit = table.query_by_text("  SELECT * FROM customers;  ");
        assert_eq!(hit.map(|q| q.id.as_str()), Some("customers_all"));

        // Any other modification fails the equality gate.
        assert!(table.query_by_text("SELECT * FROM customers LIMIT 1;").is_none());
    }

    #[test]
    fn text_match_crosses_query_ids() {
        // Editing the text to another query's literal SQL matches that query,
        // regardless of which id is selected in the UI.
        let table = CATALOG.get("customers").unwrap();
        let hit = table.query_by_text("SELECT * FROM customers WHERE status = 'active';");
        assert_eq!(hit.map(|q| q.id.as_str()), Some("customers_active"));
        assert_eq!(hit.unwrap().results.len(), 4);
    }

    #[test]
    fn large_dataset_is_deterministic() {
        let a = generated_rows(1000, "Item", None);
        let b = generated_rows(1000, "Item", None);
        assert_eq!(a.len(), 1000);
        assert_eq!(a, b);

        let active = generated_rows(300, "Active Item", Some("active"));
        assert_eq!(active.len(), 300);
        assert!(
            active
                .iter()
                .all(|r| r.get("status") == Some(&Value::Str("active".to_string())))
        );
    }

    #[test]
    fn value_ordering_nulls_first_numbers_numeric() {
        assert_eq!(Value::Null.compare(&Value::Int(0)), Ordering::Less);
        assert_eq!(Value::Int(2).compare(&Value::Float(10.5)), Ordering::Less);
        assert_eq!(
            Value::Str("b".into()).compare(&Value::Str("a".into())),
            Ordering::Greater
        );
    }

    #[test]
    fn column_label_type_suffix() {
        assert_eq!(split_column_label("total_amount numeric"), ("total_amount", Some("numeric")));
        assert_eq!(split_column_label("id"), ("id", None));
    }
}
