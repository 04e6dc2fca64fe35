//! Database connection manager
//!
//! SQLite pool setup and schema creation.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::query;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Tables in creation order. Foreign keys only point backwards in this list.
const SCHEMA: &[(&str, &str)] = &[
    (
        "operators",
        r#"
        CREATE TABLE IF NOT EXISTS operators (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL CHECK (role IN ('admin', 'staff')),
            created_at INTEGER NOT NULL
        )
        "#,
    ),
    (
        "clients",
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT NOT NULL,
            sex TEXT NOT NULL CHECK (sex IN ('Masculino', 'Femenino', 'Otro')),
            address TEXT,
            emergency_phone TEXT,
            age INTEGER,
            registered_at INTEGER NOT NULL
        )
        "#,
    ),
    (
        "services",
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            service_type TEXT NOT NULL,
            cost_cents INTEGER NOT NULL CHECK (cost_cents >= 0)
        )
        "#,
    ),
    (
        "memberships",
        r#"
        CREATE TABLE IF NOT EXISTS memberships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER REFERENCES clients(id) ON DELETE SET NULL,
            service_id INTEGER NOT NULL REFERENCES services(id) ON DELETE RESTRICT,
            starts_at INTEGER NOT NULL,
            ends_at INTEGER,
            active INTEGER NOT NULL DEFAULT 1,
            service_cost_cents INTEGER NOT NULL CHECK (service_cost_cents >= 0),
            enrollment_fee_cents INTEGER NOT NULL DEFAULT 0 CHECK (enrollment_fee_cents >= 0),
            payment_method TEXT NOT NULL CHECK (payment_method IN ('Efectivo', 'Tarjeta')),
            paid_at INTEGER NOT NULL,
            operator_id INTEGER REFERENCES operators(id) ON DELETE SET NULL
        )
        "#,
    ),
    (
        "attendances",
        r#"
        CREATE TABLE IF NOT EXISTS attendances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER REFERENCES clients(id) ON DELETE SET NULL,
            checked_in_at INTEGER NOT NULL
        )
        "#,
    ),
    (
        "products",
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            price_cents INTEGER NOT NULL CHECK (price_cents > 0),
            stock INTEGER NOT NULL CHECK (stock >= 0),
            image_url TEXT
        )
        "#,
    ),
    (
        "sales",
        r#"
        CREATE TABLE IF NOT EXISTS sales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sold_at INTEGER NOT NULL,
            total_cents INTEGER NOT NULL CHECK (total_cents >= 0),
            payment_method TEXT NOT NULL CHECK (payment_method IN ('Efectivo', 'Tarjeta')),
            operator_id INTEGER REFERENCES operators(id) ON DELETE SET NULL
        )
        "#,
    ),
    (
        "sale_items",
        r#"
        CREATE TABLE IF NOT EXISTS sale_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sale_id INTEGER NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
            product_id INTEGER REFERENCES products(id) ON DELETE SET NULL,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            unit_price_cents INTEGER NOT NULL
        )
        "#,
    ),
    (
        "cash_closings",
        r#"
        CREATE TABLE IF NOT EXISTS cash_closings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            closed_at INTEGER NOT NULL,
            period_start INTEGER NOT NULL UNIQUE,
            system_cash_cents INTEGER NOT NULL,
            system_card_cents INTEGER NOT NULL,
            system_total_cents INTEGER NOT NULL,
            counted_cash_cents INTEGER NOT NULL,
            variance_cents INTEGER NOT NULL,
            operator_id INTEGER REFERENCES operators(id) ON DELETE SET NULL,
            CHECK (closed_at > period_start)
        )
        "#,
    ),
    (
        "takings_lock",
        r#"
        CREATE TABLE IF NOT EXISTS takings_lock (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            generation INTEGER NOT NULL
        )
        "#,
    ),
    (
        "mass_messages",
        r#"
        CREATE TABLE IF NOT EXISTS mass_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sent_at INTEGER NOT NULL,
            subject TEXT NOT NULL,
            body_summary TEXT NOT NULL,
            filter TEXT NOT NULL,
            total_sent INTEGER NOT NULL,
            operator_id INTEGER REFERENCES operators(id) ON DELETE SET NULL
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_sales_sold_at ON sales (sold_at, payment_method)",
    "CREATE INDEX IF NOT EXISTS idx_memberships_paid_at ON memberships (paid_at, payment_method)",
    "CREATE INDEX IF NOT EXISTS idx_memberships_client ON memberships (client_id, active)",
    "CREATE INDEX IF NOT EXISTS idx_attendances_client ON attendances (client_id, checked_in_at)",
    "CREATE INDEX IF NOT EXISTS idx_cash_closings_closed_at ON cash_closings (closed_at)",
    "CREATE INDEX IF NOT EXISTS idx_mass_messages_sent_at ON mass_messages (sent_at)",
];

/// Database connection manager
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pub pool: SqlitePool,
}

impl DatabaseManager {
    /// Connect to the given SQLite URL, creating the file if needed
    pub async fn new(database_url: &str) -> Result<Self> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid SQLite URL: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        debug!("Successfully connected to SQLite database");
        Ok(Self { pool })
    }

    /// Private in-memory database.
    ///
    /// Pinned to a single connection that never expires, since every SQLite memory
    /// connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Invalid in-memory SQLite URL")?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        Ok(Self { pool })
    }

    /// Create all tables and indexes. Safe to run on every start.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        for (table, ddl) in SCHEMA {
            query(ddl)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create table {}", table))?;
            crate::logging::log_database_operation("CREATE TABLE", table, None);
        }

        for ddl in INDEXES {
            query(ddl).execute(&self.pool).await.context("Failed to create index")?;
        }

        query("INSERT OR IGNORE INTO takings_lock (id, generation) VALUES (1, 0)")
            .execute(&self.pool)
            .await
            .context("Failed to seed takings lock")?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Test database connection
    pub async fn test_connection(&self) -> Result<()> {
        query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database connection test failed")?;

        debug!("Database connection test successful");
        Ok(())
    }

    /// Get connection pool statistics
    pub fn pool_size(&self) -> u32 {
        self.pool.size()
    }
}
