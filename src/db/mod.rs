use anyhow::Result;
use chrono::Utc;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::time::Duration;

pub mod address_store;
pub mod carrier_store;
pub mod sender_store;
pub mod shipment_store;
pub mod user_store;

pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str) -> Result<DbPool> {
    // Create the database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        Sqlite::create_database(database_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    setup_database(&pool).await?;

    Ok(pool)
}

/// Set up the database schema. Safe to run on every startup; schema
/// evolution is additive-only.
pub async fn setup_database(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS carriers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            contact_person TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS senders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS addresses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipient_name TEXT NOT NULL,
            recipient_phone TEXT NOT NULL,
            recipient_address TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Databases created before the contact person existed get the
    // column appended; "duplicate column" means it is already there.
    if let Err(e) =
        sqlx::query("ALTER TABLE addresses ADD COLUMN contact_person TEXT NOT NULL DEFAULT ''")
            .execute(pool)
            .await
    {
        if !e.to_string().contains("duplicate column name") {
            return Err(e.into());
        }
    }

    // The foreign keys are declarative only; the stores enforce the
    // referential guard so a blocked delete reports a clean conflict.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shipments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tracking_number TEXT UNIQUE NOT NULL,
            carrier_id INTEGER NOT NULL,
            sender_id INTEGER NOT NULL,
            address_id INTEGER NOT NULL,
            weight REAL NOT NULL DEFAULT 0,
            amount REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'shipped',
            shipping_date TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            FOREIGN KEY (carrier_id) REFERENCES carriers(id),
            FOREIGN KEY (sender_id) REFERENCES senders(id),
            FOREIGN KEY (address_id) REFERENCES addresses(id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the operator account if it does not exist yet.
pub async fn seed_admin(pool: &DbPool, username: &str, password: &str) -> Result<()> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    if existing.is_none() {
        let password_hash = crate::services::auth_service::hash_password(password)?;
        sqlx::query(
            "INSERT INTO users (username, password_hash, status, created_at) VALUES (?, ?, 'active', ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        tracing::info!(username, "created operator account");
    }

    Ok(())
}
