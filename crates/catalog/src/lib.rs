//! Read-only car catalog lookups.
//!
//! The `cars` table is populated by an out-of-band ingestion process; this
//! crate only reads it. Matching on (brand, model) is case-insensitive and
//! whitespace-trimmed on both sides — no fuzzy matching. Each lookup is a
//! single statement, so a reader never observes a half-ingested row set.

pub mod error;

use {
    serde::Serialize,
    sqlx::SqlitePool,
};

pub use error::{Error, Result};

/// One catalog record. Immutable once loaded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub brand: String,
    pub model: String,
    pub price: f64,
    pub fuel_type: String,
    pub transmission: String,
    pub description: String,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// SQLite-backed catalog reader.
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the table if the ingestion collaborator hasn't yet.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cars (
                brand TEXT NOT NULL,
                model TEXT NOT NULL,
                price REAL NOT NULL,
                fuel_type TEXT NOT NULL,
                transmission TEXT NOT NULL,
                description TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Exact lookup by normalized (brand, model). `None` when absent.
    pub async fn find_item(&self, brand: &str, model: &str) -> Result<Option<CatalogItem>> {
        let row: Option<(String, String, f64, String, String, String)> = sqlx::query_as(
            "SELECT brand, model, price, fuel_type, transmission, description
             FROM cars
             WHERE LOWER(TRIM(brand)) = ?1 AND LOWER(TRIM(model)) = ?2",
        )
        .bind(normalize(brand))
        .bind(normalize(model))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(item_from_row))
    }

    /// Bulk read for the dashboard/graphs collaborators.
    pub async fn list_all(&self) -> Result<Vec<CatalogItem>> {
        let rows: Vec<(String, String, f64, String, String, String)> = sqlx::query_as(
            "SELECT brand, model, price, fuel_type, transmission, description
             FROM cars ORDER BY brand, model",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(item_from_row).collect())
    }
}

fn item_from_row(
    (brand, model, price, fuel_type, transmission, description): (
        String,
        String,
        f64,
        String,
        String,
        String,
    ),
) -> CatalogItem {
    CatalogItem {
        brand,
        model,
        price,
        fuel_type,
        transmission,
        description,
    }
}
