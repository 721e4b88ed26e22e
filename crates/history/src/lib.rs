//! Durable record of resolved conversational turns.
//!
//! Persisting an exchange is two effects: insert the exchange row, then
//! append its id to the owning user's ordered history. The second effect is
//! allowed to fail independently (the row survives, the history link is
//! lost) — callers treat a recorded exchange as recorded either way.

pub mod error;

use {
    chrono::Utc,
    sqlx::SqlitePool,
    tracing::warn,
    uuid::Uuid,
};

pub use error::{Error, Result};

/// One resolved turn, as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub id: String,
    pub user_id: String,
    pub input_text: String,
    pub output_text: String,
    /// RFC 3339, UTC.
    pub created_at: String,
}

impl Exchange {
    /// A fresh exchange, not yet persisted. Built by the caller so the
    /// answer can still be delivered if the write below fails.
    pub fn new(user_id: &str, input_text: &str, output_text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            input_text: input_text.to_string(),
            output_text: output_text.to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// SQLite-backed exchange store.
pub struct SqliteExchangeStore {
    pool: SqlitePool,
}

impl SqliteExchangeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS exchanges (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                input_text TEXT NOT NULL,
                output_text TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        // seq gives append order independent of wall-clock ties.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS user_history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                exchange_id TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Persist one turn.
    pub async fn record(&self, exchange: &Exchange) -> Result<()> {
        sqlx::query(
            "INSERT INTO exchanges (id, user_id, input_text, output_text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&exchange.id)
        .bind(&exchange.user_id)
        .bind(&exchange.input_text)
        .bind(&exchange.output_text)
        .bind(&exchange.created_at)
        .execute(&self.pool)
        .await?;

        // The row is in; losing the history link is tolerable, losing the
        // exchange is not.
        if let Err(e) = sqlx::query(
            "INSERT INTO user_history (user_id, exchange_id) VALUES (?1, ?2)",
        )
        .bind(&exchange.user_id)
        .bind(&exchange.id)
        .execute(&self.pool)
        .await
        {
            warn!(error = %e, exchange_id = %exchange.id, "history append failed");
        }

        Ok(())
    }

    /// A user's exchanges in append order.
    pub async fn history(&self, user_id: &str) -> Result<Vec<Exchange>> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            "SELECT e.id, e.user_id, e.input_text, e.output_text, e.created_at
             FROM user_history h
             JOIN exchanges e ON e.id = h.exchange_id
             WHERE h.user_id = ?1
             ORDER BY h.seq",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, user_id, input_text, output_text, created_at)| Exchange {
                id,
                user_id,
                input_text,
                output_text,
                created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteExchangeStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        SqliteExchangeStore::init(&pool).await.unwrap();
        SqliteExchangeStore::new(pool)
    }

    #[tokio::test]
    async fn record_round_trips_through_history() {
        let store = store().await;
        let exchange = Exchange::new("u1", "hi", "hello");
        assert!(!exchange.id.is_empty());
        store.record(&exchange).await.unwrap();

        let history = store.history("u1").await.unwrap();
        assert_eq!(history, vec![exchange]);
    }

    #[tokio::test]
    async fn history_preserves_append_order() {
        let store = store().await;
        for n in 0..5 {
            store
                .record(&Exchange::new("u1", &format!("q{n}"), &format!("a{n}")))
                .await
                .unwrap();
        }
        let inputs: Vec<_> = store
            .history("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.input_text)
            .collect();
        assert_eq!(inputs, vec!["q0", "q1", "q2", "q3", "q4"]);
    }

    #[tokio::test]
    async fn histories_are_isolated_per_user() {
        let store = store().await;
        store.record(&Exchange::new("u1", "mine", "yours")).await.unwrap();
        store.record(&Exchange::new("u2", "theirs", "ours")).await.unwrap();

        let u1 = store.history("u1").await.unwrap();
        assert_eq!(u1.len(), 1);
        assert_eq!(u1[0].input_text, "mine");
        assert!(store.history("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        SqliteExchangeStore::init(&pool).await.unwrap();
        SqliteExchangeStore::init(&pool).await.unwrap();
    }
}
