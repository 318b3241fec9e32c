//! # Document Repository
//!
//! Every collection of the ledger is stored whole, as one JSON document keyed
//! by its [`Collection`] name.
//!
//! ## Commit Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    commit(&ChangeSet)                                   │
//! │                                                                         │
//! │  ChangeSet { products, sales, last_bill_number }                       │
//! │       │  serialize every touched collection FIRST                      │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── UPSERT products          version += 1                            │
//! │   ├── UPSERT sales             version += 1                            │
//! │   └── UPSERT last_bill_number  version += 1                            │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Any failure before COMMIT → the transaction is dropped and rolled     │
//! │  back. Readers never observe stock moved without its sale.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A collection that was never written reads as its `Default` (empty list,
//! default settings, bill counter 0).

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use kirana_core::{
    ChangeSet, Collection, DailyLog, Expense, Product, Purchase, Sale, Settings, Staff,
};

const UPSERT_DOCUMENT: &str = r#"
    INSERT INTO documents (collection, payload, version, updated_at)
    VALUES (?1, ?2, 1, ?3)
    ON CONFLICT(collection) DO UPDATE SET
        payload = excluded.payload,
        version = documents.version + 1,
        updated_at = excluded.updated_at
"#;

// =============================================================================
// Snapshot
// =============================================================================

/// Every collection, decoded, as of one read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub settings: Settings,
    pub products: Vec<Product>,
    pub staff: Vec<Staff>,
    pub sales: Vec<Sale>,
    pub purchases: Vec<Purchase>,
    pub expenses: Vec<Expense>,
    pub daily_logs: Vec<DailyLog>,
    pub last_bill_number: u64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for collection documents.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.documents();
///
/// let staff: Vec<Staff> = repo.get(Collection::Staff).await?;
/// repo.commit(&ChangeSet::new().with_staff(staff)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    /// Creates a new DocumentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DocumentRepository { pool }
    }

    /// Raw JSON payload of a collection, `None` if never written.
    pub async fn get_raw(&self, collection: Collection) -> DbResult<Option<String>> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM documents WHERE collection = ?1")
                .bind(collection.name())
                .fetch_optional(&self.pool)
                .await?;

        Ok(payload)
    }

    /// Decodes a collection, falling back to `T::default()` when missing.
    ///
    /// ## Errors
    /// * `DbError::Serialization` - the stored document does not decode as `T`
    pub async fn get<T>(&self, collection: Collection) -> DbResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.get_raw(collection).await? {
            Some(payload) => decode(collection, &payload),
            None => Ok(T::default()),
        }
    }

    /// Writes one collection whole.
    pub async fn replace<T: Serialize>(&self, collection: Collection, value: &T) -> DbResult<()> {
        let payload = serde_json::to_string(value)?;

        debug!(collection = %collection, bytes = payload.len(), "Replacing document");

        sqlx::query(UPSERT_DOCUMENT)
            .bind(collection.name())
            .bind(&payload)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Writes every collection in `changes` atomically.
    ///
    /// Serialization happens before the transaction opens, so an encoding
    /// failure never leaves a half-written store. An empty change set is a
    /// no-op.
    pub async fn commit(&self, changes: &ChangeSet) -> DbResult<()> {
        let documents = changes.to_documents()?;
        if documents.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for (collection, payload) in &documents {
            sqlx::query(UPSERT_DOCUMENT)
                .bind(collection.name())
                .bind(payload)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            collections = ?changes.collections(),
            "Committed change set"
        );
        Ok(())
    }

    /// Reads and decodes every collection in one read transaction.
    pub async fn snapshot(&self) -> DbResult<StoreSnapshot> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT collection, payload FROM documents")
                .fetch_all(&self.pool)
                .await?;

        let mut snapshot = StoreSnapshot::default();

        for (name, payload) in rows {
            let Some(collection) = Collection::ALL.iter().copied().find(|c| c.name() == name)
            else {
                debug!(collection = %name, "Ignoring unknown document");
                continue;
            };

            match collection {
                Collection::Settings => snapshot.settings = decode(collection, &payload)?,
                Collection::Products => snapshot.products = decode(collection, &payload)?,
                Collection::Staff => snapshot.staff = decode(collection, &payload)?,
                Collection::Sales => snapshot.sales = decode(collection, &payload)?,
                Collection::Purchases => snapshot.purchases = decode(collection, &payload)?,
                Collection::Expenses => snapshot.expenses = decode(collection, &payload)?,
                Collection::DailyLogs => snapshot.daily_logs = decode(collection, &payload)?,
                Collection::LastBillNumber => {
                    snapshot.last_bill_number = decode(collection, &payload)?
                }
            }
        }

        Ok(snapshot)
    }

    /// Write count of a collection, 0 if never written.
    pub async fn version(&self, collection: Collection) -> DbResult<i64> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE collection = ?1")
                .bind(collection.name())
                .fetch_optional(&self.pool)
                .await?;

        Ok(version.unwrap_or(0))
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, payload: &str) -> DbResult<T> {
    serde_json::from_str(payload)
        .map_err(|e| DbError::Serialization(format!("{collection}: {e}")))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kirana_core::Money;

    async fn repo() -> DocumentRepository {
        Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .documents()
    }

    fn rice() -> Product {
        Product {
            id: "p-rice".to_string(),
            name: "Rice 1kg".to_string(),
            category: "Grains".to_string(),
            unit: "kg".to_string(),
            purchase_price: Money::from_major(40),
            sales_price: Money::from_major(50),
            stock: 12,
        }
    }

    #[tokio::test]
    async fn test_missing_collections_read_as_default() {
        let repo = repo().await;

        let products: Vec<Product> = repo.get(Collection::Products).await.unwrap();
        assert!(products.is_empty());

        let last: u64 = repo.get(Collection::LastBillNumber).await.unwrap();
        assert_eq!(last, 0);

        let settings: Settings = repo.get(Collection::Settings).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(repo.version(Collection::Products).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_then_get() {
        let repo = repo().await;

        repo.replace(Collection::Products, &vec![rice()]).await.unwrap();
        let products: Vec<Product> = repo.get(Collection::Products).await.unwrap();
        assert_eq!(products, vec![rice()]);

        repo.replace(Collection::Products, &Vec::<Product>::new())
            .await
            .unwrap();
        assert_eq!(repo.version(Collection::Products).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_commit_writes_every_touched_collection() {
        let repo = repo().await;

        let changes = ChangeSet::new()
            .with_products(vec![rice()])
            .with_last_bill_number(41);
        repo.commit(&changes).await.unwrap();

        let snapshot = repo.snapshot().await.unwrap();
        assert_eq!(snapshot.products, vec![rice()]);
        assert_eq!(snapshot.last_bill_number, 41);
        assert!(snapshot.sales.is_empty());

        // Untouched collections are never created
        assert!(repo.get_raw(Collection::Sales).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_commit_is_noop() {
        let repo = repo().await;
        repo.commit(&ChangeSet::new()).await.unwrap();
        assert_eq!(repo.snapshot().await.unwrap(), StoreSnapshot::default());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_a_serialization_error() {
        let repo = repo().await;
        sqlx::query(UPSERT_DOCUMENT)
            .bind(Collection::Sales.name())
            .bind("{\"not\": \"a list\"}")
            .bind(Utc::now().to_rfc3339())
            .execute(&repo.pool)
            .await
            .unwrap();

        let err = repo.get::<Vec<Sale>>(Collection::Sales).await.unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
        assert!(repo.snapshot().await.is_err());
    }

    #[tokio::test]
    async fn test_commit_after_close_fails_without_partial_write() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.documents();
        db.close().await;

        let result = repo
            .commit(&ChangeSet::new().with_products(vec![rice()]))
            .await;
        assert!(result.is_err());
    }
}
