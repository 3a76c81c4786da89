//! Database Module
//!
//! Embedded SurrealDB storage. The binary runs on the RocksDB
//! engine under `WORK_DIR/database`; tests use the in-memory engine.
//! Both yield the same `Surreal<Db>` handle, so repositories and the
//! transaction discipline are identical in both.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

const NAMESPACE: &str = "store";
const DATABASE: &str = "store";

/// Database service owning the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the on-disk database at `path`
    pub async fn new(path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;
        Self::init(db).await
    }

    /// Open a fresh in-memory database (tests, ephemeral tooling)
    pub async fn memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;
        Self::init(db).await
    }

    async fn init(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_schema(&db).await?;

        tracing::info!("Database ready (SurrealDB embedded)");
        Ok(Self { db })
    }
}

/// Define tables and indexes. Tables stay schemaless (documents carry
/// their own shape); the unique index on order codes is what backs the
/// never-reused-code invariant at the storage level.
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS order SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS profile SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS counter SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS analytics SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS role SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS order_code_unique ON TABLE order FIELDS code UNIQUE;
        "#,
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;
    Ok(())
}
