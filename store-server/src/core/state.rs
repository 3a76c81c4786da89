//! Shared server state
//!
//! One [`ServerState`] is built at startup and cloned into every
//! handler. Everything inside is cheap to clone (Arc-backed handles).

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::notify::NotificationTrigger;
use crate::services::{BlobStore, FsBlobStore, LogMailer, Mailer, SendgridMailer};
use crate::utils::AppError;
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub db: Surreal<Db>,
    pub jwt: Arc<JwtService>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: NotificationTrigger,
}

impl ServerState {
    /// Wire everything up from configuration: open the database under
    /// the work directory, pick the mailer, set up slip storage.
    pub async fn initialize(config: Config) -> Result<Self, AppError> {
        let db_path = format!("{}/database", config.work_dir);
        let db_service = DbService::new(&db_path).await?;

        let uploads_dir = Self::uploads_dir(&config);
        let blobs: Arc<dyn BlobStore> =
            Arc::new(FsBlobStore::new(uploads_dir, config.public_base_url.clone()));

        let mailer: Arc<dyn Mailer> = match &config.sendgrid_api_key {
            Some(key) => {
                tracing::info!("Email delivery: SendGrid");
                Arc::new(SendgridMailer::new(key.clone(), config.from_email.clone()))
            }
            None => {
                tracing::info!("Email delivery: log only (no SENDGRID_API_KEY)");
                Arc::new(LogMailer)
            }
        };
        let notifier = NotificationTrigger::new(mailer, config.owner_email.clone());

        let jwt = Arc::new(JwtService::new(&config.jwt));

        Ok(Self {
            config: Arc::new(config),
            db: db_service.db,
            jwt,
            blobs,
            notifier,
        })
    }

    pub fn uploads_dir(config: &Config) -> String {
        format!("{}/uploads", config.work_dir)
    }

    /// State over an in-memory database with in-memory collaborators.
    /// Test-only wiring; the HTTP surface is identical.
    pub async fn for_tests() -> Result<Self, AppError> {
        use crate::services::MemoryBlobStore;

        let config = Config::from_env();
        let db_service = DbService::memory().await?;
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
        Ok(Self {
            notifier: NotificationTrigger::new(mailer, config.owner_email.clone()),
            jwt: Arc::new(JwtService::new(&config.jwt)),
            blobs: Arc::new(MemoryBlobStore::new()),
            db: db_service.db,
            config: Arc::new(config),
        })
    }
}
