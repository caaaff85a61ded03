use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::database::models::{Certificate, Product, Project};
use crate::database::{
    ContactStore, DatabaseManager, DocumentStore, PgContactStore, PgDocumentStore, PgUserStore,
    UserStore,
};
use crate::mail::{Mailer, ResendMailer};
use crate::middleware::LoginRateLimiter;
use crate::storage::{CloudinaryStorage, ObjectStorage};
use crate::upload::{ImageSettings, UploadPipeline};

/// Shared clients handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Absent when the stores are not database backed
    pub database: Option<DatabaseManager>,
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn DocumentStore<Product>>,
    pub projects: Arc<dyn DocumentStore<Project>>,
    pub certificates: Arc<dyn DocumentStore<Certificate>>,
    pub contacts: Arc<dyn ContactStore>,
    pub uploads: UploadPipeline,
    pub mailer: Arc<dyn Mailer>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

/// External collaborators the state is assembled from
pub struct Services {
    pub database: Option<DatabaseManager>,
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn DocumentStore<Product>>,
    pub projects: Arc<dyn DocumentStore<Project>>,
    pub certificates: Arc<dyn DocumentStore<Certificate>>,
    pub contacts: Arc<dyn ContactStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: AppConfig, services: Services) -> Self {
        let settings = ImageSettings {
            width: config.storage.image_width,
            jpeg_quality: config.storage.jpeg_quality,
        };
        let login_limiter = LoginRateLimiter::new(
            config.api.login_attempts,
            Duration::from_secs(config.api.login_window_secs),
        );

        Self {
            config: Arc::new(config),
            database: services.database,
            users: services.users,
            products: services.products,
            projects: services.projects,
            certificates: services.certificates,
            contacts: services.contacts,
            uploads: UploadPipeline::new(services.storage, settings),
            mailer: services.mailer,
            login_limiter: Arc::new(login_limiter),
        }
    }

    /// Connect to Postgres, apply migrations and build the production clients
    pub async fn connect(config: AppConfig) -> anyhow::Result<Self> {
        let database = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        database.migrate().await.context("failed to run migrations")?;

        let pool = database.pool().clone();
        let storage =
            CloudinaryStorage::new(&config.storage).context("invalid object storage settings")?;
        let mailer = ResendMailer::new(&config.mail);

        let services = Services {
            users: Arc::new(PgUserStore::new(pool.clone())),
            products: Arc::new(PgDocumentStore::<Product>::new(pool.clone())?),
            projects: Arc::new(PgDocumentStore::<Project>::new(pool.clone())?),
            certificates: Arc::new(PgDocumentStore::<Certificate>::new(pool.clone())?),
            contacts: Arc::new(PgContactStore::new(pool)),
            storage: Arc::new(storage),
            mailer: Arc::new(mailer),
            database: Some(database),
        };

        Ok(Self::new(config, services))
    }
}
