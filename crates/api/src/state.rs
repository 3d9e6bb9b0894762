//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::config::ApiConfig;
use crate::models::{MenuItem, collections};
use crate::services::{MailClient, PaymentClient, TemplateStore, UpstreamError};
use crate::store::{ErrorLog, FileStore, StoreError};

/// How long a menu snapshot is served from memory before it is re-read
/// from the store.
const MENU_CACHE_TTL: Duration = Duration::from_secs(60);

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not prepare the data layout: {0}")]
    Layout(#[from] std::io::Error),
    #[error("could not build an outbound client: {0}")]
    Client(#[from] UpstreamError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the record store, outbound clients, and
/// configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: FileStore,
    errors: ErrorLog,
    payment: PaymentClient,
    mail: MailClient,
    templates: TemplateStore,
    menu_cache: Cache<&'static str, Arc<Vec<MenuItem>>>,
}

impl AppState {
    /// Build the application state and prepare the on-disk layout.
    ///
    /// Every collection directory is created up front so record operations
    /// never have to care whether their collection exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection directory cannot be created or an
    /// outbound client cannot be built.
    pub async fn bootstrap(config: ApiConfig) -> Result<Self, StateError> {
        for collection in collections::ALL {
            tokio::fs::create_dir_all(config.data_dir.join(collection)).await?;
        }

        let errors = ErrorLog::new(&config.log_dir);
        let store = FileStore::new(&config.data_dir, errors.clone());
        let payment = PaymentClient::new(&config.payment)?;
        let mail = MailClient::new(&config.mail);
        let templates = TemplateStore::new(&config.templates_dir);

        let menu_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(MENU_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                errors,
                payment,
                mail,
                templates,
                menu_cache,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the record store.
    #[must_use]
    pub fn store(&self) -> &FileStore {
        &self.inner.store
    }

    /// Get a reference to the error log.
    #[must_use]
    pub fn errors(&self) -> &ErrorLog {
        &self.inner.errors
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn payment(&self) -> &PaymentClient {
        &self.inner.payment
    }

    /// Get a reference to the mail client.
    #[must_use]
    pub fn mail(&self) -> &MailClient {
        &self.inner.mail
    }

    /// Get a reference to the template store.
    #[must_use]
    pub fn templates(&self) -> &TemplateStore {
        &self.inner.templates
    }

    /// The current menu, served through a short-lived read-through cache.
    ///
    /// The menu is seeded externally and read on every cart operation, so
    /// it is the one collection worth keeping in memory.
    ///
    /// # Errors
    ///
    /// Returns the store error if the menu record cannot be read.
    pub async fn menu(&self) -> Result<Arc<Vec<MenuItem>>, Arc<StoreError>> {
        self.inner
            .menu_cache
            .try_get_with(collections::MENU_KEY, async {
                let menu: Vec<MenuItem> = self
                    .inner
                    .store
                    .read(collections::MENU, collections::MENU_KEY)
                    .await?;
                Ok(Arc::new(menu))
            })
            .await
    }
}
