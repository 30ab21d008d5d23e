//! App Core for Lockbox.
//!
//! Owns the database, settings, dispatcher, data store and autofill service,
//! and wires them together.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::database::connection::Database;
use crate::platform;
use crate::services::autofill_service::AutofillService;
use crate::services::data_store::{CredentialSource, DataStore};
use crate::services::dispatcher::Dispatcher;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

/// Central application struct.
pub struct App {
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub dispatcher: Dispatcher,
    pub data_store: Arc<DataStore>,
    pub autofill: AutofillService,
    store_listener: JoinHandle<()>,
}

impl App {
    /// Assembles the app around an opened database and loaded settings.
    ///
    /// Spawns the data store's dispatcher listener, so it must be called
    /// from within a tokio runtime.
    pub fn new(db: Database, settings_engine: SettingsEngine, master_password: impl Into<String>) -> Self {
        let db = Arc::new(db);
        let dispatcher = Dispatcher::new();
        let data_store = Arc::new(DataStore::new(db.clone(), master_password));
        let store_listener = data_store.listen(&dispatcher);

        let source: Arc<dyn CredentialSource> = data_store.clone();
        let autofill = AutofillService::new(
            source,
            dispatcher.clone(),
            &settings_engine.get_settings().autofill,
        );

        Self {
            db,
            settings_engine,
            dispatcher,
            data_store,
            autofill,
            store_listener,
        }
    }

    /// Loads settings (from `settings_path` or the platform default), opens
    /// the database and assembles the app. The database is
    /// `storage.database_path` when set, else `lockbox.db` in `data_dir`,
    /// else in the platform data dir.
    pub fn open(
        settings_path: Option<String>,
        data_dir: Option<PathBuf>,
        master_password: impl Into<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(settings_path);
        let settings = settings_engine.load()?;

        let db_path = settings
            .storage
            .database_path
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.unwrap_or_else(platform::get_data_dir).join("lockbox.db"));
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!(path = %db_path.display(), "opening login database");
        let db = Database::open(&db_path)?;

        Ok(Self::new(db, settings_engine, master_password))
    }

    /// Rebuilds the autofill service from the current settings. Pending fill
    /// requests of the old service are dropped.
    pub fn reload_autofill(&mut self) {
        self.autofill.on_disconnected();
        let source: Arc<dyn CredentialSource> = self.data_store.clone();
        self.autofill = AutofillService::new(
            source,
            self.dispatcher.clone(),
            &self.settings_engine.get_settings().autofill,
        );
    }

    /// Drops pending fills, locks the store and stops its listener.
    pub fn shutdown(&mut self) {
        self.autofill.on_disconnected();
        self.data_store.lock();
        self.store_listener.abort();
        info!("lockbox shut down");
    }
}
