use serde::{Deserialize, Serialize};

/// Top-level Lockbox settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockboxSettings {
    pub app_label: String,
    pub autofill: AutofillSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

impl Default for LockboxSettings {
    fn default() -> Self {
        Self {
            app_label: "Lockbox".to_string(),
            autofill: AutofillSettings::default(),
            storage: StorageSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Autofill behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutofillSettings {
    /// Dispatch an unlock to the data store whenever the host connects.
    pub unlock_on_connect: bool,
    /// Label shown next to a suggested password; `%1$s` is the username.
    pub password_label: String,
}

impl Default for AutofillSettings {
    fn default() -> Self {
        Self {
            unlock_on_connect: true,
            password_label: "Password for %1$s".to_string(),
        }
    }
}

/// Where the login database lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StorageSettings {
    /// Absolute path of the database file. `None` uses the platform data dir.
    pub database_path: Option<String>,
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `lockbox=debug`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
