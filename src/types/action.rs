use serde::{Deserialize, Serialize};

/// Commands accepted by the data store over the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DataStoreAction {
    Lock,
    Unlock,
    Reset,
    /// Marks a login as used.
    Touch(String),
    Delete(String),
}

impl DataStoreAction {
    /// Telemetry `(method, object)` pair recorded when the action is dispatched.
    pub fn telemetry(&self) -> (&'static str, &'static str) {
        match self {
            DataStoreAction::Lock => ("lock", "datastore"),
            DataStoreAction::Unlock => ("unlock", "datastore"),
            DataStoreAction::Reset => ("reset", "datastore"),
            DataStoreAction::Touch(_) => ("touch", "datastore"),
            DataStoreAction::Delete(_) => ("delete", "delete_credential"),
        }
    }
}
