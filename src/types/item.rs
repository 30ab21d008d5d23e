use serde::{Deserialize, Serialize};

/// Read-only view of one login for the item detail screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetailViewModel {
    pub id: String,
    pub title: String,
    pub hostname: String,
    pub username: String,
    pub has_username: bool,
    pub password: String,
}

/// Title and optional subtitle of a delete confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub title: String,
    pub subtitle: Option<String>,
}
