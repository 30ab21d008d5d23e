use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A decrypted login as handed out by the data store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ServerPassword {
    pub id: String,
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub times_used: i64,
    pub time_created: i64,
    pub time_last_used: i64,
    pub time_password_changed: i64,
}

impl ServerPassword {
    /// Builds a login with zeroed bookkeeping fields.
    pub fn new(
        id: impl Into<String>,
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            times_used: 0,
            time_created: 0,
            time_last_used: 0,
            time_password_changed: 0,
        }
    }
}

/// A login row as persisted, with the password still sealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRecord {
    pub id: String,
    pub hostname: String,
    pub username: String,
    pub encrypted_password: Vec<u8>,
    pub iv: Vec<u8>,
    pub auth_tag: Vec<u8>,
    pub times_used: i64,
    pub time_created: i64,
    pub time_last_used: i64,
    pub time_password_changed: i64,
}

/// Encrypted data container used by CryptoService.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub auth_tag: Vec<u8>,
}
