use std::fmt;

// === FillError ===

/// Terminal failures of a fill request. The display text is what the host
/// shows back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillError {
    /// Neither a username nor a password field was found in the structure.
    MissingFields,
    /// No web domain in the structure and the package name heuristic failed.
    UnresolvableDomain,
    /// No stored login matched the resolved domain.
    NoCandidates,
}

impl fmt::Display for FillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillError::MissingFields => write!(f, "couldn't find a username or password field"),
            FillError::UnresolvableDomain => write!(f, "unexpected package name structure"),
            FillError::NoCandidates => write!(f, "no logins found for this domain"),
        }
    }
}

impl std::error::Error for FillError {}

// === StoreError ===

/// Errors related to the login data store.
#[derive(Debug)]
pub enum StoreError {
    /// The store has not been unlocked with the master password.
    Locked,
    /// Login with the given ID was not found.
    NotFound(String),
    /// Database operation failed.
    DatabaseError(String),
    /// Sealing or opening a stored password failed.
    CryptoError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Locked => write!(f, "Data store is locked"),
            StoreError::NotFound(id) => write!(f, "Login not found: {}", id),
            StoreError::DatabaseError(msg) => write!(f, "Data store database error: {}", msg),
            StoreError::CryptoError(msg) => write!(f, "Data store crypto error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

// === CryptoError ===

/// Errors related to cryptographic operations.
#[derive(Debug)]
pub enum CryptoError {
    /// Failed to derive encryption key from password.
    KeyDerivation(String),
    /// Encryption operation failed.
    Encryption(String),
    /// Decryption operation failed.
    Decryption(String),
    /// Failed to generate random bytes.
    RandomGeneration(String),
    /// The provided key is invalid.
    InvalidKey(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::KeyDerivation(msg) => write!(f, "Key derivation failed: {}", msg),
            CryptoError::Encryption(msg) => write!(f, "Encryption failed: {}", msg),
            CryptoError::Decryption(msg) => write!(f, "Decryption failed: {}", msg),
            CryptoError::RandomGeneration(msg) => {
                write!(f, "Random generation failed: {}", msg)
            }
            CryptoError::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
