use lockbox::types::errors::*;

// === FillError Tests ===

#[test]
fn fill_error_messages_match_host_strings() {
    assert_eq!(
        FillError::MissingFields.to_string(),
        "couldn't find a username or password field"
    );
    assert_eq!(
        FillError::UnresolvableDomain.to_string(),
        "unexpected package name structure"
    );
    assert_eq!(
        FillError::NoCandidates.to_string(),
        "no logins found for this domain"
    );
}

#[test]
fn fill_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(FillError::NoCandidates);
    assert!(err.source().is_none());
}

// === StoreError Tests ===

#[test]
fn store_error_display_variants() {
    assert_eq!(StoreError::Locked.to_string(), "Data store is locked");
    assert_eq!(
        StoreError::NotFound("abc".to_string()).to_string(),
        "Login not found: abc"
    );
    assert_eq!(
        StoreError::DatabaseError("disk full".to_string()).to_string(),
        "Data store database error: disk full"
    );
    assert_eq!(
        StoreError::CryptoError("bad tag".to_string()).to_string(),
        "Data store crypto error: bad tag"
    );
}

// === CryptoError Tests ===

#[test]
fn crypto_error_display_variants() {
    assert_eq!(
        CryptoError::KeyDerivation("bad salt".to_string()).to_string(),
        "Key derivation failed: bad salt"
    );
    assert_eq!(
        CryptoError::Encryption("oops".to_string()).to_string(),
        "Encryption failed: oops"
    );
    assert_eq!(
        CryptoError::Decryption("invalid tag".to_string()).to_string(),
        "Decryption failed: invalid tag"
    );
    assert_eq!(
        CryptoError::RandomGeneration("no entropy".to_string()).to_string(),
        "Random generation failed: no entropy"
    );
    assert_eq!(
        CryptoError::InvalidKey("wrong length".to_string()).to_string(),
        "Invalid key: wrong length"
    );
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("denied".to_string()).to_string(),
        "Settings I/O error: denied"
    );
    assert_eq!(
        SettingsError::SerializationError("eof".to_string()).to_string(),
        "Settings serialization error: eof"
    );
    assert_eq!(
        SettingsError::InvalidKey("a.b".to_string()).to_string(),
        "Invalid settings key: a.b"
    );
    assert_eq!(
        SettingsError::InvalidValue("nope".to_string()).to_string(),
        "Invalid settings value: nope"
    );
}
