//! Password sealing for the login store.
//!
//! Stored passwords are sealed with AES-256-GCM under a key derived from the
//! master password with PBKDF2-HMAC-SHA256. The login id is bound in as
//! associated data, so a sealed password only opens under the row it was
//! written for.

use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::types::credential::EncryptedData;
use crate::types::errors::CryptoError;

/// PBKDF2 iteration count for key derivation.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes for PBKDF2.
pub const SALT_LENGTH: usize = 16;

/// AES-256-GCM key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce/IV length in bytes.
pub const NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// Key material derived from the master password. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey(Vec<u8>);

impl MasterKey {
    /// Wraps raw key bytes, rejecting anything but a 256-bit key.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LENGTH {
            return Err(CryptoError::InvalidKey(format!(
                "Key must be {} bytes, got {}",
                KEY_LENGTH,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Sealing operations the data store relies on.
pub trait Cipher {
    /// Derives the master key from a password and salt.
    fn derive_master_key(&self, password: &str, salt: &[u8]) -> Result<MasterKey, CryptoError>;

    /// Seals `plaintext`, binding `context` as associated data.
    fn seal(&self, plaintext: &[u8], context: &str, key: &MasterKey) -> Result<EncryptedData, CryptoError>;

    /// Opens data sealed by [`Cipher::seal`] with the same `context`.
    fn open(&self, sealed: &EncryptedData, context: &str, key: &MasterKey) -> Result<Vec<u8>, CryptoError>;

    /// Generates a fresh random salt.
    fn generate_salt(&self) -> Result<Vec<u8>, CryptoError>;
}

/// One nonce, one use.
struct SingleNonce(Option<[u8; NONCE_LENGTH]>);

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> Result<Nonce, ring::error::Unspecified> {
        self.0
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(ring::error::Unspecified)
    }
}

/// [`Cipher`] backed by the `ring` crate.
pub struct CryptoService {
    rng: SystemRandom,
}

impl CryptoService {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for CryptoService {
    fn default() -> Self {
        Self::new()
    }
}

impl Cipher for CryptoService {
    fn derive_master_key(&self, password: &str, salt: &[u8]) -> Result<MasterKey, CryptoError> {
        if salt.is_empty() {
            return Err(CryptoError::KeyDerivation("Salt must not be empty".to_string()));
        }
        let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
            .ok_or_else(|| CryptoError::KeyDerivation("Invalid iteration count".to_string()))?;

        let mut key = vec![0u8; KEY_LENGTH];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            salt,
            password.as_bytes(),
            &mut key,
        );
        MasterKey::from_bytes(key)
    }

    fn seal(&self, plaintext: &[u8], context: &str, key: &MasterKey) -> Result<EncryptedData, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::RandomGeneration("Failed to generate nonce".to_string()))?;

        let unbound_key = UnboundKey::new(&AES_256_GCM, key.as_bytes())
            .map_err(|_| CryptoError::Encryption("Failed to create encryption key".to_string()))?;
        let mut sealing_key = aead::SealingKey::new(unbound_key, SingleNonce(Some(nonce_bytes)));

        let mut in_out = plaintext.to_vec();
        sealing_key
            .seal_in_place_append_tag(Aad::from(context.as_bytes()), &mut in_out)
            .map_err(|_| CryptoError::Encryption("Encryption operation failed".to_string()))?;

        // ring appends the tag; keep it in its own column.
        let auth_tag = in_out.split_off(in_out.len() - TAG_LENGTH);

        Ok(EncryptedData {
            ciphertext: in_out,
            iv: nonce_bytes.to_vec(),
            auth_tag,
        })
    }

    fn open(&self, sealed: &EncryptedData, context: &str, key: &MasterKey) -> Result<Vec<u8>, CryptoError> {
        let nonce_bytes: [u8; NONCE_LENGTH] = sealed.iv.as_slice().try_into().map_err(|_| {
            CryptoError::Decryption(format!(
                "IV must be {} bytes, got {}",
                NONCE_LENGTH,
                sealed.iv.len()
            ))
        })?;

        if sealed.auth_tag.len() != TAG_LENGTH {
            return Err(CryptoError::Decryption(format!(
                "Auth tag must be {} bytes, got {}",
                TAG_LENGTH,
                sealed.auth_tag.len()
            )));
        }

        let unbound_key = UnboundKey::new(&AES_256_GCM, key.as_bytes())
            .map_err(|_| CryptoError::Decryption("Failed to create decryption key".to_string()))?;
        let mut opening_key = aead::OpeningKey::new(unbound_key, SingleNonce(Some(nonce_bytes)));

        let mut in_out = Vec::with_capacity(sealed.ciphertext.len() + TAG_LENGTH);
        in_out.extend_from_slice(&sealed.ciphertext);
        in_out.extend_from_slice(&sealed.auth_tag);

        let plaintext = opening_key
            .open_in_place(Aad::from(context.as_bytes()), &mut in_out)
            .map_err(|_| CryptoError::Decryption("invalid key or corrupted data".to_string()))?;

        Ok(plaintext.to_vec())
    }

    fn generate_salt(&self) -> Result<Vec<u8>, CryptoError> {
        let mut salt = vec![0u8; SALT_LENGTH];
        self.rng
            .fill(&mut salt)
            .map_err(|_| CryptoError::RandomGeneration("Failed to generate salt".to_string()))?;
        Ok(salt)
    }
}
