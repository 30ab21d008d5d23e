//! Login data store for Lockbox.
//!
//! Keeps logins in SQLite with passwords sealed under the master key, and
//! publishes the decrypted list through a `watch` channel: `None` while
//! locked, `Some(list)` once unlocked and after every change.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension, Row};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::database::connection::Database;
use crate::services::crypto_service::{Cipher, CryptoService, MasterKey};
use crate::services::dispatcher::Dispatcher;
use crate::types::action::DataStoreAction;
use crate::types::credential::{EncryptedData, LoginRecord, ServerPassword};
use crate::types::errors::StoreError;

/// Shared snapshot of the decrypted logins.
pub type LoginList = Arc<Vec<ServerPassword>>;

/// Something that can hand out the current login list.
pub trait CredentialSource: Send + Sync {
    /// Receiver of the latest list; holds `None` while the source is locked.
    fn list(&self) -> watch::Receiver<Option<LoginList>>;
}

const MASTER_SALT_KEY: &str = "master_salt";
const MASTER_VERIFY_KEY: &str = "master_verify";
const MASTER_VERIFY_PLAINTEXT: &[u8] = b"lockbox-master-key-verify-v1";

/// `(value, iv, auth_tag)` of a `store_meta` row.
type MetaRow = (Vec<u8>, Option<Vec<u8>>, Option<Vec<u8>>);

const SELECT_LOGIN: &str = "SELECT id, hostname, username, encrypted_password, iv, auth_tag, \
     times_used, time_created, time_last_used, time_password_changed FROM logins";

/// SQLite-backed [`CredentialSource`] that reacts to [`DataStoreAction`]s.
pub struct DataStore {
    db: Arc<Database>,
    crypto: CryptoService,
    master_password: Zeroizing<String>,
    key: Mutex<Option<MasterKey>>,
    list_tx: watch::Sender<Option<LoginList>>,
}

impl DataStore {
    /// Creates a locked store.
    pub fn new(db: Arc<Database>, master_password: impl Into<String>) -> Self {
        let (list_tx, _) = watch::channel(None);
        Self {
            db,
            crypto: CryptoService::new(),
            master_password: Zeroizing::new(master_password.into()),
            key: Mutex::new(None),
            list_tx,
        }
    }

    /// Spawns a task applying every action dispatched from now on.
    pub fn listen(self: &Arc<Self>, dispatcher: &Dispatcher) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let mut actions = dispatcher.subscribe();
        tokio::spawn(async move {
            loop {
                match actions.recv().await {
                    Ok(action) => {
                        if let Err(e) = store.apply(&action) {
                            warn!(?action, error = %e, "data store action failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "data store fell behind the dispatcher");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Applies a single action.
    pub fn apply(&self, action: &DataStoreAction) -> Result<(), StoreError> {
        match action {
            DataStoreAction::Unlock => self.unlock().map(|_| ()),
            DataStoreAction::Lock => {
                self.lock();
                Ok(())
            }
            DataStoreAction::Reset => self.reset(),
            DataStoreAction::Touch(id) => self.touch(id),
            DataStoreAction::Delete(id) => self.delete(id),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.key_slot().is_some()
    }

    /// Derives the master key and checks it against the stored verification
    /// token, creating the token on first use. Returns `false` when the
    /// master password does not match; the store then stays locked.
    pub fn unlock(&self) -> Result<bool, StoreError> {
        if self.is_unlocked() {
            return Ok(true);
        }

        let salt = self.get_or_create_salt()?;
        let key = self
            .crypto
            .derive_master_key(&self.master_password, &salt)
            .map_err(|e| StoreError::CryptoError(e.to_string()))?;

        match self.verification_token()? {
            Some(token) => {
                let verified = self
                    .crypto
                    .open(&token, MASTER_VERIFY_KEY, &key)
                    .map(|plaintext| plaintext == MASTER_VERIFY_PLAINTEXT)
                    .unwrap_or(false);
                if !verified {
                    warn!("master password rejected");
                    return Ok(false);
                }
            }
            None => {
                let token = self
                    .crypto
                    .seal(MASTER_VERIFY_PLAINTEXT, MASTER_VERIFY_KEY, &key)
                    .map_err(|e| StoreError::CryptoError(e.to_string()))?;
                self.put_meta(MASTER_VERIFY_KEY, &token.ciphertext, Some(&token.iv), Some(&token.auth_tag))?;
            }
        }

        // The key is only installed once the list it unlocks is readable.
        let logins = self.readable_logins(&key)?;
        {
            let mut slot = self.key_slot();
            *slot = Some(key);
            self.list_tx.send_replace(Some(Arc::new(logins)));
        }
        info!("data store unlocked");
        Ok(true)
    }

    /// Drops the master key and publishes `None`.
    pub fn lock(&self) {
        {
            let mut slot = self.key_slot();
            // MasterKey wipes itself on drop.
            slot.take();
            self.list_tx.send_replace(None);
        }
        info!("data store locked");
    }

    /// Deletes every login and the master key material, then locks.
    pub fn reset(&self) -> Result<(), StoreError> {
        {
            let conn = self.db.connection();
            conn.execute("DELETE FROM logins", [])
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
            conn.execute("DELETE FROM store_meta", [])
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        }
        self.lock();
        info!("data store reset");
        Ok(())
    }

    /// Stores a new login and returns its id.
    pub fn add(&self, hostname: &str, username: &str, password: &str) -> Result<String, StoreError> {
        let key = self.require_key()?;
        let id = Uuid::new_v4().to_string();
        let sealed = self.seal_password(password, &id, &key)?;
        let now = now_ms();

        self.db
            .connection()
            .execute(
                "INSERT INTO logins (id, hostname, username, encrypted_password, iv, auth_tag, \
                 time_created, time_password_changed, times_used, time_last_used) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, 0, 0)",
                params![id, hostname, username, sealed.ciphertext, sealed.iv, sealed.auth_tag, now],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        debug!(%id, hostname, "login added");
        self.publish()?;
        Ok(id)
    }

    /// Replaces the username and/or password of an existing login.
    pub fn update(&self, id: &str, username: Option<&str>, password: Option<&str>) -> Result<(), StoreError> {
        let key = self.require_key()?;
        self.ensure_exists(id)?;
        let now = now_ms();

        {
            let conn = self.db.connection();
            if let Some(username) = username {
                conn.execute("UPDATE logins SET username = ?1 WHERE id = ?2", params![username, id])
                    .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
            }
            if let Some(password) = password {
                let sealed = self.seal_password(password, id, &key)?;
                conn.execute(
                    "UPDATE logins SET encrypted_password = ?1, iv = ?2, auth_tag = ?3, \
                     time_password_changed = ?4 WHERE id = ?5",
                    params![sealed.ciphertext, sealed.iv, sealed.auth_tag, now, id],
                )
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
            }
        }

        self.publish()
    }

    pub fn get(&self, id: &str) -> Result<ServerPassword, StoreError> {
        let key = self.require_key()?;
        let record = self
            .db
            .connection()
            .query_row(&format!("{} WHERE id = ?1", SELECT_LOGIN), params![id], record_from_row)
            .optional()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.open_record(&record, &key)
    }

    /// All logins, decrypted, ordered by hostname then username.
    pub fn list_logins(&self) -> Result<Vec<ServerPassword>, StoreError> {
        let key = self.require_key()?;
        self.records()?.iter().map(|r| self.open_record(r, &key)).collect()
    }

    /// Rows exactly as stored, passwords still sealed. Only handed out while
    /// unlocked.
    pub fn export_sealed(&self) -> Result<Vec<LoginRecord>, StoreError> {
        self.require_key()?;
        self.records()
    }

    /// Restores rows produced by [`DataStore::export_sealed`], replacing rows
    /// with the same id. Every row must open under the current master key;
    /// if one does not, nothing is written.
    pub fn import_sealed(&self, records: &[LoginRecord]) -> Result<usize, StoreError> {
        let key = self.require_key()?;
        for record in records {
            self.open_record(record, &key)?;
        }

        {
            let conn = self.db.connection();
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
            for r in records {
                tx.execute(
                    "INSERT OR REPLACE INTO logins (id, hostname, username, encrypted_password, iv, \
                     auth_tag, times_used, time_created, time_last_used, time_password_changed) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        r.id,
                        r.hostname,
                        r.username,
                        r.encrypted_password,
                        r.iv,
                        r.auth_tag,
                        r.times_used,
                        r.time_created,
                        r.time_last_used,
                        r.time_password_changed
                    ],
                )
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
            }
            tx.commit().map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        }

        info!(count = records.len(), "sealed logins imported");
        self.publish()?;
        Ok(records.len())
    }

    /// Bumps the usage counter and last-used time of a login.
    pub fn touch(&self, id: &str) -> Result<(), StoreError> {
        self.require_key()?;
        let changed = self
            .db
            .connection()
            .execute(
                "UPDATE logins SET times_used = times_used + 1, time_last_used = ?1 WHERE id = ?2",
                params![now_ms(), id],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.publish()
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.require_key()?;
        let changed = self
            .db
            .connection()
            .execute("DELETE FROM logins WHERE id = ?1", params![id])
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(%id, "login deleted");
        self.publish()
    }

    fn records(&self) -> Result<Vec<LoginRecord>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(&format!("{} ORDER BY hostname, username", SELECT_LOGIN))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        let rows = stmt
            .query_map([], record_from_row)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    fn key_slot(&self) -> MutexGuard<'_, Option<MasterKey>> {
        self.key.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn require_key(&self) -> Result<MasterKey, StoreError> {
        self.key_slot().clone().ok_or(StoreError::Locked)
    }

    /// Republishes the list. The key guard is held until the list is sent,
    /// so a concurrent `lock` always wins with `None`.
    fn publish(&self) -> Result<(), StoreError> {
        let slot = self.key_slot();
        let Some(key) = slot.as_ref() else {
            return Ok(());
        };
        let logins = self.readable_logins(key)?;
        self.list_tx.send_replace(Some(Arc::new(logins)));
        Ok(())
    }

    /// Every login that opens under `key`; unreadable rows are skipped.
    fn readable_logins(&self, key: &MasterKey) -> Result<Vec<ServerPassword>, StoreError> {
        let logins = self
            .records()?
            .iter()
            .filter_map(|record| match self.open_record(record, key) {
                Ok(login) => Some(login),
                Err(e) => {
                    warn!(id = %record.id, error = %e, "skipping unreadable login");
                    None
                }
            })
            .collect();
        Ok(logins)
    }

    fn ensure_exists(&self, id: &str) -> Result<(), StoreError> {
        let found: Option<String> = self
            .db
            .connection()
            .query_row("SELECT id FROM logins WHERE id = ?1", params![id], |row| row.get(0))
            .optional()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        found.map(|_| ()).ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn seal_password(&self, password: &str, id: &str, key: &MasterKey) -> Result<EncryptedData, StoreError> {
        self.crypto
            .seal(password.as_bytes(), id, key)
            .map_err(|e| StoreError::CryptoError(e.to_string()))
    }

    fn open_record(&self, record: &LoginRecord, key: &MasterKey) -> Result<ServerPassword, StoreError> {
        let sealed = EncryptedData {
            ciphertext: record.encrypted_password.clone(),
            iv: record.iv.clone(),
            auth_tag: record.auth_tag.clone(),
        };
        let plaintext = Zeroizing::new(
            self.crypto
                .open(&sealed, &record.id, key)
                .map_err(|e| StoreError::CryptoError(e.to_string()))?,
        );
        let password = String::from_utf8(plaintext.to_vec())
            .map_err(|e| StoreError::CryptoError(e.to_string()))?;

        Ok(ServerPassword {
            id: record.id.clone(),
            hostname: record.hostname.clone(),
            username: record.username.clone(),
            password,
            times_used: record.times_used,
            time_created: record.time_created,
            time_last_used: record.time_last_used,
            time_password_changed: record.time_password_changed,
        })
    }

    fn get_or_create_salt(&self) -> Result<Vec<u8>, StoreError> {
        if let Some((salt, _, _)) = self.get_meta(MASTER_SALT_KEY)? {
            return Ok(salt);
        }
        let salt = self
            .crypto
            .generate_salt()
            .map_err(|e| StoreError::CryptoError(e.to_string()))?;
        self.put_meta(MASTER_SALT_KEY, &salt, None, None)?;
        Ok(salt)
    }

    fn verification_token(&self) -> Result<Option<EncryptedData>, StoreError> {
        Ok(self.get_meta(MASTER_VERIFY_KEY)?.map(|(ciphertext, iv, auth_tag)| EncryptedData {
            ciphertext,
            iv: iv.unwrap_or_default(),
            auth_tag: auth_tag.unwrap_or_default(),
        }))
    }

    fn get_meta(&self, key: &str) -> Result<Option<MetaRow>, StoreError> {
        self.db
            .connection()
            .query_row(
                "SELECT value, iv, auth_tag FROM store_meta WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    fn put_meta(&self, key: &str, value: &[u8], iv: Option<&[u8]>, auth_tag: Option<&[u8]>) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO store_meta (key, value, iv, auth_tag) VALUES (?1, ?2, ?3, ?4)",
                params![key, value, iv, auth_tag],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

impl CredentialSource for DataStore {
    fn list(&self) -> watch::Receiver<Option<LoginList>> {
        self.list_tx.subscribe()
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<LoginRecord> {
    Ok(LoginRecord {
        id: row.get(0)?,
        hostname: row.get(1)?,
        username: row.get(2)?,
        encrypted_password: row.get(3)?,
        iv: row.get(4)?,
        auth_tag: row.get(5)?,
        times_used: row.get(6)?,
        time_created: row.get(7)?,
        time_last_used: row.get(8)?,
        time_password_changed: row.get(9)?,
    })
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
