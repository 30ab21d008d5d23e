//! RPC method handler for the Lockbox JSON-RPC bridge.
//!
//! Kept apart from `rpc_server.rs` so it can be tested without stdio.
//! Most methods answer immediately; `autofill.fill` answers once the data
//! store has published its login list, or never if the host cancels it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use tracing::debug;

use crate::app::App;
use crate::services::autofill_service::{CancellationSignal, FillCallback};
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::strings::{DELETE_SUBTITLE, DELETE_TITLE};
use crate::types::credential::{LoginRecord, ServerPassword};
use crate::types::fill::FillRequest;
use crate::types::item::{DeleteConfirmation, ItemDetailViewModel};

/// Deferred answer; resolves to `None` when no response must be written.
pub type PendingReply = Pin<Box<dyn Future<Output = Option<Result<Value, String>>> + Send>>;

/// Result of dispatching one request.
pub enum Reply {
    Now(Result<Value, String>),
    Later(PendingReply),
}

impl From<Result<Value, String>> for Reply {
    fn from(result: Result<Value, String>) -> Self {
        Reply::Now(result)
    }
}

/// Dispatches JSON-RPC methods to the [`App`].
pub struct RpcHandler {
    app: App,
    fills: Arc<Mutex<HashMap<String, CancellationSignal>>>,
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

fn login_summary(login: &ServerPassword) -> Value {
    let detail = ItemDetailViewModel::from(login);
    json!({
        "id": detail.id,
        "title": detail.title,
        "hostname": detail.hostname,
        "username": detail.username,
        "times_used": login.times_used,
    })
}

fn sealed_to_json(record: &LoginRecord) -> Value {
    json!({
        "id": record.id,
        "hostname": record.hostname,
        "username": record.username,
        "password": {
            "ciphertext": BASE64.encode(&record.encrypted_password),
            "iv": BASE64.encode(&record.iv),
            "auth_tag": BASE64.encode(&record.auth_tag),
        },
        "times_used": record.times_used,
        "time_created": record.time_created,
        "time_last_used": record.time_last_used,
        "time_password_changed": record.time_password_changed,
    })
}

fn sealed_from_json(value: &Value) -> Result<LoginRecord, String> {
    let blob = |name: &str| -> Result<Vec<u8>, String> {
        let encoded = value
            .get("password")
            .and_then(|p| p.get(name))
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("missing password.{}", name))?;
        BASE64
            .decode(encoded)
            .map_err(|e| format!("base64 decode error: {}", e))
    };
    let int = |name: &str| value.get(name).and_then(|v| v.as_i64()).unwrap_or(0);

    Ok(LoginRecord {
        id: str_param(value, "id")?.to_string(),
        hostname: str_param(value, "hostname")?.to_string(),
        username: value.get("username").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        encrypted_password: blob("ciphertext")?,
        iv: blob("iv")?,
        auth_tag: blob("auth_tag")?,
        times_used: int("times_used"),
        time_created: int("time_created"),
        time_last_used: int("time_last_used"),
        time_password_changed: int("time_password_changed"),
    })
}

impl RpcHandler {
    pub fn new(app: App) -> Self {
        Self {
            app,
            fills: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Number of fill requests that have neither answered nor been cancelled.
    pub fn pending_fills(&self) -> usize {
        self.fills.lock().map(|f| f.len()).unwrap_or(0)
    }

    /// Dispatches one request. `id` keys `autofill.fill` requests so that a
    /// later `autofill.cancel` can find them.
    pub fn handle(&mut self, id: &Value, method: &str, params: &Value) -> Reply {
        match method {
            "autofill.fill" => self.fill(id, params),
            _ => self.handle_now(method, params).into(),
        }
    }

    fn handle_now(&mut self, method: &str, params: &Value) -> Result<Value, String> {
        let store = &self.app.data_store;
        match method {
            // ─── Store ───
            "store.unlock" => {
                let unlocked = store.unlock().map_err(|e| e.to_string())?;
                Ok(json!({"unlocked": unlocked}))
            }
            "store.lock" => {
                store.lock();
                Ok(json!({"ok": true}))
            }
            "store.reset" => {
                store.reset().map_err(|e| e.to_string())?;
                Ok(json!({"ok": true}))
            }
            "store.status" => Ok(json!({"unlocked": store.is_unlocked()})),

            // ─── Logins ───
            "login.add" => {
                let hostname = str_param(params, "hostname")?;
                let username = params.get("username").and_then(|v| v.as_str()).unwrap_or("");
                let password = str_param(params, "password")?;
                if hostname.trim().is_empty() {
                    return Err("invalid hostname: must not be empty".to_string());
                }
                let id = store.add(hostname, username, password).map_err(|e| e.to_string())?;
                Ok(json!({"id": id}))
            }
            "login.update" => {
                let id = str_param(params, "id")?;
                let username = params.get("username").and_then(|v| v.as_str());
                let password = params.get("password").and_then(|v| v.as_str());
                store.update(id, username, password).map_err(|e| e.to_string())?;
                Ok(json!({"ok": true}))
            }
            "login.list" => {
                let logins = store.list_logins().map_err(|e| e.to_string())?;
                Ok(Value::Array(logins.iter().map(login_summary).collect()))
            }
            "login.get" => {
                let id = str_param(params, "id")?;
                let reveal = params.get("reveal").and_then(|v| v.as_bool()).unwrap_or(false);
                let login = store.get(id).map_err(|e| e.to_string())?;
                let detail = ItemDetailViewModel::from(&login);
                Ok(json!({
                    "id": detail.id,
                    "title": detail.title,
                    "hostname": detail.hostname,
                    "username": detail.username,
                    "has_username": detail.has_username,
                    "password": detail.display_password(reveal),
                }))
            }
            "login.delete" => {
                let id = str_param(params, "id")?;
                store.delete(id).map_err(|e| e.to_string())?;
                Ok(json!({"ok": true}))
            }
            "login.touch" => {
                let id = str_param(params, "id")?;
                store.touch(id).map_err(|e| e.to_string())?;
                Ok(json!({"ok": true}))
            }
            "login.export" => {
                let records = store.export_sealed().map_err(|e| e.to_string())?;
                Ok(json!({"logins": records.iter().map(sealed_to_json).collect::<Vec<_>>()}))
            }
            "login.import" => {
                let records = params
                    .get("logins")
                    .and_then(|v| v.as_array())
                    .ok_or("missing logins")?
                    .iter()
                    .map(sealed_from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                let imported = store.import_sealed(&records).map_err(|e| e.to_string())?;
                Ok(json!({"imported": imported}))
            }
            "delete.confirmation" => {
                let app_label = &self.app.settings_engine.get_settings().app_label;
                let prompt = DeleteConfirmation::new(DELETE_TITLE, Some(DELETE_SUBTITLE), app_label);
                serde_json::to_value(prompt).map_err(|e| e.to_string())
            }

            // ─── Autofill ───
            "autofill.connect" => {
                self.app.autofill.on_connected();
                Ok(json!({"ok": true}))
            }
            "autofill.disconnect" => {
                self.app.autofill.on_disconnected();
                let dropped = self.fills.lock().map(|mut f| f.drain().count()).unwrap_or(0);
                Ok(json!({"dropped": dropped}))
            }
            "autofill.cancel" => {
                let key = params.get("request").map(Value::to_string).ok_or("missing request")?;
                let signal = self.fills.lock().map_err(|e| e.to_string())?.remove(&key);
                match signal {
                    Some(signal) => {
                        signal.cancel();
                        Ok(json!({"cancelled": true}))
                    }
                    None => Ok(json!({"cancelled": false})),
                }
            }

            // ─── Settings ───
            "settings.get" => {
                serde_json::to_value(self.app.settings_engine.get_settings()).map_err(|e| e.to_string())
            }
            "settings.set" => {
                let key = str_param(params, "key")?;
                let value = params.get("value").cloned().ok_or("missing value")?;
                self.app
                    .settings_engine
                    .set_value(key, value)
                    .map_err(|e| e.to_string())?;
                if key.starts_with("autofill.") {
                    self.app.reload_autofill();
                }
                Ok(json!({"ok": true}))
            }

            _ => Err(format!("unknown method: {}", method)),
        }
    }

    fn fill(&mut self, id: &Value, params: &Value) -> Reply {
        let structure = match params.get("structure").cloned() {
            Some(structure) => structure,
            None => return Reply::Now(Err("missing structure".to_string())),
        };
        let request = match serde_json::from_value::<FillRequest>(json!({"structure": structure})) {
            Ok(request) => request,
            Err(e) => return Reply::Now(Err(format!("invalid structure: {}", e))),
        };

        let key = id.to_string();
        let signal = CancellationSignal::new();
        match self.fills.lock() {
            Ok(mut fills) => {
                if fills.contains_key(&key) {
                    return Reply::Now(Err(format!("duplicate request id: {}", key)));
                }
                fills.insert(key.clone(), signal.clone());
            }
            Err(e) => return Reply::Now(Err(e.to_string())),
        }

        let (callback, receiver) = FillCallback::channel();
        self.app.autofill.on_fill_request(request, signal, callback);

        let fills = Arc::clone(&self.fills);
        Reply::Later(Box::pin(async move {
            let outcome = receiver.await;
            if let Ok(mut fills) = fills.lock() {
                fills.remove(&key);
            }
            match outcome {
                Ok(Ok(response)) => Some(serde_json::to_value(response).map_err(|e| e.to_string())),
                Ok(Err(e)) => Some(Err(e.to_string())),
                Err(_) => {
                    debug!(request = %key, "fill dropped without a reply");
                    None
                }
            }
        }))
    }
}
