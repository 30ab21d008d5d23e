//! Lockbox RPC Server: JSON-RPC over stdin/stdout for the host platform.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"autofill.fill", "params":{"structure":{...}}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Fill responses may arrive out of order; a cancelled fill gets no response.

use std::path::PathBuf;
use std::time::Instant;

use lockbox::app::App;
use lockbox::logging;
use lockbox::rpc_handler::{Reply, RpcHandler};
use lockbox::services::settings_engine::SettingsEngineTrait;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Fixed-window limit on requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

/// `LOCKBOX_DATA_DIR` holds both `settings.json` and the database when set;
/// otherwise the platform config and data dirs are used.
fn data_dir() -> Option<PathBuf> {
    std::env::var("LOCKBOX_DATA_DIR").ok().map(PathBuf::from)
}

#[tokio::main]
async fn main() {
    let master_password = std::env::var("LOCKBOX_MASTER_PASSWORD").unwrap_or_default();
    let dir = data_dir();
    let settings_path = dir
        .as_ref()
        .map(|d| d.join("settings.json").to_string_lossy().to_string());
    let app = match App::open(settings_path, dir, master_password) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("failed to initialize lockbox: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = logging::init(&app.settings_engine.get_settings().logging) {
        eprintln!("{}", e);
    }
    app.autofill.on_connected();
    let mut handler = RpcHandler::new(app);

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = out_rx.recv().await {
            let line = format!("{}\n", message);
            if stdout.write_all(line.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let _ = out_tx.send(json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));
    info!("lockbox rpc ready");

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = out_tx.send(json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            let _ = out_tx.send(json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        match handler.handle(&id, method, &params) {
            Reply::Now(result) => {
                let _ = out_tx.send(response(id, result));
            }
            Reply::Later(pending) => {
                let out_tx = out_tx.clone();
                tokio::spawn(async move {
                    if let Some(result) = pending.await {
                        let _ = out_tx.send(response(id, result));
                    }
                });
            }
        }
    }

    handler.app_mut().shutdown();
    drop(out_tx);
    let _ = writer.await;
}

fn response(id: Value, result: Result<Value, String>) -> Value {
    match result {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => json!({"id": id, "error": err}),
    }
}
