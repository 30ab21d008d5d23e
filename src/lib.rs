//! Lockbox: autofill core of a password manager.
//!
//! Parses the host's view structure into field anchors, resolves a domain,
//! matches stored logins against it and builds fill responses. The library
//! crate exposes all modules for use by the RPC binary and integration tests.

pub mod app;
pub mod database;
pub mod logging;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
