// Lockbox services
// The autofill flow (parser, matcher, response builder, service) and its
// collaborators: dispatcher, data store, crypto, settings, presentation models.

pub mod autofill_service;
pub mod credential_matcher;
pub mod crypto_service;
pub mod data_store;
pub mod dispatcher;
pub mod fill_response;
pub mod item_detail;
pub mod settings_engine;
pub mod strings;
pub mod structure_parser;
