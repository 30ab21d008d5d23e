//! Turns parsed anchors and matching logins into a fill response.

use tracing::debug;

use crate::services::credential_matcher::{filter_by_domain, resolve_domain};
use crate::services::strings::format_template;
use crate::types::credential::ServerPassword;
use crate::types::errors::FillError;
use crate::types::fill::{Dataset, DatasetValue, FillResponse};
use crate::types::structure::ParsedStructure;

/// Labels attached to suggested values.
#[derive(Debug, Clone)]
pub struct FillLabels {
    /// Template for the password label; `%1$s` is the username.
    pub password_template: String,
}

impl Default for FillLabels {
    fn default() -> Self {
        Self {
            password_template: "Password for %1$s".to_string(),
        }
    }
}

/// Checks that run before any credential lookup: a fillable field must
/// exist, then a domain must resolve. Returns the resolved domain.
pub fn prepare(parsed: &ParsedStructure, activity_package: &str) -> Result<String, FillError> {
    if !parsed.has_fillable_field() {
        return Err(FillError::MissingFields);
    }
    resolve_domain(parsed, activity_package).ok_or(FillError::UnresolvableDomain)
}

/// Filters `credentials` by `domain` and builds the response.
pub fn respond(
    parsed: &ParsedStructure,
    domain: &str,
    credentials: &[ServerPassword],
    labels: &FillLabels,
) -> Result<FillResponse, FillError> {
    let candidates = filter_by_domain(domain, credentials);
    debug!(domain, total = credentials.len(), matched = candidates.len(), "filtered logins");
    build_fill_response(parsed, &candidates, labels)
}

/// One dataset per login. Fails with [`FillError::NoCandidates`] on an empty
/// list and [`FillError::MissingFields`] when no anchor is present.
pub fn build_fill_response(
    parsed: &ParsedStructure,
    candidates: &[ServerPassword],
    labels: &FillLabels,
) -> Result<FillResponse, FillError> {
    if candidates.is_empty() {
        return Err(FillError::NoCandidates);
    }
    if !parsed.has_fillable_field() {
        return Err(FillError::MissingFields);
    }

    let datasets = candidates
        .iter()
        .map(|login| dataset_for(parsed, login, labels))
        .collect();
    Ok(FillResponse { datasets })
}

fn dataset_for(parsed: &ParsedStructure, login: &ServerPassword, labels: &FillLabels) -> Dataset {
    let mut values = Vec::with_capacity(2);

    if let Some(anchor) = parsed.username_id {
        values.push(DatasetValue {
            anchor,
            value: login.username.clone(),
            label: login.username.clone(),
        });
    }

    if let Some(anchor) = parsed.password_id {
        values.push(DatasetValue {
            anchor,
            value: login.password.clone(),
            label: format_template(&labels.password_template, &login.username),
        });
    }

    Dataset { values }
}
