//! Domain resolution and hostname matching for fill requests.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::credential::ServerPassword;
use crate::types::structure::ParsedStructure;

/// `x.y.z`-style package names; group 1 is taken as the organization domain.
/// `\w` is ASCII-only here.
const PACKAGE_DOMAIN_PATTERN: &str = r"^(?-u:\w)+\.((?-u:\w)+)\..+";

fn package_domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PACKAGE_DOMAIN_PATTERN).expect("package domain pattern is valid"))
}

/// Best-effort organization domain from a package identifier:
/// `com.example.app` yields `example`, anything with fewer than three
/// dot-delimited word segments yields `None`.
///
/// Known to be inaccurate (`com.google.android.gm` yields `google`,
/// `uk.co.bbc.news` yields `co`); callers must not treat it as proof of
/// domain ownership.
pub fn domain_from_package(package_name: &str) -> Option<String> {
    package_domain_regex()
        .captures(package_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Web domain reported by the structure, else the package heuristic applied
/// to the structure's package id or, failing that, the activity package.
pub fn resolve_domain(parsed: &ParsedStructure, activity_package: &str) -> Option<String> {
    if let Some(domain) = &parsed.web_domain {
        return Some(domain.clone());
    }
    let package = parsed.package_id.as_deref().unwrap_or(activity_package);
    domain_from_package(package)
}

/// Logins whose hostname contains `domain`, ignoring case. Order is kept.
///
/// Plain substring containment: `example` also matches `notexample.com`.
pub fn filter_by_domain<'a, I>(domain: &str, credentials: I) -> Vec<ServerPassword>
where
    I: IntoIterator<Item = &'a ServerPassword>,
{
    let needle = domain.to_lowercase();
    credentials
        .into_iter()
        .filter(|login| login.hostname.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
