//! Property and example tests for domain resolution and hostname matching.

use lockbox::services::credential_matcher::{domain_from_package, filter_by_domain, resolve_domain};
use lockbox::types::credential::ServerPassword;
use lockbox::types::structure::ParsedStructure;
use proptest::prelude::*;
use rstest::rstest;

fn login(id: usize, hostname: &str) -> ServerPassword {
    ServerPassword::new(format!("id-{}", id), hostname, "user", "pw")
}

// ─── Package heuristic ───

#[rstest]
#[case("com.example.app", Some("example"))]
#[case("org.mozilla.firefox", Some("mozilla"))]
#[case("com.google.android.gm", Some("google"))]
#[case("uk.co.bbc.news", Some("co"))]
#[case("com.my_company.app", Some("my_company"))]
#[case("example", None)]
#[case("com.example", None)]
#[case("com.example.", None)]
#[case(".example.app", None)]
#[case("com..app", None)]
#[case("", None)]
fn package_heuristic(#[case] package: &str, #[case] expected: Option<&str>) {
    assert_eq!(domain_from_package(package).as_deref(), expected);
}

#[test]
fn unresolvable_without_web_domain() {
    let parsed = ParsedStructure {
        package_id: Some("example".to_string()),
        ..Default::default()
    };
    assert_eq!(resolve_domain(&parsed, "com.example.app"), None);
}

// ─── Hostname filter ───

#[test]
fn filter_ignores_case_and_keeps_order() {
    let logins = vec![
        login(0, "https://WWW.Example.COM"),
        login(1, "https://mozilla.org"),
        login(2, "https://notexample.com"),
        login(3, "https://example.org"),
    ];
    let ids: Vec<String> = filter_by_domain("example", &logins)
        .iter()
        .map(|l| l.id.clone())
        .collect();
    assert_eq!(ids, vec!["id-0", "id-2", "id-3"]);
}

#[test]
fn filter_with_web_domain_is_substring_of_hostname() {
    let logins = vec![
        login(0, "https://accounts.example.com"),
        login(1, "https://example.com"),
    ];
    let matched = filter_by_domain("accounts.example.com", &logins);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, "id-0");
}

proptest! {
    #[test]
    fn three_word_segments_yield_the_second(
        a in "[A-Za-z0-9_]{1,10}",
        b in "[A-Za-z0-9_]{1,10}",
        rest in "[A-Za-z0-9_.]{1,20}",
    ) {
        let package = format!("{}.{}.{}", a, b, rest);
        prop_assert_eq!(domain_from_package(&package), Some(b));
    }

    #[test]
    fn fewer_than_two_dots_never_resolve(name in "[A-Za-z0-9_]{0,12}(\\.[A-Za-z0-9_]{0,12})?") {
        prop_assert_eq!(domain_from_package(&name), None);
    }

    #[test]
    fn filter_keeps_exactly_the_containing_hostnames(
        domain in "[a-zA-Z]{1,6}",
        hosts in proptest::collection::vec("[a-zA-Z.]{0,16}", 0..12),
    ) {
        let logins: Vec<ServerPassword> =
            hosts.iter().enumerate().map(|(i, h)| login(i, h)).collect();
        let matched = filter_by_domain(&domain, &logins);

        let expected: Vec<String> = logins
            .iter()
            .filter(|l| l.hostname.to_lowercase().contains(&domain.to_lowercase()))
            .map(|l| l.id.clone())
            .collect();
        let actual: Vec<String> = matched.iter().map(|l| l.id.clone()).collect();
        prop_assert_eq!(actual, expected);
    }
}
