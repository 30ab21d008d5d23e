//! Unit tests for the item detail view model and delete prompt.

use lockbox::services::item_detail::title_from_hostname;
use lockbox::services::strings::{DELETE_SUBTITLE, DELETE_TITLE};
use lockbox::types::credential::ServerPassword;
use lockbox::types::item::{DeleteConfirmation, ItemDetailViewModel};
use rstest::rstest;

#[rstest]
#[case("https://www.example.com", "example.com")]
#[case("http://www2.example.com/login", "example.com/login")]
#[case("https://accounts.example.com", "accounts.example.com")]
#[case("example.com", "example.com")]
#[case("www.example.com", "example.com")]
#[case("ftp://www.example.com", "ftp://www.example.com")]
#[case("https://wwwexample.com", "wwwexample.com")]
fn title_strips_scheme_and_www(#[case] hostname: &str, #[case] expected: &str) {
    assert_eq!(title_from_hostname(hostname), expected);
}

#[test]
fn view_model_from_login() {
    let login = ServerPassword::new("id-1", "https://www.example.com", "alice", "hunter2");
    let detail = ItemDetailViewModel::from(&login);
    assert_eq!(detail.id, "id-1");
    assert_eq!(detail.title, "example.com");
    assert_eq!(detail.hostname, "https://www.example.com");
    assert!(detail.has_username);
    assert_eq!(detail.display_password(true), "hunter2");
}

#[test]
fn empty_username_is_flagged() {
    let login = ServerPassword::new("id-2", "https://example.com", "", "pw");
    assert!(!ItemDetailViewModel::from(&login).has_username);
}

#[test]
fn hidden_password_masks_each_character() {
    let login = ServerPassword::new("id-3", "https://example.com", "bob", "pässwörd");
    let masked = ItemDetailViewModel::from(&login).display_password(false);
    assert_eq!(masked.chars().count(), 8);
    assert!(masked.chars().all(|c| c == '\u{2022}'));
}

#[test]
fn delete_confirmation_uses_app_label() {
    let prompt = DeleteConfirmation::new(DELETE_TITLE, Some(DELETE_SUBTITLE), "Lockbox");
    assert_eq!(prompt.title, "Delete this login?");
    assert_eq!(
        prompt.subtitle.as_deref(),
        Some("This login will be removed from Lockbox on all synced devices.")
    );
}

#[test]
fn delete_confirmation_without_subtitle() {
    let prompt = DeleteConfirmation::new("Remove from %1$s?", None, "Vault");
    assert_eq!(prompt.title, "Remove from Vault?");
    assert!(prompt.subtitle.is_none());
}
