//! Presentation models for the login detail screen and the delete prompt.

use std::sync::OnceLock;

use regex::Regex;

use crate::services::strings::format_template;
use crate::types::credential::ServerPassword;
use crate::types::item::{DeleteConfirmation, ItemDetailViewModel};

const MASK_CHAR: char = '\u{2022}';

fn www_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^www\d*\.").expect("www prefix pattern is valid"))
}

/// Display title for a hostname: scheme and `www.` (or `www2.` etc.) removed.
pub fn title_from_hostname(hostname: &str) -> String {
    let without_scheme = hostname
        .strip_prefix("http://")
        .or_else(|| hostname.strip_prefix("https://"))
        .unwrap_or(hostname);
    www_prefix().replace(without_scheme, "").into_owned()
}

impl From<&ServerPassword> for ItemDetailViewModel {
    fn from(login: &ServerPassword) -> Self {
        Self {
            id: login.id.clone(),
            title: title_from_hostname(&login.hostname),
            hostname: login.hostname.clone(),
            username: login.username.clone(),
            has_username: !login.username.is_empty(),
            password: login.password.clone(),
        }
    }
}

impl ItemDetailViewModel {
    /// The password as it should be rendered: plain when visible, otherwise
    /// one mask character per password character.
    pub fn display_password(&self, visible: bool) -> String {
        if visible {
            self.password.clone()
        } else {
            std::iter::repeat(MASK_CHAR).take(self.password.chars().count()).collect()
        }
    }
}

impl DeleteConfirmation {
    /// Fills `%1$s` in either template with the app label.
    pub fn new(title_template: &str, subtitle_template: Option<&str>, app_label: &str) -> Self {
        Self {
            title: format_template(title_template, app_label),
            subtitle: subtitle_template.map(|t| format_template(t, app_label)),
        }
    }
}
