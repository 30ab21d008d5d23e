//! Display strings and the `%1$s` placeholder convention they use.

/// Positional placeholder substituted by [`format_template`].
pub const PLACEHOLDER: &str = "%1$s";

pub const DELETE_TITLE: &str = "Delete this login?";
pub const DELETE_SUBTITLE: &str = "This login will be removed from %1$s on all synced devices.";

/// Substitutes `arg` for every `%1$s` in `template`. Templates without the
/// placeholder are returned unchanged.
pub fn format_template(template: &str, arg: &str) -> String {
    if template.contains(PLACEHOLDER) {
        template.replace(PLACEHOLDER, arg)
    } else {
        template.to_string()
    }
}
