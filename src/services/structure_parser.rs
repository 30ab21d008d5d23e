//! Extracts field anchors from the view hierarchy of a fill request.
//!
//! Nodes are visited depth-first in pre-order, window by window; the first
//! node that satisfies a query wins.

use crate::types::structure::{AutofillId, AutofillType, ParsedStructure, ViewNode, ViewStructure};

/// Autofill hint and keyword set identifying a username field.
pub const USERNAME_KEYWORDS: &[&str] = &["username", "emailAddress", "email", "user name"];

/// Autofill hint and keyword set identifying a password field.
pub const PASSWORD_KEYWORDS: &[&str] = &["password"];

/// Builds a [`ParsedStructure`] from a [`ViewStructure`].
pub struct ParsedStructureBuilder<'a> {
    structure: &'a ViewStructure,
}

impl<'a> ParsedStructureBuilder<'a> {
    pub fn new(structure: &'a ViewStructure) -> Self {
        Self { structure }
    }

    pub fn build(&self) -> ParsedStructure {
        let password_id = self.autofill_id_for(PASSWORD_KEYWORDS, None);
        let username_id = self.autofill_id_for(USERNAME_KEYWORDS, password_id);

        ParsedStructure {
            username_id,
            password_id,
            package_id: self.search(|node| non_empty(node.id_package.as_deref())),
            web_domain: self.search(|node| non_empty(node.web_domain.as_deref())),
        }
    }

    fn autofill_id_for(&self, keywords: &[&str], exclude: Option<AutofillId>) -> Option<AutofillId> {
        self.search(|node| {
            let id = node.autofill_id?;
            if Some(id) == exclude {
                return None;
            }
            if is_fillable_text_field(node, keywords) || is_fillable_html_input(node, keywords) {
                Some(id)
            } else {
                None
            }
        })
    }

    fn search<T>(&self, mut visit: impl FnMut(&ViewNode) -> Option<T>) -> Option<T> {
        let mut stack: Vec<&ViewNode> = self.structure.windows.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if let Some(found) = visit(node) {
                return Some(found);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn contains_keyword(haystack: &str, keywords: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    keywords
        .iter()
        .any(|keyword| haystack.contains(&keyword.to_lowercase()))
}

fn is_fillable_text_field(node: &ViewNode, keywords: &[&str]) -> bool {
    if node.autofill_type != AutofillType::Text {
        return false;
    }
    node.id_entry
        .iter()
        .chain(node.hint.iter())
        .chain(node.autofill_hints.iter())
        .any(|candidate| contains_keyword(candidate, keywords))
}

fn is_fillable_html_input(node: &ViewNode, keywords: &[&str]) -> bool {
    match &node.html_info {
        Some(info) if info.tag.eq_ignore_ascii_case("input") => info
            .attributes
            .iter()
            .any(|(_, value)| contains_keyword(value, keywords)),
        _ => false,
    }
}
