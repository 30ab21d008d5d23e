use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier tying a suggested value to one on-screen input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AutofillId(pub u64);

impl fmt::Display for AutofillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of value a view accepts when autofilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutofillType {
    #[default]
    None,
    Text,
    Toggle,
    List,
    Date,
}

/// HTML metadata attached to nodes rendered from web content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HtmlInfo {
    pub tag: String,
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
}

/// One node of the view hierarchy supplied by the host with a fill request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewNode {
    pub autofill_id: Option<AutofillId>,
    pub autofill_type: AutofillType,
    pub id_package: Option<String>,
    pub id_entry: Option<String>,
    pub hint: Option<String>,
    pub autofill_hints: Vec<String>,
    pub html_info: Option<HtmlInfo>,
    pub web_domain: Option<String>,
    pub children: Vec<ViewNode>,
}

/// The view hierarchy of the activity a fill request was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewStructure {
    pub activity_package: String,
    #[serde(default)]
    pub windows: Vec<ViewNode>,
}

/// Field anchors and metadata extracted from a [`ViewStructure`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedStructure {
    pub username_id: Option<AutofillId>,
    pub password_id: Option<AutofillId>,
    pub package_id: Option<String>,
    pub web_domain: Option<String>,
}

impl ParsedStructure {
    /// True when at least one of the username/password anchors was found.
    pub fn has_fillable_field(&self) -> bool {
        self.username_id.is_some() || self.password_id.is_some()
    }
}
