use serde::{Deserialize, Serialize};

use super::structure::{AutofillId, ViewStructure};

/// A host-issued request for credential suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillRequest {
    pub structure: ViewStructure,
}

/// A single value bound to a field anchor, with the label the host shows for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetValue {
    pub anchor: AutofillId,
    pub value: String,
    pub label: String,
}

/// One credential's values bound to the form's anchors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub values: Vec<DatasetValue>,
}

impl Dataset {
    /// Returns the value bound to the given anchor, if any.
    pub fn value_for(&self, anchor: AutofillId) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.anchor == anchor)
            .map(|v| v.value.as_str())
    }
}

/// Ordered candidate datasets returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FillResponse {
    pub datasets: Vec<Dataset>,
}
