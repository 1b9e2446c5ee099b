use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Read-only description of an item, cached once per acquisition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub item_id: String,
    pub name: String,
    /// Backend-specific attributes (vendor, category, ...).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl ItemDetail {
    pub fn new(item_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_detail_serialization_skips_empty_attributes() {
        let detail = ItemDetail::new("100012043978", "Limited bottle");
        let json = serde_json::to_string(&detail).unwrap();
        assert!(!json.contains("attributes"));

        let parsed: ItemDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, detail);
    }

    #[test]
    fn test_item_detail_with_attribute() {
        let detail = ItemDetail::new("1", "Item").with_attribute("vendor", "official");
        assert_eq!(detail.attributes.get("vendor").map(String::as_str), Some("official"));
    }
}
