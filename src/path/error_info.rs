use super::field_path::{ErrorKey, FieldLocation, RECORD_PREFIX, SUB_OBJECT_PREFIX};
use crate::core::SubItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last known error state for one record, from the server or from local
/// validation. Both sources key `fields` by the same wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub message: Option<String>,
    pub fields: BTreeMap<String, String>,
    /// `subitems.<id>.<field>` entries re-keyed per item for display lookup.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_items: BTreeMap<SubItemId, BTreeMap<String, String>>,
}

impl ErrorInfo {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn from_field_errors(message: Option<String>, fields: BTreeMap<String, String>) -> Self {
        let mut sub_items: BTreeMap<SubItemId, BTreeMap<String, String>> = BTreeMap::new();
        for (key, text) in &fields {
            if let Ok(ErrorKey::Field(FieldLocation::SubItem { sub_item_id, field })) =
                ErrorKey::parse(key)
            {
                sub_items
                    .entry(sub_item_id)
                    .or_default()
                    .insert(field, text.clone());
            }
        }
        Self {
            message,
            fields,
            sub_items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.fields.is_empty()
    }

    /// Looks up by bare field name, then `record.<field>`, then
    /// `subobject.<field>`.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        if let Some(text) = self.fields.get(field) {
            return Some(text);
        }
        [RECORD_PREFIX, SUB_OBJECT_PREFIX]
            .iter()
            .find_map(|prefix| self.fields.get(&format!("{prefix}.{field}")))
            .map(String::as_str)
    }

    pub fn sub_item_field_error(&self, sub_item_id: &str, field: &str) -> Option<&str> {
        self.sub_items
            .get(sub_item_id)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn lookup_order_prefers_bare_then_record_then_subobject() {
        let info = ErrorInfo::from_field_errors(
            None,
            fields(&[
                ("record.name", "top"),
                ("subobject.name", "nested"),
                ("subobject.mass", "heavy"),
            ]),
        );
        assert_eq!(info.field_error("name"), Some("top"));
        assert_eq!(info.field_error("mass"), Some("heavy"));
        assert_eq!(info.field_error("missing"), None);

        let bare =
            ErrorInfo::from_field_errors(None, fields(&[("name", "bare"), ("record.name", "top")]));
        assert_eq!(bare.field_error("name"), Some("bare"));
    }

    #[test]
    fn sub_item_errors_are_indexed_per_item() {
        let info = ErrorInfo::from_field_errors(
            Some("partial".into()),
            fields(&[("subitems.s1.key", "duplicate"), ("record.bmk", "bad")]),
        );
        assert_eq!(info.sub_item_field_error("s1", "key"), Some("duplicate"));
        assert_eq!(info.sub_item_field_error("s2", "key"), None);
        assert_eq!(info.field_error("key"), None);
    }

    #[test]
    fn message_only_is_not_empty() {
        assert!(!ErrorInfo::with_message("rejected").is_empty());
        assert!(ErrorInfo::default().is_empty());
    }
}
