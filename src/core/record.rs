use super::value::{FieldMap, FieldValue};
use serde::{Deserialize, Serialize};

pub type RecordId = String;
pub type SubItemId = String;

/// Canonical record as the caller knows it.
///
/// The engine never mutates one of these; reconciliation hands back merged
/// copies for the caller to apply to its own state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_object: Option<FieldMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_items: Option<Vec<SubItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubItem {
    pub id: SubItemId,
    #[serde(default)]
    pub fields: FieldMap,
}

impl Record {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: FieldMap::new(),
            sub_object: None,
            sub_items: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn with_sub_object_field(
        mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.sub_object
            .get_or_insert_with(FieldMap::new)
            .insert(field.into(), value.into());
        self
    }

    pub fn with_sub_item(mut self, item: SubItem) -> Self {
        self.sub_items.get_or_insert_with(Vec::new).push(item);
        self
    }

    pub fn field(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn sub_object_field(&self, field: &str) -> Option<&FieldValue> {
        self.sub_object.as_ref().and_then(|fields| fields.get(field))
    }

    pub fn sub_item(&self, sub_item_id: &str) -> Option<&SubItem> {
        self.sub_items
            .as_deref()
            .and_then(|items| items.iter().find(|item| item.id == sub_item_id))
    }

    pub fn sub_item_mut(&mut self, sub_item_id: &str) -> Option<&mut SubItem> {
        self.sub_items
            .as_mut()
            .and_then(|items| items.iter_mut().find(|item| item.id == sub_item_id))
    }
}

impl SubItem {
    pub fn new(id: impl Into<SubItemId>) -> Self {
        Self {
            id: id.into(),
            fields: FieldMap::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }
}
