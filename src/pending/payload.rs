use super::patch::Patch;
use crate::core::{FieldMap, FieldValue, RecordId, SubItemId};
use serde::{Deserialize, Serialize};

/// One record's entry in the outgoing batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPatchPayload {
    pub id: RecordId,
    pub patch: RecordPatch,
}

/// Server-shaped patch: top-level fields inline, the nested sub-object under
/// `subobject`, sub-item patches under `subitems`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(flatten)]
    pub fields: FieldMap,
    #[serde(rename = "subobject", default, skip_serializing_if = "Option::is_none")]
    pub sub_object: Option<FieldMap>,
    #[serde(rename = "subitems", default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<SubItemPatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubItemPatch {
    pub id: SubItemId,
    #[serde(flatten)]
    pub fields: FieldMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadOptions {
    pub include_sub_items: bool,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self {
            include_sub_items: true,
        }
    }
}

/// A cleared sub-object text field means "delete this value".
pub fn sub_object_wire_value(staged: &FieldValue) -> FieldValue {
    match staged {
        FieldValue::Text(s) if s.is_empty() => FieldValue::Null,
        other => other.clone(),
    }
}

/// Builds the wire patch for `record_id`, or `None` when nothing would be sent.
pub fn build_patch_payload(
    record_id: &str,
    patch: &Patch,
    options: PayloadOptions,
) -> Option<RecordPatchPayload> {
    let outgoing = patch.outgoing(options.include_sub_items);
    if outgoing.is_empty() {
        return None;
    }

    let sub_object = (!outgoing.sub_object().is_empty()).then(|| {
        outgoing
            .sub_object()
            .iter()
            .map(|(field, value)| (field.clone(), sub_object_wire_value(value)))
            .collect::<FieldMap>()
    });

    let sub_items = outgoing
        .sub_items()
        .iter()
        .map(|(id, fields)| SubItemPatch {
            id: id.clone(),
            fields: fields.clone(),
        })
        .collect();

    Some(RecordPatchPayload {
        id: record_id.to_string(),
        patch: RecordPatch {
            fields: outgoing.top_level().clone(),
            sub_object,
            sub_items,
        },
    })
}
