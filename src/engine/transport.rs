use crate::core::{RecordId, TransportError};
use crate::pending::RecordPatchPayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The server's outcome for one record of a batch.
///
/// `fields` maps field-path keys (`record.bmk`, `subobject`,
/// `subitems.4.key`, ...) to messages. When it is present and non-empty only
/// the listed paths were rejected; every other submitted field was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResultItem {
    pub record_id: RecordId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl BatchResultItem {
    pub fn success(record_id: impl Into<RecordId>) -> Self {
        Self {
            record_id: record_id.into(),
            success: true,
            error: None,
            fields: None,
        }
    }

    pub fn failure(record_id: impl Into<RecordId>, message: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            success: false,
            error: Some(message.into()),
            fields: None,
        }
    }

    pub fn field_failures<I, K, V>(record_id: impl Into<RecordId>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            record_id: record_id.into(),
            success: false,
            error: None,
            fields: Some(
                fields
                    .into_iter()
                    .map(|(key, message)| (key.into(), message.into()))
                    .collect(),
            ),
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Field detail, if the server reported any.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        self.fields.as_ref().filter(|fields| !fields.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    #[serde(default)]
    pub results: Vec<BatchResultItem>,
    #[serde(default)]
    pub success_count: usize,
    #[serde(default)]
    pub failure_count: usize,
}

impl BatchResponse {
    pub fn from_results(results: Vec<BatchResultItem>) -> Self {
        let success_count = results.iter().filter(|item| item.success).count();
        Self {
            failure_count: results.len() - success_count,
            success_count,
            results,
        }
    }
}

/// Performs the single batch-update call for a submission.
#[async_trait]
pub trait BatchTransport: Send + Sync {
    async fn submit_batch(
        &self,
        payloads: Vec<RecordPatchPayload>,
    ) -> std::result::Result<BatchResponse, TransportError>;
}
