use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Resource type marker of topic records, which must be exactly "records".
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordsType {
    #[serde(rename = "records")]
    Records,
}

/// RecordResource is a topic record as returned by the records endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecordResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: RecordsType,
    pub attributes: Message,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Message is a single record of a topic partition.
/// Messages are never modified once fetched, and are identified by their
/// [`MessageId`] rather than by their content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub partition: i32,
    pub offset: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_type: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Size of the record on the wire, in bytes.
    pub size: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// MessageId is the identity of a Message within its topic.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId {
    pub partition: i32,
    pub offset: i64,
}

impl Message {
    pub fn id(&self) -> MessageId {
        MessageId {
            partition: self.partition,
            offset: self.offset,
        }
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.partition, self.offset)
    }
}
