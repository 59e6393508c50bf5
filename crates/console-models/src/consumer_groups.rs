use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Resource type marker of consumer groups.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerGroupsType {
    #[serde(rename = "consumerGroups")]
    ConsumerGroups,
}

/// ConsumerGroup is a consumer group which has committed offsets
/// for at least one partition of a topic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConsumerGroup {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConsumerGroupsType,
    pub attributes: ConsumerGroupAttributes,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerGroupAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_consumer_group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ConsumerGroup {
    pub fn member_count(&self) -> usize {
        self.attributes.members.as_ref().map(Vec::len).unwrap_or_default()
    }
}
