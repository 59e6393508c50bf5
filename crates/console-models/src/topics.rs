use crate::OrError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Resource type marker of topics, which must be exactly "topics".
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicsType {
    #[serde(rename = "topics")]
    Topics,
}

/// TopicSummary is a topic as it's returned by the topic listing,
/// which includes only a subset of its attributes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TopicsType,
    pub attributes: TopicSummaryAttributes,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummaryAttributes {
    pub name: String,
    pub internal: bool,
    pub partitions: Vec<Partition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Topic is a fully-described topic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Topic {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TopicsType,
    pub attributes: TopicAttributes,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicAttributes {
    pub name: String,
    pub internal: bool,
    pub partitions: Vec<Partition>,
    /// Operations the current user may perform upon the topic.
    pub authorized_operations: OrError<Vec<String>>,
    /// Topic configuration entries, keyed on configuration name.
    pub configs: OrError<BTreeMap<String, ConfigEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_leader_log_bytes: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    pub partition: i32,
    pub leader_id: i32,
    pub replicas: Vec<Replica>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offsets: Option<PartitionOffsets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_local_storage: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Replica {
    pub node_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_rack: Option<String>,
    pub in_sync: bool,
    /// Log storage of this replica on its broker, which is an error
    /// if the broker's log directories could not be described.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_storage: Option<OrError<ReplicaLocalStorage>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaLocalStorage {
    pub size: i64,
    pub offset_lag: i64,
    pub future: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartitionOffsets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest: Option<OffsetInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<OffsetInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_timestamp: Option<OffsetInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<OffsetInfo>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OffsetInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_epoch: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    /// Value of the entry, which the backend omits for sensitive entries.
    pub value: Option<String>,
    pub source: String,
    pub sensitive: bool,
    pub read_only: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TopicSummary {
    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn partition_count(&self) -> usize {
        self.attributes.partitions.len()
    }

    /// Number of records in the topic, falling back to the sum of the
    /// record counts of its partitions.
    pub fn record_count(&self) -> Option<i64> {
        self.attributes
            .record_count
            .or_else(|| sum_record_counts(&self.attributes.partitions))
    }
}

impl Topic {
    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn partition_count(&self) -> usize {
        self.attributes.partitions.len()
    }

    pub fn record_count(&self) -> Option<i64> {
        self.attributes
            .record_count
            .or_else(|| sum_record_counts(&self.attributes.partitions))
    }
}

impl Partition {
    /// Returns the replica which currently leads this partition.
    pub fn leader(&self) -> Option<&Replica> {
        self.replicas.iter().find(|r| r.node_id == self.leader_id)
    }

    pub fn in_sync_count(&self) -> usize {
        self.replicas.iter().filter(|r| r.in_sync).count()
    }
}

fn sum_record_counts(partitions: &[Partition]) -> Option<i64> {
    if partitions.is_empty() {
        return None;
    }
    Some(partitions.iter().filter_map(|p| p.record_count).sum())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{validate, DataListResponse, DataResponse};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn topic_fixture() -> Value {
        json!({
            "data": {
                "id": "Xm3kTwUhRf2SJRTuS1gXrA",
                "type": "topics",
                "attributes": {
                    "name": "orders",
                    "internal": false,
                    "partitions": [
                        {
                            "partition": 0,
                            "leaderId": 1,
                            "replicas": [
                                {
                                    "nodeId": 1,
                                    "nodeRack": "us-east-1a",
                                    "inSync": true,
                                    "localStorage": {"size": 2048, "offsetLag": 0, "future": false},
                                },
                                {
                                    "nodeId": 2,
                                    "inSync": false,
                                    "localStorage": {
                                        "meta": {"type": "error"},
                                        "title": "Unable to describe log dirs",
                                        "detail": "timed out",
                                    },
                                },
                            ],
                            "offsets": {
                                "earliest": {"offset": 0},
                                "latest": {"offset": 40, "leaderEpoch": 3},
                            },
                            "recordCount": 40,
                            "leaderLocalStorage": 2048,
                        },
                        {
                            "partition": 1,
                            "leaderId": 2,
                            "replicas": [{"nodeId": 2, "inSync": true}],
                            "offsets": null,
                            "recordCount": 2,
                        },
                    ],
                    "authorizedOperations": ["READ", "DESCRIBE"],
                    "configs": {
                        "cleanup.policy": {
                            "value": "delete",
                            "source": "DEFAULT_CONFIG",
                            "sensitive": false,
                            "readOnly": false,
                            "type": "LIST",
                        },
                    },
                    "totalLeaderLogBytes": 2048,
                    "consumerGroups": {"data": []},
                },
            },
        })
    }

    #[test]
    fn topic_with_replica_storage_error_validates() {
        let doc: DataResponse<Topic> = validate("topic", &serde_json::to_vec(&topic_fixture()).unwrap()).unwrap();
        let topic = doc.data;

        assert_eq!(topic.name(), "orders");
        assert_eq!(topic.partition_count(), 2);
        // Absent topic-level count is summed from partitions.
        assert_eq!(topic.record_count(), Some(42));

        let p0 = &topic.attributes.partitions[0];
        assert_eq!(p0.leader().map(|r| r.node_id), Some(1));
        assert_eq!(p0.in_sync_count(), 1);

        let storage = p0.replicas[0].local_storage.as_ref().unwrap();
        assert_eq!(storage.value().map(|s| s.size), Some(2048));
        let storage = p0.replicas[1].local_storage.as_ref().unwrap();
        assert_eq!(
            storage.error().map(|e| e.title.as_str()),
            Some("Unable to describe log dirs")
        );

        assert_eq!(topic.attributes.partitions[1].offsets, None);
        assert!(topic.attributes.extra.contains_key("consumerGroups"));
    }

    #[test]
    fn unknown_fields_pass_through() {
        let mut fixture = topic_fixture();
        // Explicit nulls are read as absent, and are not written back.
        fixture["data"]["attributes"]["partitions"][1]
            .as_object_mut()
            .unwrap()
            .remove("offsets");

        let doc: DataResponse<Topic> = serde_json::from_value(fixture.clone()).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), fixture);
    }

    #[test]
    fn topic_missing_configs_is_rejected() {
        let mut fixture = topic_fixture();
        fixture["data"]["attributes"]
            .as_object_mut()
            .unwrap()
            .remove("configs");

        let err = validate::<DataResponse<Topic>>("topic", &serde_json::to_vec(&fixture).unwrap())
            .unwrap_err();
        assert!(err.source.to_string().contains("missing field `configs`"), "{err:?}");
    }

    #[test]
    fn topic_of_wrong_type_is_rejected() {
        let mut fixture = topic_fixture();
        fixture["data"]["type"] = json!("nodes");

        assert!(validate::<DataResponse<Topic>>("topic", &serde_json::to_vec(&fixture).unwrap()).is_err());
    }

    #[test]
    fn topic_listing_validates_subset_of_attributes() {
        let body = json!({
            "data": [
                {
                    "id": "a",
                    "type": "topics",
                    "attributes": {"name": "orders", "internal": false, "partitions": [], "recordCount": 7},
                },
                {
                    "id": "b",
                    "type": "topics",
                    "attributes": {"name": "__consumer_offsets", "internal": true, "partitions": []},
                },
            ],
            "meta": {"page": {"total": 2}},
        });

        let doc: DataListResponse<TopicSummary> =
            validate("topics", &serde_json::to_vec(&body).unwrap()).unwrap();

        let names: Vec<_> = doc.data.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["orders", "__consumer_offsets"]);
        assert_eq!(doc.data[0].record_count(), Some(7));
        assert_eq!(doc.data[1].record_count(), None);
        assert!(doc.extra.contains_key("meta"));
    }

    #[test]
    fn partition_with_mistyped_leader_is_rejected() {
        let body = json!({
            "data": [{
                "id": "a",
                "type": "topics",
                "attributes": {
                    "name": "orders",
                    "internal": false,
                    "partitions": [{"partition": 0, "leaderId": "one", "replicas": []}],
                },
            }],
        });

        assert!(
            validate::<DataListResponse<TopicSummary>>("topics", &serde_json::to_vec(&body).unwrap())
                .is_err()
        );
    }
}
