use crate::{Client, Error};
use chrono::{DateTime, SecondsFormat, Utc};
use console_models::{DataListResponse, DataResponse, Topic, TopicSummary};

/// Fields requested when listing topics.
pub const LIST_FIELDS: &str = "name,internal,partitions,recordCount";
/// Fields requested when describing a single topic.
pub const DESCRIBE_FIELDS: &str =
    "name,internal,partitions,authorizedOperations,configs,recordCount,totalLeaderLogBytes";

/// OffsetSpec selects which offsets the backend resolves for each partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetSpec {
    Earliest,
    Latest,
    MaxTimestamp,
    Timestamp(DateTime<Utc>),
}

impl OffsetSpec {
    pub fn as_param(&self) -> String {
        match self {
            OffsetSpec::Earliest => "earliest".to_string(),
            OffsetSpec::Latest => "latest".to_string(),
            OffsetSpec::MaxTimestamp => "maxTimestamp".to_string(),
            OffsetSpec::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl std::str::FromStr for OffsetSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earliest" => Ok(OffsetSpec::Earliest),
            "latest" => Ok(OffsetSpec::Latest),
            "maxTimestamp" | "max-timestamp" => Ok(OffsetSpec::MaxTimestamp),
            other => DateTime::parse_from_rfc3339(other)
                .map(|ts| OffsetSpec::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|_| {
                    format!(
                        "invalid offset spec '{other}': expected earliest, latest, maxTimestamp, or an RFC 3339 timestamp"
                    )
                }),
        }
    }
}

impl Client {
    /// List the topics of Kafka cluster `kafka_id`.
    #[tracing::instrument(skip(self), err)]
    pub async fn list_topics(&self, kafka_id: &str) -> Result<Vec<TopicSummary>, Error> {
        let doc: DataListResponse<TopicSummary> = self
            .api_get(
                "topics",
                &["api", "kafkas", kafka_id, "topics"],
                &[("fields[topics]", LIST_FIELDS.to_string())],
            )
            .await?;

        tracing::debug!(count = doc.data.len(), "listed topics");
        Ok(doc.data)
    }

    /// Describe topic `topic_id` of Kafka cluster `kafka_id`.
    #[tracing::instrument(skip(self), err)]
    pub async fn describe_topic(
        &self,
        kafka_id: &str,
        topic_id: &str,
        offset_spec: Option<OffsetSpec>,
    ) -> Result<Topic, Error> {
        let mut query = vec![("fields[topics]", DESCRIBE_FIELDS.to_string())];
        if let Some(spec) = offset_spec {
            query.push(("offsetSpec", spec.as_param()));
        }

        let doc: DataResponse<Topic> = self
            .api_get("topic", &["api", "kafkas", kafka_id, "topics", topic_id], &query)
            .await?;

        Ok(doc.data)
    }
}
