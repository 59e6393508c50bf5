use crate::{Client, Error};
use chrono::{DateTime, SecondsFormat, Utc};
use console_models::{DataListResponse, Message, RecordResource};

/// Fields requested of each record.
pub const RECORD_FIELDS: &str = "partition,offset,timestamp,timestampType,headers,key,value,size";

/// RecordsQuery is a request for a page of records of a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordsQuery {
    /// Partition to read, or all partitions if None.
    pub partition: Option<i32>,
    /// Maximum number of records to return.
    pub limit: u32,
    /// Return only records at or after this offset.
    pub offset: Option<i64>,
    /// Return only records at or after this timestamp.
    pub timestamp: Option<DateTime<Utc>>,
}

impl RecordsQuery {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("fields[records]", RECORD_FIELDS.to_string()),
            ("page[size]", self.limit.to_string()),
        ];
        if let Some(partition) = self.partition {
            pairs.push(("filter[partition]", partition.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("filter[offset]", format!("gte,{offset}")));
        }
        if let Some(timestamp) = self.timestamp {
            pairs.push((
                "filter[timestamp]",
                format!("gte,{}", timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ));
        }
        pairs
    }
}

impl Client {
    /// Fetch a page of records of topic `topic_id`.
    #[tracing::instrument(skip(self), err)]
    pub async fn list_records(
        &self,
        kafka_id: &str,
        topic_id: &str,
        query: &RecordsQuery,
    ) -> Result<Vec<Message>, Error> {
        let doc: DataListResponse<RecordResource> = self
            .api_get(
                "records",
                &["api", "kafkas", kafka_id, "topics", topic_id, "records"],
                &query.to_query_pairs(),
            )
            .await?;

        tracing::debug!(count = doc.data.len(), "fetched records");
        Ok(doc.data.into_iter().map(|r| r.attributes).collect())
    }
}
