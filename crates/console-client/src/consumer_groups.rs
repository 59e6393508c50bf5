use crate::{Client, Error};
use console_models::{ConsumerGroup, DataListResponse};

impl Client {
    /// List the consumer groups which consume topic `topic_id`.
    #[tracing::instrument(skip(self), err)]
    pub async fn list_topic_consumer_groups(
        &self,
        kafka_id: &str,
        topic_id: &str,
    ) -> Result<Vec<ConsumerGroup>, Error> {
        let doc: DataListResponse<ConsumerGroup> = self
            .api_get(
                "consumerGroups",
                &["api", "kafkas", kafka_id, "topics", topic_id, "consumerGroups"],
                &[],
            )
            .await?;

        Ok(doc.data)
    }
}
