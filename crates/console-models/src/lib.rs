//! Typed documents of the Kafka console backend API.
//!
//! Every response of the backend is a JSON:API document whose `data` holds
//! one or more resources. The types of this crate describe the shapes the
//! console relies upon, and [`validate`] turns a raw response body into them,
//! failing with a [`SchemaValidationError`] when required fields are missing
//! or mistyped. Fields which the console doesn't know about are kept in each
//! resource's `extra` map, so documents survive a round-trip without loss.

mod consumer_groups;
mod document;
mod error;
mod records;
mod topics;
mod validate;

pub use consumer_groups::{ConsumerGroup, ConsumerGroupAttributes, ConsumerGroupsType};
pub use document::{DataListResponse, DataResponse, ErrorDocument};
pub use error::{ApiError, BackendError, ErrorMeta, ErrorMetaType, OrError};
pub use records::{Message, MessageId, RecordResource, RecordsType};
pub use topics::{
    ConfigEntry, OffsetInfo, Partition, PartitionOffsets, Replica, ReplicaLocalStorage, Topic,
    TopicAttributes, TopicSummary, TopicSummaryAttributes, TopicsType,
};
pub use validate::{validate, validate_value, SchemaValidationError};
