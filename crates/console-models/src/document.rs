use crate::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// DataResponse is a document holding a single resource.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataResponse<T> {
    pub data: T,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// DataListResponse is a document holding a page of resources,
/// along with optional pagination `meta` and `links`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataListResponse<T> {
    pub data: Vec<T>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// ErrorDocument is the body of a non-success response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorDocument {
    pub errors: Vec<ApiError>,
}
