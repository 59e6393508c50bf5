use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// BackendError is a structured error which the backend returns in place of
/// a single field that it was unable to resolve, such as the local storage of
/// a replica hosted by an unreachable broker. It's distinguished from a value
/// by its `meta.type` of "error".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendError {
    pub meta: ErrorMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorMeta {
    #[serde(rename = "type")]
    pub kind: ErrorMetaType,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMetaType {
    Error,
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.title, detail),
            None => f.write_str(&self.title),
        }
    }
}

/// OrError is a field which holds either its expected value or a
/// [`BackendError`] explaining why the value is unavailable.
/// A field-level error is not a failure of the document as a whole.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum OrError<T> {
    Error(BackendError),
    Value(T),
}

impl<T> OrError<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            OrError::Value(value) => Some(value),
            OrError::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&BackendError> {
        match self {
            OrError::Error(err) => Some(err),
            OrError::Value(_) => None,
        }
    }

    pub fn as_result(&self) -> Result<&T, &BackendError> {
        match self {
            OrError::Value(value) => Ok(value),
            OrError::Error(err) => Err(err),
        }
    }
}

/// ApiError is a single entry of the `errors` array of a failed response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "[{code}] ")?;
        }
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.title, detail),
            None => f.write_str(&self.title),
        }
    }
}
