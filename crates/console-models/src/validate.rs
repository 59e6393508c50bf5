use serde::de::DeserializeOwned;

/// SchemaValidationError is returned when a response of the backend doesn't
/// have the shape of the expected `resource`. It's a failure of the payload,
/// and is distinct from transport failures or error statuses.
#[derive(Debug, thiserror::Error)]
#[error("{resource} response failed schema validation")]
pub struct SchemaValidationError {
    pub resource: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Validate a raw response `body` as a document of type `T`.
pub fn validate<T: DeserializeOwned>(
    resource: &'static str,
    body: &[u8],
) -> Result<T, SchemaValidationError> {
    serde_json::from_slice(body).map_err(|source| SchemaValidationError { resource, source })
}

/// Validate an already-parsed JSON `value` as a document of type `T`.
pub fn validate_value<T: DeserializeOwned>(
    resource: &'static str,
    value: serde_json::Value,
) -> Result<T, SchemaValidationError> {
    serde_json::from_value(value).map_err(|source| SchemaValidationError { resource, source })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{DataListResponse, TopicSummary};

    #[test]
    fn non_json_bodies_fail_validation() {
        let err = validate::<DataListResponse<TopicSummary>>("topics", b"<html>oops</html>")
            .unwrap_err();
        assert_eq!(err.resource, "topics");
        assert_eq!(err.to_string(), "topics response failed schema validation");
    }

    #[test]
    fn missing_data_fails_validation() {
        let err =
            validate_value::<DataListResponse<TopicSummary>>("topics", serde_json::json!({"meta": {}}))
                .unwrap_err();
        assert!(err.source.to_string().contains("missing field `data`"));
    }
}
