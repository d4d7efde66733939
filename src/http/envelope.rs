//! The backend's response envelope.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Every backend resource is returned wrapped as `{data, message, success, meta?}`.
///
/// # Examples
///
/// ```
/// use aircare::http::ApiResponse;
///
/// let body = r#"{"data":[1,2,3],"message":"ok","success":true}"#;
/// let envelope: ApiResponse<Vec<u32>> = serde_json::from_str(body).unwrap();
/// assert_eq!(envelope.into_result().unwrap(), vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default)]
    pub message: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> ApiResponse<T> {
    /// Unwraps the payload, turning `success: false` into [`FetchError::Api`].
    pub fn into_result(self) -> Result<T, FetchError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(FetchError::Api(self.message))
        }
    }
}

impl<T> ApiResponse<T>
where
    T: serde::de::DeserializeOwned,
{
    /// Decodes a raw response body into an envelope.
    pub fn from_slice(body: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(body).map_err(FetchError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_meta() {
        let body = br#"{
            "data": ["ac-repair"],
            "message": "",
            "success": true,
            "meta": {"page": 1, "limit": 20, "total": 1, "totalPages": 1}
        }"#;
        let envelope = ApiResponse::<Vec<String>>::from_slice(body).unwrap();
        let meta = envelope.meta.clone().unwrap();
        assert_eq!(meta.total_pages, 1);
        assert_eq!(envelope.into_result().unwrap(), vec!["ac-repair".to_string()]);
    }

    #[test]
    fn unsuccessful_envelope_is_an_api_error() {
        let body = br#"{"data": null, "message": "slot unavailable", "success": false}"#;
        let envelope = ApiResponse::<Option<u32>>::from_slice(body).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert!(matches!(err, FetchError::Api(ref m) if m == "slot unavailable"));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = ApiResponse::<u32>::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
