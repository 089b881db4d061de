use serde_json::Value;
use wayfare_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AmadeusError {
    #[error("Amadeus credentials are not configured")]
    MissingCredentials,
    #[error("Amadeus request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Amadeus returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Unexpected Amadeus response: {0}")]
    Decode(String),
}

impl AmadeusError {
    /// Builds a status error from an error body, using the most specific
    /// message it carries. API errors look like
    /// `{"errors":[{"title":..,"detail":..}]}`, OAuth errors like
    /// `{"error":..,"error_description":..}`.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                let api = &v["errors"][0];
                api["detail"]
                    .as_str()
                    .or_else(|| api["title"].as_str())
                    .or_else(|| v["error_description"].as_str())
                    .or_else(|| v["error"].as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "no response body".to_string()
                } else {
                    trimmed.chars().take(200).collect()
                }
            });
        AmadeusError::Status { status, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AmadeusError::Status { status: 401, .. })
    }
}

impl From<AmadeusError> for CoreError {
    fn from(err: AmadeusError) -> Self {
        CoreError::UpstreamError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_detail_preferred() {
        let body = r#"{"errors":[{"status":400,"code":477,"title":"INVALID FORMAT","detail":"cityCode must be 3 letters"}]}"#;
        let err = AmadeusError::from_body(400, body);
        assert_eq!(err.to_string(), "Amadeus returned 400: cityCode must be 3 letters");
    }

    #[test]
    fn test_oauth_error_description() {
        let body = r#"{"error":"invalid_client","error_description":"Client credentials are invalid","code":38187}"#;
        let err = AmadeusError::from_body(401, body);
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Amadeus returned 401: Client credentials are invalid");
    }

    #[test]
    fn test_non_json_body() {
        let err = AmadeusError::from_body(502, "  Bad Gateway ");
        assert_eq!(err.to_string(), "Amadeus returned 502: Bad Gateway");
        let err = AmadeusError::from_body(503, "");
        assert_eq!(err.to_string(), "Amadeus returned 503: no response body");
    }
}
