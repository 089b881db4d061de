use wayfare_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("LLM response had no content")]
    EmptyResponse,
}

impl AssistantError {
    /// Rate limiting, server errors and transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AssistantError::Http(_) => true,
            AssistantError::Status { status, .. } => *status == 429 || *status >= 500,
            AssistantError::EmptyResponse => false,
        }
    }
}

impl From<AssistantError> for CoreError {
    fn from(err: AssistantError) -> Self {
        CoreError::UpstreamError(err.to_string())
    }
}
