use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`. A missing or `null` message is accepted here and
/// rejected by the handler as a blank question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// The question to answer, or `None` when there is nothing to ask.
    pub fn question(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub dataset_loaded: bool,
    pub buildings: usize,
}
