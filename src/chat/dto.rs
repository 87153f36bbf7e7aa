use serde::Deserialize;

/// Body for one user turn of the assistant conversation.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}
