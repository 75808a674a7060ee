use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// `{ "message": ... }` body used for confirmations and every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_single_message_field() {
        let json = serde_json::to_value(MessageResponse::new("Image deleted")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Image deleted" }));
    }
}
