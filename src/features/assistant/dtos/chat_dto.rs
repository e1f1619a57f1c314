use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Chat request. An absent thread_id starts a new thread in the caller's scope.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChatRequestDto {
    pub thread_id: Option<Uuid>,

    #[validate(length(min = 1, max = 10000))]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponseDto {
    pub thread_id: Uuid,
    pub reply: String,
}

/// Per-user rate limit snapshot for the current window
#[derive(Debug, Serialize, ToSchema)]
pub struct RateLimitStatusDto {
    pub used: i64,
    pub remaining: i64,
    pub max_requests: i64,
    pub window_secs: i64,
    pub resets_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_length_bounds() {
        let dto = ChatRequestDto {
            thread_id: None,
            message: String::new(),
        };
        assert!(dto.validate().is_err());

        let dto = ChatRequestDto {
            thread_id: None,
            message: "x".repeat(10_001),
        };
        assert!(dto.validate().is_err());

        let dto = ChatRequestDto {
            thread_id: None,
            message: "hello".to_string(),
        };
        assert!(dto.validate().is_ok());
    }
}
