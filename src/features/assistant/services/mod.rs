mod assistant_runtime_service;
mod rate_limit_service;

pub use assistant_runtime_service::{AssistantRuntimeService, ChatEvent};
pub use rate_limit_service::{RateLimitService, RateLimitStatus};
