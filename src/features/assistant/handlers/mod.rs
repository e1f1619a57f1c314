pub mod chat_handler;
pub mod rate_limit_handler;

pub use chat_handler::{chat_stream, chat_sync, ChatState};
pub use rate_limit_handler::rate_limit_status;
