pub mod thread_service;

pub use thread_service::ThreadService;
