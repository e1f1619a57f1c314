pub mod thread_handler;

pub use thread_handler::{create_thread, delete_thread, get_thread, list_threads, update_thread};
