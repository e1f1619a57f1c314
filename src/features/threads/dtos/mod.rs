pub mod thread_dto;

pub use thread_dto::{CreateThreadDto, ListThreadsQuery, ThreadResponseDto, UpdateThreadDto};
