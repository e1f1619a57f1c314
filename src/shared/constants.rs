/// Default number of threads returned by list endpoints
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Maximum number of threads a single list request can return
pub const MAX_LIST_LIMIT: i64 = 100;

/// Maximum serialized size of thread metadata (16 KiB)
pub const MAX_METADATA_BYTES: usize = 16 * 1024;
