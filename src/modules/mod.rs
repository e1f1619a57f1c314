//! Modules layer - Infrastructure components behind the feature services
//!
//! Contains the storage adapters that map Spindle's canonical thread shape
//! onto relational backends.

pub mod storage;
