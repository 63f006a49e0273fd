//! Writes batches of structured log records to object storage as JSON Lines,
//! one object per flush.
//!
//! ```text
//! host decoder ──► collect ──► normalize + encode ──► object key ──► write
//!                 (ts per record)                    (prefix/tag/date/hour)
//! ```
//!
//! The host pipeline owns batching and retries; each flush either writes one
//! whole object or reports a retry/error outcome back to it.

pub mod cli;
pub mod config;
pub mod encode;
pub mod flush;
pub mod host;
pub mod record;
pub mod storage;
