//! Shared static-site deploy primitives.
//!
//! This crate owns the request/result contracts, archive and deploy path
//! derivation, and the diff between the published file set and a new
//! archive. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod storage_keys;
pub mod sync_plan;
