//! AWS-oriented adapters and handlers for static-site deploys.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! trigger wait loop, S3 and SQS adapters) on top of the contract and diff
//! primitives in `ui_deploy_core`.

pub mod adapters;
pub mod archive;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod runtime;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
