//! Error types for the deploy handler and trigger.

use std::fmt;

use thiserror::Error;
use ui_deploy_core::contract::ValidationError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to publish message: {0}")]
    Publish(String),

    #[error("failed to receive messages: {0}")]
    Receive(String),

    #[error("failed to acknowledge message: {0}")]
    Ack(String),

    #[error("failed to release message: {0}")]
    Release(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

/// A single file operation that failed during a deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: String,
    pub message: String,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_failures(failures: &[FileFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid deploy request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("failed to fetch archive {key}: {source}")]
    ArchiveFetch {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("archive {key} is not a readable zip: {message}")]
    ArchiveFormat { key: String, message: String },

    #[error("failed to list deployed files: {0}")]
    Listing(#[source] StoreError),

    #[error("failed to upload {} file(s): {}", .failures.len(), join_failures(.failures))]
    Upload { failures: Vec<FileFailure> },

    #[error("failed to delete {} stale file(s): {}", .failures.len(), join_failures(.failures))]
    Delete { failures: Vec<FileFailure> },

    #[error("failed to publish deploy result: {0}")]
    Publish(#[source] ChannelError),
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("invalid revision: {0}")]
    InvalidRevision(#[from] ValidationError),

    #[error("failed to publish deploy request: {0}")]
    Publish(#[source] ChannelError),

    #[error("failed to receive deploy results: {0}")]
    Receive(#[source] ChannelError),
}
