use async_trait::async_trait;
use ui_deploy_core::contract::{DeployRequest, DeployResult};

use crate::error::ChannelError;

/// A message pulled from the result channel. `receipt` is the handle used
/// to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub receipt: String,
    pub body: String,
}

#[async_trait]
pub trait RequestPublisher: Send + Sync {
    async fn publish_request(&self, request: &DeployRequest) -> Result<(), ChannelError>;
}

#[async_trait]
pub trait ResultPublisher: Send + Sync {
    async fn publish_result(&self, result: &DeployResult) -> Result<(), ChannelError>;
}

/// Pull-based subscription to the result channel. Messages that are
/// received but neither acknowledged nor released become visible again
/// after the channel's visibility window.
#[async_trait]
pub trait ResultSubscriber: Send + Sync {
    /// Waits (bounded by the transport's long-poll window) for the next
    /// batch. An empty batch is not an error.
    async fn receive(&self) -> Result<Vec<ReceivedMessage>, ChannelError>;

    async fn ack(&self, message: &ReceivedMessage) -> Result<(), ChannelError>;

    /// Hands a received message back to the channel so another subscriber
    /// can pick it up shortly, instead of after the full visibility window.
    async fn release(&self, message: &ReceivedMessage) -> Result<(), ChannelError>;
}
