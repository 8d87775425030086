use async_trait::async_trait;
use ui_deploy_core::contract::{DeployRequest, DeployResult};

use crate::adapters::channel::{
    ReceivedMessage, RequestPublisher, ResultPublisher, ResultSubscriber,
};
use crate::error::ChannelError;

pub const LONG_POLL_WAIT_SECONDS: i32 = 20;
pub const MAX_MESSAGES_PER_RECEIVE: i32 = 10;
/// Visibility left on a released message. Non-zero so a subscriber that
/// keeps releasing the same message does not spin on it.
pub const RELEASE_VISIBILITY_SECONDS: i32 = 1;

/// Publishes JSON message bodies to one SQS queue.
#[derive(Debug, Clone)]
pub struct SqsPublisher {
    queue_url: String,
    sqs_client: aws_sdk_sqs::Client,
}

impl SqsPublisher {
    pub fn new(sqs_client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            sqs_client,
        }
    }

    async fn send(&self, body: String) -> Result<(), ChannelError> {
        self.sqs_client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| ChannelError::Publish(format!("failed to enqueue message: {error}")))
    }
}

#[async_trait]
impl RequestPublisher for SqsPublisher {
    async fn publish_request(&self, request: &DeployRequest) -> Result<(), ChannelError> {
        self.send(request.to_json()).await
    }
}

#[async_trait]
impl ResultPublisher for SqsPublisher {
    async fn publish_result(&self, result: &DeployResult) -> Result<(), ChannelError> {
        self.send(result.to_json()).await
    }
}

/// Long-polls the result queue.
#[derive(Debug, Clone)]
pub struct SqsResultSubscriber {
    queue_url: String,
    sqs_client: aws_sdk_sqs::Client,
}

impl SqsResultSubscriber {
    pub fn new(sqs_client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            sqs_client,
        }
    }
}

#[async_trait]
impl ResultSubscriber for SqsResultSubscriber {
    async fn receive(&self) -> Result<Vec<ReceivedMessage>, ChannelError> {
        let output = self
            .sqs_client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(MAX_MESSAGES_PER_RECEIVE)
            .wait_time_seconds(LONG_POLL_WAIT_SECONDS)
            .send()
            .await
            .map_err(|error| ChannelError::Receive(format!("failed to poll queue: {error}")))?;

        Ok(output
            .messages()
            .iter()
            .filter_map(|message| {
                Some(ReceivedMessage {
                    receipt: message.receipt_handle()?.to_string(),
                    body: message.body()?.to_string(),
                })
            })
            .collect())
    }

    async fn ack(&self, message: &ReceivedMessage) -> Result<(), ChannelError> {
        self.sqs_client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| ChannelError::Ack(format!("failed to delete message: {error}")))
    }

    async fn release(&self, message: &ReceivedMessage) -> Result<(), ChannelError> {
        self.sqs_client
            .change_message_visibility()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt)
            .visibility_timeout(RELEASE_VISIBILITY_SECONDS)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                ChannelError::Release(format!("failed to change message visibility: {error}"))
            })
    }
}
