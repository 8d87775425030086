use std::time::Duration;

use tracing::{debug, error, info, warn};
use ui_deploy_core::contract::{DeployRequest, DeployResult};

use crate::adapters::channel::{RequestPublisher, ResultSubscriber};
use crate::error::TriggerError;

/// How a trigger run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Deployed,
    Failed,
    TimedOut,
}

impl TriggerOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Deployed => 0,
            Self::Failed | Self::TimedOut => 1,
        }
    }
}

/// Publishes a deploy request for `revision` and waits for its result.
///
/// The deadline covers both the publish and the wait. Hitting it yields
/// [`TriggerOutcome::TimedOut`]; the subscription is left as is.
pub async fn run_trigger(
    revision: &str,
    timeout: Duration,
    publisher: &impl RequestPublisher,
    subscriber: &impl ResultSubscriber,
) -> Result<TriggerOutcome, TriggerError> {
    let request = DeployRequest::new(revision)?;
    info!(revision, ?timeout, "deploying revision");

    match tokio::time::timeout(timeout, publish_and_wait(&request, publisher, subscriber)).await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(revision, "timed out waiting for deploy result");
            Ok(TriggerOutcome::TimedOut)
        }
    }
}

async fn publish_and_wait(
    request: &DeployRequest,
    publisher: &impl RequestPublisher,
    subscriber: &impl ResultSubscriber,
) -> Result<TriggerOutcome, TriggerError> {
    publisher
        .publish_request(request)
        .await
        .map_err(TriggerError::Publish)?;
    info!(revision = %request.revision, "waiting for deployment results");

    loop {
        let messages = subscriber.receive().await.map_err(TriggerError::Receive)?;
        let mut outcome = None;

        // Every message in the batch is settled before returning: ours are
        // acknowledged, other revisions are released back to their triggers.
        for message in messages {
            let result = match DeployResult::from_json(&message.body) {
                Ok(result) => result,
                Err(error) => {
                    warn!(%error, body = %message.body, "ignoring malformed deploy result");
                    continue;
                }
            };

            if result.revision != request.revision {
                debug!(other = %result.revision, "releasing result for another revision");
                if let Err(error) = subscriber.release(&message).await {
                    warn!(%error, "failed to release deploy result");
                }
                continue;
            }

            if let Err(error) = subscriber.ack(&message).await {
                warn!(%error, "failed to acknowledge deploy result");
            }
            outcome.get_or_insert(result.ok);
        }

        match outcome {
            Some(true) => {
                info!(revision = %request.revision, "deployment ok");
                return Ok(TriggerOutcome::Deployed);
            }
            Some(false) => {
                error!(revision = %request.revision, "deployment failed");
                return Ok(TriggerOutcome::Failed);
            }
            None => {}
        }
    }
}
