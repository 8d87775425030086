//! In-process stand-ins for the artifact bucket, the site bucket, and the
//! request/result queues.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use ui_deploy_core::contract::{DeployRequest, DeployResult};

use crate::adapters::channel::{
    ReceivedMessage, RequestPublisher, ResultPublisher, ResultSubscriber,
};
use crate::adapters::object_store::{ArchiveStore, SiteStore, UploadOptions};
use crate::error::{ChannelError, StoreError};

pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_WAIT: Duration = Duration::from_millis(100);
pub const DEFAULT_RELEASE_DELAY: Duration = Duration::from_millis(100);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub options: Option<UploadOptions>,
}

#[derive(Debug, Default)]
struct ObjectStoreState {
    objects: BTreeMap<String, StoredObject>,
    failing_paths: BTreeSet<String>,
    fail_listing: bool,
    uploads: Vec<String>,
    deletions: Vec<String>,
}

/// Bucket backed by a sorted map. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    state: Arc<Mutex<ObjectStoreState>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_object(&self, key: &str, body: &[u8]) {
        lock(&self.state).objects.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                options: None,
            },
        );
    }

    /// Every subsequent put or delete of `path` fails.
    pub fn fail_on(&self, path: &str) {
        lock(&self.state).failing_paths.insert(path.to_string());
    }

    pub fn fail_listing(&self) {
        lock(&self.state).fail_listing = true;
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.state).objects.keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        lock(&self.state).objects.get(key).cloned()
    }

    /// Paths written, in completion order.
    pub fn uploads(&self) -> Vec<String> {
        lock(&self.state).uploads.clone()
    }

    /// Paths deleted, in completion order.
    pub fn deletions(&self) -> Vec<String> {
        lock(&self.state).deletions.clone()
    }
}

#[async_trait]
impl ArchiveStore for MemoryObjectStore {
    async fn fetch_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        lock(&self.state)
            .objects
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl SiteStore for MemoryObjectStore {
    async fn list_paths(&self) -> Result<Vec<String>, StoreError> {
        let state = lock(&self.state);
        if state.fail_listing {
            return Err(StoreError::Backend("listing unavailable".to_string()));
        }
        Ok(state.objects.keys().cloned().collect())
    }

    async fn put_file(
        &self,
        path: &str,
        body: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        if state.failing_paths.contains(path) {
            return Err(StoreError::Backend(format!("write denied for {path}")));
        }
        state.objects.insert(
            path.to_string(),
            StoredObject {
                body,
                options: Some(options.clone()),
            },
        );
        state.uploads.push(path.to_string());
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        if state.failing_paths.contains(path) {
            return Err(StoreError::Backend(format!("delete denied for {path}")));
        }
        if state.objects.remove(path).is_none() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        state.deletions.push(path.to_string());
        Ok(())
    }
}

#[derive(Debug)]
struct InFlight {
    body: String,
    visible_at: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    next_receipt: u64,
    visible: VecDeque<String>,
    in_flight: BTreeMap<String, InFlight>,
    published: Vec<String>,
    acked: Vec<String>,
    fail_publish: bool,
}

/// Queue with at-least-once delivery: received messages stay hidden for the
/// visibility timeout and reappear unless acknowledged.
#[derive(Debug, Clone)]
pub struct MemoryQueue {
    state: Arc<Mutex<QueueState>>,
    visibility_timeout: Duration,
    poll_wait: Duration,
    release_delay: Duration,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            poll_wait: DEFAULT_POLL_WAIT,
            release_delay: DEFAULT_RELEASE_DELAY,
        }
    }
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visibility_timeout(mut self, visibility_timeout: Duration) -> Self {
        self.visibility_timeout = visibility_timeout;
        self
    }

    pub fn fail_publish(&self) {
        lock(&self.state).fail_publish = true;
    }

    pub fn push_body(&self, body: impl Into<String>) {
        let body = body.into();
        let mut state = lock(&self.state);
        state.published.push(body.clone());
        state.visible.push_back(body);
    }

    pub fn published_bodies(&self) -> Vec<String> {
        lock(&self.state).published.clone()
    }

    pub fn published_results(&self) -> Vec<DeployResult> {
        self.published_bodies()
            .iter()
            .filter_map(|body| DeployResult::from_json(body).ok())
            .collect()
    }

    pub fn acked_bodies(&self) -> Vec<String> {
        lock(&self.state).acked.clone()
    }

    /// Messages not yet acknowledged, visible or in flight.
    pub fn pending_len(&self) -> usize {
        let state = lock(&self.state);
        state.visible.len() + state.in_flight.len()
    }

    fn publish(&self, body: String) -> Result<(), ChannelError> {
        if lock(&self.state).fail_publish {
            return Err(ChannelError::Publish("queue unavailable".to_string()));
        }
        self.push_body(body);
        Ok(())
    }

    fn take_visible(&self) -> Vec<ReceivedMessage> {
        let now = Instant::now();
        let mut state = lock(&self.state);

        let expired: Vec<String> = state
            .in_flight
            .iter()
            .filter(|(_, message)| message.visible_at <= now)
            .map(|(receipt, _)| receipt.clone())
            .collect();
        for receipt in expired {
            if let Some(message) = state.in_flight.remove(&receipt) {
                state.visible.push_back(message.body);
            }
        }

        let mut delivered = Vec::with_capacity(state.visible.len());
        while let Some(body) = state.visible.pop_front() {
            state.next_receipt += 1;
            let receipt = format!("receipt-{}", state.next_receipt);
            state.in_flight.insert(
                receipt.clone(),
                InFlight {
                    body: body.clone(),
                    visible_at: now + self.visibility_timeout,
                },
            );
            delivered.push(ReceivedMessage { receipt, body });
        }
        delivered
    }
}

#[async_trait]
impl RequestPublisher for MemoryQueue {
    async fn publish_request(&self, request: &DeployRequest) -> Result<(), ChannelError> {
        self.publish(request.to_json())
    }
}

#[async_trait]
impl ResultPublisher for MemoryQueue {
    async fn publish_result(&self, result: &DeployResult) -> Result<(), ChannelError> {
        self.publish(result.to_json())
    }
}

#[async_trait]
impl ResultSubscriber for MemoryQueue {
    async fn receive(&self) -> Result<Vec<ReceivedMessage>, ChannelError> {
        let delivered = self.take_visible();
        if delivered.is_empty() {
            tokio::time::sleep(self.poll_wait).await;
        }
        Ok(delivered)
    }

    async fn ack(&self, message: &ReceivedMessage) -> Result<(), ChannelError> {
        let mut state = lock(&self.state);
        match state.in_flight.remove(&message.receipt) {
            Some(in_flight) => {
                state.acked.push(in_flight.body);
                Ok(())
            }
            None => Err(ChannelError::Ack(format!(
                "unknown or expired receipt {}",
                message.receipt
            ))),
        }
    }

    async fn release(&self, message: &ReceivedMessage) -> Result<(), ChannelError> {
        let visible_at = Instant::now() + self.release_delay;
        match lock(&self.state).in_flight.get_mut(&message.receipt) {
            Some(in_flight) => {
                in_flight.visible_at = visible_at;
                Ok(())
            }
            None => Err(ChannelError::Release(format!(
                "unknown or expired receipt {}",
                message.receipt
            ))),
        }
    }
}
