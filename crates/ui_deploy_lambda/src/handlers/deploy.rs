use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, info_span, Instrument};
use ui_deploy_core::contract::{decode_request_event, DeployRequest, DeployResult};
use ui_deploy_core::storage_keys::archive_object_key;
use ui_deploy_core::sync_plan::SyncPlan;

use crate::adapters::channel::ResultPublisher;
use crate::adapters::object_store::{ArchiveStore, SiteStore, UploadOptions};
use crate::archive::{extract_archive, ArchiveFile};
use crate::error::{DeployError, FileFailure};

pub const DEPLOYED_STATUS: &str = "deployed";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploySuccessResponse {
    pub status: String,
    pub revision: String,
    pub uploaded: usize,
    pub deleted: usize,
}

/// Synchronises the site bucket with one revision's archive and reports the
/// outcome on the result channel.
///
/// Exactly one result is published per handled request, on both the success
/// and the failure path, before any error is returned to the caller.
#[derive(Debug, Clone)]
pub struct DeployHandler<A, S, P> {
    archives: A,
    site: S,
    results: P,
}

impl<A, S, P> DeployHandler<A, S, P>
where
    A: ArchiveStore,
    S: SiteStore,
    P: ResultPublisher,
{
    pub fn new(archives: A, site: S, results: P) -> Self {
        Self {
            archives,
            site,
            results,
        }
    }

    /// Handles an invocation event. Batched requests run one at a time; the
    /// first failure stops the batch.
    pub async fn handle_event(
        &self,
        event: &Value,
    ) -> Result<Vec<DeploySuccessResponse>, DeployError> {
        info!(%event, "received deploy event");
        let requests = decode_request_event(event)?;

        let mut responses = Vec::with_capacity(requests.len());
        for request in &requests {
            responses.push(self.handle_request(request).await?);
        }
        Ok(responses)
    }

    pub async fn handle_request(
        &self,
        request: &DeployRequest,
    ) -> Result<DeploySuccessResponse, DeployError> {
        let revision = request.revision.as_str();
        async move {
            info!("parsed revision from event");
            match self.deploy(revision).await {
                Ok(response) => match self
                    .results
                    .publish_result(&DeployResult::succeeded(revision))
                    .await
                {
                    Ok(()) => {
                        info!(
                            uploaded = response.uploaded,
                            deleted = response.deleted,
                            "published success result"
                        );
                        Ok(response)
                    }
                    Err(publish_error) => Err(DeployError::Publish(publish_error)),
                },
                Err(deploy_error) => {
                    error!(error = %deploy_error, "deploy failed");
                    if let Err(publish_error) = self
                        .results
                        .publish_result(&DeployResult::failed(revision))
                        .await
                    {
                        error!(error = %publish_error, "failed to publish failure result");
                    }
                    Err(deploy_error)
                }
            }
        }
        .instrument(info_span!("deploy", revision))
        .await
    }

    async fn deploy(&self, revision: &str) -> Result<DeploySuccessResponse, DeployError> {
        let key = archive_object_key(revision);
        info!(archive = %key, "downloading zip archive");
        let bytes = self
            .archives
            .fetch_object(&key)
            .await
            .map_err(|source| DeployError::ArchiveFetch {
                key: key.clone(),
                source,
            })?;

        let files = extract_archive(&bytes).map_err(|error| DeployError::ArchiveFormat {
            key: key.clone(),
            message: error.to_string(),
        })?;
        info!(
            entries = ?files.iter().map(|file| &file.entry_name).collect::<Vec<_>>(),
            "zipped content to deploy"
        );

        let previous_paths = self.site.list_paths().await.map_err(DeployError::Listing)?;
        info!(existing = ?previous_paths, "existing files");

        let plan = SyncPlan::compute(
            previous_paths,
            files.iter().map(|file| file.deploy_path.clone()),
        );
        info!(
            added = ?plan.added,
            overwritten = ?plan.retained,
            "computed sync plan"
        );

        let uploaded = self.upload_all(files).await?;
        info!(deployed = ?uploaded, "deployed new files");

        info!(stale = ?plan.stale, "obsolete files to delete");
        self.delete_all(&plan.stale).await?;

        info!("done");
        Ok(DeploySuccessResponse {
            status: DEPLOYED_STATUS.to_string(),
            revision: revision.to_string(),
            uploaded: uploaded.len(),
            deleted: plan.stale.len(),
        })
    }

    async fn upload_all(&self, files: Vec<ArchiveFile>) -> Result<Vec<String>, DeployError> {
        let uploads = files.into_iter().map(|file| async move {
            let ArchiveFile {
                deploy_path,
                contents,
                ..
            } = file;
            let options = UploadOptions::for_path(&deploy_path);
            let outcome = self.site.put_file(&deploy_path, contents, &options).await;
            (deploy_path, outcome)
        });

        let mut uploaded = Vec::new();
        let mut failures = Vec::new();
        for (path, outcome) in join_all(uploads).await {
            match outcome {
                Ok(()) => uploaded.push(path),
                Err(error) => {
                    error!(path = %path, %error, "upload failed");
                    failures.push(FileFailure {
                        path,
                        message: error.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(uploaded)
        } else {
            Err(DeployError::Upload { failures })
        }
    }

    async fn delete_all(&self, stale_paths: &[String]) -> Result<(), DeployError> {
        let deletions = stale_paths.iter().map(|path| async move {
            (path, self.site.delete_file(path).await)
        });

        let failures: Vec<FileFailure> = join_all(deletions)
            .await
            .into_iter()
            .filter_map(|(path, outcome)| {
                let error = outcome.err()?;
                error!(path = %path, %error, "delete failed");
                Some(FileFailure {
                    path: path.clone(),
                    message: error.to_string(),
                })
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DeployError::Delete { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::memory::{MemoryObjectStore, MemoryQueue};
    use crate::test_helpers::{build_zip_archive, sample_site_archive, ArchiveEntry};

    struct Fixture {
        artifacts: MemoryObjectStore,
        site: MemoryObjectStore,
        results: MemoryQueue,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                artifacts: MemoryObjectStore::new(),
                site: MemoryObjectStore::new(),
                results: MemoryQueue::new(),
            }
        }

        fn handler(&self) -> DeployHandler<MemoryObjectStore, MemoryObjectStore, MemoryQueue> {
            DeployHandler::new(
                self.artifacts.clone(),
                self.site.clone(),
                self.results.clone(),
            )
        }
    }

    fn request(revision: &str) -> DeployRequest {
        DeployRequest::new(revision).expect("revision should be valid")
    }

    #[tokio::test]
    async fn deploys_archive_and_publishes_success() {
        let fixture = Fixture::new();
        fixture
            .artifacts
            .seed_object("ui-abc123.zip", &sample_site_archive());

        let response = fixture
            .handler()
            .handle_request(&request("abc123"))
            .await
            .expect("deploy should succeed");

        assert_eq!(response.status, "deployed");
        assert_eq!(response.uploaded, 2);
        assert_eq!(response.deleted, 0);
        assert_eq!(fixture.site.keys(), vec!["assets/app.js", "index.html"]);
        assert_eq!(
            fixture.results.published_results(),
            vec![DeployResult::succeeded("abc123")]
        );
    }

    #[tokio::test]
    async fn uploads_carry_no_store_and_inferred_content_type() {
        let fixture = Fixture::new();
        fixture
            .artifacts
            .seed_object("ui-abc123.zip", &sample_site_archive());

        fixture
            .handler()
            .handle_request(&request("abc123"))
            .await
            .expect("deploy should succeed");

        let index = fixture.site.object("index.html").expect("index uploaded");
        let options = index.options.expect("upload options recorded");
        assert_eq!(options.cache_control, "no-store");
        assert_eq!(options.content_type, "text/html");
        assert_eq!(index.body, b"<!doctype html><title>ui</title>");
    }

    #[tokio::test]
    async fn deletes_only_stale_paths_and_overwrites_retained() {
        let fixture = Fixture::new();
        fixture.site.seed_object("index.html", b"old index");
        fixture.site.seed_object("assets/old.js", b"old js");
        fixture
            .artifacts
            .seed_object("ui-abc123.zip", &sample_site_archive());

        let response = fixture
            .handler()
            .handle_request(&request("abc123"))
            .await
            .expect("deploy should succeed");

        assert_eq!(response.deleted, 1);
        assert_eq!(fixture.site.deletions(), vec!["assets/old.js"]);
        assert_eq!(fixture.site.keys(), vec!["assets/app.js", "index.html"]);
        assert_ne!(
            fixture.site.object("index.html").expect("index kept").body,
            b"old index"
        );
    }

    #[tokio::test]
    async fn redeploying_same_archive_yields_same_path_set() {
        let fixture = Fixture::new();
        fixture
            .artifacts
            .seed_object("ui-abc123.zip", &sample_site_archive());
        let handler = fixture.handler();

        handler
            .handle_request(&request("abc123"))
            .await
            .expect("first deploy should succeed");
        let first = fixture.site.keys();
        handler
            .handle_request(&request("abc123"))
            .await
            .expect("second deploy should succeed");

        assert_eq!(fixture.site.keys(), first);
        assert!(fixture.site.deletions().is_empty());
        assert_eq!(fixture.results.published_results().len(), 2);
    }

    #[tokio::test]
    async fn missing_archive_publishes_failure_and_raises() {
        let fixture = Fixture::new();
        fixture.site.seed_object("index.html", b"live");

        let error = fixture
            .handler()
            .handle_request(&request("missing"))
            .await
            .expect_err("missing archive should fail");

        assert!(matches!(error, DeployError::ArchiveFetch { ref key, .. } if key == "ui-missing.zip"));
        assert_eq!(
            fixture.results.published_results(),
            vec![DeployResult::failed("missing")]
        );
        assert_eq!(fixture.site.keys(), vec!["index.html"]);
    }

    #[tokio::test]
    async fn corrupt_archive_publishes_failure() {
        let fixture = Fixture::new();
        fixture.artifacts.seed_object("ui-bad.zip", b"not a zip");

        let error = fixture
            .handler()
            .handle_request(&request("bad"))
            .await
            .expect_err("corrupt archive should fail");

        assert!(matches!(error, DeployError::ArchiveFormat { .. }));
        assert_eq!(
            fixture.results.published_results(),
            vec![DeployResult::failed("bad")]
        );
    }

    #[tokio::test]
    async fn listing_failure_uploads_nothing() {
        let fixture = Fixture::new();
        fixture
            .artifacts
            .seed_object("ui-abc123.zip", &sample_site_archive());
        fixture.site.fail_listing();

        let error = fixture
            .handler()
            .handle_request(&request("abc123"))
            .await
            .expect_err("listing failure should fail");

        assert!(matches!(error, DeployError::Listing(_)));
        assert!(fixture.site.uploads().is_empty());
        assert_eq!(
            fixture.results.published_results(),
            vec![DeployResult::failed("abc123")]
        );
    }

    #[tokio::test]
    async fn upload_failure_keeps_other_uploads_and_skips_deletes() {
        let fixture = Fixture::new();
        fixture.site.seed_object("assets/old.js", b"old js");
        fixture.site.fail_on("assets/app.js");
        fixture
            .artifacts
            .seed_object("ui-abc123.zip", &sample_site_archive());

        let error = fixture
            .handler()
            .handle_request(&request("abc123"))
            .await
            .expect_err("upload failure should fail");

        match error {
            DeployError::Upload { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].path, "assets/app.js");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fixture.site.uploads(), vec!["index.html"]);
        assert!(fixture.site.deletions().is_empty());
        assert_eq!(
            fixture.results.published_results(),
            vec![DeployResult::failed("abc123")]
        );
    }

    #[tokio::test]
    async fn delete_failures_are_aggregated_after_all_attempts() {
        let fixture = Fixture::new();
        for path in ["a.js", "b.js", "c.js"] {
            fixture.site.seed_object(path, b"stale");
        }
        fixture.site.fail_on("a.js");
        fixture.site.fail_on("c.js");
        fixture
            .artifacts
            .seed_object("ui-abc123.zip", &sample_site_archive());

        let error = fixture
            .handler()
            .handle_request(&request("abc123"))
            .await
            .expect_err("delete failures should fail");

        match error {
            DeployError::Delete { failures } => {
                let paths: Vec<&str> = failures.iter().map(|f| f.path.as_str()).collect();
                assert_eq!(paths, vec!["a.js", "c.js"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fixture.site.deletions(), vec!["b.js"]);
        assert_eq!(
            fixture.results.published_results(),
            vec![DeployResult::failed("abc123")]
        );
    }

    #[tokio::test]
    async fn failed_result_publish_still_returns_deploy_error() {
        let fixture = Fixture::new();
        fixture.results.fail_publish();

        let error = fixture
            .handler()
            .handle_request(&request("missing"))
            .await
            .expect_err("missing archive should fail");

        assert!(matches!(error, DeployError::ArchiveFetch { .. }));
    }

    #[tokio::test]
    async fn success_with_failed_publish_is_an_error() {
        let fixture = Fixture::new();
        fixture
            .artifacts
            .seed_object("ui-abc123.zip", &sample_site_archive());
        fixture.results.fail_publish();

        let error = fixture
            .handler()
            .handle_request(&request("abc123"))
            .await
            .expect_err("publish failure should fail");

        assert!(matches!(error, DeployError::Publish(_)));
    }

    #[tokio::test]
    async fn decodes_base64_event_before_deploying() {
        let fixture = Fixture::new();
        fixture.artifacts.seed_object(
            "ui-r2.zip",
            &build_zip_archive(&[ArchiveEntry::file("dist/robots.txt", b"User-agent: *")]),
        );

        let responses = fixture
            .handler()
            .handle_event(&request("r2").to_event())
            .await
            .expect("event should deploy");

        assert_eq!(responses.len(), 1);
        assert_eq!(fixture.site.keys(), vec!["robots.txt"]);
    }

    #[tokio::test]
    async fn invalid_event_publishes_nothing() {
        let fixture = Fixture::new();

        let error = fixture
            .handler()
            .handle_event(&json!({"data": "%%%"}))
            .await
            .expect_err("bad event should fail");

        assert!(matches!(error, DeployError::InvalidRequest(_)));
        assert!(fixture.results.published_bodies().is_empty());
    }

    #[tokio::test]
    async fn sqs_batch_stops_at_first_failure() {
        let fixture = Fixture::new();
        fixture
            .artifacts
            .seed_object("ui-good.zip", &sample_site_archive());
        let event = json!({
            "Records": [
                {"eventSource": "aws:sqs", "body": "{\"revision\":\"good\"}"},
                {"eventSource": "aws:sqs", "body": "{\"revision\":\"missing\"}"},
                {"eventSource": "aws:sqs", "body": "{\"revision\":\"good\"}"}
            ]
        });

        let error = fixture
            .handler()
            .handle_event(&event)
            .await
            .expect_err("second record should fail");

        assert!(matches!(error, DeployError::ArchiveFetch { .. }));
        assert_eq!(
            fixture.results.published_results(),
            vec![
                DeployResult::succeeded("good"),
                DeployResult::failed("missing")
            ]
        );
    }
}
