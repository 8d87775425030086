//! Wires AWS clients into the deploy handler.

use crate::adapters::s3::S3Bucket;
use crate::adapters::sqs::SqsPublisher;
use crate::config::DeployHandlerConfig;
use crate::handlers::deploy::DeployHandler;

pub type AwsDeployHandler = DeployHandler<S3Bucket, S3Bucket, SqsPublisher>;

pub async fn load_aws_config() -> aws_config::SdkConfig {
    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await
}

pub fn build_deploy_handler(
    aws_config: &aws_config::SdkConfig,
    config: &DeployHandlerConfig,
) -> AwsDeployHandler {
    let s3_client = aws_sdk_s3::Client::new(aws_config);
    let sqs_client = aws_sdk_sqs::Client::new(aws_config);

    DeployHandler::new(
        S3Bucket::new(s3_client.clone(), &config.artifact_bucket),
        S3Bucket::new(s3_client, &config.site_bucket),
        SqsPublisher::new(sqs_client, &config.result_queue_url),
    )
}
