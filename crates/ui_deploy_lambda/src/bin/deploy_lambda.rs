use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use ui_deploy_lambda::config::DeployHandlerConfig;
use ui_deploy_lambda::handlers::deploy::DeploySuccessResponse;
use ui_deploy_lambda::logging::init_lambda_tracing;
use ui_deploy_lambda::runtime::{build_deploy_handler, load_aws_config, AwsDeployHandler};

async fn handle_request(
    handler: &AwsDeployHandler,
    event: LambdaEvent<Value>,
) -> Result<Vec<DeploySuccessResponse>, Error> {
    handler
        .handle_event(&event.payload)
        .await
        .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_tracing();

    let config = DeployHandlerConfig::from_env()?;
    let aws_config = load_aws_config().await;
    let handler = build_deploy_handler(&aws_config, &config);
    let handler = &handler;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(handler, event).await
    }))
    .await
}
