use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use ui_deploy_lambda::adapters::sqs::{SqsPublisher, SqsResultSubscriber};
use ui_deploy_lambda::config::{
    DEFAULT_TIMEOUT_MS, REQUEST_QUEUE_URL_ENV, RESULT_QUEUE_URL_ENV, TIMEOUT_ENV,
};
use ui_deploy_lambda::handlers::trigger::run_trigger;
use ui_deploy_lambda::logging::init_cli_tracing;
use ui_deploy_lambda::runtime::load_aws_config;

#[derive(Parser)]
#[command(
    name = "deploy_trigger",
    about = "Request a UI deploy and wait for its result",
    long_about = "Publishes a deploy request for REVISION and blocks until the matching\n\
                  result arrives. Exits 0 on a successful deploy, 1 on failure or timeout."
)]
struct Cli {
    /// Revision whose ui-<REVISION>.zip archive should be deployed
    revision: String,
    /// Milliseconds to wait for the deploy result
    #[arg(long = "timeout-ms", env = TIMEOUT_ENV, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Queue the deploy handler consumes
    #[arg(long, env = REQUEST_QUEUE_URL_ENV)]
    request_queue_url: String,
    /// Queue the deploy handler publishes results to
    #[arg(long, env = RESULT_QUEUE_URL_ENV)]
    result_queue_url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_cli_tracing();
    let cli = Cli::parse();

    let aws_config = load_aws_config().await;
    let sqs_client = aws_sdk_sqs::Client::new(&aws_config);
    let publisher = SqsPublisher::new(sqs_client.clone(), cli.request_queue_url);
    let subscriber = SqsResultSubscriber::new(sqs_client, cli.result_queue_url);

    match run_trigger(
        &cli.revision,
        Duration::from_millis(cli.timeout_ms),
        &publisher,
        &subscriber,
    )
    .await
    {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(error) => {
            error!(%error, "trigger failed");
            ExitCode::FAILURE
        }
    }
}
