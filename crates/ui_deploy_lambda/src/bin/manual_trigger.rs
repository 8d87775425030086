use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use ui_deploy_core::contract::DeployRequest;
use ui_deploy_lambda::config::DeployHandlerConfig;
use ui_deploy_lambda::logging::init_cli_tracing;
use ui_deploy_lambda::runtime::{build_deploy_handler, load_aws_config};

/// Runs the deploy handler in-process, bypassing the request queue.
#[derive(Parser)]
#[command(
    name = "manual_trigger",
    about = "Invoke the deploy handler directly for one revision"
)]
struct Cli {
    /// Revision whose ui-<REVISION>.zip archive should be deployed
    revision: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_cli_tracing();
    let cli = Cli::parse();

    let config = match DeployHandlerConfig::from_env() {
        Ok(value) => value,
        Err(error) => {
            error!(%error, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let request = match DeployRequest::new(cli.revision) {
        Ok(value) => value,
        Err(error) => {
            error!(%error, "invalid revision");
            return ExitCode::FAILURE;
        }
    };

    let aws_config = load_aws_config().await;
    let handler = build_deploy_handler(&aws_config, &config);

    match handler.handle_event(&request.to_event()).await {
        Ok(responses) => {
            for response in responses {
                info!(
                    revision = %response.revision,
                    uploaded = response.uploaded,
                    deleted = response.deleted,
                    "manual deploy finished"
                );
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(%error, "manual deploy failed");
            ExitCode::FAILURE
        }
    }
}
