use clap::Parser;
use mxbikes_data::cli::Args;
use mxbikes_data::commands::{
    handle_health_command, handle_list_config_command, handle_load_command,
};
use mxbikes_data::logging::setup_logging;
use mxbikes_data::{AppError, Config, DataManager};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    let (log_file_path, _guard) = setup_logging(&args).await?;
    info!("Logs are written to {log_file_path}");

    if args.list_config {
        return handle_list_config_command().await;
    }

    let config = Config::load().await?;
    let manager = DataManager::new(config)?;

    if args.health {
        return handle_health_command(&manager).await;
    }

    handle_load_command(&manager, &args).await
}
