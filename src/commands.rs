use crate::cli::Args;
use crate::config::Config;
use crate::data_fetcher::DataManager;
use crate::data_fetcher::sources::SourceKind;
use crate::error::AppError;
use tracing::{error, info};

/// Handles the --list-config command.
pub async fn handle_list_config_command() -> Result<(), AppError> {
    Config::display().await
}

fn health_label(healthy: bool) -> &'static str {
    if healthy { "healthy" } else { "unavailable" }
}

/// Handles the --health command: probes every source and prints the result.
pub async fn handle_health_command(manager: &DataManager) -> Result<(), AppError> {
    let health = manager.initialize().await;
    let config = manager.config();

    println!("{:<10} {:<12} {}", "SOURCE", "STATUS", "ENDPOINT");
    println!(
        "{:<10} {:<12} {}",
        SourceKind::Public,
        health_label(health.public),
        config.public_api_url
    );
    match &config.internal_api_url {
        Some(endpoint) => println!(
            "{:<10} {:<12} {}",
            SourceKind::Internal,
            health_label(health.internal),
            endpoint
        ),
        None => println!("{:<10} {:<12} -", SourceKind::Internal, "disabled"),
    }
    if let Some(region) = &health.region {
        println!("Region: {region}");
    }
    println!("Premium access: {}", manager.has_premium_access());
    println!("Racing access: {}", manager.has_racing_access());
    Ok(())
}

/// Loads the requested content and prints it as JSON.
///
/// Load failures print the user-facing message; the cause is in the log.
pub async fn handle_load_command(manager: &DataManager, args: &Args) -> Result<(), AppError> {
    manager.initialize().await;

    match manager.load_data(&args.content_type, args.load_options()).await {
        Ok(data) => {
            info!("Loaded {} {} records", data.len(), args.content_type);
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Err(e @ AppError::Validation(_)) => return Err(e),
        Err(e) => {
            error!("Load failed: {e}");
            eprintln!("{}", e.user_message());
        }
    }

    if args.stats {
        print_stats(manager)?;
    }
    Ok(())
}

fn print_stats(manager: &DataManager) -> Result<(), AppError> {
    let stats = manager.request_stats();
    eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    eprintln!("Success rate: {:.0}%", stats.success_rate() * 100.0);
    Ok(())
}
