//! Redirect Agent Binary Entry Point

use clap::Parser;
use redirect_agent::{logging_config, run_agent, Args};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging on stderr; stdout carries the replay output
    redirect_core::logging::init_logging_with_writer(&logging_config(&args), std::io::stderr)?;

    tokio::select! {
        result = run_agent(args) => {
            if let Err(e) = result {
                tracing::error!("Replay failed: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
             tracing::info!("Shutdown signal received, stopping replay...");
        }
    }

    Ok(())
}
