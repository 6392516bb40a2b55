//! kyc-voice CLI entrypoint

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kyc_voice::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing (stderr, so the dialog on stdout stays readable)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Parse and execute CLI
    let cli = Cli::parse();

    tokio::select! {
        result = cli.execute() => match result {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("An error occurred: {:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\nExiting...");
            // A pending stdin read would otherwise hold up runtime shutdown
            std::process::exit(0);
        }
    }
}
