use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use wgquick::cli::{self, Cli, Commands};
use wgquick::error::EXIT_USAGE;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string().to_lowercase()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::commands::escalate() {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }

    let result = match cli.command {
        Commands::Up { target } => cli::commands::cmd_up(&target, &cli.config_dir).await,
        Commands::Down { target } => cli::commands::cmd_down(&target, &cli.config_dir).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
