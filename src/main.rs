//! TLS-terminating API gateway for the taskboard services.
//!
//! ```text
//!     Client (HTTPS)
//!         │
//!         ▼
//!   ┌───────────────────────────────────────────────┐
//!   │  gateway                                      │
//!   │  TLS → accumulate body → /<service>/<rest>    │
//!   │        → routing table (SERVICES, *_PORT)     │
//!   │        → forward (5s deadline) → relay        │
//!   └───────────────────────────────────────────────┘
//!         │ plain HTTP
//!         ▼
//!   localhost:<service port>
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use taskboard_gateway::lifecycle::startup;
use taskboard_gateway::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "taskboard-gateway", version, about = "HTTPS gateway for the taskboard services")]
struct Cli {
    /// Optional TOML file layered under the environment.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    logging::init(&level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "taskboard-gateway starting");

    match startup::run(cli.config.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped");
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
