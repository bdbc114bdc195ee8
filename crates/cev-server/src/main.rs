use anyhow::Result;
use clap::Parser;
use tracing::warn;

use cev_server::config::ServerConfig;
use cev_server::routes;

/// Sandboxed code-evaluation service.
#[derive(Parser, Debug)]
#[command(name = "code-evald", version, about)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Bind address override.
    #[arg(long)]
    bind: Option<String>,

    /// Port override.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref(), cli.bind, cli.port)?;

    log_interpreter_availability().await;
    routes::serve(config.socket_addr()?).await
}

/// Initialize tracing from LOG_LEVEL (falling back to info), writing to
/// stderr so evaluation output pipes stay clean.
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_new(&level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();
}

/// A missing interpreter is not fatal (requests for that language fail
/// with a spawn verdict), but it is worth a loud note at startup.
async fn log_interpreter_availability() {
    for bin in [
        cev_runner::PYTHON_BIN,
        cev_runner::NODE_BIN,
        cev_runner::TS_NODE_BIN,
    ] {
        if let Err(e) = cev_process::check_tool_installed(bin).await {
            warn!(interpreter = bin, "{e:#}");
        }
    }
}
