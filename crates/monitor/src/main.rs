use tracing_subscriber::EnvFilter;
use vigil_monitor::{cli, config, run};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let args = cli::parse();
    let cfg = match config::load_from_file(&args.config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(path = %args.config_path.display(), error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "vigil monitor starting");
    if let Err(e) = run::run(cfg).await {
        tracing::error!(error = %e, "monitor exited with error");
        std::process::exit(1);
    }
}
