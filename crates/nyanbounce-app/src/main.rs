use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nyanbounce_core::Config;
use nyanbounce_desktop::run_app;

fn main() -> ExitCode {
    // Init logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_env_filter(filter)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    info!("Nyanbounce starting");
    let config = match Config::resolve(std::env::args_os().nth(1).map(PathBuf::from)) {
        Ok(config) => config,
        Err(e) => {
            error!("Nyanbounce config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = run_app(config) {
        error!("Nyanbounce error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
