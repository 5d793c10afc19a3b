//! `promptstream` server: serves `POST /api/ai` until Ctrl-C.
//!
//! Configuration comes from the environment (`ANTHROPIC_API_KEY`,
//! `PROMPTSTREAM_BIND`, `PROMPTSTREAM_AUTH_COOKIE`, ...); logging from
//! `PROMPTSTREAM_LOG_LEVEL` / `PROMPTSTREAM_LOG_FORMAT` / `PROMPTSTREAM_LOG_FILE`.

use std::process::ExitCode;

use promptstream::config::ServerConfig;
use promptstream::server_adapters::axum::serve;
use promptstream::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = match telemetry::init_from_env() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
