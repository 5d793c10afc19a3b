//! `promptstream-generate`: stream one generation to stdout.
//!
//! ```text
//! promptstream-generate [--preset blog|marketing|email|general] <prompt>...
//! ```
//!
//! Ctrl-C cancels the stream; partial output stays on screen.

use std::io::Write;
use std::process::ExitCode;

use promptstream::client::GenerationClient;
use promptstream::config::ClientConfig;
use promptstream::types::{Preset, StreamStatus};
use promptstream::{CancelHandle, GenerateError, telemetry};

const USAGE: &str = "usage: promptstream-generate [--preset blog|marketing|email|general] <prompt>...";

struct Args {
    preset: Preset,
    prompt: String,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, GenerateError> {
    let mut preset = Preset::default();
    let mut words = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--preset" | "-p" => {
                let name = args.next().ok_or_else(|| {
                    GenerateError::Validation("--preset requires a value".to_string())
                })?;
                preset = name.parse()?;
            }
            _ => match arg.strip_prefix("--preset=") {
                Some(name) => preset = name.parse()?,
                None => words.push(arg),
            },
        }
    }

    Ok(Args {
        preset,
        prompt: words.join(" "),
    })
}

/// Print one delta immediately. A closed stdout (e.g. a broken pipe) cancels
/// the generation instead of reading the rest of it.
fn write_delta(out: &mut impl Write, delta: &str, cancel: &CancelHandle) {
    if let Err(e) = out.write_all(delta.as_bytes()).and_then(|()| out.flush()) {
        if !cancel.is_cancelled() {
            tracing::warn!("Output closed, cancelling: {e}");
            cancel.cancel();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = match telemetry::init_from_env() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n{USAGE}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancelHandle::new();
    let on_write_error = cancel.clone();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let request = args.preset.request(args.prompt);
    let client = GenerationClient::new(config);
    tracing::info!(
        preset = args.preset.name(),
        endpoint = %client.config().endpoint,
        "Generating"
    );
    let mut stdout = std::io::stdout();

    let result = client
        .generate(&request, cancel, |delta| {
            write_delta(&mut stdout, delta, &on_write_error)
        })
        .await;
    write_delta(&mut stdout, "\n", &on_write_error);

    match result {
        Ok(outcome) => match outcome.status {
            StreamStatus::Complete | StreamStatus::Cancelled => ExitCode::SUCCESS,
            StreamStatus::Error(message) => {
                tracing::error!("Generation failed: {message}");
                eprintln!("Something went wrong.");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
