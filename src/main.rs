use std::io::Write as _;
use std::process::ExitCode;

use anyhow::Context as _;
use serde::Serialize;
use serde_json::json;

use croxz_bridge::cli::{ArgsError, Cli};
use croxz_bridge::downloader::extractors::{ExtractorConfig, InfoExtractorOrchestrator};

fn main() -> ExitCode {
    // Logging problems must not cost the caller its JSON
    if let Err(err) = croxz_bridge::logging::init() {
        eprintln!("{err:#}");
    }

    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(ArgsError::Display(err)) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(ArgsError::Invalid(message)) => {
            tracing::debug!(%message, "rejected arguments");
            return emit_error(&message);
        }
    };
    tracing::debug!(?cli, "parsed cli");

    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => emit_error(&format!("{err:#}")),
    }
}

fn try_main(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    let output = runtime.block_on(async {
        let orchestrator = InfoExtractorOrchestrator::new(ExtractorConfig::from_env());
        croxz_bridge::commands::run(&cli.command, &orchestrator).await
    });

    print_json(&output)
}

/// One line of JSON; non-ASCII is written as-is
fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let line = serde_json::to_string(value).context("serialize output")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}").context("write stdout")?;
    stdout.flush().context("flush stdout")?;
    Ok(())
}

fn emit_error(message: &str) -> ExitCode {
    if let Err(err) = print_json(&json!({ "error": message })) {
        eprintln!("{err:#}");
    }
    ExitCode::FAILURE
}
