mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "dockscript",
    about = "Turn a Dockerfile into a self-building script with the project files embedded"
)]
#[command(version)]
struct Cli {
    /// Path to the directory containing the Dockerfile
    #[arg(long, short = 'p', default_value = ".")]
    path: PathBuf,
    /// Decode every embedded file again after writing the script
    #[arg(long)]
    verify: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                // arch-lint: allow(no-silent-result-drop) reason="an unset or malformed RUST_LOG falls back to warn"
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match commands::generate(&cli.path, cli.verify) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
