use std::process::ExitCode;

use clap::Parser;

use docqa_cli::{init_tracing, resolve_paths, run, Cli};
use docqa_core::config::Config;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose());

    let result = Config::load_in(&cli.config_dir)
        .and_then(|config| config.settings())
        .map_err(anyhow::Error::from)
        .and_then(|mut settings| {
            resolve_paths(&mut settings, &cli.config_dir);
            run(&cli, &settings, &mut std::io::stdout().lock())
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("[docqa] error: {e:#}");
            ExitCode::from(2)
        }
    }
}
