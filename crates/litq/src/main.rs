//! Command-line interface for the `litq` query linter.

use std::process::ExitCode;

use litq::cli::{
    CommandContext,
    args::{Commands, parse_cli},
    commands,
};

fn main() -> ExitCode {
    let cli = parse_cli();

    // RUST_LOG still applies to modules the filter level leaves alone.
    env_logger::Builder::from_default_env()
        .filter_level(cli.log_filter())
        .init();

    // `init` must work even when an existing config is broken.
    let ctx = match cli.command {
        Commands::Init(_) | Commands::Rules(_) => CommandContext::load_cwd_only(),
        _ => CommandContext::load(),
    };
    match ctx {
        Ok(ctx) => commands::run(cli.command, &ctx),
        Err(code) => code,
    }
}
