//! Implementation of `litq config`.

use std::process::ExitCode;

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader, warning},
};

/// Shows the config files in effect, the merged settings and any warnings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    if config.sources.is_empty() {
        println!("{}", dim("# no configuration files found; showing defaults"));
    } else {
        for path in &config.sources {
            println!("{}", dim(&format!("# {}", path.display())));
        }
    }

    match config.to_toml() {
        Ok(toml) => print!("{toml}"),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    }

    let warnings = config.validate();
    if !warnings.is_empty() {
        eprintln!();
        eprintln!("{}", subheader("Warnings:"));
        for w in &warnings {
            eprintln!("   {} {w}", warning("warning:"));
        }
    }
    ExitCode::SUCCESS
}
