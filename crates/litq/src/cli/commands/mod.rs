//! Command implementations and dispatch.

pub mod config;
pub mod format;
pub mod init;
mod input;
pub mod lint;
pub mod parse;
pub mod rules;
pub mod screen;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Lint(cmd) => lint::run(ctx, &cmd),
        Commands::Parse(cmd) => parse::run(ctx, &cmd),
        Commands::Format(cmd) => format::run(ctx, &cmd),
        Commands::Screen(cmd) => screen::run(ctx, &cmd),
        Commands::Rules(cmd) => rules::run(&cmd),
        Commands::Init(cmd) => init::run(ctx, &cmd),
        Commands::Config => config::run(ctx),
    }
}
