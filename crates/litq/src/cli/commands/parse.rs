//! Implementation of `litq parse`.

use std::process::ExitCode;

use litq_lint::Report;
use litq_query::{Shape, to_json};

use super::input::parse_query;
use crate::cli::{
    args::ParseCommand,
    context::CommandContext,
    output::{print_json, render_tree, subheader},
};

/// Parses a query and prints its tree, or its canonical JSON.
///
/// Exits with failure when the parser reports a fatal diagnostic.
pub fn run(ctx: &CommandContext, cmd: &ParseCommand) -> ExitCode {
    let targets = ctx.targets(&cmd.platforms.platforms);
    let options = ctx.parse_options(&targets);
    let parsed = match parse_query(&cmd.query, cmd.from_json, &options) {
        Ok(parsed) => parsed,
        Err(code) => return code,
    };
    let report = Report::new(parsed.diagnostics.iter().cloned());

    let code = if cmd.json {
        let shape = if cmd.list { Shape::List } else { Shape::String };
        // Keep stdout valid JSON; problems go to stderr.
        eprint!("{}", report.render(None));
        print_json(&to_json(&parsed.query, shape))
    } else {
        print!("{}", render_tree(&parsed.query));
        if !report.is_empty() {
            println!();
            println!("{}", subheader("Parse errors:"));
            let source = (!cmd.from_json).then_some(cmd.query.as_str());
            print!("{}", report.render(source));
        }
        ExitCode::SUCCESS
    };

    if parsed.has_fatal() {
        ExitCode::FAILURE
    } else {
        code
    }
}
