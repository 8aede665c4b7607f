//! Implementation of `litq format`.

use std::process::ExitCode;

use litq_lint::Report;
use litq_query::{to_platform_string, to_query_string_with};

use super::input::parse_query;
use crate::cli::{args::FormatCommand, context::CommandContext};

/// Prints a query in canonical syntax, or in a platform's own syntax.
///
/// Queries with fatal parse errors are not printed; their errors go to
/// stderr.
pub fn run(ctx: &CommandContext, cmd: &FormatCommand) -> ExitCode {
    let explicit: Vec<_> = cmd.platform.into_iter().collect();
    let targets = ctx.targets(&explicit);
    let options = ctx.parse_options(&targets);
    let parsed = match parse_query(&cmd.query, cmd.from_json, &options) {
        Ok(parsed) => parsed,
        Err(code) => return code,
    };

    if parsed.has_fatal() {
        let report = Report::new(parsed.diagnostics);
        let source = (!cmd.from_json).then_some(cmd.query.as_str());
        eprint!("{}", report.render(source));
        eprintln!("error: query has fatal errors; not formatting");
        return ExitCode::FAILURE;
    }

    let text = match cmd.platform {
        Some(platform) => to_platform_string(&parsed.query, platform),
        None => to_query_string_with(&parsed.query, &options.precedence),
    };
    println!("{text}");
    ExitCode::SUCCESS
}
