//! Implementation of `litq lint`.

use std::process::ExitCode;

use litq_lint::Report;
use log::debug;
use serde::Serialize;
use serde_json::Value;

use super::input::{Input, read_inputs};
use crate::cli::{
    args::LintCommand,
    context::CommandContext,
    output::{dim, header, print_json, success, summary},
};

/// JSON output for one linted query.
#[derive(Serialize)]
struct JsonLintResult<'a> {
    /// Where the query came from.
    source: &'a str,
    /// The query text.
    query: &'a str,
    /// Diagnostics at or above the minimum severity.
    diagnostics: Report,
}

/// Lints every input query and prints the reports.
pub fn run(ctx: &CommandContext, cmd: &LintCommand) -> ExitCode {
    let inputs = match read_inputs(&cmd.input) {
        Ok(inputs) => inputs,
        Err(code) => return code,
    };
    let targets = ctx.targets(&cmd.platforms.platforms);
    let linter = match ctx.linter(&targets, &cmd.disable) {
        Ok(linter) => linter,
        Err(code) => return code,
    };
    let min_severity = cmd.min_severity.unwrap_or(ctx.config.lint.min_severity);
    debug!("linting {} inputs for {targets:?}", inputs.len());

    let results = if cmd.input.from_json {
        inputs
            .iter()
            .map(|input| {
                serde_json::from_str::<Value>(&input.text)
                    .map_err(|e| format!("{}: invalid JSON: {e}", input.source))
                    .and_then(|value| {
                        linter
                            .lint_json(&value, &targets)
                            .map_err(|e| e.to_string())
                    })
            })
            .collect::<Vec<_>>()
    } else {
        let texts: Vec<&str> = inputs.iter().map(|input| input.text.as_str()).collect();
        linter
            .lint_batch(texts.as_slice(), &targets)
            .into_iter()
            .map(|result| result.map_err(|e| e.to_string()))
            .collect()
    };

    let mut reports = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let failed = reports.iter().any(Report::has_errors);
    let shown: Vec<Report> = reports.iter().map(|r| r.at_least(min_severity)).collect();

    let code = if cmd.json {
        print_json_results(&inputs, &shown)
    } else {
        print_text_results(&inputs, &shown, cmd.input.from_json);
        ExitCode::SUCCESS
    };
    if failed { ExitCode::FAILURE } else { code }
}

/// Prints reports as a JSON array.
fn print_json_results(inputs: &[Input], reports: &[Report]) -> ExitCode {
    let results: Vec<JsonLintResult<'_>> = inputs
        .iter()
        .zip(reports)
        .map(|(input, report)| JsonLintResult {
            source: &input.source,
            query: &input.text,
            diagnostics: report.clone(),
        })
        .collect();
    print_json(&results)
}

/// Prints rendered reports and a summary line.
fn print_text_results(inputs: &[Input], reports: &[Report], from_json: bool) {
    let many = inputs.len() > 1;
    for (input, report) in inputs.iter().zip(reports) {
        if many {
            println!("{} {}", header(&input.source), dim(&input.text));
        }
        // Spans in list input do not point into the text.
        let source = (!from_json).then_some(input.text.as_str());
        if report.is_empty() {
            if many {
                println!("{}", success("ok"));
            }
        } else {
            print!("{}", report.render(source));
        }
        if many {
            println!();
        }
    }

    let text = summary(reports);
    if reports.iter().all(Report::is_empty) {
        println!("{}", success(&text));
    } else {
        println!("{text}");
    }
}
