//! Implementation of `litq screen`.

use std::{fs, process::ExitCode};

use litq_lint::Report;
use litq_query::{Matcher, Record};
use log::debug;
use serde::Serialize;

use super::input::parse_query;
use crate::cli::{
    args::ScreenCommand,
    context::CommandContext,
    output::{dim, print_json, summary},
};

/// JSON output for `litq screen`.
#[derive(Serialize)]
struct JsonScreenOutput<'a> {
    /// Number of records read.
    total: usize,
    /// Zero-based indices of the selected records.
    selected: Vec<usize>,
    /// The selected records.
    records: Vec<&'a Record>,
}

/// Selects the records in a JSON file that a query matches.
pub fn run(ctx: &CommandContext, cmd: &ScreenCommand) -> ExitCode {
    let targets = ctx.targets(&[]);
    let parsed = match parse_query(&cmd.query, false, &ctx.parse_options(&targets)) {
        Ok(parsed) => parsed,
        Err(code) => return code,
    };
    if parsed.has_fatal() {
        let report = Report::new(parsed.diagnostics);
        eprint!("{}", report.render(Some(&cmd.query)));
        eprintln!("error: {}", summary([&report]));
        return ExitCode::FAILURE;
    }

    let content = match fs::read_to_string(&cmd.records) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("error: failed to read {}: {e}", cmd.records.display());
            return ExitCode::FAILURE;
        }
    };
    let records: Vec<Record> = match serde_json::from_str(&content) {
        Ok(records) => records,
        Err(e) => {
            eprintln!(
                "error: {} is not an array of records: {e}",
                cmd.records.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let matcher = Matcher::new(&parsed.query);
    let selected: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| matcher.selects(record))
        .map(|(i, _)| i)
        .collect();
    debug!("{} of {} records selected", selected.len(), records.len());

    if cmd.json {
        return print_json(&JsonScreenOutput {
            total: records.len(),
            records: selected.iter().map(|&i| &records[i]).collect(),
            selected,
        });
    }

    for &i in &selected {
        let title = records[i].get("title").map_or("(untitled)", String::as_str);
        println!("{:>4}  {title}", i + 1);
    }
    println!(
        "{}",
        dim(&format!("{} of {} records selected", selected.len(), records.len()))
    );
    ExitCode::SUCCESS
}
