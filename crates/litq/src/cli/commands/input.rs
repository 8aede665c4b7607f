//! Collecting query text from arguments, files and stdin.

use std::{
    fs,
    io::{self, Read},
    path::Path,
    process::ExitCode,
};

use litq_query::{ParseOptions, Parsed, from_json_with, parse_str_with};
use serde_json::Value;

use crate::cli::args::InputArgs;

/// One query to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Human-readable origin, e.g. `queries.txt:3`.
    pub source: String,
    /// Query text or JSON document.
    pub text: String,
}

/// Gathers queries from positional arguments and `--file` options.
///
/// Files hold one query per line, skipping blank lines and `#` comments. With
/// `--from-json` each file is a single document.
pub fn read_inputs(args: &InputArgs) -> Result<Vec<Input>, ExitCode> {
    let mut inputs: Vec<Input> = args
        .queries
        .iter()
        .enumerate()
        .map(|(i, text)| Input {
            source: format!("query {}", i + 1),
            text: text.clone(),
        })
        .collect();

    for path in &args.files {
        let content = read_source(path).map_err(|e| {
            eprintln!("error: failed to read {}: {e}", path.display());
            ExitCode::FAILURE
        })?;
        inputs.extend(split_inputs(&path.display().to_string(), &content, args.from_json));
    }

    if inputs.is_empty() {
        eprintln!("error: no queries given");
        eprintln!("pass queries as arguments or use --file");
        return Err(ExitCode::FAILURE);
    }
    Ok(inputs)
}

/// Parses a single query given as text or, with `from_json`, as canonical
/// JSON.
pub fn parse_query(
    text: &str,
    from_json: bool,
    options: &ParseOptions,
) -> Result<Parsed, ExitCode> {
    if !from_json {
        return Ok(parse_str_with(text, options));
    }
    let value: Value = serde_json::from_str(text).map_err(|e| {
        eprintln!("error: invalid JSON: {e}");
        ExitCode::FAILURE
    })?;
    Ok(from_json_with(&value, options))
}

/// Reads a file, or stdin for `-`.
fn read_source(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        fs::read_to_string(path)
    }
}

/// Splits file content into inputs.
fn split_inputs(name: &str, content: &str, whole: bool) -> Vec<Input> {
    if whole {
        return vec![Input {
            source: name.to_string(),
            text: content.to_string(),
        }];
    }
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(i, line)| Input {
            source: format!("{name}:{}", i + 1),
            text: line.trim().to_string(),
        })
        .collect()
}
