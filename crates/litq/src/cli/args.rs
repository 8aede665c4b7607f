//! Clap argument definitions for the `litq` CLI.

use std::{env, path::PathBuf, process::exit};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind};
use litq_query::{Platform, Severity};
use log::LevelFilter;

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "litq")]
#[command(about = "Lint, parse and format boolean bibliographic search queries")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Log level (overrides RUST_LOG)
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The log filter selected by `-v` and `--log-level`.
    pub fn log_filter(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if let Some(level) = self.log_level {
            level.to_level_filter()
        } else {
            LevelFilter::Warn
        }
    }
}

/// Log levels accepted by `--log-level`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages.
    Info,
    /// Debug output.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Converts to a `log` filter.
    pub const fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

/// Where query text comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Queries to process
    pub queries: Vec<String>,

    /// Read queries from a file, one per line (`#` starts a comment; `-` is stdin)
    #[arg(short = 'f', long = "file")]
    pub files: Vec<PathBuf>,

    /// Treat each input as a canonical JSON document instead of a query string
    #[arg(long)]
    pub from_json: bool,
}

/// Target platform selection.
#[derive(Args, Debug, Clone, Default)]
pub struct PlatformArgs {
    /// Target platform (can be specified multiple times) [default: from config]
    #[arg(short = 'p', long = "platform")]
    pub platforms: Vec<Platform>,
}

/// Arguments for `litq lint`.
#[derive(Args, Debug, Clone)]
pub struct LintCommand {
    #[command(flatten)]
    /// Query sources.
    pub input: InputArgs,

    #[command(flatten)]
    /// Target platforms.
    pub platforms: PlatformArgs,

    /// Hide diagnostics below this severity [default: from config]
    #[arg(long)]
    pub min_severity: Option<Severity>,

    /// Disable a rule for this run (can be specified multiple times)
    #[arg(short = 'd', long = "disable")]
    pub disable: Vec<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `litq parse`.
#[derive(Args, Debug, Clone)]
pub struct ParseCommand {
    /// Query to parse
    pub query: String,

    #[command(flatten)]
    /// Target platforms, which pick the operator precedence.
    pub platforms: PlatformArgs,

    /// Parse the input as canonical JSON instead of a query string
    #[arg(long)]
    pub from_json: bool,

    /// Output canonical JSON
    #[arg(long)]
    pub json: bool,

    /// Use the operator-list shape for JSON output
    #[arg(long, requires = "json")]
    pub list: bool,
}

/// Arguments for `litq format`.
#[derive(Args, Debug, Clone)]
pub struct FormatCommand {
    /// Query to format
    pub query: String,

    /// Render for this platform instead of the canonical syntax
    #[arg(short = 'p', long)]
    pub platform: Option<Platform>,

    /// Parse the input as canonical JSON instead of a query string
    #[arg(long)]
    pub from_json: bool,
}

/// Arguments for `litq screen`.
#[derive(Args, Debug, Clone)]
pub struct ScreenCommand {
    /// Query to screen with
    pub query: String,

    /// JSON file holding an array of records (objects of field name to text)
    #[arg(short = 'r', long)]
    pub records: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `litq rules`.
#[derive(Args, Debug, Clone)]
pub struct RulesCommand {
    /// Show a single rule in detail
    pub code: Option<String>,

    /// Only list rules that apply to this platform
    #[arg(short = 'p', long)]
    pub platform: Option<Platform>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `litq init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.litq.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `litq` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Lint queries and report diagnostics
    #[command(after_help = "\
QUERY SYNTAX:
  term              Term must appear
  term1 term2       Both terms (implicit AND)
  \"phrase\"          Exact phrase
  ti:term           Field-qualified term
  a AND b, a OR b   Boolean operators
  NOT a             Exclusion
  a NEAR/3 b        Proximity
  (expr)            Grouping

EXAMPLES:
  litq lint 'cancer AND (therapy OR treatment)'
  litq lint -p pubmed 'tiab:oncology AND ther*'
  litq lint -f queries.txt --json
  litq lint --from-json -f search.json")]
    Lint(LintCommand),

    /// Show how a query is parsed
    Parse(ParseCommand),

    /// Print a query in canonical or platform syntax
    Format(FormatCommand),

    /// Select the records a query matches
    Screen(ScreenCommand),

    /// List lint rules
    Rules(RulesCommand),

    /// Initialize litq configuration in current directory
    Init(InitCommand),

    /// Show effective configuration settings
    Config,
}

/// Parses CLI arguments, printing hierarchical help for top-level `--help`.
pub fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if e.kind() == ErrorKind::DisplayHelp {
                let args: Vec<_> = env::args().collect();
                if args.len() <= 2 {
                    print_hierarchical_help();
                    exit(0);
                }
            }
            e.exit();
        }
    }
}

/// Prints custom help listing subcommands and global options.
fn print_hierarchical_help() {
    let cmd = Cli::command();
    let about = cmd.get_about().map(|s| s.to_string()).unwrap_or_default();

    println!("{about}");
    println!();
    println!("Usage: litq [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");

    for sub in cmd.get_subcommands() {
        let name = sub.get_name();
        if name == "help" {
            continue;
        }
        let about = sub.get_about().map(|s| s.to_string()).unwrap_or_default();
        println!("  {name:10} {about}");
    }

    println!(
        "  {:<10} Print this message or the help of the given subcommand(s)",
        "help"
    );
    println!();
    println!("Options:");
    println!("  -v, --verbose            Enable debug logging");
    println!("      --log-level <LEVEL>  Log level (overrides RUST_LOG)");
    println!("  -h, --help               Print help");
    println!();
    println!("Platforms: {}", platform_names().join(", "));
}

/// Names accepted by `--platform`.
fn platform_names() -> Vec<&'static str> {
    Platform::ALL.iter().map(|p| p.name()).collect()
}
