//! group-assign - sort participants into groups by their preferences.
//!
//! Reads `<id>,<cost_1>,...,<cost_n>` lines from stdin and prints one line per
//! participant with the assigned group(s).

use std::io::{self, Write};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use group_assign::input::{read_participants, EXAMPLE};
use group_assign::report::{render_csv, render_json};
use group_assign::{Cost, ForbiddenPairs, Problem, DEFAULT_PENALTY};

const EXIT_USAGE: u8 = 1;
const EXIT_INPUT: u8 = 2;
const EXIT_SOLVE: u8 = 3;
const EXIT_OUTPUT: u8 = 4;

/// Uses preferences to sort participants into groups. Input data is read from stdin.
#[derive(Parser)]
#[command(name = "group-assign")]
#[command(version, about, long_about = None)]
#[command(after_help = "Usage: group-assign < preferences.csv")]
struct Cli {
    /// Print an example preferences document in the correct format and leave
    #[arg(short, long)]
    example: bool,

    /// Append the cost of every assignment to the output
    #[arg(short, long)]
    costs: bool,

    /// Assign participants to multiple groups: split the preferences before this index (counting from 0)
    #[arg(short, long, value_name = "INDEX")]
    multiple: Option<usize>,

    /// Mutually exclusive groups for --multiple, e.g. 0-1,2-0
    #[arg(short = 'x', long, value_name = "A-B,...")]
    exclusive: Option<ForbiddenPairs>,

    /// Cost added to a forbidden follow-up group
    #[arg(short, long, default_value_t = DEFAULT_PENALTY)]
    penalty: Cost,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// id,group...[,cost...]
    #[default]
    Csv,
    /// Array of {"id", "group"} objects
    Json,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };
    init_logging(cli.verbose);

    if cli.example {
        print!("{EXAMPLE}");
        return ExitCode::SUCCESS;
    }

    let participants = match read_participants(io::stdin().lock()) {
        Ok(participants) => participants,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::from(EXIT_INPUT);
        }
    };

    let mut problem = Problem::new(participants).with_penalty(cli.penalty);
    if let Some(split) = cli.multiple {
        problem = problem.with_split(split);
    }
    if let Some(forbidden) = cli.exclusive {
        problem = problem.with_forbidden(forbidden);
    }
    debug!(participants = problem.participants().len(), "solving");

    let assignments = match problem.solve() {
        Ok(assignments) => assignments,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::from(EXIT_SOLVE);
        }
    };

    let output = match cli.format {
        OutputFormat::Csv => render_csv(&assignments, cli.costs),
        OutputFormat::Json => match render_json(&assignments, cli.costs) {
            Ok(json) => json + "\n",
            Err(err) => {
                eprintln!("Error: {err}");
                return ExitCode::from(EXIT_OUTPUT);
            }
        },
    };
    if let Err(err) = write_output(&mut io::stdout().lock(), &output) {
        eprintln!("Error: failed to write output: {err}");
        return ExitCode::from(EXIT_OUTPUT);
    }
    ExitCode::SUCCESS
}

fn write_output(out: &mut impl Write, output: &str) -> io::Result<()> {
    out.write_all(output.as_bytes())?;
    out.flush()
}
