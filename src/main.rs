//! ocplog - decode OCP SAS-SATA device telemetry log dumps
//!
//! Feeds captured raw page images of GP logs 0x24 and 0x25 (page N at byte
//! offset 512*N, as produced by dumping Read Log Ext output) through the
//! telemetry decoder and prints the text report, optionally followed by the
//! JSON tree.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ocplog::source::{LOG_CURRENT_INTERNAL_STATUS, LOG_SAVED_INTERNAL_STATUS};
use ocplog::{print_telemetry_log, FileImageSource, TextJsonReport};

#[derive(Parser)]
#[command(name = "ocplog", version, about = "OCP SAS-SATA device telemetry log decoder")]
struct Cli {
    /// Raw page image of the Current Device Internal Status log (0x24)
    #[arg(long, value_name = "FILE")]
    data: PathBuf,

    /// Raw page image of the Saved Device Internal Status log (0x25)
    #[arg(long, value_name = "FILE")]
    strings: PathBuf,

    /// Also print the report as a JSON tree
    #[arg(long)]
    json: bool,

    /// Enable debug diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    let mut source = FileImageSource::new();
    if let Err(err) = source.load(LOG_CURRENT_INTERNAL_STATUS, &cli.data) {
        eprintln!("ocplog: {err}");
        return ExitCode::FAILURE;
    }
    if let Err(err) = source.load(LOG_SAVED_INTERNAL_STATUS, &cli.strings) {
        eprintln!("ocplog: {err}");
        return ExitCode::FAILURE;
    }
    let nsectors_0x24 = source.nsectors(LOG_CURRENT_INTERNAL_STATUS);
    let nsectors_0x25 = source.nsectors(LOG_SAVED_INTERNAL_STATUS);

    let mut report = TextJsonReport::new();
    let result = print_telemetry_log(&mut source, nsectors_0x24, nsectors_0x25, &mut report);

    // Output emitted before a failure is retained.
    let (text, tree) = report.into_parts();
    print!("{text}");
    if cli.json {
        match serde_json::to_string_pretty(&tree) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("ocplog: failed to render JSON tree: {err}"),
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ocplog: {err}");
            ExitCode::FAILURE
        }
    }
}
