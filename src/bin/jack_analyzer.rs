use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use jack::{Analyzer, ErrorKind};

#[derive(Debug, Parser)]
#[command(about = "Checks a Jack class and writes its tagged tokens")]
struct CmdOpts {
    /// Jack source file
    source: PathBuf,

    /// Destination for the tagged tokens
    output: PathBuf,

    /// Log more; repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let opts = CmdOpts::parse();

    let level = match opts.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = Analyzer::run_file(&opts.source, &opts.output) {
        let exit_code = match e.kind() {
            ErrorKind::CompilationError => 65,
            ErrorKind::SourceError => 66,
            ErrorKind::OutputError => 74,
        };
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(exit_code);
    }
}
