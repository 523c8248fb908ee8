//! avcgen CLI - generate H.264 conformance bitstreams and analyze decoder logs.

use clap::{Parser, Subcommand};

mod commands;

use commands::{CmdCoeffHistogram, CmdDepGraph, CmdGenerate, CmdTiming, CmdTrace};

/// Command-line arguments for the avcgen tool.
#[derive(Parser, Debug)]
#[command(name = "avcgen")]
#[command(version)]
#[command(about = "H.264/AVC conformance bitstream generator")]
#[command(long_about = "avcgen turns hand-authored YAML stream descriptions into raw Annex-B\n\
    H.264 bitstreams, field by field and without validation, for exercising\n\
    decoders on streams no encoder would produce. It also post-processes the\n\
    YAML trace logs such decoders emit.\n\n\
    EXAMPLES:\n    \
    avcgen generate input.yaml output.264\n    \
    avcgen coeff-histogram decode-log.yaml\n    \
    avcgen dep-graph decode-log.yaml deps.dot")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an Annex-B bitstream from a YAML stream description
    Generate(CmdGenerate),
    /// Histogram of residual coefficient magnitudes in a decoder log
    CoeffHistogram(CmdCoeffHistogram),
    /// Per-slice decoding time vs. byte size columns from a decoder log
    Timing(CmdTiming),
    /// Frame dependency graph in DOT format from a decoder log
    DepGraph(CmdDepGraph),
    /// Trace Event Format export of slice decoding spans
    Trace(CmdTrace),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match args.command {
        Command::Generate(cmd) => cmd.run(),
        Command::CoeffHistogram(cmd) => cmd.run(),
        Command::Timing(cmd) => cmd.run(),
        Command::DepGraph(cmd) => cmd.run(),
        Command::Trace(cmd) => cmd.run(),
    }
}
