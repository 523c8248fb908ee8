//! Decoder-log analysis commands.
//!
//! The column outputs are gnuplot-ready; plotting itself stays outside the
//! tool. Graph and trace exports are written to files for GraphViz and
//! Perfetto respectively.

use std::path::PathBuf;

use clap::Args;
use console::style;

use avcgen_logs::{
    coeff_level_histogram, decoding_time_per_size, dependency_graph, load_log, trace_events,
    LogRecord,
};

fn read_log(path: &PathBuf) -> anyhow::Result<Vec<LogRecord>> {
    let yaml = std::fs::read_to_string(path)?;
    Ok(load_log(&yaml)?)
}

/// Histogram of residual coefficient magnitudes.
#[derive(Args, Debug)]
pub struct CmdCoeffHistogram {
    /// Path to the YAML decoder log.
    pub log: PathBuf,
}

impl CmdCoeffHistogram {
    pub fn run(&self) -> anyhow::Result<()> {
        let records = read_log(&self.log)?;
        let counts = coeff_level_histogram(&records);
        println!("{}", style("# magnitude count").dim());
        for (magnitude, count) in counts.iter().enumerate() {
            println!("{magnitude} {count}");
        }
        Ok(())
    }
}

/// Per-slice decoding time vs. byte size.
#[derive(Args, Debug)]
pub struct CmdTiming {
    /// Path to the YAML decoder log.
    pub log: PathBuf,
}

impl CmdTiming {
    pub fn run(&self) -> anyhow::Result<()> {
        let records = read_log(&self.log)?;
        println!("{}", style("# bytes microseconds").dim());
        for (bytes, micros) in decoding_time_per_size(&records)? {
            println!("{bytes} {micros}");
        }
        Ok(())
    }
}

/// Frame dependency graph in DOT format.
#[derive(Args, Debug)]
pub struct CmdDepGraph {
    /// Path to the YAML decoder log.
    pub log: PathBuf,

    /// Path of the .dot output file.
    pub output: PathBuf,
}

impl CmdDepGraph {
    pub fn run(&self) -> anyhow::Result<()> {
        let records = read_log(&self.log)?;
        std::fs::write(&self.output, dependency_graph(&records))?;
        println!(
            "{} wrote {} (render with: dot -Tsvg {} > deps.svg)",
            style("Done:").green().bold(),
            self.output.display(),
            self.output.display()
        );
        Ok(())
    }
}

/// Trace Event Format export for Perfetto.
#[derive(Args, Debug)]
pub struct CmdTrace {
    /// Path to the YAML decoder log.
    pub log: PathBuf,

    /// Path of the .json output file.
    pub output: PathBuf,
}

impl CmdTrace {
    pub fn run(&self) -> anyhow::Result<()> {
        let records = read_log(&self.log)?;
        std::fs::write(&self.output, trace_events(&records)?)?;
        println!(
            "{} wrote {} (open on https://ui.perfetto.dev/)",
            style("Done:").green().bold(),
            self.output.display()
        );
        Ok(())
    }
}
