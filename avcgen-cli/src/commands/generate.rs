//! Bitstream generation command.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use avcgen_h264::{encode_stream, load_stream};

/// Generate an Annex-B bitstream from a YAML stream description.
#[derive(Args, Debug)]
pub struct CmdGenerate {
    /// Path to the YAML stream description.
    pub input: PathBuf,

    /// Path of the .264 output file.
    pub output: PathBuf,
}

impl CmdGenerate {
    /// Execute the generate command.
    pub fn run(&self) -> anyhow::Result<()> {
        info!("loading {}", self.input.display());
        let yaml = std::fs::read_to_string(&self.input)?;
        let nals = load_stream(&yaml)?;

        info!("generating {}", self.output.display());
        let mut sink = BufWriter::new(File::create(&self.output)?);
        encode_stream(&nals, &mut sink)?;
        let bytes = sink.into_inner()?.metadata()?.len();

        println!(
            "{} {} NAL unit(s), {} bytes -> {}",
            style("Done:").green().bold(),
            nals.len(),
            bytes,
            style(self.output.display()).white()
        );
        Ok(())
    }
}
