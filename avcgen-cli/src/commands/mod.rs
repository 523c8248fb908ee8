//! CLI subcommand implementations.

pub mod analyze;
pub mod generate;

pub use analyze::{CmdCoeffHistogram, CmdDepGraph, CmdTiming, CmdTrace};
pub use generate::CmdGenerate;
