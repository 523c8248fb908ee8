//! # avcgen-core
//!
//! Core types for the avcgen conformance-stream generator:
//! - Error handling types
//! - Bit-level stream writing with incremental flushing
//! - Exp-Golomb coding primitives
//! - A bit reader used as the reference decode side in tests

pub mod bitstream;
pub mod error;

pub use bitstream::{BitReader, BitWriter};
pub use error::{BitstreamError, DescriptionError, Error, Result};
