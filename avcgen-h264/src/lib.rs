//! # avcgen-h264
//!
//! H.264/AVC Annex-B bitstream generation from hand-authored stream
//! descriptions. Each NAL unit in a description is encoded field by field
//! exactly as written, including values a real encoder would never produce,
//! which is what makes the output useful as decoder conformance input.
//!
//! The crate is organized like a decoder's syntax modules, but encode-only:
//! - [`desc`]: the typed description data model and the YAML loader
//! - [`nal`]: start codes, NAL headers, and payload dispatch
//! - [`sps`] / [`pps`]: parameter-set payloads (incl. VUI, HRD, MVC)
//! - [`slice`]: slice headers and CAVLC slice data
//! - [`cavlc`]: residual block coding
//! - [`tables`]: the fixed VLC and permutation tables
//!
//! No emulation-prevention bytes are inserted: descriptions are expected to
//! avoid forbidden byte patterns themselves, keeping the emitted bitstream a
//! direct transcript of the description.

pub mod cavlc;
pub mod desc;
pub mod nal;
pub mod pps;
pub mod slice;
pub mod sps;
pub mod tables;

pub use desc::{load_stream, NalUnit, NalPayload};
pub use nal::{encode_nal, encode_stream, NalUnitType};
