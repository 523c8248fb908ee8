//! NAL unit framing and payload dispatch.
//!
//! Every NAL unit is emitted with a 4-byte start code, the header byte, the
//! payload RBSP, and the trailing stop bit plus zero padding. Emulation
//! prevention is intentionally not applied.

use std::io::Write;

use avcgen_core::bitstream::BitWriter;
use avcgen_core::error::{DescriptionError, Error, Result};

use crate::desc::{NalPayload, NalUnit};
use crate::{pps, slice, sps};

/// NAL unit types the generator can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NalUnitType {
    /// Non-IDR slice.
    Slice = 1,
    /// IDR slice.
    IdrSlice = 5,
    /// Sequence parameter set.
    Sps = 7,
    /// Picture parameter set.
    Pps = 8,
    /// Access unit delimiter.
    Aud = 9,
    /// SPS extension.
    SpsExt = 13,
    /// Subset SPS.
    SubsetSps = 15,
}

impl NalUnitType {
    /// Map a raw nal_unit_type value to a supported type.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Slice),
            5 => Some(Self::IdrSlice),
            7 => Some(Self::Sps),
            8 => Some(Self::Pps),
            9 => Some(Self::Aud),
            13 => Some(Self::SpsExt),
            15 => Some(Self::SubsetSps),
            _ => None,
        }
    }

    /// The raw nal_unit_type value.
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Encode one NAL unit to `sink`.
pub fn encode_nal<W: Write>(sink: &mut W, nal: &NalUnit) -> Result<()> {
    let mut writer = BitWriter::new();
    writer.write_bits(1, 32)?; // start code
    writer.write_bit(false)?; // forbidden_zero_bit
    writer.write_bits(u32::from(nal.ref_idc), 2)?;
    writer.write_bits(u32::from(nal.unit_type.value()), 5)?;

    match (&nal.payload, nal.unit_type) {
        (NalPayload::Slice(s), NalUnitType::Slice | NalUnitType::IdrSlice) => {
            slice::encode_slice(&mut writer, sink, nal.ref_idc, nal.unit_type, s)?;
        }
        (NalPayload::SequenceParameterSet(s), NalUnitType::Sps) => {
            sps::encode_sps(&mut writer, s)?;
        }
        (NalPayload::PictureParameterSet(p), NalUnitType::Pps) => {
            pps::encode_pps(&mut writer, p)?;
        }
        (NalPayload::AccessUnitDelimiter(aud), NalUnitType::Aud) => {
            writer.write_bits(u32::from(aud.primary_pic_type), 3)?;
        }
        (NalPayload::SpsExtension(spse), NalUnitType::SpsExt) => {
            sps::encode_sps_extension(&mut writer, spse)?;
        }
        (NalPayload::SubsetSps(ssps), NalUnitType::SubsetSps) => {
            sps::encode_subset_sps(&mut writer, ssps)?;
        }
        (_, unit_type) => {
            return Err(DescriptionError::Malformed {
                message: format!("payload does not match nal_unit_type {}", unit_type.value()),
            }
            .into());
        }
    }

    writer.write_rbsp_trailing_bits()?;
    writer.finish_to(sink)?;
    Ok(())
}

/// Encode a whole description to `sink`, one NAL unit after another.
///
/// Errors are attributed to the zero-based index of the offending NAL unit.
pub fn encode_stream<W: Write>(nals: &[NalUnit], sink: &mut W) -> Result<()> {
    for (index, nal) in nals.iter().enumerate() {
        tracing::debug!(
            index,
            nal_unit_type = nal.unit_type.value(),
            nal_ref_idc = nal.ref_idc,
            "encoding NAL unit"
        );
        encode_nal(sink, nal).map_err(|e| Error::at_nal(e, index))?;
    }
    Ok(())
}
