//! Slice header and CAVLC slice data emission.
//!
//! Header element presence follows the slice type (mod 5), the NAL type and
//! ref idc, and which optional description fields are set. Slice data flushes
//! the writer to the byte sink once per macroblock so long slices never hold
//! more than a partial byte plus the current macroblock in memory.

use std::io::Write;

use avcgen_core::bitstream::BitWriter;
use avcgen_core::error::{Error, Result};

use crate::cavlc;
use crate::desc::{Macroblock, RefPicListMod, SliceDesc, Weight};
use crate::nal::NalUnitType;
use crate::tables;

/// Encode a slice RBSP (header plus CAVLC slice data, without NAL header or
/// trailing bits). `ref_idc` and `unit_type` come from the NAL envelope.
pub fn encode_slice<W: Write>(
    writer: &mut BitWriter,
    sink: &mut W,
    ref_idc: u8,
    unit_type: NalUnitType,
    slice: &SliceDesc,
) -> Result<()> {
    writer.write_ue(slice.first_mb_in_slice)?;
    writer.write_ue(slice.slice_type)?;
    let slice_type = (slice.slice_type % 5) as usize;
    writer.write_ue(slice.pic_parameter_set_id)?;

    if let Some(id) = slice.colour_plane_id {
        writer.write_bits(u32::from(id), 2)?;
    }

    if slice.frame_num.bits > 32 {
        return Err(Error::invalid_argument("frame_num.bits must be at most 32"));
    }
    let frame_num =
        (u64::from(slice.frame_num.absolute) & ((1u64 << slice.frame_num.bits) - 1)) as u32;
    writer.write_bits(frame_num, slice.frame_num.bits)?;

    if let Some(field_pic_flag) = slice.field_pic_flag {
        writer.write_bit(field_pic_flag)?;
        if field_pic_flag {
            writer.write_bit(
                slice
                    .bottom_field_flag
                    .ok_or_else(|| Error::missing_field("bottom_field_flag"))?,
            )?;
        }
    }

    let idr = unit_type == NalUnitType::IdrSlice || slice.non_idr_flag == Some(false);
    if idr {
        writer.write_ue(
            slice
                .idr_pic_id
                .ok_or_else(|| Error::missing_field("idr_pic_id"))?,
        )?;
    }

    let poc = &slice.pic_order_cnt;
    if poc.poc_type == 0 {
        let bits = poc
            .bits
            .ok_or_else(|| Error::missing_field("pic_order_cnt.bits"))?;
        if bits > 32 {
            return Err(Error::invalid_argument("pic_order_cnt.bits must be at most 32"));
        }
        let absolute = poc
            .absolute
            .ok_or_else(|| Error::missing_field("pic_order_cnt.absolute"))?;
        writer.write_bits((absolute as u64 & ((1u64 << bits) - 1)) as u32, bits)?;
        if let Some(bottom) = poc.bottom {
            let delta = i32::try_from(bottom - absolute)
                .map_err(|_| Error::invalid_argument("bottom field order count delta overflows"))?;
            writer.write_se(delta)?;
        }
    }
    if poc.poc_type == 1 {
        if let Some(delta0) = poc.delta0 {
            writer.write_se(delta0)?;
            if let Some(delta1) = poc.delta1 {
                writer.write_se(delta1)?;
            }
        }
    }

    if slice_type == 1 {
        writer.write_bit(
            slice
                .direct_spatial_mv_pred_flag
                .ok_or_else(|| Error::missing_field("direct_spatial_mv_pred_flag"))?,
        )?;
    }

    if slice_type <= 1 {
        let active = slice
            .num_ref_idx_active
            .as_ref()
            .ok_or_else(|| Error::missing_field("num_ref_idx_active"))?;
        writer.write_bit(active.override_flag)?;
        if active.override_flag {
            writer.write_ue(count_minus1(active.l0, "num_ref_idx_active.l0")?)?;
            if slice_type == 1 {
                let l1 = active
                    .l1
                    .ok_or_else(|| Error::missing_field("num_ref_idx_active.l1"))?;
                writer.write_ue(count_minus1(l1, "num_ref_idx_active.l1")?)?;
            }
        }

        let mod_lists = [
            &slice.ref_pic_list_modification_l0,
            &slice.ref_pic_list_modification_l1,
        ];
        for mods in mod_lists.iter().take(slice_type + 1) {
            match mods {
                Some(ops) => {
                    writer.write_bit(true)?;
                    for op in ops {
                        write_ref_pic_list_mod(writer, op)?;
                    }
                    writer.write_ue(3)?; // end of modification list
                }
                None => writer.write_bit(false)?,
            }
        }

        if let Some(weights_l0) = &slice.explicit_weights_l0 {
            let first = weights_l0
                .first()
                .ok_or_else(|| Error::invalid_argument("explicit_weights_l0 must not be empty"))?;
            writer.write_ue(first.y.log2_denom)?;
            writer.write_ue(first.cb.log2_denom)?;
            let weight_lists = [Some(weights_l0), slice.explicit_weights_l1.as_ref()];
            for list in weight_lists.iter().take(slice_type + 1) {
                let list = list.ok_or_else(|| Error::missing_field("explicit_weights_l1"))?;
                for table in list {
                    for weight in [table.y, table.cb, table.cr] {
                        write_weight(writer, weight)?;
                    }
                }
            }
        }
    }

    if ref_idc != 0 {
        if idr {
            writer.write_bit(
                slice
                    .no_output_of_prior_pics_flag
                    .ok_or_else(|| Error::missing_field("no_output_of_prior_pics_flag"))?,
            )?;
            writer.write_bit(
                slice
                    .long_term_reference_flag
                    .ok_or_else(|| Error::missing_field("long_term_reference_flag"))?,
            )?;
        } else {
            match &slice.memory_management_control_operations {
                Some(mmcos) => {
                    writer.write_bit(true)?;
                    for mmco in mmcos {
                        writer.write_ue(mmco.idc)?;
                        if let Some(sref) = mmco.sref {
                            let magnitude = u32::try_from(-i64::from(sref)).map_err(|_| {
                                Error::invalid_argument("mmco sref must not be positive")
                            })?;
                            writer.write_ue(magnitude)?;
                        }
                        if let Some(lref) = mmco.lref {
                            writer.write_ue(lref)?;
                        }
                    }
                    writer.write_bit(true)?; // terminating mmco idc == 0
                }
                None => writer.write_bit(false)?,
            }
        }
    }

    if let Some(idc) = slice.cabac_init_idc {
        writer.write_ue(idc)?;
    }
    writer.write_se(slice.slice_qp_delta)?;

    if let Some(idc) = slice.disable_deblocking_filter_idc {
        writer.write_ue(idc)?;
        if idc != 1 {
            let alpha = slice
                .slice_alpha_c0_offset
                .ok_or_else(|| Error::missing_field("slice_alpha_c0_offset"))?;
            let beta = slice
                .slice_beta_offset
                .ok_or_else(|| Error::missing_field("slice_beta_offset"))?;
            writer.write_se(alpha >> 1)?;
            writer.write_se(beta >> 1)?;
        }
    }

    match &slice.macroblocks_cavlc {
        Some(mbs) => encode_slice_data(writer, sink, slice, slice_type, mbs),
        None => Err(Error::unsupported("CABAC slice data")),
    }
}

fn count_minus1(count: u32, field: &str) -> Result<u32> {
    count
        .checked_sub(1)
        .ok_or_else(|| Error::invalid_argument(format!("{field} must be positive")))
}

fn write_ref_pic_list_mod(writer: &mut BitWriter, op: &RefPicListMod) -> Result<()> {
    // The sign of the delta selects between the subtract/add idc pair.
    let (idc, value) = match *op {
        RefPicListMod::Sref(diff) => (1 - u32::from(diff < 0), abs_minus1(diff, "sref")?),
        RefPicListMod::Lref(num) => (2, num),
        RefPicListMod::View(diff) => (5 - u32::from(diff < 0), abs_minus1(diff, "view")?),
    };
    writer.write_ue(idc)?;
    writer.write_ue(value)
}

fn abs_minus1(diff: i32, what: &str) -> Result<u32> {
    diff.unsigned_abs()
        .checked_sub(1)
        .ok_or_else(|| Error::invalid_argument(format!("{what} modification delta must not be 0")))
}

fn write_weight(writer: &mut BitWriter, weight: Weight) -> Result<()> {
    let is_default = weight.offset == 0
        && weight.log2_denom < 63
        && i64::from(weight.weight) == 1i64 << weight.log2_denom;
    writer.write_bit(!is_default)?;
    if !is_default {
        writer.write_se(weight.weight)?;
        writer.write_se(weight.offset)?;
    }
    Ok(())
}

fn encode_slice_data<W: Write>(
    writer: &mut BitWriter,
    sink: &mut W,
    slice: &SliceDesc,
    slice_type: usize,
    mbs: &[Macroblock],
) -> Result<()> {
    if slice_type > 2 {
        return Err(Error::unsupported(format!(
            "slice data for slice_type {slice_type}"
        )));
    }
    let i_pcm_type = [30u32, 48, 25][slice_type];
    let i_nxn_type = [5u32, 23, 0][slice_type];

    let mut skip_run: i64 = 0;
    for mb in mbs {
        writer.flush_to(sink)?;

        if let Some(run) = mb.mb_skip_run {
            writer.write_ue(run)?;
            skip_run = i64::from(run);
        }
        skip_run -= 1;
        if skip_run >= 0 {
            continue;
        }

        if let Some(flag) = mb.mb_field_decoding_flag {
            writer.write_bit(flag)?;
        }

        let mb_type = mb.mb_type.ok_or_else(|| Error::missing_field("mb_type"))?;
        writer.write_ue(mb_type)?;

        if mb_type == i_pcm_type {
            writer.align_to_byte()?; // pcm_alignment_zero_bit
            let pcm = mb
                .pcm_samples
                .as_ref()
                .ok_or_else(|| Error::missing_field("pcm_samples"))?;
            for &sample in &pcm.y {
                writer.write_bits(sample, pcm.bits_y)?;
            }
            for &sample in pcm.cb.iter().chain(&pcm.cr) {
                writer.write_bits(sample, pcm.bits_c)?;
            }
        }

        if mb_type == i_nxn_type {
            if let Some(flag) = mb.transform_size_8x8_flag {
                writer.write_bit(flag)?;
            }
        }

        let pred_modes = mb
            .rem_intra4x4_pred_modes
            .as_ref()
            .or(mb.rem_intra8x8_pred_modes.as_ref());
        if let Some(modes) = pred_modes {
            for &mode in modes {
                writer.write_bit(mode < 0)?;
                if mode >= 0 {
                    writer.write_bits(mode as u32, 3)?;
                }
            }
        }
        if let Some(mode) = mb.intra_chroma_pred_mode {
            writer.write_ue(mode)?;
        }

        if has_sub_mb_types(slice_type, mb_type) {
            let subs = mb
                .sub_mb_types
                .as_ref()
                .ok_or_else(|| Error::missing_field("sub_mb_types"))?;
            for &sub_mb_type in subs {
                writer.write_ue(sub_mb_type)?;
            }
        }

        if is_non_direct_inter(slice_type, mb_type) {
            for entry in &mb.ref_idx {
                let active = slice
                    .num_ref_idx_active
                    .as_ref()
                    .ok_or_else(|| Error::missing_field("num_ref_idx_active"))?;
                let count = if entry.block < 4 {
                    active.l0
                } else {
                    active
                        .l1
                        .ok_or_else(|| Error::missing_field("num_ref_idx_active.l1"))?
                };
                // With exactly two active refs ref_idx is a single inverted bit.
                if count == 2 {
                    writer.write_bit(entry.value & 1 == 0)?;
                } else {
                    writer.write_ue(entry.value)?;
                }
            }
            for &[x, y] in &mb.mvds {
                writer.write_se(x)?;
                writer.write_se(y)?;
            }
        }

        if has_coded_block_pattern(slice_type, mb_type) {
            let cbp = mb
                .coded_block_pattern
                .ok_or_else(|| Error::missing_field("coded_block_pattern"))?;
            let table = if mb_type < i_nxn_type {
                tables::CBP_INTER
            } else {
                tables::CBP_INTRA
            };
            let code = table.get(cbp as usize).copied().ok_or_else(|| {
                Error::invalid_argument(format!("coded_block_pattern {cbp} out of range"))
            })?;
            writer.write_ue(code)?;
        }

        if mb_type != i_nxn_type {
            if let Some(flag) = mb.transform_size_8x8_flag {
                writer.write_bit(flag)?;
            }
        }

        if let Some(delta) = mb.mb_qp_delta {
            writer.write_se(delta)?;
            for block in &mb.coeff_levels {
                cavlc::encode_residual_block(writer, block.nc, &block.c)?;
            }
        }
    }
    Ok(())
}

fn has_sub_mb_types(slice_type: usize, mb_type: u32) -> bool {
    match slice_type {
        0 => mb_type == 3 || mb_type == 4,
        1 => mb_type == 22,
        _ => false,
    }
}

fn is_non_direct_inter(slice_type: usize, mb_type: u32) -> bool {
    match slice_type {
        0 => mb_type < 5,
        1 => (1..23).contains(&mb_type),
        _ => false,
    }
}

fn has_coded_block_pattern(slice_type: usize, mb_type: u32) -> bool {
    match slice_type {
        0 => mb_type < 6,
        1 => mb_type < 24,
        _ => mb_type == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::{FrameNum, NumRefIdxActive, PcmSamples, PicOrderCnt};

    fn minimal_slice(slice_type: u32) -> SliceDesc {
        SliceDesc {
            first_mb_in_slice: 0,
            slice_type,
            pic_parameter_set_id: 0,
            colour_plane_id: None,
            frame_num: FrameNum { absolute: 0, bits: 4 },
            field_pic_flag: None,
            bottom_field_flag: None,
            non_idr_flag: None,
            idr_pic_id: None,
            pic_order_cnt: PicOrderCnt {
                poc_type: 2,
                bits: None,
                absolute: None,
                bottom: None,
                delta0: None,
                delta1: None,
            },
            direct_spatial_mv_pred_flag: None,
            num_ref_idx_active: Some(NumRefIdxActive {
                override_flag: false,
                l0: 1,
                l1: None,
            }),
            ref_pic_list_modification_l0: None,
            ref_pic_list_modification_l1: None,
            explicit_weights_l0: None,
            explicit_weights_l1: None,
            no_output_of_prior_pics_flag: None,
            long_term_reference_flag: None,
            memory_management_control_operations: None,
            cabac_init_idc: None,
            slice_qp_delta: 0,
            disable_deblocking_filter_idc: None,
            slice_alpha_c0_offset: None,
            slice_beta_offset: None,
            macroblocks_cavlc: Some(vec![]),
        }
    }

    fn encode_to_bytes(slice: &SliceDesc) -> Result<Vec<u8>> {
        let mut writer = BitWriter::new();
        let mut sink = Vec::new();
        encode_slice(&mut writer, &mut sink, 0, NalUnitType::Slice, slice)?;
        writer.finish_to(&mut sink)?;
        Ok(sink)
    }

    #[test]
    fn test_skip_run_suppresses_skipped_macroblocks() {
        let mut slice = minimal_slice(0);
        slice.macroblocks_cavlc = Some(vec![
            Macroblock {
                mb_skip_run: Some(2),
                ..Macroblock::default()
            },
            Macroblock::default(),
            Macroblock::default(),
        ]);
        // Header is 10 bits, the run is ue(2) = "011", the two skipped
        // macroblocks emit nothing.
        assert_eq!(encode_to_bytes(&slice).unwrap(), vec![0xE0, 0x58]);
    }

    #[test]
    fn test_pcm_samples_start_byte_aligned() {
        let mut slice = minimal_slice(2);
        slice.num_ref_idx_active = None;
        slice.macroblocks_cavlc = Some(vec![Macroblock {
            mb_type: Some(25), // I_PCM in an I slice
            pcm_samples: Some(PcmSamples {
                y: vec![0xAB],
                cb: vec![],
                cr: vec![],
                bits_y: 8,
                bits_c: 8,
            }),
            ..Macroblock::default()
        }]);
        assert_eq!(encode_to_bytes(&slice).unwrap(), vec![0xB8, 0x43, 0x40, 0xAB]);
    }

    #[test]
    fn test_missing_cavlc_macroblocks_is_unsupported() {
        let mut slice = minimal_slice(2);
        slice.num_ref_idx_active = None;
        slice.macroblocks_cavlc = None;
        let mut writer = BitWriter::new();
        let mut sink = Vec::new();
        let err =
            encode_slice(&mut writer, &mut sink, 0, NalUnitType::Slice, &slice).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_two_active_refs_use_inverted_bit() {
        use crate::desc::RefIdxEntry;
        let mut slice = minimal_slice(0);
        slice.num_ref_idx_active = Some(NumRefIdxActive {
            override_flag: false,
            l0: 2,
            l1: None,
        });
        slice.macroblocks_cavlc = Some(vec![Macroblock {
            mb_type: Some(0), // P_L0_16x16
            ref_idx: vec![RefIdxEntry { block: 0, value: 1 }],
            mvds: vec![[0, 0]],
            coded_block_pattern: Some(0),
            ..Macroblock::default()
        }]);
        // Header 10 bits, mb_type ue(0), ref_idx bit 0, two se(0) mvds,
        // cbp ue(me_inter[0] = 0) = "1".
        let bytes = encode_to_bytes(&slice).unwrap();
        assert_eq!(bytes.len(), 2);
        // Bit 11 (after the 10-bit header and mb_type) is the inverted
        // ref_idx: value 1 encodes as 0.
        assert_eq!(bytes[1] & 0b0001_0000, 0);
    }

    #[test]
    fn test_idr_slice_requires_idr_pic_id() {
        let slice = minimal_slice(2);
        let mut writer = BitWriter::new();
        let mut sink = Vec::new();
        let err = encode_slice(&mut writer, &mut sink, 3, NalUnitType::IdrSlice, &slice)
            .unwrap_err();
        assert!(err.to_string().contains("idr_pic_id"), "{err}");
    }

    #[test]
    fn test_ref_pic_list_modification_codes() {
        let mut writer = BitWriter::new();
        // sref -1: idc 0, value 0 -> "1" "1"
        write_ref_pic_list_mod(&mut writer, &RefPicListMod::Sref(-1)).unwrap();
        // sref +2: idc 1, value 1 -> "010" "010"
        write_ref_pic_list_mod(&mut writer, &RefPicListMod::Sref(2)).unwrap();
        // lref 3: idc 2, value 3 -> "011" "00100"
        write_ref_pic_list_mod(&mut writer, &RefPicListMod::Lref(3)).unwrap();
        assert_eq!(writer.pending_bits(), 2 + 6 + 8);
        let mut reader = avcgen_core::BitReader::new(writer.data());
        for expected in [0u32, 0, 1, 1, 2, 3] {
            assert_eq!(reader.read_ue().unwrap(), expected);
        }
    }
}
