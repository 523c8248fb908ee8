//! Sequence parameter set emission, including VUI and HRD blocks, the SPS
//! extension, and the subset SPS with its two-view MVC extension.
//!
//! Every syntax element comes straight from the description; the only derived
//! values are the HRD scales (from the CPB rates/sizes) and the VUI
//! bitstream-restriction quotients, mirroring how those fields are defined in
//! terms of the raw description values.

use avcgen_core::bitstream::BitWriter;
use avcgen_core::error::{Error, Result};

use crate::desc::{
    HrdParameters, MvcVuiParameters, SequenceParameterSet, SpsExtension, SubsetSps, VuiParameters,
};

/// profile_idc values whose SPS carries the chroma/bit-depth/scaling block.
const HIGH_PROFILE_IDCS: [u8; 13] = [100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 139, 134, 135];

/// profile_idc values whose subset SPS carries the MVC extension.
const MVC_PROFILE_IDCS: [u8; 3] = [118, 128, 134];

/// Encode an SPS RBSP (without NAL header or trailing bits).
pub fn encode_sps(writer: &mut BitWriter, sps: &SequenceParameterSet) -> Result<()> {
    writer.write_bits(u32::from(sps.profile_idc), 8)?;

    if sps.constraint_set_flags.len() > 8 {
        return Err(Error::invalid_argument(
            "more than 8 constraint_set_flags",
        ));
    }
    let mut flags = 0u32;
    for (i, &f) in sps.constraint_set_flags.iter().enumerate() {
        flags |= u32::from(f) << (7 - i);
    }
    writer.write_bits(flags, 8)?;
    writer.write_bits((sps.level_idc * 10.0).round() as u32, 8)?;
    writer.write_bit(true)?; // seq_parameter_set_id == 0

    if HIGH_PROFILE_IDCS.contains(&sps.profile_idc) {
        writer.write_ue(u32::from(sps.chroma_format_idc))?;
        if sps.chroma_format_idc == 3 {
            let flag = sps
                .separate_colour_plane_flag
                .ok_or_else(|| Error::missing_field("separate_colour_plane_flag"))?;
            writer.write_bit(flag)?;
        }
        writer.write_ue(depth_minus8(sps.bit_depth.luma)?)?;
        writer.write_ue(depth_minus8(sps.bit_depth.chroma)?)?;
        writer.write_bit(sps.qpprime_y_zero_transform_bypass_flag)?;
        match &sps.seq_scaling_matrix {
            Some(lists) => {
                writer.write_bit(true)?;
                write_scaling_lists(writer, lists)?;
            }
            None => writer.write_bit(false)?,
        }
    }

    writer.write_ue(sub_or_invalid(
        u32::from(sps.log2_max_frame_num),
        4,
        "log2_max_frame_num",
    )?)?;
    writer.write_ue(u32::from(sps.pic_order_cnt_type))?;
    match sps.pic_order_cnt_type {
        0 => {
            let log2 = sps
                .log2_max_pic_order_cnt_lsb
                .ok_or_else(|| Error::missing_field("log2_max_pic_order_cnt_lsb"))?;
            writer.write_ue(sub_or_invalid(u32::from(log2), 4, "log2_max_pic_order_cnt_lsb")?)?;
        }
        1 => {
            writer.write_bit(
                sps.delta_pic_order_always_zero_flag
                    .ok_or_else(|| Error::missing_field("delta_pic_order_always_zero_flag"))?,
            )?;
            writer.write_se(
                sps.offset_for_non_ref_pic
                    .ok_or_else(|| Error::missing_field("offset_for_non_ref_pic"))?,
            )?;
            writer.write_se(
                sps.offset_for_top_to_bottom_field
                    .ok_or_else(|| Error::missing_field("offset_for_top_to_bottom_field"))?,
            )?;
            let offsets = sps
                .offsets_for_ref_frames
                .as_ref()
                .ok_or_else(|| Error::missing_field("offsets_for_ref_frames"))?;
            writer.write_ue(offsets.len() as u32)?;
            for &offset in offsets {
                writer.write_se(offset)?;
            }
        }
        _ => {}
    }
    writer.write_ue(sps.max_num_ref_frames)?;
    writer.write_bit(sps.gaps_in_frame_num_value_allowed_flag)?;
    writer.write_ue(sub_or_invalid(sps.pic_size_in_mbs.width, 1, "pic_size_in_mbs.width")?)?;
    writer.write_ue(sub_or_invalid(sps.pic_size_in_mbs.height, 1, "pic_size_in_mbs.height")?)?;
    writer.write_bit(sps.frame_mbs_only_flag)?;
    if !sps.frame_mbs_only_flag {
        writer.write_bit(
            sps.mb_adaptive_frame_field_flag
                .ok_or_else(|| Error::missing_field("mb_adaptive_frame_field_flag"))?,
        )?;
    }
    writer.write_bit(sps.direct_8x8_inference_flag)?;
    match &sps.frame_crop_offsets {
        Some(crop) => {
            writer.write_bit(true)?;
            for offset in [crop.left, crop.right, crop.top, crop.bottom] {
                writer.write_ue(offset)?;
            }
        }
        None => writer.write_bit(false)?,
    }
    match &sps.vui_parameters {
        Some(vui) => {
            writer.write_bit(true)?;
            encode_vui(writer, sps, vui)?;
        }
        None => writer.write_bit(false)?,
    }
    Ok(())
}

fn depth_minus8(depth: u8) -> Result<u32> {
    sub_or_invalid(u32::from(depth), 8, "bit_depth")
}

fn sub_or_invalid(value: u32, minus: u32, field: &str) -> Result<u32> {
    value
        .checked_sub(minus)
        .ok_or_else(|| Error::invalid_argument(format!("{field} must be at least {minus}")))
}

/// Write scaling lists as wrapped deltas against a running last-scale of 8.
/// An empty list clears its presence flag.
pub(crate) fn write_scaling_lists(writer: &mut BitWriter, lists: &[Vec<i32>]) -> Result<()> {
    for list in lists {
        writer.write_bit(!list.is_empty())?;
        let mut last = 8i32;
        for &next in list {
            let delta = (next - last + 128).rem_euclid(256) - 128;
            writer.write_se(delta)?;
            last = next;
        }
    }
    Ok(())
}

fn encode_vui(writer: &mut BitWriter, sps: &SequenceParameterSet, vui: &VuiParameters) -> Result<()> {
    match &vui.aspect_ratio {
        Some(ar) => {
            writer.write_bit(true)?;
            writer.write_bits(u32::from(ar.idc), 8)?;
            if ar.idc == 255 {
                let width = ar.width.ok_or_else(|| Error::missing_field("aspect_ratio.width"))?;
                let height = ar
                    .height
                    .ok_or_else(|| Error::missing_field("aspect_ratio.height"))?;
                writer.write_bits(u32::from(width), 16)?;
                writer.write_bits(u32::from(height), 16)?;
            }
        }
        None => writer.write_bit(false)?,
    }

    writer.write_bit(vui.overscan_appropriate_flag.is_some())?;
    if let Some(flag) = vui.overscan_appropriate_flag {
        writer.write_bit(flag)?;
    }

    match &vui.video_signal_type {
        Some(vst) => {
            writer.write_bit(true)?;
            writer.write_bits(u32::from(vst.video_format), 3)?;
            writer.write_bit(vst.video_full_range_flag)?;
            match &vst.colour_description {
                Some(cd) => {
                    writer.write_bit(true)?;
                    writer.write_bits(u32::from(cd.colour_primaries), 8)?;
                    writer.write_bits(u32::from(cd.transfer_characteristics), 8)?;
                    writer.write_bits(u32::from(cd.matrix_coefficients), 8)?;
                }
                None => writer.write_bit(false)?,
            }
        }
        None => writer.write_bit(false)?,
    }

    match &vui.chroma_sample_loc {
        Some(loc) => {
            writer.write_bit(true)?;
            writer.write_ue(loc.top)?;
            writer.write_ue(loc.bottom)?;
        }
        None => writer.write_bit(false)?,
    }

    write_timing_info(writer, vui.timing_info.as_ref())?;
    write_hrd_pair(
        writer,
        vui.nal_hrd_parameters.as_ref(),
        vui.vcl_hrd_parameters.as_ref(),
        vui.low_delay_hrd_flag,
    )?;
    writer.write_bit(vui.pic_struct_present_flag)?;

    match &vui.bitstream_restriction {
        Some(br) => {
            writer.write_bit(true)?;
            writer.write_bit(br.motion_vectors_over_pic_boundaries_flag)?;
            let pic_size_in_mbs =
                u64::from(sps.pic_size_in_mbs.width) * u64::from(sps.pic_size_in_mbs.height);
            let raw_mb_bits = 256 * u64::from(sps.bit_depth.luma)
                + ((64u64 << sps.chroma_format_idc) & !64) * u64::from(sps.bit_depth.chroma);
            let bytes_code = if br.max_bytes_per_pic != 0 {
                pic_size_in_mbs * raw_mb_bits / br.max_bytes_per_pic / 8
            } else {
                0
            };
            writer.write_ue_u64(bytes_code)?;
            let bits_code = if br.max_bits_per_mb != 0 {
                (128 + raw_mb_bits) / br.max_bits_per_mb
            } else {
                0
            };
            writer.write_ue_u64(bits_code)?;
            writer.write_ue(br.log2_max_mv_length_horizontal)?;
            writer.write_ue(br.log2_max_mv_length_vertical)?;
            writer.write_ue(br.max_num_reorder_frames)?;
            writer.write_ue(br.max_dec_frame_buffering)?;
        }
        None => writer.write_bit(false)?,
    }
    Ok(())
}

fn write_timing_info(
    writer: &mut BitWriter,
    timing: Option<&crate::desc::TimingInfo>,
) -> Result<()> {
    match timing {
        Some(t) => {
            writer.write_bit(true)?;
            writer.write_bits(t.num_units_in_tick, 32)?;
            writer.write_bits(t.time_scale, 32)?;
            writer.write_bit(t.fixed_frame_rate_flag)?;
        }
        None => writer.write_bit(false)?,
    }
    Ok(())
}

fn write_hrd_pair(
    writer: &mut BitWriter,
    nal: Option<&HrdParameters>,
    vcl: Option<&HrdParameters>,
    low_delay_hrd_flag: bool,
) -> Result<()> {
    for hrd in [nal, vcl] {
        match hrd {
            Some(h) => {
                writer.write_bit(true)?;
                encode_hrd(writer, h)?;
            }
            None => writer.write_bit(false)?,
        }
    }
    if nal.is_some() || vcl.is_some() {
        writer.write_bit(low_delay_hrd_flag)?;
    }
    Ok(())
}

/// Encode an hrd_parameters() block.
///
/// The scales are the largest values (capped at 15) that keep every CPB rate
/// and size exactly representable: trailing zeros of the OR across CPBs,
/// less the fixed exponent of the syntax.
pub(crate) fn encode_hrd(writer: &mut BitWriter, hrd: &HrdParameters) -> Result<()> {
    let count = hrd
        .cpbs
        .len()
        .checked_sub(1)
        .ok_or_else(|| Error::invalid_argument("HRD needs at least one CPB"))?;
    writer.write_ue(count as u32)?;

    let rate_or = hrd.cpbs.iter().fold(0u64, |acc, c| acc | c.bit_rate);
    let size_or = hrd.cpbs.iter().fold(0u64, |acc, c| acc | c.size);
    let bit_rate_scale = scale_for(rate_or, 6);
    let cpb_size_scale = scale_for(size_or, 4);
    writer.write_bits(bit_rate_scale, 4)?;
    writer.write_bits(cpb_size_scale, 4)?;

    for cpb in &hrd.cpbs {
        let rate = (cpb.bit_rate >> 6 >> bit_rate_scale)
            .checked_sub(1)
            .ok_or_else(|| Error::invalid_argument("CPB bit_rate below 64"))?;
        writer.write_ue_u64(rate)?;
        let size = (cpb.size >> 4 >> cpb_size_scale)
            .checked_sub(1)
            .ok_or_else(|| Error::invalid_argument("CPB size below 16"))?;
        writer.write_ue_u64(size)?;
        writer.write_bit(cpb.cbr_flag)?;
    }

    for (length, field) in [
        (hrd.initial_cpb_removal_delay_length, "initial_cpb_removal_delay_length"),
        (hrd.cpb_removal_delay_length, "cpb_removal_delay_length"),
        (hrd.dpb_output_delay_length, "dpb_output_delay_length"),
    ] {
        let coded = u32::from(length)
            .checked_sub(1)
            .ok_or_else(|| Error::invalid_argument(format!("{field} must be positive")))?;
        writer.write_bits(coded, 5)?;
    }
    writer.write_bits(u32::from(hrd.time_offset_length), 5)?;
    Ok(())
}

fn scale_for(or_of_values: u64, base_shift: u32) -> u32 {
    or_of_values.trailing_zeros().saturating_sub(base_shift).min(15)
}

/// Encode a seq_parameter_set_extension RBSP.
pub fn encode_sps_extension(writer: &mut BitWriter, spse: &SpsExtension) -> Result<()> {
    writer.write_bit(true)?; // seq_parameter_set_id == 0
    writer.write_ue(spse.aux_format_idc)?;
    if spse.aux_format_idc != 0 {
        let depth = spse
            .bit_depth_aux
            .ok_or_else(|| Error::missing_field("bit_depth_aux"))?;
        writer.write_ue(depth_minus8(depth)?)?;
        writer.write_bit(
            spse.alpha_incr_flag
                .ok_or_else(|| Error::missing_field("alpha_incr_flag"))?,
        )?;
        let opaque = spse
            .alpha_opaque_value
            .ok_or_else(|| Error::missing_field("alpha_opaque_value"))?;
        let transparent = spse
            .alpha_transparent_value
            .ok_or_else(|| Error::missing_field("alpha_transparent_value"))?;
        // Alpha values are bit_depth_aux + 1 bits wide.
        let width = depth
            .checked_add(1)
            .ok_or_else(|| Error::invalid_argument("bit_depth_aux too large"))?;
        writer.write_bits(opaque, width)?;
        writer.write_bits(transparent, width)?;
    }
    writer.write_bit(false)?; // additional_extension_flag
    Ok(())
}

/// Encode a subset SPS RBSP: plain SPS plus the MVC extension for the MVC
/// profiles, always two views.
pub fn encode_subset_sps(writer: &mut BitWriter, ssps: &SubsetSps) -> Result<()> {
    encode_sps(writer, &ssps.sps)?;
    if MVC_PROFILE_IDCS.contains(&ssps.sps.profile_idc) {
        let mvc = ssps.mvc.as_ref().ok_or_else(|| Error::missing_field("mvc"))?;
        writer.write_bit(true)?; // bit_equal_to_one
        writer.write_ue(1)?; // num_views_minus1
        writer.write_ue(mvc.view_ids[0])?;
        writer.write_ue(mvc.view_ids[1])?;
        // Inter-view refs always point at the base view.
        for count in [
            mvc.num_anchor_refs.l0,
            mvc.num_anchor_refs.l1,
            mvc.num_non_anchor_refs.l0,
            mvc.num_non_anchor_refs.l1,
        ] {
            writer.write_ue(count)?;
            if count != 0 {
                writer.write_ue(mvc.view_ids[0])?;
            }
        }

        let levels = &mvc.level_values_signalled;
        writer.write_ue(len_minus1(levels.len(), "level_values_signalled")?)?;
        for level in levels {
            writer.write_bits(u32::from(level.idc), 8)?;
            writer.write_ue(len_minus1(level.operation_points.len(), "operation_points")?)?;
            for op in &level.operation_points {
                writer.write_bits(u32::from(op.temporal_id), 3)?;
                writer.write_ue(len_minus1(op.target_views.len(), "target_views")?)?;
                for &view_id in &op.target_views {
                    writer.write_ue(view_id)?;
                }
                writer.write_ue(sub_or_invalid(op.num_views, 1, "num_views")?)?;
            }
        }

        match &mvc.mvc_vui_parameters {
            Some(vui) => {
                writer.write_bit(true)?;
                encode_mvc_vui(writer, vui)?;
            }
            None => writer.write_bit(false)?,
        }
    }
    writer.write_bit(false)?; // additional_extension2_flag
    Ok(())
}

fn len_minus1(len: usize, field: &str) -> Result<u32> {
    len.checked_sub(1)
        .map(|v| v as u32)
        .ok_or_else(|| Error::invalid_argument(format!("{field} must not be empty")))
}

fn encode_mvc_vui(writer: &mut BitWriter, vui: &MvcVuiParameters) -> Result<()> {
    writer.write_ue(len_minus1(vui.operation_points.len(), "operation_points")?)?;
    for op in &vui.operation_points {
        writer.write_bits(u32::from(op.temporal_id), 3)?;
        writer.write_ue(len_minus1(op.target_views.len(), "target_views")?)?;
        for &view_id in &op.target_views {
            writer.write_ue(view_id)?;
        }
        write_timing_info(writer, vui.timing_info.as_ref())?;
        write_hrd_pair(
            writer,
            vui.nal_hrd_parameters.as_ref(),
            vui.vcl_hrd_parameters.as_ref(),
            vui.low_delay_hrd_flag,
        )?;
        writer.write_bit(vui.pic_struct_present_flag)?;
    }
    Ok(())
}
