//! Typed stream descriptions and the YAML loader.
//!
//! A description is a YAML sequence of NAL-unit maps. Each map carries
//! `nal_ref_idc` and `nal_unit_type` plus the payload fields for that type.
//! Field presence in the description drives syntax-element presence in the
//! bitstream, so nearly everything here is an `Option`; the encoders report
//! a missing-field error when a present element requires an absent one
//! (e.g. `bottom_field_flag` once `field_pic_flag` is set).
//!
//! Values are emitted exactly as written. Out-of-range or semantically
//! inconsistent values are deliberately representable: producing streams a
//! conforming encoder would never emit is the entire point.

use serde::{Deserialize, Serialize};

use avcgen_core::error::{DescriptionError, Error, Result};

use crate::nal::NalUnitType;

/// One NAL unit of a stream description: envelope plus typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NalUnit {
    /// nal_ref_idc (0-3).
    pub ref_idc: u8,
    /// NAL unit type, already validated against the supported set.
    pub unit_type: NalUnitType,
    /// The payload fields.
    pub payload: NalPayload,
}

/// Payload union, one variant per supported NAL unit type.
#[derive(Debug, Clone, PartialEq)]
pub enum NalPayload {
    Slice(SliceDesc),
    SequenceParameterSet(SequenceParameterSet),
    PictureParameterSet(PictureParameterSet),
    AccessUnitDelimiter(AccessUnitDelimiter),
    SpsExtension(SpsExtension),
    SubsetSps(SubsetSps),
}

// ---------------------------------------------------------------------------
// Sequence parameter set
// ---------------------------------------------------------------------------

/// Sequence parameter set description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceParameterSet {
    pub profile_idc: u8,
    /// constraint_set0..7 flags, MSB first; shorter lists leave the rest 0.
    pub constraint_set_flags: Vec<bool>,
    /// Level as written in the standard (e.g. 4.1); emitted as level * 10.
    pub level_idc: f32,
    /// Only emitted for the high-profile IDC set.
    #[serde(default = "default_chroma_format_idc")]
    pub chroma_format_idc: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separate_colour_plane_flag: Option<bool>,
    #[serde(default)]
    pub bit_depth: BitDepth,
    #[serde(default)]
    pub qpprime_y_zero_transform_bypass_flag: bool,
    /// Six or twelve scaling lists; an empty list means "not present".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_scaling_matrix: Option<Vec<Vec<i32>>>,
    pub log2_max_frame_num: u8,
    pub pic_order_cnt_type: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log2_max_pic_order_cnt_lsb: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_pic_order_always_zero_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_for_non_ref_pic: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_for_top_to_bottom_field: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offsets_for_ref_frames: Option<Vec<i32>>,
    pub max_num_ref_frames: u32,
    #[serde(default)]
    pub gaps_in_frame_num_value_allowed_flag: bool,
    pub pic_size_in_mbs: PicSizeInMbs,
    pub frame_mbs_only_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mb_adaptive_frame_field_flag: Option<bool>,
    pub direct_8x8_inference_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_crop_offsets: Option<FrameCropOffsets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vui_parameters: Option<VuiParameters>,
}

fn default_chroma_format_idc() -> u8 {
    1
}

/// Sample bit depths; defaults to 8-bit 4:2:0 material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BitDepth {
    pub luma: u8,
    pub chroma: u8,
}

impl Default for BitDepth {
    fn default() -> Self {
        Self { luma: 8, chroma: 8 }
    }
}

/// Frame size in macroblock units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PicSizeInMbs {
    pub width: u32,
    pub height: u32,
}

/// Cropping rectangle offsets, in the units defined by the chroma format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameCropOffsets {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

/// VUI parameters (Annex E).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct VuiParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overscan_appropriate_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_signal_type: Option<VideoSignalType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chroma_sample_loc: Option<ChromaSampleLoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_info: Option<TimingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nal_hrd_parameters: Option<HrdParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcl_hrd_parameters: Option<HrdParameters>,
    /// Only emitted when either HRD block is present.
    #[serde(default)]
    pub low_delay_hrd_flag: bool,
    #[serde(default)]
    pub pic_struct_present_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitstream_restriction: Option<BitstreamRestriction>,
}

/// Sample aspect ratio; width/height only for the Extended_SAR idc (255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AspectRatio {
    pub idc: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoSignalType {
    pub video_format: u8,
    pub video_full_range_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour_description: Option<ColourDescription>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColourDescription {
    pub colour_primaries: u8,
    pub transfer_characteristics: u8,
    pub matrix_coefficients: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChromaSampleLoc {
    pub top: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingInfo {
    pub num_units_in_tick: u32,
    pub time_scale: u32,
    pub fixed_frame_rate_flag: bool,
}

/// HRD parameters. Scales are derived from the CPB values at encode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HrdParameters {
    pub cpbs: Vec<Cpb>,
    pub initial_cpb_removal_delay_length: u8,
    pub cpb_removal_delay_length: u8,
    pub dpb_output_delay_length: u8,
    pub time_offset_length: u8,
}

/// One coded picture buffer: rates in bits/s, size in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Cpb {
    pub bit_rate: u64,
    pub size: u64,
    pub cbr_flag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BitstreamRestriction {
    pub motion_vectors_over_pic_boundaries_flag: bool,
    /// 0 means unconstrained.
    pub max_bytes_per_pic: u64,
    /// 0 means unconstrained.
    pub max_bits_per_mb: u64,
    pub log2_max_mv_length_horizontal: u32,
    pub log2_max_mv_length_vertical: u32,
    pub max_num_reorder_frames: u32,
    pub max_dec_frame_buffering: u32,
}

// ---------------------------------------------------------------------------
// Picture parameter set
// ---------------------------------------------------------------------------

/// Picture parameter set description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PictureParameterSet {
    pub pic_parameter_set_id: u32,
    pub entropy_coding_mode_flag: bool,
    pub bottom_field_pic_order_in_frame_present_flag: bool,
    pub num_ref_idx_default_active: RefCounts,
    pub weighted_pred_flag: bool,
    pub weighted_bipred_idc: u8,
    /// Absolute QP; emitted relative to 26.
    pub pic_init_qp: i32,
    pub chroma_qp_index_offset: i32,
    pub deblocking_filter_control_present_flag: bool,
    pub constrained_intra_pred_flag: bool,
    /// Presence of this flag gates the whole transform-8x8 tail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_8x8_mode_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pic_scaling_matrix: Option<Vec<Vec<i32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_chroma_qp_index_offset: Option<i32>,
}

/// A pair of per-list counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefCounts {
    pub l0: u32,
    pub l1: u32,
}

// ---------------------------------------------------------------------------
// Access unit delimiter, SPS extension, subset SPS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessUnitDelimiter {
    pub primary_pic_type: u8,
}

/// Sequence parameter set extension (auxiliary coded pictures).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpsExtension {
    pub aux_format_idc: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_depth_aux: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_incr_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_opaque_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_transparent_value: Option<u32>,
}

/// Subset SPS: a plain SPS plus the two-view MVC extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubsetSps {
    pub sps: SequenceParameterSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mvc: Option<MvcExtension>,
}

/// Two-view MVC sequence extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MvcExtension {
    pub view_ids: [u32; 2],
    pub num_anchor_refs: RefCounts,
    pub num_non_anchor_refs: RefCounts,
    pub level_values_signalled: Vec<LevelValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mvc_vui_parameters: Option<MvcVuiParameters>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelValue {
    pub idc: u8,
    pub operation_points: Vec<OperationPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationPoint {
    pub temporal_id: u8,
    pub target_views: Vec<u32>,
    pub num_views: u32,
}

/// MVC VUI: per-operation-point timing and HRD, shared across points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MvcVuiParameters {
    pub operation_points: Vec<MvcVuiOperationPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_info: Option<TimingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nal_hrd_parameters: Option<HrdParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcl_hrd_parameters: Option<HrdParameters>,
    #[serde(default)]
    pub low_delay_hrd_flag: bool,
    #[serde(default)]
    pub pic_struct_present_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MvcVuiOperationPoint {
    pub temporal_id: u8,
    pub target_views: Vec<u32>,
}

// ---------------------------------------------------------------------------
// Slices
// ---------------------------------------------------------------------------

/// Slice description: header fields plus CAVLC macroblock data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SliceDesc {
    pub first_mb_in_slice: u32,
    /// Raw slice_type value (0-9); presence rules use its value mod 5.
    pub slice_type: u32,
    pub pic_parameter_set_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour_plane_id: Option<u8>,
    pub frame_num: FrameNum,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_pic_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_field_flag: Option<bool>,
    /// For type-1 NALs: false marks the slice as IDR despite the NAL type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_idr_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idr_pic_id: Option<u32>,
    pub pic_order_cnt: PicOrderCnt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_spatial_mv_pred_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ref_idx_active: Option<NumRefIdxActive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_pic_list_modification_l0: Option<Vec<RefPicListMod>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_pic_list_modification_l1: Option<Vec<RefPicListMod>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_weights_l0: Option<Vec<WeightTable>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_weights_l1: Option<Vec<WeightTable>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_output_of_prior_pics_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_term_reference_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_management_control_operations: Option<Vec<Mmco>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabac_init_idc: Option<u32>,
    pub slice_qp_delta: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_deblocking_filter_idc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice_alpha_c0_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice_beta_offset: Option<i32>,
    /// Absent means CABAC slice data, which is not supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macroblocks_cavlc: Option<Vec<Macroblock>>,
}

/// frame_num with an explicit field width; the absolute value is masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameNum {
    pub absolute: u32,
    pub bits: u8,
}

/// Picture order count fields; which ones apply depends on `poc_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PicOrderCnt {
    #[serde(rename = "type")]
    pub poc_type: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute: Option<i64>,
    /// Bottom-field order count; emitted as a delta against `absolute`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta0: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta1: Option<i32>,
}

/// Active reference counts with the per-slice override flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumRefIdxActive {
    pub override_flag: bool,
    pub l0: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1: Option<u32>,
}

/// One ref_pic_list_modification operation.
///
/// Short- and long-term picture selection plus the MVC view variant; the
/// modification idc and the coded value are derived from the signed delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefPicListMod {
    /// abs_diff_pic_num; sign selects modification idc 0 vs 1.
    Sref(i32),
    /// long_term_pic_num.
    Lref(u32),
    /// abs_diff_view_idx; sign selects modification idc 4 vs 5.
    View(i32),
}

/// Per-reference prediction weights for the three planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightTable {
    pub y: Weight,
    pub cb: Weight,
    pub cr: Weight,
}

/// A single prediction weight. The default weight `2^log2_denom` with a
/// zero offset is signalled by a cleared flag instead of coded values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Weight {
    pub weight: i32,
    pub log2_denom: u32,
    pub offset: i32,
}

/// One memory management control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mmco {
    pub idc: u32,
    /// Negative picture-number delta, coded as its magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sref: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lref: Option<u32>,
}

/// One CAVLC macroblock.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Macroblock {
    /// Starts a skip run; subsequent skipped macroblocks are empty entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mb_skip_run: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mb_field_decoding_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mb_type: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcm_samples: Option<PcmSamples>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_size_8x8_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rem_intra4x4_pred_modes: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rem_intra8x8_pred_modes: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intra_chroma_pred_mode: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_mb_types: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ref_idx: Vec<RefIdxEntry>,
    /// Motion vector differences as (x, y) pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mvds: Vec<[i32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coded_block_pattern: Option<u32>,
    /// Presence gates the residual data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mb_qp_delta: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coeff_levels: Vec<CoeffBlock>,
}

/// Raw I_PCM samples with their per-plane bit widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PcmSamples {
    pub y: Vec<u32>,
    pub cb: Vec<u32>,
    pub cr: Vec<u32>,
    pub bits_y: u8,
    pub bits_c: u8,
}

/// ref_idx for one partition block (0-3 for list 0, 4-7 for list 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefIdxEntry {
    pub block: u8,
    pub value: u32,
}

/// One residual block with its CAVLC context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoeffBlock {
    #[serde(rename = "nC")]
    pub nc: i8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub c: Vec<i32>,
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Parse a YAML stream description into typed NAL units.
///
/// The top level must be a sequence of maps. `nal_ref_idc` and
/// `nal_unit_type` select the payload type; the remaining keys are
/// deserialized strictly (unknown keys are rejected). Errors carry the
/// zero-based NAL index.
pub fn load_stream(yaml: &str) -> Result<Vec<NalUnit>> {
    let docs: Vec<serde_yaml::Value> = serde_yaml::from_str(yaml).map_err(|e| {
        Error::from(DescriptionError::Parse {
            message: e.to_string(),
        })
    })?;

    let mut nals = Vec::with_capacity(docs.len());
    for (index, value) in docs.into_iter().enumerate() {
        nals.push(load_nal(value).map_err(|e| e.at_nal(index))?);
    }
    Ok(nals)
}

fn load_nal(value: serde_yaml::Value) -> Result<NalUnit> {
    let serde_yaml::Value::Mapping(mut map) = value else {
        return Err(DescriptionError::Malformed {
            message: "NAL record is not a mapping".into(),
        }
        .into());
    };

    let ref_idc = take_u8(&mut map, "nal_ref_idc")?;
    if ref_idc > 3 {
        return Err(DescriptionError::Malformed {
            message: format!("nal_ref_idc {ref_idc} out of range"),
        }
        .into());
    }
    let type_value = take_u8(&mut map, "nal_unit_type")?;
    let unit_type = NalUnitType::from_u8(type_value)
        .ok_or(DescriptionError::UnsupportedNalType { value: type_value })?;

    let rest = serde_yaml::Value::Mapping(map);
    let payload = match unit_type {
        NalUnitType::Slice | NalUnitType::IdrSlice => NalPayload::Slice(from_value(rest)?),
        NalUnitType::Sps => NalPayload::SequenceParameterSet(from_value(rest)?),
        NalUnitType::Pps => NalPayload::PictureParameterSet(from_value(rest)?),
        NalUnitType::Aud => NalPayload::AccessUnitDelimiter(from_value(rest)?),
        NalUnitType::SpsExt => NalPayload::SpsExtension(from_value(rest)?),
        NalUnitType::SubsetSps => NalPayload::SubsetSps(from_value(rest)?),
    };

    Ok(NalUnit {
        ref_idc,
        unit_type,
        payload,
    })
}

fn from_value<T: serde::de::DeserializeOwned>(value: serde_yaml::Value) -> Result<T> {
    serde_yaml::from_value(value).map_err(|e| {
        DescriptionError::Malformed {
            message: e.to_string(),
        }
        .into()
    })
}

fn take_u8(map: &mut serde_yaml::Mapping, field: &'static str) -> Result<u8> {
    let value = map
        .remove(&serde_yaml::Value::from(field))
        .ok_or(DescriptionError::MissingField { field })?;
    value
        .as_u64()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| {
            DescriptionError::Malformed {
                message: format!("`{field}` is not an 8-bit unsigned integer"),
            }
            .into()
        })
}
