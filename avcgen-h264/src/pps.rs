//! Picture parameter set emission.
//!
//! Single-slice-group form only: num_slice_groups_minus1, the parameter-set
//! id references and pic_init_qs are emitted as their zero short codes.

use avcgen_core::bitstream::BitWriter;
use avcgen_core::error::{Error, Result};

use crate::desc::PictureParameterSet;
use crate::sps::write_scaling_lists;

/// Encode a PPS RBSP (without NAL header or trailing bits).
pub fn encode_pps(writer: &mut BitWriter, pps: &PictureParameterSet) -> Result<()> {
    writer.write_ue(pps.pic_parameter_set_id)?;
    writer.write_bit(true)?; // seq_parameter_set_id == 0
    writer.write_bit(pps.entropy_coding_mode_flag)?;
    writer.write_bit(pps.bottom_field_pic_order_in_frame_present_flag)?;
    writer.write_bit(true)?; // num_slice_groups_minus1 == 0
    writer.write_ue(active_minus1(pps.num_ref_idx_default_active.l0, "l0")?)?;
    writer.write_ue(active_minus1(pps.num_ref_idx_default_active.l1, "l1")?)?;
    writer.write_bit(pps.weighted_pred_flag)?;
    writer.write_bits(u32::from(pps.weighted_bipred_idc), 2)?;
    writer.write_se(pps.pic_init_qp - 26)?;
    writer.write_bit(true)?; // pic_init_qs_minus26 == 0
    writer.write_se(pps.chroma_qp_index_offset)?;
    writer.write_bit(pps.deblocking_filter_control_present_flag)?;
    writer.write_bit(pps.constrained_intra_pred_flag)?;
    writer.write_bit(false)?; // redundant_pic_cnt_present_flag

    if let Some(transform_8x8_mode_flag) = pps.transform_8x8_mode_flag {
        writer.write_bit(transform_8x8_mode_flag)?;
        match &pps.pic_scaling_matrix {
            Some(lists) => {
                writer.write_bit(true)?;
                write_scaling_lists(writer, lists)?;
            }
            None => writer.write_bit(false)?,
        }
        writer.write_se(
            pps.second_chroma_qp_index_offset
                .ok_or_else(|| Error::missing_field("second_chroma_qp_index_offset"))?,
        )?;
    }
    Ok(())
}

fn active_minus1(count: u32, list: &str) -> Result<u32> {
    count.checked_sub(1).ok_or_else(|| {
        Error::invalid_argument(format!("num_ref_idx_default_active.{list} must be positive"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::RefCounts;

    fn baseline_pps() -> PictureParameterSet {
        PictureParameterSet {
            pic_parameter_set_id: 0,
            entropy_coding_mode_flag: false,
            bottom_field_pic_order_in_frame_present_flag: false,
            num_ref_idx_default_active: RefCounts { l0: 1, l1: 1 },
            weighted_pred_flag: false,
            weighted_bipred_idc: 0,
            pic_init_qp: 26,
            chroma_qp_index_offset: 0,
            deblocking_filter_control_present_flag: false,
            constrained_intra_pred_flag: false,
            transform_8x8_mode_flag: None,
            pic_scaling_matrix: None,
            second_chroma_qp_index_offset: None,
        }
    }

    #[test]
    fn test_baseline_pps_bits() {
        let mut writer = BitWriter::new();
        encode_pps(&mut writer, &baseline_pps()).unwrap();
        // ue(0) id, 4 single bits, two ue(0) actives, flag + 2-bit idc,
        // se(0) qp, qs bit, se(0) chroma offset, 3 flags.
        assert_eq!(writer.pending_bits(), 1 + 4 + 2 + 3 + 1 + 1 + 1 + 3);
        // First byte: 1 1 0 0 1 1 1 0
        assert_eq!(writer.data()[0], 0b1100_1110);
    }

    #[test]
    fn test_transform_tail_requires_second_offset() {
        let mut pps = baseline_pps();
        pps.transform_8x8_mode_flag = Some(true);
        let mut writer = BitWriter::new();
        let err = encode_pps(&mut writer, &pps).unwrap_err();
        assert!(err.to_string().contains("second_chroma_qp_index_offset"), "{err}");
    }

    #[test]
    fn test_transform_tail_emitted() {
        let mut pps = baseline_pps();
        pps.transform_8x8_mode_flag = Some(true);
        pps.second_chroma_qp_index_offset = Some(-2);
        let mut writer = BitWriter::new();
        encode_pps(&mut writer, &pps).unwrap();
        // Tail: flag, matrix absent, se(-2) = "00100".
        assert_eq!(writer.pending_bits(), 16 + 1 + 1 + 5);
    }
}
