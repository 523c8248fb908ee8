//! End-to-end tests: YAML description in, Annex-B bytes out.

use avcgen_core::BitReader;
use avcgen_h264::{encode_stream, load_stream};

const BASELINE_SPS: &str = "\
- nal_ref_idc: 3
  nal_unit_type: 7
  profile_idc: 66
  constraint_set_flags: [false, true]
  level_idc: 3.0
  log2_max_frame_num: 4
  pic_order_cnt_type: 2
  max_num_ref_frames: 1
  pic_size_in_mbs: { width: 11, height: 9 }
  frame_mbs_only_flag: true
  direct_8x8_inference_flag: true
";

fn encode(yaml: &str) -> Vec<u8> {
    let nals = load_stream(yaml).unwrap();
    let mut sink = Vec::new();
    encode_stream(&nals, &mut sink).unwrap();
    sink
}

#[test]
fn baseline_sps_stream() {
    let bytes = encode(BASELINE_SPS);
    assert_eq!(&bytes[..5], &[0x00, 0x00, 0x00, 0x01, 0x67]);

    // Reparse the payload and check it decodes back to the same fields.
    let mut reader = BitReader::new(&bytes[5..]);
    assert_eq!(reader.read_bits(8).unwrap(), 66); // profile_idc
    assert_eq!(reader.read_bits(8).unwrap(), 0x40); // constraint_set1_flag
    assert_eq!(reader.read_bits(8).unwrap(), 30); // level_idc
    assert_eq!(reader.read_ue().unwrap(), 0); // seq_parameter_set_id
    assert_eq!(reader.read_ue().unwrap(), 0); // log2_max_frame_num - 4
    assert_eq!(reader.read_ue().unwrap(), 2); // pic_order_cnt_type
    assert_eq!(reader.read_ue().unwrap(), 1); // max_num_ref_frames
    assert!(!reader.read_bit().unwrap()); // gaps allowed
    assert_eq!(reader.read_ue().unwrap(), 10); // width - 1
    assert_eq!(reader.read_ue().unwrap(), 8); // height - 1
    assert!(reader.read_bit().unwrap()); // frame_mbs_only_flag
    assert!(reader.read_bit().unwrap()); // direct_8x8_inference_flag
    assert!(!reader.read_bit().unwrap()); // cropping
    assert!(!reader.read_bit().unwrap()); // vui
    assert!(reader.read_bit().unwrap()); // rbsp stop bit
}

#[test]
fn encoding_is_idempotent() {
    let yaml = concat!(
        "- nal_ref_idc: 0\n  nal_unit_type: 9\n  primary_pic_type: 2\n",
        "- nal_ref_idc: 3\n  nal_unit_type: 7\n  profile_idc: 66\n",
        "  constraint_set_flags: []\n  level_idc: 1.0\n  log2_max_frame_num: 4\n",
        "  pic_order_cnt_type: 2\n  max_num_ref_frames: 0\n",
        "  pic_size_in_mbs: { width: 1, height: 1 }\n  frame_mbs_only_flag: true\n",
        "  direct_8x8_inference_flag: false\n",
    );
    assert_eq!(encode(yaml), encode(yaml));
}

#[test]
fn pcm_slice_stream() {
    let yaml = "\
- nal_ref_idc: 0
  nal_unit_type: 1
  first_mb_in_slice: 0
  slice_type: 2
  pic_parameter_set_id: 0
  frame_num: { absolute: 0, bits: 4 }
  pic_order_cnt: { type: 2 }
  slice_qp_delta: 0
  macroblocks_cavlc:
  - mb_type: 25
    pcm_samples: { y: [171], cb: [], cr: [], bits_y: 8, bits_c: 8 }
";
    // Raw samples land byte-aligned after the pcm alignment padding.
    assert_eq!(
        encode(yaml),
        vec![0x00, 0x00, 0x00, 0x01, 0x01, 0xB8, 0x43, 0x40, 0xAB, 0x80]
    );
}

#[test]
fn residual_slice_stream_round_trips_cavlc() {
    let yaml = "\
- nal_ref_idc: 2
  nal_unit_type: 5
  first_mb_in_slice: 0
  slice_type: 7
  pic_parameter_set_id: 0
  idr_pic_id: 0
  frame_num: { absolute: 0, bits: 4 }
  pic_order_cnt: { type: 2 }
  no_output_of_prior_pics_flag: false
  long_term_reference_flag: false
  slice_qp_delta: 2
  macroblocks_cavlc:
  - mb_type: 1
    mb_qp_delta: 0
    coeff_levels:
    - { nC: 0, c: [3, 0, 1, -1, -1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0] }
";
    let bytes = encode(yaml);
    assert_eq!(&bytes[..5], &[0x00, 0x00, 0x00, 0x01, 0x65]);
    // Stop bit and padding land in the final byte.
    assert_eq!(bytes.last().map(|b| b.count_ones() >= 1), Some(true));
    assert_eq!(encode(yaml), bytes);
}

#[test]
fn skip_run_spans_multiple_entries() {
    let yaml = "\
- nal_ref_idc: 0
  nal_unit_type: 1
  first_mb_in_slice: 0
  slice_type: 0
  pic_parameter_set_id: 0
  frame_num: { absolute: 0, bits: 4 }
  pic_order_cnt: { type: 2 }
  num_ref_idx_active: { override_flag: false, l0: 1 }
  slice_qp_delta: 0
  macroblocks_cavlc:
  - mb_skip_run: 2
  - {}
  - {}
";
    // Header (10 bits) + ue(2), nothing for the skipped macroblocks, then
    // the stop bit.
    assert_eq!(
        encode(yaml),
        vec![0x00, 0x00, 0x00, 0x01, 0x01, 0xE0, 0x5C]
    );
}

#[test]
fn cabac_slice_is_rejected() {
    let yaml = "\
- nal_ref_idc: 0
  nal_unit_type: 1
  first_mb_in_slice: 0
  slice_type: 2
  pic_parameter_set_id: 0
  frame_num: { absolute: 0, bits: 4 }
  pic_order_cnt: { type: 2 }
  slice_qp_delta: 0
";
    let nals = load_stream(yaml).unwrap();
    let mut sink = Vec::new();
    let err = encode_stream(&nals, &mut sink).unwrap_err();
    assert_eq!(err.to_string(), "NAL 0: Unsupported: CABAC slice data");
}

#[test]
fn unsupported_nal_type_is_rejected_at_load() {
    let yaml = "- nal_ref_idc: 0\n  nal_unit_type: 12\n";
    let err = load_stream(yaml).unwrap_err();
    assert_eq!(
        err.to_string(),
        "NAL 0: Description error: unsupported nal_unit_type 12"
    );
}

#[test]
fn malformed_description_names_the_field() {
    let yaml = "\
- nal_ref_idc: 3
  nal_unit_type: 7
  profile_idc: 66
";
    let err = load_stream(yaml).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("NAL 0:"), "{text}");
    assert!(text.contains("missing field"), "{text}");
}

#[test]
fn pps_stream() {
    let yaml = "\
- nal_ref_idc: 3
  nal_unit_type: 8
  pic_parameter_set_id: 0
  entropy_coding_mode_flag: false
  bottom_field_pic_order_in_frame_present_flag: false
  num_ref_idx_default_active: { l0: 1, l1: 1 }
  weighted_pred_flag: false
  weighted_bipred_idc: 0
  pic_init_qp: 26
  chroma_qp_index_offset: 0
  deblocking_filter_control_present_flag: false
  constrained_intra_pred_flag: false
";
    let bytes = encode(yaml);
    assert_eq!(&bytes[..5], &[0x00, 0x00, 0x00, 0x01, 0x68]);
    // 16 payload bits + stop bit, zero padded.
    assert_eq!(bytes.len(), 5 + 3);
}

#[test]
fn subset_sps_without_mvc_profile_has_no_extension() {
    let yaml = "\
- nal_ref_idc: 3
  nal_unit_type: 15
  sps:
    profile_idc: 66
    constraint_set_flags: []
    level_idc: 3.0
    log2_max_frame_num: 4
    pic_order_cnt_type: 2
    max_num_ref_frames: 1
    pic_size_in_mbs: { width: 11, height: 9 }
    frame_mbs_only_flag: true
    direct_8x8_inference_flag: true
";
    let bytes = encode(yaml);
    assert_eq!(&bytes[..5], &[0x00, 0x00, 0x00, 0x01, 0x6F]);
    // Same SPS tail as the plain parameter set, one extra flag bit, then
    // the stop bit.
    let plain = encode(BASELINE_SPS);
    assert_eq!(bytes.len(), plain.len());
}
