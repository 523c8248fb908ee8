//! # avcgen-logs
//!
//! Typed records for decoder trace logs (the YAML a logging decoder emits,
//! one record per NAL unit) plus read-only analysis transforms over them:
//! coefficient histograms, timing scatter data, a frame dependency graph in
//! DOT form, and a Trace Event Format export.
//!
//! Records are parsed leniently: logs carry many more keys than any single
//! transform needs, so unknown fields are ignored and everything is optional.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use avcgen_core::error::{DescriptionError, Error, Result};

/// One decoder-log record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "FrameId", default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_mb_in_slice: Option<u32>,
    /// Per-list reference FrameIds of this slice.
    #[serde(rename = "RefPicLists", default, skip_serializing_if = "Option::is_none")]
    pub ref_pic_lists: Option<Vec<Vec<i64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approx_byte_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoding_start_us: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoding_end_us: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macroblocks_cavlc: Option<Vec<LogMacroblock>>,
}

/// The macroblock subset the transforms look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogMacroblock {
    #[serde(rename = "coeffLevels", default)]
    pub coeff_levels: Vec<LogCoeffBlock>,
}

/// One logged residual block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogCoeffBlock {
    #[serde(default)]
    pub c: Vec<i32>,
}

/// Parse a YAML decoder log.
pub fn load_log(yaml: &str) -> Result<Vec<LogRecord>> {
    serde_yaml::from_str(yaml).map_err(|e| {
        Error::from(DescriptionError::Parse {
            message: e.to_string(),
        })
    })
}

/// Histogram of non-zero coefficient magnitudes across all CAVLC blocks.
///
/// Sixteen buckets; magnitudes above 15 are clamped into the last one, so
/// bucket 0 always stays empty.
pub fn coeff_level_histogram(records: &[LogRecord]) -> [u64; 16] {
    let mut counts = [0u64; 16];
    for record in records {
        for mb in record.macroblocks_cavlc.iter().flatten() {
            for block in &mb.coeff_levels {
                for magnitude in block.c.iter().map(|c| c.unsigned_abs() as usize) {
                    if magnitude > 0 {
                        counts[magnitude.min(15)] += 1;
                    }
                }
            }
        }
    }
    counts
}

/// (byte size, decoding microseconds) per timed slice record.
pub fn decoding_time_per_size(records: &[LogRecord]) -> Result<Vec<(u64, u64)>> {
    let mut pairs = Vec::new();
    for record in records {
        let Some(size) = record.approx_byte_size else {
            continue;
        };
        let start = record
            .decoding_start_us
            .ok_or_else(|| Error::missing_field("decoding_start_us"))?;
        let end = record
            .decoding_end_us
            .ok_or_else(|| Error::missing_field("decoding_end_us"))?;
        pairs.push((size, end.saturating_sub(start)));
    }
    Ok(pairs)
}

/// Frame dependency graph in DOT format.
///
/// Only the first 21 frames are kept so the rendered graph stays readable.
/// Edges are deduplicated and ordered, so the output is deterministic.
pub fn dependency_graph(records: &[LogRecord]) -> String {
    let mut graph: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    for record in records {
        let (Some(frame_id), Some(lists)) = (record.frame_id, &record.ref_pic_lists) else {
            continue;
        };
        if frame_id > 20 {
            continue;
        }
        let refs = graph.entry(frame_id).or_default();
        for list in lists {
            refs.extend(list.iter().copied());
        }
    }

    let mut dot = String::from("digraph dependencies {\n");
    for (dst, srcs) in &graph {
        for src in srcs {
            let _ = writeln!(dot, "\t{src} -> {dst};");
        }
    }
    dot.push_str("}\n");
    dot
}

#[derive(Debug, Serialize)]
struct TraceEvent {
    name: String,
    ph: &'static str,
    ts: u64,
    dur: i64,
    pid: u32,
    tid: u32,
}

/// Export timed slice records as a Trace Event Format JSON array, one
/// complete ("X") span per record, keyed by the decoding thread.
pub fn trace_events(records: &[LogRecord]) -> Result<String> {
    let mut events = Vec::new();
    for record in records {
        let Some(tid) = record.thread_id else {
            continue;
        };
        let frame_id = record
            .frame_id
            .ok_or_else(|| Error::missing_field("FrameId"))?;
        let first_mb = record
            .first_mb_in_slice
            .ok_or_else(|| Error::missing_field("first_mb_in_slice"))?;
        let start = record
            .decoding_start_us
            .ok_or_else(|| Error::missing_field("decoding_start_us"))?;
        let end = record
            .decoding_end_us
            .ok_or_else(|| Error::missing_field("decoding_end_us"))?;
        events.push(TraceEvent {
            name: format!("FrameId={frame_id} first_mb_in_slice={first_mb}"),
            ph: "X",
            ts: start,
            dur: end as i64 - start as i64,
            pid: 0,
            tid,
        });
    }
    serde_json::to_string_pretty(&events).map_err(|e| Error::invalid_argument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LOG: &str = "\
- FrameId: 0
  first_mb_in_slice: 0
  approx_byte_size: 1200
  decoding_start_us: 100
  decoding_end_us: 350
  thread_id: 1
  macroblocks_cavlc:
  - coeffLevels:
    - { nC: 0, c: [3, 0, -1, 1] }
    - { nC: -1, c: [20, 0, 0, 0] }
- FrameId: 1
  first_mb_in_slice: 0
  RefPicLists: [[0], [0]]
  approx_byte_size: 800
  decoding_start_us: 360
  decoding_end_us: 500
  thread_id: 2
- FrameId: 25
  RefPicLists: [[24]]
";

    #[test]
    fn test_histogram_clamps_magnitudes() {
        let records = load_log(SAMPLE_LOG).unwrap();
        let counts = coeff_level_histogram(&records);
        assert_eq!(counts[0], 0);
        assert_eq!(counts[1], 2);
        assert_eq!(counts[3], 1);
        assert_eq!(counts[15], 1); // |20| clamped
        assert_eq!(counts.iter().sum::<u64>(), 4);
    }

    #[test]
    fn test_time_per_size_pairs() {
        let records = load_log(SAMPLE_LOG).unwrap();
        let pairs = decoding_time_per_size(&records).unwrap();
        assert_eq!(pairs, vec![(1200, 250), (800, 140)]);
    }

    #[test]
    fn test_dependency_graph_filters_late_frames() {
        let records = load_log(SAMPLE_LOG).unwrap();
        let dot = dependency_graph(&records);
        assert_eq!(dot, "digraph dependencies {\n\t0 -> 1;\n}\n");
    }

    #[test]
    fn test_trace_events_span_per_thread() {
        let records = load_log(SAMPLE_LOG).unwrap();
        let json = trace_events(&records).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let events = parsed.as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["name"], "FrameId=0 first_mb_in_slice=0");
        assert_eq!(events[0]["ph"], "X");
        assert_eq!(events[0]["dur"], 250);
        assert_eq!(events[1]["tid"], 2);
    }

    #[test]
    fn test_unknown_log_keys_are_ignored() {
        let yaml = "- FrameId: 3\n  slice_type: 0\n  frame_num: { absolute: 3, bits: 4 }\n";
        let records = load_log(yaml).unwrap();
        assert_eq!(records[0].frame_id, Some(3));
    }
}
