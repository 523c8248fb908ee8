//! CAVLC (Context-Adaptive Variable-Length Coding) residual block encoding.
//!
//! Encodes one transform block per call, in the scan order given by the
//! description. The nC context is taken from the description as well rather
//! than being predicted from neighbours: conformance inputs deliberately
//! exercise contexts a real encoder would never pick.

use avcgen_core::bitstream::BitWriter;
use avcgen_core::error::{Error, Result};

use crate::tables;

/// Emit a literal VLC bit-string, MSB first.
pub(crate) fn write_vlc(writer: &mut BitWriter, code: &str) -> Result<()> {
    for b in code.bytes() {
        writer.write_bit(b == b'1')?;
    }
    Ok(())
}

/// Look up a code word, turning an out-of-range index into an error instead
/// of a panic (descriptions are untrusted input).
fn lookup<'a>(table: &[&'a [&'a str]], row: usize, col: usize, what: &str) -> Result<&'a str> {
    table
        .get(row)
        .and_then(|r| r.get(col))
        .copied()
        .ok_or_else(|| Error::invalid_argument(format!("no {what} code for [{row}][{col}]")))
}

fn bit_length(v: i64) -> i64 {
    64 - i64::from(v.leading_zeros())
}

/// Encode one residual block (clause 9.2 syntax, encode direction).
///
/// `nc` selects the coeff_token table: -2 for chroma DC in 4:2:2, -1 for
/// chroma DC in 4:2:0, otherwise the predicted non-zero count. `coeffs` is
/// the full block in scan order, length 16, 15, 8 or 4.
pub fn encode_residual_block(writer: &mut BitWriter, nc: i8, coeffs: &[i32]) -> Result<()> {
    if !matches!(coeffs.len(), 16 | 15 | 8 | 4) {
        return Err(Error::invalid_argument(format!(
            "residual block length {} (expected 16, 15, 8 or 4)",
            coeffs.len()
        )));
    }

    let positions: Vec<usize> = (0..coeffs.len()).filter(|&i| coeffs[i] != 0).collect();
    let levels: Vec<i32> = positions.iter().map(|&i| coeffs[i]).collect();
    let total_coeff = levels.len();
    let trailing_ones = levels
        .iter()
        .rev()
        .position(|&c| c.unsigned_abs() > 1)
        .unwrap_or(total_coeff)
        .min(3);

    let token_table = match nc {
        -2 => tables::COEFF_TOKEN_CHROMA_DC_2X4,
        -1 => tables::COEFF_TOKEN_CHROMA_DC_2X2,
        n if n < 2 => tables::COEFF_TOKEN_NC0,
        n if n < 4 => tables::COEFF_TOKEN_NC2,
        n if n < 8 => tables::COEFF_TOKEN_NC4,
        _ => tables::COEFF_TOKEN_NC8,
    };
    write_vlc(
        writer,
        lookup(token_table, total_coeff, trailing_ones, "coeff_token")?,
    )?;
    if total_coeff == 0 {
        return Ok(());
    }

    // Levels, highest frequency first. suffixLength adapts as in 9.2.2.
    let mut suffix_length: u8 = u8::from(total_coeff > 10 && trailing_ones < 3);
    for (i, &c) in levels.iter().rev().enumerate() {
        if i < trailing_ones {
            writer.write_bit(c < 0)?;
            continue;
        }
        let abs_c = i64::from(c).abs();
        let mut level_code = abs_c * 2 - 2 + i64::from(c < 0)
            - 2 * i64::from(i == trailing_ones && trailing_ones < 3);
        let mut level_prefix = level_code >> suffix_length;
        let mut suffix_size = i64::from(suffix_length);
        // Escape (a): prefix 14 carries a 4-bit suffix when suffixLength is 0.
        if suffix_length == 0 && (14..30).contains(&level_code) {
            level_prefix = 14;
            level_code -= 14;
            suffix_size = 4;
        }
        // Escape (b): prefixes >= 15 carry a variable-size suffix.
        let escape = 15i64 << suffix_length.max(1);
        if level_code >= escape {
            level_code += 4096 - escape;
            level_prefix = bit_length(level_code) + 2;
            suffix_size = level_prefix - 3;
        }
        for _ in 0..level_prefix {
            writer.write_bit(false)?;
        }
        writer.write_bit(true)?;
        let mask = (1u64 << suffix_size) - 1;
        writer.write_bits_u64(level_code as u64 & mask, suffix_size as u8)?;
        if suffix_length == 0 {
            suffix_length = 1;
        }
        if abs_c > 3i64 << (suffix_length - 1) && suffix_length < 6 {
            suffix_length += 1;
        }
    }

    // total_zeros is skipped for full blocks.
    let mut zeros_left = 0usize;
    if total_coeff < coeffs.len() {
        zeros_left = positions[total_coeff - 1] + 1 - total_coeff;
        let tz_table = if coeffs.len() >= 15 {
            tables::TOTAL_ZEROS_4X4
        } else if coeffs.len() == 8 {
            tables::TOTAL_ZEROS_2X4
        } else {
            tables::TOTAL_ZEROS_2X2
        };
        write_vlc(
            writer,
            lookup(tz_table, total_coeff - 1, zeros_left, "total_zeros")?,
        )?;
    }

    // run_before per coefficient, highest frequency first; the lowest run is
    // implied once all zeros are accounted for.
    for i in (1..total_coeff).rev() {
        if zeros_left == 0 {
            break;
        }
        let run_before = positions[i] - positions[i - 1] - 1;
        write_vlc(
            writer,
            lookup(tables::RUN_BEFORE, zeros_left.min(7) - 1, run_before, "run_before")?,
        )?;
        zeros_left -= run_before;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(nc: i8, coeffs: &[i32]) -> Vec<u8> {
        let mut writer = BitWriter::new();
        encode_residual_block(&mut writer, nc, coeffs).unwrap();
        writer.align_to_byte().unwrap();
        writer.into_data()
    }

    #[test]
    fn test_empty_block_is_bare_coeff_token() {
        // TotalCoeff == 0, nC < 2 -> "1"
        assert_eq!(encode(0, &[0; 16]), vec![0b1000_0000]);
        // chroma DC 2x2 empty -> "01"
        assert_eq!(encode(-1, &[0; 4]), vec![0b0100_0000]);
    }

    #[test]
    fn test_single_trailing_one() {
        // One +1 at position 0: token "01", sign 0, total_zeros "1".
        assert_eq!(encode(0, &[1, 0, 0, 0]), vec![0b0101_0000]);
    }

    #[test]
    fn test_textbook_block() {
        // Zig-zag block 0,3,0,1,-1,-1,0,1,0... with nC == 0 encodes to the
        // well-known 24-bit sequence 000010001110010111101101.
        let mut coeffs = [0i32; 16];
        coeffs[1] = 3;
        coeffs[3] = 1;
        coeffs[4] = -1;
        coeffs[5] = -1;
        coeffs[7] = 1;
        assert_eq!(encode(0, &coeffs), vec![0x08, 0xE5, 0xED]);
    }

    #[test]
    fn test_full_block_skips_total_zeros() {
        // All 16 positions non-zero: no total_zeros, no run_before.
        let coeffs = [1i32; 16];
        let mut writer = BitWriter::new();
        encode_residual_block(&mut writer, 8, &coeffs).unwrap();
        // coeff_token "111111" (6 bits), 3 sign bits, one level at
        // suffixLength 0 ("1"), then 12 levels at suffixLength 1 (2 bits).
        assert_eq!(writer.pending_bits(), 6 + 3 + 1 + 12 * 2);
    }

    #[test]
    fn test_bad_block_length_rejected() {
        let mut writer = BitWriter::new();
        let err = encode_residual_block(&mut writer, 0, &[0; 7]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_large_level_uses_escape() {
        // A lone large coefficient forces escape (b); just check it encodes
        // without error and produces a long prefix.
        let mut coeffs = [0i32; 16];
        coeffs[0] = 100_000;
        let mut writer = BitWriter::new();
        encode_residual_block(&mut writer, 0, &coeffs).unwrap();
        assert!(writer.pending_bits() > 20);
    }
}
