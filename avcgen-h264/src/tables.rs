//! Fixed VLC and permutation tables used by the CAVLC and macroblock coders.
//!
//! The variable-length codes are stored as literal bit-strings reproduced
//! verbatim from Tables 9-5, 9-7, 9-8, 9-9 and 9-10 of the H.264
//! specification, never derived at runtime. `cavlc::write_vlc` emits them
//! bit by bit.

/// coeff_token, 0 <= nC < 2 (Table 9-5, column 1), indexed [TotalCoeff][TrailingOnes].
pub static COEFF_TOKEN_NC0: &[&[&str]] = &[
    &["1"],
    &["000101", "01"],
    &["00000111", "000100", "001"],
    &["000000111", "00000110", "0000101", "00011"],
    &["0000000111", "000000110", "00000101", "000011"],
    &["00000000111", "0000000110", "000000101", "0000100"],
    &["0000000001111", "00000000110", "0000000101", "00000100"],
    &["0000000001011", "0000000001110", "00000000101", "000000100"],
    &["0000000001000", "0000000001010", "0000000001101", "0000000100"],
    &["00000000001111", "00000000001110", "0000000001001", "00000000100"],
    &["00000000001011", "00000000001010", "00000000001101", "0000000001100"],
    &["000000000001111", "000000000001110", "00000000001001", "00000000001100"],
    &["000000000001011", "000000000001010", "000000000001101", "00000000001000"],
    &["0000000000001111", "000000000000001", "000000000001001", "000000000001100"],
    &["0000000000001011", "0000000000001110", "0000000000001101", "000000000001000"],
    &["0000000000000111", "0000000000001010", "0000000000001001", "0000000000001100"],
    &["0000000000000100", "0000000000000110", "0000000000000101", "0000000000001000"],
];

/// coeff_token, 2 <= nC < 4 (Table 9-5, column 2).
pub static COEFF_TOKEN_NC2: &[&[&str]] = &[
    &["11"],
    &["001011", "10"],
    &["000111", "00111", "011"],
    &["0000111", "001010", "001001", "0101"],
    &["00000111", "000110", "000101", "0100"],
    &["00000100", "0000110", "0000101", "00110"],
    &["000000111", "00000110", "00000101", "001000"],
    &["00000001111", "000000110", "000000101", "000100"],
    &["00000001011", "00000001110", "00000001101", "0000100"],
    &["000000001111", "00000001010", "00000001001", "000000100"],
    &["000000001011", "000000001110", "000000001101", "00000001100"],
    &["000000001000", "000000001010", "000000001001", "00000001000"],
    &["0000000001111", "0000000001110", "0000000001101", "000000001100"],
    &["0000000001011", "0000000001010", "0000000001001", "0000000001100"],
    &["0000000000111", "00000000001011", "0000000000110", "0000000001000"],
    &["00000000001001", "00000000001000", "00000000001010", "0000000000001"],
    &["00000000000111", "00000000000110", "00000000000101", "00000000000100"],
];

/// coeff_token, 4 <= nC < 8 (Table 9-5, column 3).
pub static COEFF_TOKEN_NC4: &[&[&str]] = &[
    &["1111"],
    &["001111", "1110"],
    &["001011", "01111", "1101"],
    &["001000", "01100", "01110", "1100"],
    &["0001111", "01010", "01011", "1011"],
    &["0001011", "01000", "01001", "1010"],
    &["0001001", "001110", "001101", "1001"],
    &["0001000", "001010", "001001", "1000"],
    &["00001111", "0001110", "0001101", "01101"],
    &["00001011", "00001110", "0001010", "001100"],
    &["000001111", "00001010", "00001101", "0001100"],
    &["000001011", "000001110", "00001001", "00001100"],
    &["000001000", "000001010", "000001101", "00001000"],
    &["0000001101", "000000111", "000001001", "000001100"],
    &["0000001001", "0000001100", "0000001011", "0000001010"],
    &["0000000101", "0000001000", "0000000111", "0000000110"],
    &["0000000001", "0000000100", "0000000011", "0000000010"],
];

/// coeff_token, nC >= 8 (Table 9-5, fixed-length column).
pub static COEFF_TOKEN_NC8: &[&[&str]] = &[
    &["000011"],
    &["000000", "000001"],
    &["000100", "000101", "000110"],
    &["001000", "001001", "001010", "001011"],
    &["001100", "001101", "001110", "001111"],
    &["010000", "010001", "010010", "010011"],
    &["010100", "010101", "010110", "010111"],
    &["011000", "011001", "011010", "011011"],
    &["011100", "011101", "011110", "011111"],
    &["100000", "100001", "100010", "100011"],
    &["100100", "100101", "100110", "100111"],
    &["101000", "101001", "101010", "101011"],
    &["101100", "101101", "101110", "101111"],
    &["110000", "110001", "110010", "110011"],
    &["110100", "110101", "110110", "110111"],
    &["111000", "111001", "111010", "111011"],
    &["111100", "111101", "111110", "111111"],
];

/// coeff_token, nC == -1 (chroma DC 2x2, Table 9-5 column 4).
pub static COEFF_TOKEN_CHROMA_DC_2X2: &[&[&str]] = &[
    &["01"],
    &["000111", "1"],
    &["000100", "000110", "001"],
    &["000011", "0000011", "0000010", "000101"],
    &["000010", "00000011", "00000010", "0000000"],
];

/// coeff_token, nC == -2 (chroma DC 2x4, Table 9-5 column 5).
pub static COEFF_TOKEN_CHROMA_DC_2X4: &[&[&str]] = &[
    &["1"],
    &["0001111", "01"],
    &["0001110", "0001101", "001"],
    &["000000111", "0001100", "0001011", "00001"],
    &["000000110", "000000101", "0001010", "000001"],
    &["0000000111", "0000000110", "000000100", "0001001"],
    &["00000000111", "00000000110", "0000000101", "0001000"],
    &["000000000111", "000000000110", "00000000101", "0000000100"],
    &["0000000000111", "000000000101", "000000000100", "00000000100"],
];

/// total_zeros for 4x4 blocks of 15 or 16 coefficients (Tables 9-7/9-8), indexed [TotalCoeff - 1][zerosLeft].
pub static TOTAL_ZEROS_4X4: &[&[&str]] = &[
    &["1", "011", "010", "0011", "0010", "00011", "00010", "000011", "000010", "0000011", "0000010", "00000011", "00000010", "000000011", "000000010", "000000001"],
    &["111", "110", "101", "100", "011", "0101", "0100", "0011", "0010", "00011", "00010", "000011", "000010", "000001", "000000"],
    &["0101", "111", "110", "101", "0100", "0011", "100", "011", "0010", "00011", "00010", "000001", "00001", "000000"],
    &["00011", "111", "0101", "0100", "110", "101", "100", "0011", "011", "0010", "00010", "00001", "00000"],
    &["0101", "0100", "0011", "111", "110", "101", "100", "011", "0010", "00001", "0001", "00000"],
    &["000001", "00001", "111", "110", "101", "100", "011", "010", "0001", "001", "000000"],
    &["000001", "00001", "101", "100", "011", "11", "010", "0001", "001", "000000"],
    &["000001", "0001", "00001", "011", "11", "10", "010", "001", "000000"],
    &["000001", "000000", "0001", "11", "10", "001", "01", "00001"],
    &["00001", "00000", "001", "11", "10", "01", "0001"],
    &["0000", "0001", "001", "010", "1", "011"],
    &["0000", "0001", "01", "1", "001"],
    &["000", "001", "1", "01"],
    &["00", "01", "1"],
    &["0", "1"],
];

/// total_zeros for chroma DC 2x4 blocks (Table 9-9b).
pub static TOTAL_ZEROS_2X4: &[&[&str]] = &[
    &["1", "010", "011", "0010", "0011", "0001", "00001", "00000"],
    &["000", "01", "001", "100", "101", "110", "111"],
    &["000", "001", "01", "10", "110", "111"],
    &["110", "00", "01", "10", "111"],
    &["00", "01", "10", "11"],
    &["00", "01", "1"],
    &["0", "1"],
];

/// total_zeros for chroma DC 2x2 blocks (Table 9-9a).
pub static TOTAL_ZEROS_2X2: &[&[&str]] = &[
    &["1", "01", "001", "000"],
    &["1", "01", "00"],
    &["1", "0"],
];

/// run_before (Table 9-10), indexed [min(7, zerosLeft) - 1][run].
pub static RUN_BEFORE: &[&[&str]] = &[
    &["1", "0"],
    &["1", "01", "00"],
    &["11", "10", "01", "00"],
    &["11", "10", "01", "001", "000"],
    &["11", "10", "011", "010", "001", "000"],
    &["11", "000", "001", "011", "010", "101", "100"],
    &["111", "110", "101", "100", "011", "010", "001", "0001", "00001", "000001", "0000001", "00000001", "000000001", "0000000001", "00000000001"],
];

/// coded_block_pattern to codeNum mapping for Intra_4x4/Intra_8x8 macroblocks (Table 9-4, intra column).
pub static CBP_INTRA: &[u32] = &[
    3, 29, 30, 17, 31, 18, 37, 8, 32, 38, 19, 9, 20, 10, 11, 2,
    16, 33, 34, 21, 35, 22, 39, 4, 36, 40, 23, 5, 24, 6, 7, 1,
    41, 42, 43, 25, 44, 26, 46, 12, 45, 47, 27, 13, 28, 14, 15, 0,
];

/// coded_block_pattern to codeNum mapping for Inter macroblocks (Table 9-4, inter column).
pub static CBP_INTER: &[u32] = &[
    0, 2, 3, 7, 4, 8, 17, 13, 5, 18, 9, 14, 10, 15, 16, 11,
    1, 32, 33, 36, 34, 37, 44, 40, 35, 45, 38, 41, 39, 42, 43, 19,
    6, 24, 25, 20, 26, 21, 46, 28, 27, 47, 22, 29, 23, 30, 31, 12,
];
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shapes() {
        assert_eq!(COEFF_TOKEN_NC0.len(), 17);
        assert_eq!(COEFF_TOKEN_NC2.len(), 17);
        assert_eq!(COEFF_TOKEN_NC4.len(), 17);
        assert_eq!(COEFF_TOKEN_NC8.len(), 17);
        assert_eq!(COEFF_TOKEN_CHROMA_DC_2X2.len(), 5);
        assert_eq!(COEFF_TOKEN_CHROMA_DC_2X4.len(), 9);
        assert_eq!(TOTAL_ZEROS_4X4.len(), 15);
        assert_eq!(TOTAL_ZEROS_2X4.len(), 7);
        assert_eq!(TOTAL_ZEROS_2X2.len(), 3);
        assert_eq!(RUN_BEFORE.len(), 7);
        assert_eq!(CBP_INTRA.len(), 48);
        assert_eq!(CBP_INTER.len(), 48);
    }

    #[test]
    fn test_coeff_token_rows_track_trailing_ones_cap() {
        for table in [COEFF_TOKEN_NC0, COEFF_TOKEN_NC2, COEFF_TOKEN_NC4, COEFF_TOKEN_NC8] {
            for (total_coeff, row) in table.iter().enumerate() {
                assert_eq!(row.len(), total_coeff.min(3) + 1);
            }
        }
    }

    #[test]
    fn test_cbp_tables_are_permutations() {
        for table in [CBP_INTRA, CBP_INTER] {
            let mut seen = [false; 48];
            for &v in table {
                seen[v as usize] = true;
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn test_codes_are_binary_strings() {
        let tables = [
            COEFF_TOKEN_NC0,
            COEFF_TOKEN_NC2,
            COEFF_TOKEN_NC4,
            COEFF_TOKEN_NC8,
            COEFF_TOKEN_CHROMA_DC_2X2,
            COEFF_TOKEN_CHROMA_DC_2X4,
            TOTAL_ZEROS_4X4,
            TOTAL_ZEROS_2X4,
            TOTAL_ZEROS_2X2,
            RUN_BEFORE,
        ];
        for table in tables {
            for row in table {
                for code in *row {
                    assert!(!code.is_empty());
                    assert!(code.bytes().all(|b| b == b'0' || b == b'1'));
                }
            }
        }
    }
}
