//! Bitstream writing and reading utilities.
//!
//! The writer is the backbone of the NAL encoders: an ordered bit-sequence
//! builder (MSB first) with Exp-Golomb primitives and incremental flushing to
//! a byte sink. Code words are purely concatenative (no arithmetic carries),
//! so a flush is a length-based byte cut: every byte whose bits are all
//! determined is written out, only the partial tail byte stays in memory.
//!
//! The reader exists as the reference decode side for round-trip tests; the
//! encode path never consumes bits.

use std::io::Write;

use crate::error::{BitstreamError, Error, Result};

/// A bitstream writer for generating coded data.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    bit_pos: u8,
}

impl BitWriter {
    /// Create a new bit writer.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            bit_pos: 0,
        }
    }

    /// Create a new bit writer with capacity.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            bit_pos: 0,
        }
    }

    /// Get the number of bits written and not yet flushed.
    pub fn pending_bits(&self) -> usize {
        self.data.len() * 8 - (8 - self.bit_pos as usize) % 8
    }

    /// Check if the writer is byte-aligned.
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        if self.bit_pos == 0 {
            self.data.push(0);
        }

        if bit {
            let idx = self.data.len() - 1;
            self.data[idx] |= 1 << (7 - self.bit_pos);
        }

        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
        }
        Ok(())
    }

    /// Write up to 32 bits from an unsigned integer, MSB first.
    pub fn write_bits(&mut self, value: u32, n: u8) -> Result<()> {
        if n > 32 {
            return Err(Error::InvalidArgument(
                "cannot write more than 32 bits at once".into(),
            ));
        }
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 != 0)?;
        }
        Ok(())
    }

    /// Write up to 64 bits from an unsigned integer, MSB first.
    pub fn write_bits_u64(&mut self, value: u64, n: u8) -> Result<()> {
        if n > 64 {
            return Err(Error::InvalidArgument(
                "cannot write more than 64 bits at once".into(),
            ));
        }
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 != 0)?;
        }
        Ok(())
    }

    /// Write an unsigned Exp-Golomb coded value (ue(v)).
    pub fn write_ue(&mut self, value: u32) -> Result<()> {
        self.write_ue_u64(u64::from(value))
    }

    /// Write an unsigned Exp-Golomb coded value from a 64-bit input.
    ///
    /// Needed by `write_se`: the signed mapping of `i32::MIN` exceeds `u32`.
    pub fn write_ue_u64(&mut self, value: u64) -> Result<()> {
        let value_plus_1 = value.checked_add(1).ok_or_else(|| {
            Error::InvalidArgument("Exp-Golomb value out of range".into())
        })?;
        let leading_zeros = 63 - value_plus_1.leading_zeros() as u8;

        for _ in 0..leading_zeros {
            self.write_bit(false)?;
        }
        self.write_bits_u64(value_plus_1, leading_zeros + 1)
    }

    /// Write a signed Exp-Golomb coded value (se(v)).
    ///
    /// Zero maps to the single-bit code; positive `v` to `2v - 1`, negative
    /// to `-2v`.
    pub fn write_se(&mut self, value: i32) -> Result<()> {
        let mapped = if value <= 0 {
            (-(i64::from(value)) * 2) as u64
        } else {
            (i64::from(value) * 2 - 1) as u64
        };
        self.write_ue_u64(mapped)
    }

    /// Align to the next byte boundary by writing zero bits.
    pub fn align_to_byte(&mut self) -> Result<()> {
        while self.bit_pos != 0 {
            self.write_bit(false)?;
        }
        Ok(())
    }

    /// Write RBSP trailing bits (stop bit followed by zeros to alignment).
    pub fn write_rbsp_trailing_bits(&mut self) -> Result<()> {
        self.write_bit(true)?;
        self.align_to_byte()
    }

    /// Flush every fully determined byte to `sink`.
    ///
    /// Only the trailing partial byte (if any) is retained; its bits are not
    /// reordered or revisited by later appends. Returns the number of bytes
    /// written. Callers emitting long slices flush once per macroblock to
    /// bound memory.
    pub fn flush_to<W: Write>(&mut self, sink: &mut W) -> Result<usize> {
        let complete = if self.bit_pos == 0 {
            self.data.len()
        } else {
            self.data.len() - 1
        };
        sink.write_all(&self.data[..complete])?;
        self.data.drain(..complete);
        Ok(complete)
    }

    /// Zero-pad the final partial byte and write everything to `sink`.
    pub fn finish_to<W: Write>(&mut self, sink: &mut W) -> Result<usize> {
        self.align_to_byte()?;
        self.flush_to(sink)
    }

    /// Get the pending (unflushed) data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the pending data, consuming the writer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// A bitstream reader for parsing coded data.
///
/// Reference decode side only: round-trip tests use it to check that emitted
/// Exp-Golomb and VLC sequences decode back to their inputs.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// Get the current bit position in the stream.
    pub fn position(&self) -> usize {
        self.byte_pos * 8 + self.bit_pos as usize
    }

    /// Get the number of remaining bits.
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.position())
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.byte_pos >= self.data.len() {
            return Err(BitstreamError::UnexpectedEnd.into());
        }

        let bit = (self.data[self.byte_pos] >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }

        Ok(bit != 0)
    }

    /// Read up to 32 bits as an unsigned integer.
    pub fn read_bits(&mut self, n: u8) -> Result<u32> {
        if n > 32 {
            return Err(Error::InvalidArgument(
                "cannot read more than 32 bits at once".into(),
            ));
        }
        if self.remaining_bits() < n as usize {
            return Err(BitstreamError::UnexpectedEnd.into());
        }

        let mut value: u32 = 0;
        for _ in 0..n {
            value = (value << 1) | (self.read_bit()? as u32);
        }

        Ok(value)
    }

    /// Read up to 64 bits as an unsigned integer.
    pub fn read_bits_u64(&mut self, n: u8) -> Result<u64> {
        if n > 64 {
            return Err(Error::InvalidArgument(
                "cannot read more than 64 bits at once".into(),
            ));
        }
        if self.remaining_bits() < n as usize {
            return Err(BitstreamError::UnexpectedEnd.into());
        }

        let mut value: u64 = 0;
        for _ in 0..n {
            value = (value << 1) | (self.read_bit()? as u64);
        }

        Ok(value)
    }

    /// Read an unsigned Exp-Golomb coded value (ue(v)).
    pub fn read_ue(&mut self) -> Result<u32> {
        let value = self.read_ue_u64()?;
        u32::try_from(value).map_err(|_| BitstreamError::ExpGolombOverflow.into())
    }

    /// Read an unsigned Exp-Golomb coded value with a 64-bit result.
    pub fn read_ue_u64(&mut self) -> Result<u64> {
        let mut leading_zeros = 0u8;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > 63 {
                return Err(BitstreamError::ExpGolombOverflow.into());
            }
        }

        if leading_zeros == 0 {
            return Ok(0);
        }

        let suffix = self.read_bits_u64(leading_zeros)?;
        Ok((1u64 << leading_zeros) - 1 + suffix)
    }

    /// Read a signed Exp-Golomb coded value (se(v)).
    pub fn read_se(&mut self) -> Result<i64> {
        let ue = self.read_ue_u64()?;
        let value = ue.div_ceil(2) as i64;
        if ue % 2 == 0 {
            Ok(-value)
        } else {
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b1011, 4).unwrap();
        writer.write_bits(0b0100, 4).unwrap();
        assert_eq!(writer.data(), &[0b10110100]);
    }

    #[test]
    fn test_write_single_bits() {
        let mut writer = BitWriter::new();
        for bit in [true, false, true, true] {
            writer.write_bit(bit).unwrap();
        }
        writer.align_to_byte().unwrap();
        assert_eq!(writer.data(), &[0b10110000]);
    }

    #[test]
    fn test_write_exp_golomb() {
        // 0 -> "1", 1 -> "010", 2 -> "011", 3 -> "00100"
        for (value, expected) in [(0, &[0x80u8][..]), (1, &[0x40]), (2, &[0x60]), (3, &[0x20])] {
            let mut writer = BitWriter::new();
            writer.write_ue(value).unwrap();
            writer.align_to_byte().unwrap();
            assert_eq!(writer.data(), expected, "ue({value})");
        }
    }

    #[test]
    fn test_signed_exp_golomb_zero_is_single_bit() {
        let mut writer = BitWriter::new();
        writer.write_se(0).unwrap();
        assert_eq!(writer.pending_bits(), 1);
        writer.align_to_byte().unwrap();
        assert_eq!(writer.data(), &[0x80]);
    }

    #[test]
    fn test_ue_round_trip() {
        for value in [0u32, 1, 2, 3, 7, 8, 254, 255, 256, 65535, i32::MAX as u32] {
            let mut writer = BitWriter::new();
            writer.write_ue(value).unwrap();
            writer.align_to_byte().unwrap();
            let mut reader = BitReader::new(writer.data());
            assert_eq!(reader.read_ue().unwrap(), value);
        }
    }

    #[test]
    fn test_se_round_trip() {
        for value in [0i32, 1, -1, 2, -2, 127, -128, i32::MAX, i32::MIN + 1, i32::MIN] {
            let mut writer = BitWriter::new();
            writer.write_se(value).unwrap();
            writer.align_to_byte().unwrap();
            let mut reader = BitReader::new(writer.data());
            assert_eq!(reader.read_se().unwrap(), i64::from(value), "se({value})");
        }
    }

    #[test]
    fn test_flush_retains_partial_byte() {
        let mut writer = BitWriter::new();
        let mut sink = Vec::new();
        writer.write_bits(0xAB, 8).unwrap();
        writer.write_bits(0b101, 3).unwrap();

        assert_eq!(writer.flush_to(&mut sink).unwrap(), 1);
        assert_eq!(sink, vec![0xAB]);
        assert_eq!(writer.pending_bits(), 3);

        // Later bits extend the retained tail without disturbing it.
        writer.write_bits(0b01100, 5).unwrap();
        writer.flush_to(&mut sink).unwrap();
        assert_eq!(sink, vec![0xAB, 0b10101100]);
        assert_eq!(writer.pending_bits(), 0);
    }

    #[test]
    fn test_finish_pads_with_zeros() {
        let mut writer = BitWriter::new();
        let mut sink = Vec::new();
        writer.write_bits(0b11, 2).unwrap();
        writer.finish_to(&mut sink).unwrap();
        assert_eq!(sink, vec![0b11000000]);
        assert_eq!(writer.pending_bits(), 0);
    }

    #[test]
    fn test_rbsp_trailing_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b10110, 5).unwrap();
        writer.write_rbsp_trailing_bits().unwrap();
        assert_eq!(writer.data(), &[0b10110100]);
        assert!(writer.is_byte_aligned());
    }

    #[test]
    fn test_write_bits_too_many() {
        let mut writer = BitWriter::new();
        assert!(writer.write_bits(0, 33).is_err());
    }
}
