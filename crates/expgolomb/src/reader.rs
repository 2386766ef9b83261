use std::io;

/// Reads bits and Exp-Golomb values out of a byte slice.
///
/// Up to four bytes are loaded at a time into a working window; reads that
/// straddle the window boundary refill it in a loop. Reading past the end of
/// the buffer fails with [`io::ErrorKind::UnexpectedEof`].
#[derive(Debug, Clone)]
pub struct ExpGolombReader<'a> {
    data: &'a [u8],
    /// Index of the next byte to load into the window.
    position: usize,
    /// Valid bits are MSB aligned; the unused low bits are always zero.
    word: u32,
    bits_in_word: u32,
}

impl<'a> ExpGolombReader<'a> {
    /// Creates a reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            word: 0,
            bits_in_word: 0,
        }
    }

    /// Number of bits that can still be read.
    pub fn bits_available(&self) -> usize {
        (self.data.len() - self.position) * 8 + self.bits_in_word as usize
    }

    fn load_word(&mut self) -> io::Result<()> {
        let remaining = self.data.len() - self.position;
        if remaining == 0 {
            return Err(eof());
        }

        let take = remaining.min(4);
        let mut bytes = [0u8; 4];
        bytes[..take].copy_from_slice(&self.data[self.position..self.position + take]);

        self.word = u32::from_be_bytes(bytes);
        self.bits_in_word = take as u32 * 8;
        self.position += take;
        Ok(())
    }

    /// Reads `count` bits (at most 32) as a big-endian unsigned value.
    pub fn read_bits(&mut self, count: u32) -> io::Result<u32> {
        if count > 32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot read {count} bits into a u32"),
            ));
        }
        if count as usize > self.bits_available() {
            return Err(eof());
        }

        let mut value: u64 = 0;
        let mut needed = count;
        while needed > 0 {
            if self.bits_in_word == 0 {
                self.load_word()?;
            }

            let take = needed.min(self.bits_in_word);
            value = (value << take) | (self.word as u64 >> (32 - take));
            self.word = if take == 32 { 0 } else { self.word << take };
            self.bits_in_word -= take;
            needed -= take;
        }

        Ok(value as u32)
    }

    /// Discards `count` bits.
    pub fn skip_bits(&mut self, count: usize) -> io::Result<()> {
        if count > self.bits_available() {
            return Err(eof());
        }

        if count < self.bits_in_word as usize {
            self.word <<= count;
            self.bits_in_word -= count as u32;
            return Ok(());
        }

        let count = count - self.bits_in_word as usize;
        self.word = 0;
        self.bits_in_word = 0;
        self.position += count / 8;

        let rest = (count % 8) as u32;
        if rest > 0 {
            self.load_word()?;
            self.word <<= rest;
            self.bits_in_word -= rest;
        }
        Ok(())
    }

    /// Counts and consumes zero bits up to (not including) the next set bit.
    pub fn skip_leading_zeros(&mut self) -> io::Result<u32> {
        let mut count = 0;
        loop {
            if self.bits_in_word == 0 {
                self.load_word()?;
            }

            let zeros = self.word.leading_zeros().min(self.bits_in_word);
            if zeros < self.bits_in_word {
                self.word <<= zeros;
                self.bits_in_word -= zeros;
                return Ok(count + zeros);
            }

            count += self.bits_in_word;
            self.word = 0;
            self.bits_in_word = 0;
        }
    }

    /// Reads a single bit as a flag.
    pub fn read_bool(&mut self) -> io::Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads eight bits.
    pub fn read_u8(&mut self) -> io::Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads an unsigned Exp-Golomb value (`ue(v)`).
    pub fn read_unsigned_exp_golomb(&mut self) -> io::Result<u32> {
        let zeros = self.skip_leading_zeros()?;
        if zeros > 31 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("exp-golomb prefix of {zeros} zero bits overflows u32"),
            ));
        }
        Ok(self.read_bits(zeros + 1)? - 1)
    }

    /// Reads a signed Exp-Golomb value (`se(v)`): odd codes are positive,
    /// even codes negative.
    pub fn read_exp_golomb(&mut self) -> io::Result<i32> {
        let code = self.read_unsigned_exp_golomb()? as i64;
        let value = if code & 1 == 1 {
            (code + 1) / 2
        } else {
            -(code / 2)
        };
        i32::try_from(value).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("signed exp-golomb value {value} overflows i32"),
            )
        })
    }

    /// Skips an unsigned Exp-Golomb value.
    pub fn skip_unsigned_exp_golomb(&mut self) -> io::Result<()> {
        let zeros = self.skip_leading_zeros()?;
        self.skip_bits(zeros as usize + 1)
    }

    /// Skips a signed Exp-Golomb value.
    pub fn skip_exp_golomb(&mut self) -> io::Result<()> {
        self.skip_unsigned_exp_golomb()
    }
}

fn eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "bit reader exhausted")
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::ExpGolombWriter;

    #[test]
    fn test_read_bits_across_window() {
        let data = [0xAB, 0xCD, 0xEF, 0x01, 0x23, 0x45];
        let mut reader = ExpGolombReader::new(&data);

        assert_eq!(reader.read_bits(4).unwrap(), 0xA);
        assert_eq!(reader.read_bits(32).unwrap(), 0xBCDEF012);
        assert_eq!(reader.bits_available(), 12);
        assert_eq!(reader.read_bits(12).unwrap(), 0x345);
        assert_eq!(reader.bits_available(), 0);
    }

    #[test]
    fn test_read_past_end_fails() {
        let data = [0xFF];
        let mut reader = ExpGolombReader::new(&data);
        assert_eq!(reader.read_bits(6).unwrap(), 0x3F);

        let err = reader.read_bits(3).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(reader.skip_bits(3).is_err());
    }

    #[test]
    fn test_skip_bits() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x7F];
        let mut reader = ExpGolombReader::new(&data);

        reader.skip_bits(40).unwrap();
        assert!(reader.read_bool().unwrap());
        reader.skip_bits(8).unwrap();
        assert_eq!(reader.read_bits(7).unwrap(), 0x7F);
    }

    #[test]
    fn test_skip_leading_zeros_refills() {
        // 37 zero bits followed by a one
        let data = [0x00, 0x00, 0x00, 0x00, 0x04];
        let mut reader = ExpGolombReader::new(&data);
        assert_eq!(reader.skip_leading_zeros().unwrap(), 37);
        assert!(reader.read_bool().unwrap());

        let zeros = [0x00, 0x00];
        let mut reader = ExpGolombReader::new(&zeros);
        assert!(reader.skip_leading_zeros().is_err());
    }

    #[test]
    fn test_unsigned_exp_golomb_sequence() {
        // 1 | 010 | 011 | 00100 | 00101 | 00110 | 00111
        let mut writer = ExpGolombWriter::new();
        writer.write_bits(0b1, 1);
        writer.write_bits(0b010, 3);
        writer.write_bits(0b011, 3);
        writer.write_bits(0b00100, 5);
        writer.write_bits(0b00101, 5);
        writer.write_bits(0b00110, 5);
        writer.write_bits(0b00111, 5);
        let data = writer.finish();

        let mut reader = ExpGolombReader::new(&data);
        for expected in 0..=6 {
            assert_eq!(reader.read_unsigned_exp_golomb().unwrap(), expected);
        }
    }

    #[test]
    fn test_signed_mapping() {
        let mut writer = ExpGolombWriter::new();
        writer.write_unsigned_exp_golomb(1);
        writer.write_unsigned_exp_golomb(2);
        writer.write_unsigned_exp_golomb(3);
        writer.write_unsigned_exp_golomb(0);
        let data = writer.finish();

        let mut reader = ExpGolombReader::new(&data);
        assert_eq!(reader.read_exp_golomb().unwrap(), 1);
        assert_eq!(reader.read_exp_golomb().unwrap(), -1);
        assert_eq!(reader.read_exp_golomb().unwrap(), 2);
        assert_eq!(reader.read_exp_golomb().unwrap(), 0);
    }

    #[test]
    fn test_unsigned_round_trip() {
        let values = [0, 1, 2, 7, 8, 255, 256, 65_535, 1 << 20, u32::MAX - 1];

        let mut writer = ExpGolombWriter::new();
        for value in values {
            writer.write_unsigned_exp_golomb(value);
        }
        let data = writer.finish();

        let mut reader = ExpGolombReader::new(&data);
        for value in values {
            assert_eq!(reader.read_unsigned_exp_golomb().unwrap(), value);
        }
    }

    #[test]
    fn test_skip_exp_golomb() {
        let mut writer = ExpGolombWriter::new();
        writer.write_unsigned_exp_golomb(300);
        writer.write_exp_golomb(-17);
        writer.write_bits(0b101, 3);
        let data = writer.finish();

        let mut reader = ExpGolombReader::new(&data);
        reader.skip_unsigned_exp_golomb().unwrap();
        reader.skip_exp_golomb().unwrap();
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    }

    #[test]
    fn test_overlong_prefix_is_invalid() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00];
        let mut reader = ExpGolombReader::new(&data);
        let err = reader.read_unsigned_exp_golomb().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_signed_extremes() {
        let mut writer = ExpGolombWriter::new();
        writer.write_unsigned_exp_golomb(u32::MAX - 2);
        writer.write_unsigned_exp_golomb(u32::MAX - 1);
        writer.write_exp_golomb(i32::MAX);
        writer.write_exp_golomb(-i32::MAX);
        let data = writer.finish();

        let mut reader = ExpGolombReader::new(&data);
        assert_eq!(reader.read_exp_golomb().unwrap(), i32::MAX);
        assert_eq!(reader.read_exp_golomb().unwrap(), -i32::MAX);
        assert_eq!(reader.read_exp_golomb().unwrap(), i32::MAX);
        assert_eq!(reader.read_exp_golomb().unwrap(), -i32::MAX);
    }
}
