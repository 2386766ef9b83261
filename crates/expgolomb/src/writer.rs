use crate::signed_to_code;

/// Packs bits MSB first into a byte vector.
#[derive(Debug, Default, Clone)]
pub struct ExpGolombWriter {
    bytes: Vec<u8>,
    current: u8,
    bit_count: u8,
}

impl ExpGolombWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single bit.
    pub fn write_bit(&mut self, bit: bool) {
        self.current = (self.current << 1) | bit as u8;
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.bit_count = 0;
        }
    }

    /// Appends the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, count: u32) {
        for shift in (0..count).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Appends an unsigned Exp-Golomb value (`ue(v)`).
    pub fn write_unsigned_exp_golomb(&mut self, value: u32) {
        let code = value as u64 + 1;
        let zeros = 63 - code.leading_zeros();
        self.write_bits(0, zeros);
        self.write_bits(code, zeros + 1);
    }

    /// Appends a signed Exp-Golomb value (`se(v)`).
    pub fn write_exp_golomb(&mut self, value: i32) {
        self.write_unsigned_exp_golomb(signed_to_code(value));
    }

    /// Pads the final partial byte with zero bits and returns the buffer.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.current <<= 8 - self.bit_count;
            self.bytes.push(self.current);
        }
        self.bytes
    }
}
