//! Bit-level reading and writing of Exp-Golomb coded values.
//!
//! H.264 parameter sets are packed with variable-length Exp-Golomb integers.
//! [`ExpGolombReader`] decodes them from an RBSP buffer through a 32-bit
//! working window, and [`ExpGolombWriter`] produces the same encoding.
//!
//! ```rust
//! # fn test() -> std::io::Result<()> {
//! use expgolomb::{ExpGolombReader, ExpGolombWriter};
//!
//! let mut writer = ExpGolombWriter::new();
//! writer.write_unsigned_exp_golomb(0);
//! writer.write_unsigned_exp_golomb(1);
//! writer.write_exp_golomb(-2);
//!
//! let data = writer.finish();
//! let mut reader = ExpGolombReader::new(&data);
//!
//! assert_eq!(reader.read_unsigned_exp_golomb()?, 0);
//! assert_eq!(reader.read_unsigned_exp_golomb()?, 1);
//! assert_eq!(reader.read_exp_golomb()?, -2);
//! # Ok(())
//! # }
//! # test().expect("failed to run test");
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod reader;
mod writer;

pub use reader::ExpGolombReader;
pub use writer::ExpGolombWriter;

/// Returns the number of bits that an unsigned Exp-Golomb encoded number would take up.
///
/// See: <https://en.wikipedia.org/wiki/Exponential-Golomb_coding>
pub fn size_of_exp_golomb(number: u32) -> u32 {
    let value = number as u64 + 1;
    let leading_zeros = 63 - value.leading_zeros();
    leading_zeros * 2 + 1
}

/// Maps a signed value onto the unsigned code space (0, 1, -1, 2, -2, ...).
pub(crate) fn signed_to_code(number: i32) -> u32 {
    if number <= 0 {
        (-(number as i64) * 2) as u32
    } else {
        (number as i64 * 2 - 1) as u32
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_size_of_exp_golomb() {
        assert_eq!(size_of_exp_golomb(0), 1);
        assert_eq!(size_of_exp_golomb(1), 3);
        assert_eq!(size_of_exp_golomb(2), 3);
        assert_eq!(size_of_exp_golomb(3), 5);
        assert_eq!(size_of_exp_golomb(6), 5);
        assert_eq!(size_of_exp_golomb(7), 7);
        assert_eq!(size_of_exp_golomb(u32::MAX), 65);
    }

    #[test]
    fn test_signed_to_code() {
        assert_eq!(signed_to_code(0), 0);
        assert_eq!(signed_to_code(1), 1);
        assert_eq!(signed_to_code(-1), 2);
        assert_eq!(signed_to_code(2), 3);
        assert_eq!(signed_to_code(-2), 4);
    }
}
