use std::io;

use expgolomb::ExpGolombReader;

use crate::rbsp::nal_to_rbsp;

/// Profiles whose SPS carries chroma format, bit depth and scaling lists.
const HIGH_PROFILES: [u8; 9] = [100, 110, 122, 244, 44, 83, 86, 118, 128];

/// Frame cropping offsets, in the units the SPS declares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameCrop {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

/// The parts of a Sequence Parameter Set needed to describe the video.
///
/// Parsing stops after the cropping window; VUI parameters are not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sps {
    pub profile_idc: u8,
    /// constraint_set flags, also known as profile compatibility
    pub profile_compatibility: u8,
    pub level_idc: u8,
    pub chroma_format_idc: u32,
    pub pic_order_cnt_type: u32,
    pub pic_width_in_mbs_minus1: u32,
    pub pic_height_in_map_units_minus1: u32,
    pub frame_mbs_only_flag: bool,
    pub frame_crop: Option<FrameCrop>,
}

impl Sps {
    /// Parses an SPS NAL unit as captured from the bitstream (header byte
    /// included, emulation prevention bytes still present).
    pub fn parse_nal(nal: &[u8]) -> io::Result<Self> {
        Self::parse(&nal_to_rbsp(nal))
    }

    /// Parses SPS fields from an already de-escaped RBSP without the NAL header.
    pub fn parse(rbsp: &[u8]) -> io::Result<Self> {
        let mut reader = ExpGolombReader::new(rbsp);

        let profile_idc = reader.read_u8()?;
        let profile_compatibility = reader.read_u8()?;
        let level_idc = reader.read_u8()?;
        reader.skip_unsigned_exp_golomb()?; // seq_parameter_set_id

        let mut chroma_format_idc = 1;
        if HIGH_PROFILES.contains(&profile_idc) {
            chroma_format_idc = reader.read_unsigned_exp_golomb()?;
            if chroma_format_idc == 3 {
                reader.skip_bits(1)?; // separate_colour_plane_flag
            }
            reader.skip_unsigned_exp_golomb()?; // bit_depth_luma_minus8
            reader.skip_unsigned_exp_golomb()?; // bit_depth_chroma_minus8
            reader.skip_bits(1)?; // qpprime_y_zero_transform_bypass_flag

            if reader.read_bool()? {
                // seq_scaling_matrix_present_flag
                let lists = if chroma_format_idc != 3 { 8 } else { 12 };
                for i in 0..lists {
                    if reader.read_bool()? {
                        skip_scaling_list(&mut reader, if i < 6 { 16 } else { 64 })?;
                    }
                }
            }
        }

        reader.skip_unsigned_exp_golomb()?; // log2_max_frame_num_minus4
        let pic_order_cnt_type = reader.read_unsigned_exp_golomb()?;
        match pic_order_cnt_type {
            0 => reader.skip_unsigned_exp_golomb()?, // log2_max_pic_order_cnt_lsb_minus4
            1 => {
                reader.skip_bits(1)?; // delta_pic_order_always_zero_flag
                reader.skip_exp_golomb()?; // offset_for_non_ref_pic
                reader.skip_exp_golomb()?; // offset_for_top_to_bottom_field
                let cycle = reader.read_unsigned_exp_golomb()?;
                for _ in 0..cycle {
                    reader.skip_exp_golomb()?; // offset_for_ref_frame
                }
            }
            _ => {}
        }

        reader.skip_unsigned_exp_golomb()?; // max_num_ref_frames
        reader.skip_bits(1)?; // gaps_in_frame_num_value_allowed_flag

        let pic_width_in_mbs_minus1 = reader.read_unsigned_exp_golomb()?;
        let pic_height_in_map_units_minus1 = reader.read_unsigned_exp_golomb()?;

        let frame_mbs_only_flag = reader.read_bool()?;
        if !frame_mbs_only_flag {
            reader.skip_bits(1)?; // mb_adaptive_frame_field_flag
        }
        reader.skip_bits(1)?; // direct_8x8_inference_flag

        let frame_crop = if reader.read_bool()? {
            Some(FrameCrop {
                left: reader.read_unsigned_exp_golomb()?,
                right: reader.read_unsigned_exp_golomb()?,
                top: reader.read_unsigned_exp_golomb()?,
                bottom: reader.read_unsigned_exp_golomb()?,
            })
        } else {
            None
        };

        let sps = Self {
            profile_idc,
            profile_compatibility,
            level_idc,
            chroma_format_idc,
            pic_order_cnt_type,
            pic_width_in_mbs_minus1,
            pic_height_in_map_units_minus1,
            frame_mbs_only_flag,
            frame_crop,
        };

        if sps.checked_width().is_none() || sps.checked_height().is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "SPS cropping window exceeds the coded frame size",
            ));
        }

        Ok(sps)
    }

    fn checked_width(&self) -> Option<u64> {
        let base = (self.pic_width_in_mbs_minus1 as u64 + 1) * 16;
        let crop = self
            .frame_crop
            .map_or(0, |c| (c.left as u64 + c.right as u64) * 2);
        base.checked_sub(crop)
    }

    fn checked_height(&self) -> Option<u64> {
        let base = (2 - self.frame_mbs_only_flag as u64)
            * (self.pic_height_in_map_units_minus1 as u64 + 1)
            * 16;
        let crop = self
            .frame_crop
            .map_or(0, |c| (c.top as u64 + c.bottom as u64) * 2);
        base.checked_sub(crop)
    }

    /// `16 * (pic_width_in_mbs_minus1 + 1) - 2 * (crop_left + crop_right)`
    pub fn width(&self) -> u64 {
        self.checked_width().unwrap_or(0)
    }

    /// `16 * (2 - frame_mbs_only_flag) * (pic_height_in_map_units_minus1 + 1) - 2 * (crop_top + crop_bottom)`
    pub fn height(&self) -> u64 {
        self.checked_height().unwrap_or(0)
    }
}

fn skip_scaling_list(reader: &mut ExpGolombReader<'_>, size: usize) -> io::Result<()> {
    let mut last_scale: i32 = 8;
    let mut next_scale: i32 = 8;

    for _ in 0..size {
        if next_scale != 0 {
            let delta_scale = reader.read_exp_golomb()?;
            if !(-128..=127).contains(&delta_scale) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("scaling list delta {delta_scale} out of range"),
                ));
            }
            next_scale = (last_scale + delta_scale + 256).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }

    Ok(())
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use expgolomb::ExpGolombWriter;

    use super::*;
    use crate::rbsp::escape_rbsp;

    #[test]
    fn test_parse_baseline_sps() {
        let mut writer = ExpGolombWriter::new();
        // profile_idc
        writer.write_bits(66, 8);
        // constraint flags
        writer.write_bits(0xC0, 8);
        // level_idc
        writer.write_bits(30, 8);
        // seq_parameter_set_id
        writer.write_unsigned_exp_golomb(0);
        // log2_max_frame_num_minus4
        writer.write_unsigned_exp_golomb(0);
        // pic_order_cnt_type
        writer.write_unsigned_exp_golomb(2);
        // max_num_ref_frames
        writer.write_unsigned_exp_golomb(1);
        // gaps_in_frame_num_value_allowed_flag
        writer.write_bit(false);
        // 640 = (p + 1) * 16
        writer.write_unsigned_exp_golomb(39);
        // 480 = (2 - 1) * (p + 1) * 16
        writer.write_unsigned_exp_golomb(29);
        // frame_mbs_only_flag
        writer.write_bit(true);
        // direct_8x8_inference_flag
        writer.write_bit(true);
        // frame_cropping_flag
        writer.write_bit(false);
        // vui_parameters_present_flag + rbsp stop bit
        writer.write_bit(false);
        writer.write_bit(true);

        let sps = Sps::parse(&writer.finish()).unwrap();
        assert_eq!(sps.profile_idc, 66);
        assert_eq!(sps.profile_compatibility, 0xC0);
        assert_eq!(sps.level_idc, 30);
        assert_eq!(sps.chroma_format_idc, 1);
        assert_eq!(sps.pic_order_cnt_type, 2);
        assert_eq!(sps.width(), 640);
        assert_eq!(sps.height(), 480);
    }

    #[test]
    fn test_parse_high_profile_with_scaling_lists_and_cropping() {
        let mut writer = ExpGolombWriter::new();
        // profile_idc
        writer.write_bits(100, 8);
        writer.write_bits(0, 8);
        writer.write_bits(40, 8);
        // seq_parameter_set_id
        writer.write_unsigned_exp_golomb(0);
        // chroma_format_idc
        writer.write_unsigned_exp_golomb(1);
        // bit_depth_luma_minus8, bit_depth_chroma_minus8
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(0);
        // qpprime_y_zero_transform_bypass_flag
        writer.write_bit(false);
        // seq_scaling_matrix_present_flag
        writer.write_bit(true);
        // list 0 present with a delta that drops next_scale to 0 straight away
        writer.write_bit(true);
        writer.write_exp_golomb(-8);
        // list 1 present, flat 16 deltas of zero
        writer.write_bit(true);
        for _ in 0..16 {
            writer.write_exp_golomb(0);
        }
        // lists 2..8 absent
        for _ in 2..8 {
            writer.write_bit(false);
        }
        // log2_max_frame_num_minus4
        writer.write_unsigned_exp_golomb(0);
        // pic_order_cnt_type 1 with a two entry cycle
        writer.write_unsigned_exp_golomb(1);
        writer.write_bit(false);
        writer.write_exp_golomb(-1);
        writer.write_exp_golomb(2);
        writer.write_unsigned_exp_golomb(2);
        writer.write_exp_golomb(3);
        writer.write_exp_golomb(-3);
        // max_num_ref_frames
        writer.write_unsigned_exp_golomb(4);
        writer.write_bit(false);
        // 1920 = (p + 1) * 16 - 2 * (0 + 0)
        writer.write_unsigned_exp_golomb(119);
        // 1080 = (2 - 0) * (p + 1) * 16 - 2 * (0 + 4)
        writer.write_unsigned_exp_golomb(33);
        // frame_mbs_only_flag
        writer.write_bit(false);
        // mb_adaptive_frame_field_flag
        writer.write_bit(false);
        // direct_8x8_inference_flag
        writer.write_bit(true);
        // frame_cropping_flag
        writer.write_bit(true);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(4);
        writer.write_bit(true);

        let sps = Sps::parse(&writer.finish()).unwrap();
        assert_eq!(sps.profile_idc, 100);
        assert_eq!(sps.pic_order_cnt_type, 1);
        assert!(!sps.frame_mbs_only_flag);
        assert_eq!(
            sps.frame_crop,
            Some(FrameCrop {
                left: 0,
                right: 0,
                top: 0,
                bottom: 4
            })
        );
        assert_eq!(sps.width(), 1920);
        assert_eq!(sps.height(), 1080);
    }

    #[test]
    fn test_parse_nal_removes_emulation_prevention() {
        let mut writer = ExpGolombWriter::new();
        writer.write_bits(77, 8);
        // zero constraint and level bytes followed by the long id code
        // produce 00 00 02 in the payload
        writer.write_bits(0, 8);
        writer.write_bits(0, 8);
        writer.write_unsigned_exp_golomb(63);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(2);
        writer.write_unsigned_exp_golomb(0);
        writer.write_bit(false);
        // 320 x 240
        writer.write_unsigned_exp_golomb(19);
        writer.write_unsigned_exp_golomb(14);
        writer.write_bit(true);
        writer.write_bit(true);
        writer.write_bit(false);
        writer.write_bit(true);
        let rbsp = writer.finish();

        let mut nal = vec![0x67];
        nal.extend_from_slice(&escape_rbsp(&rbsp));
        assert_ne!(nal.len(), rbsp.len() + 1);

        let sps = Sps::parse_nal(&nal).unwrap();
        assert_eq!(sps.profile_idc, 77);
        assert_eq!(sps.width(), 320);
        assert_eq!(sps.height(), 240);
    }

    #[test]
    fn test_truncated_sps_fails() {
        assert!(Sps::parse(&[0x42, 0x00]).is_err());
        assert_eq!(
            Sps::parse(&[0x42, 0x00, 0x1E]).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn test_oversized_crop_is_rejected() {
        let mut writer = ExpGolombWriter::new();
        writer.write_bits(66, 8);
        writer.write_bits(0, 8);
        writer.write_bits(30, 8);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(2);
        writer.write_unsigned_exp_golomb(0);
        writer.write_bit(false);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(0);
        writer.write_bit(true);
        writer.write_bit(true);
        writer.write_bit(true);
        writer.write_unsigned_exp_golomb(20);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(0);
        writer.write_bit(true);

        let err = Sps::parse(&writer.finish()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_out_of_range_scaling_delta_is_rejected() {
        let mut writer = ExpGolombWriter::new();
        writer.write_bits(100, 8);
        writer.write_bits(0, 8);
        writer.write_bits(40, 8);
        writer.write_unsigned_exp_golomb(0);
        // chroma_format_idc, bit depths, transform bypass
        writer.write_unsigned_exp_golomb(1);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(0);
        writer.write_bit(false);
        // scaling matrix present, list 0 present
        writer.write_bit(true);
        writer.write_bit(true);
        writer.write_exp_golomb(i32::MAX);
        writer.write_bits(0, 32);
        let rbsp = writer.finish();

        let mut nal = vec![0x67];
        nal.extend_from_slice(&escape_rbsp(&rbsp));
        let err = Sps::parse_nal(&nal).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let mut writer = ExpGolombWriter::new();
        writer.write_bits(100, 8);
        writer.write_bits(0, 8);
        writer.write_bits(40, 8);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(1);
        writer.write_unsigned_exp_golomb(0);
        writer.write_unsigned_exp_golomb(0);
        writer.write_bit(false);
        writer.write_bit(true);
        writer.write_bit(true);
        writer.write_exp_golomb(-129);
        writer.write_bits(0, 32);
        let err = Sps::parse(&writer.finish()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
