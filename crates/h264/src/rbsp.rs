/// Strips the NAL header byte and removes emulation prevention bytes.
///
/// Every `0x03` that follows two zero bytes is dropped, which yields the raw
/// byte sequence payload the SPS syntax is defined over.
pub fn nal_to_rbsp(nal: &[u8]) -> Vec<u8> {
    let payload = nal.get(1..).unwrap_or_default();
    let mut rbsp = Vec::with_capacity(payload.len());
    let mut zero_count = 0;

    for &byte in payload {
        if zero_count >= 2 && byte == 0x03 {
            zero_count = 0;
            continue;
        }

        rbsp.push(byte);
        if byte == 0x00 {
            zero_count += 1;
        } else {
            zero_count = 0;
        }
    }

    rbsp
}

/// Inserts emulation prevention bytes so the payload contains no start code.
pub fn escape_rbsp(rbsp: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(rbsp.len() + rbsp.len() / 64);
    let mut zero_count = 0;

    for &byte in rbsp {
        if zero_count >= 2 && byte <= 0x03 {
            escaped.push(0x03);
            zero_count = 0;
        }

        escaped.push(byte);
        if byte == 0x00 {
            zero_count += 1;
        } else {
            zero_count = 0;
        }
    }

    escaped
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_nal_to_rbsp() {
        let nal = [0x67, 0x64, 0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03];
        assert_eq!(
            nal_to_rbsp(&nal),
            vec![0x64, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_lone_three_is_kept() {
        let nal = [0x67, 0x00, 0x03, 0x00, 0x03];
        assert_eq!(nal_to_rbsp(&nal), vec![0x00, 0x03, 0x00, 0x03]);
        assert!(nal_to_rbsp(&[]).is_empty());
    }

    #[test]
    fn test_escape_then_strip() {
        let rbsp = [0x4D, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0xFF, 0x00, 0x00];
        let escaped = escape_rbsp(&rbsp);
        assert_eq!(
            escaped,
            vec![0x4D, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0x02, 0xFF, 0x00, 0x00]
        );

        let mut nal = vec![0x67];
        nal.extend_from_slice(&escaped);
        assert_eq!(nal_to_rbsp(&nal), rbsp);
    }
}
