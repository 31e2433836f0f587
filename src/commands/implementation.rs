use log::debug;

use super::{Dtc, Pid};

/// Mode 03 reply header
const DTC_HEADER: &str = "43";

/// Group the adapter pads a Mode 03 reply with after the last code
const DTC_PADDING: &str = "0000";

pub(super) fn decode_pid(pid: Pid, raw: &str) -> Option<i32> {
    let data = raw.strip_prefix(pid.response_prefix())?;
    let bytes = hex_bytes(data, pid.data_len())?;
    Some(pid.apply(&bytes))
}

/// Parse the first `count` bytes of a hex string
fn hex_bytes(data: &str, count: usize) -> Option<Vec<u8>> {
    (0..count)
        .map(|i| {
            data.get(i * 2..i * 2 + 2)
                .filter(|s| is_hex(s))
                .and_then(|s| u8::from_str_radix(s, 16).ok())
        })
        .collect()
}

/// `from_str_radix` alone lets a leading `+` through
fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Decode a cleaned Mode 03 reply into trouble codes
///
/// After the `43` header the reply is read in groups of four hex digits, one code each. A
/// trailing partial group is dropped, as are `0000` padding groups and groups that are not hex.
/// Codes keep reply order and duplicates are kept.
pub fn decode_dtcs(raw: &str) -> Vec<Dtc> {
    let Some(data) = raw.strip_prefix(DTC_HEADER) else {
        debug!("decode_dtcs: reply {:?} has no {} header", raw, DTC_HEADER);
        return Vec::new();
    };

    data.as_bytes()
        .chunks_exact(4)
        .filter_map(|group| std::str::from_utf8(group).ok())
        .filter(|group| *group != DTC_PADDING && is_hex(group))
        .filter_map(|group| u16::from_str_radix(group, 16).ok())
        .map(Dtc::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codes(raw: &str) -> Vec<String> {
        decode_dtcs(raw).iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn two_codes_in_order() {
        assert_eq!(codes("4301330171"), vec!["P0133", "P0171"]);
    }

    #[test]
    fn padding_is_skipped() {
        assert_eq!(codes("43013300000171"), vec!["P0133", "P0171"]);
        assert_eq!(codes("43000000000000"), Vec::<String>::new());
        assert_eq!(codes("43"), Vec::<String>::new());
    }

    #[test]
    fn partial_group_is_dropped() {
        assert_eq!(codes("43013301"), vec!["P0133"]);
    }

    #[test]
    fn duplicates_are_kept() {
        assert_eq!(codes("4301330133"), vec!["P0133", "P0133"]);
    }

    #[test]
    fn categories_from_top_bits() {
        assert_eq!(codes("434123"), vec!["C0123"]);
        assert_eq!(codes("438123"), vec!["B0123"]);
        assert_eq!(codes("43C123"), vec!["U0123"]);
        assert_eq!(codes("43F1AB"), vec!["U31AB"]);
        assert_eq!(codes("431234"), vec!["P1234"]);
    }

    #[test]
    fn signed_groups_are_skipped() {
        assert_eq!(codes("43+1230171"), vec!["P0171"]);
    }

    #[test]
    fn missing_header_gives_no_codes() {
        assert!(decode_dtcs("NODATA").is_empty());
        assert!(decode_dtcs("0133").is_empty());
    }

    #[test]
    fn hex_bytes_requires_full_length() {
        assert_eq!(hex_bytes("1AF8", 2), Some(vec![0x1a, 0xf8]));
        assert_eq!(hex_bytes("1AF", 2), None);
        assert_eq!(hex_bytes("G0", 1), None);
        assert_eq!(hex_bytes("+5", 1), None);
    }

    proptest! {
        #[test]
        fn code_layout_matches_bits(b1 in any::<u8>(), b2 in any::<u8>()) {
            prop_assume!(b1 != 0 || b2 != 0);
            let code = decode_dtcs(&format!("43{:02X}{:02X}", b1, b2))[0].to_string();

            let letter = ['P', 'C', 'B', 'U'][usize::from(b1 >> 6)];
            let expected = format!("{}{:X}{:X}{:02X}", letter, (b1 >> 4) & 0x3, b1 & 0xf, b2);
            prop_assert_eq!(code.len(), 5);
            prop_assert_eq!(code, expected);
        }
    }
}
