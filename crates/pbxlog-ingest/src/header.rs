//! Report banner removal
//!
//! Every now and then the PABX prefixes a record with a human readable report
//! header. Such a record starts with a form feed and the header ends with a
//! `====` rule; the data follows two bytes after the last rule.

use crate::constants::{BANNER_TAG, BANNER_TRAILER_LEN, FORM_FEED};

/// Strip a leading report banner from `record`.
///
/// Returns the record unchanged when it does not start with a form feed or
/// carries no banner tag. If the cut point lies past the end, the result is
/// empty.
pub fn skip_header(record: &[u8]) -> &[u8] {
    if record.first() != Some(&FORM_FEED) {
        return record;
    }

    match rfind(record, BANNER_TAG) {
        Some(pos) => {
            let cut = pos + BANNER_TAG.len() + BANNER_TRAILER_LEN;
            record.get(cut..).unwrap_or(&[])
        }
        None => record,
    }
}

/// Check whether `skip_header` would strip anything
pub fn has_banner(record: &[u8]) -> bool {
    record.first() == Some(&FORM_FEED) && rfind(record, BANNER_TAG).is_some()
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BANNER: &[u8] =
        b"\x0c\r\n   STATION MESSAGE DETAIL RECORDING   PAGE 12\r\n==========================================\r\n";

    #[test]
    fn test_plain_record_unchanged() {
        let record = b"  001234 214    7781     03 14 09:12";
        assert_eq!(skip_header(record), &record[..]);
        assert!(!has_banner(record));
    }

    #[test]
    fn test_banner_stripped_after_last_tag() {
        let mut record = BANNER.to_vec();
        record.extend_from_slice(b"DATA");

        assert!(has_banner(&record));
        assert_eq!(skip_header(&record), b"DATA");
    }

    #[test]
    fn test_last_tag_wins() {
        let record = b"\x0c==== first ====  rest";
        assert_eq!(skip_header(record), b"rest");
    }

    #[test]
    fn test_tag_inside_data_moves_cut() {
        let mut record = BANNER.to_vec();
        record.extend_from_slice(b"AB====  CD");
        assert_eq!(skip_header(&record), b"CD");
    }

    #[test]
    fn test_form_feed_without_tag_unchanged() {
        let record = b"\x0cno rule here";
        assert_eq!(skip_header(record), &record[..]);
        assert!(!has_banner(record));
    }

    #[test]
    fn test_tag_without_form_feed_unchanged() {
        let record = b"header ====  data";
        assert_eq!(skip_header(record), &record[..]);
    }

    #[test]
    fn test_cut_past_end_yields_empty() {
        assert_eq!(skip_header(b"\x0c===="), b"");
        assert_eq!(skip_header(b"\x0c====\r"), b"");
        assert_eq!(skip_header(b"\x0c====\r\n"), b"");
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(skip_header(b""), b"");
    }

    proptest! {
        #[test]
        fn prop_stripping_is_idempotent(
            body in proptest::collection::vec(0x20u8..0x7f, 0..200),
        ) {
            // A tag inside the data moves the cut; covered separately
            prop_assume!(rfind(&body, BANNER_TAG).is_none());

            let mut record = BANNER.to_vec();
            record.extend_from_slice(&body);

            let once = skip_header(&record);
            prop_assert_eq!(once, &body[..]);
            prop_assert_eq!(skip_header(once), once);
        }

        #[test]
        fn prop_records_without_form_feed_pass_through(
            record in proptest::collection::vec(any::<u8>(), 0..300),
        ) {
            prop_assume!(record.first() != Some(&FORM_FEED));
            prop_assert_eq!(skip_header(&record), &record[..]);
        }
    }
}
