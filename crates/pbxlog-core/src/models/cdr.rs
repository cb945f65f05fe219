//! CDR (Call Detail Record) model
//!
//! Represents one call record as reported by the PABX serial/TCP interface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Report mode of a PABX record, identified by its total byte length.
///
/// The exchange firmware emits two report layouts: the long one carries a
/// caller-ID appendix (name, pilot number, ring time), the short one ends
/// after the caller-ID number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// 154 bytes, all fields populated
    Long,
    /// 122 bytes, no caller-ID appendix
    Short,
}

impl RecordFormat {
    /// Total byte length of a long record
    pub const LONG_LEN: usize = 154;

    /// Total byte length of a short record
    pub const SHORT_LEN: usize = 122;

    /// Select the format for a record of `len` bytes.
    ///
    /// Returns `None` for any length other than the two recognized ones.
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            Self::LONG_LEN => Some(Self::Long),
            Self::SHORT_LEN => Some(Self::Short),
            _ => None,
        }
    }

    /// Total byte length of this format
    #[inline]
    pub fn byte_len(self) -> usize {
        match self {
            Self::Long => Self::LONG_LEN,
            Self::Short => Self::SHORT_LEN,
        }
    }

    /// Whether records of this format carry the caller-ID appendix
    #[inline]
    pub fn has_caller_id_appendix(self) -> bool {
        matches!(self, Self::Long)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CDR (Call Detail Record)
///
/// Built once per valid record and handed straight to the call store.
/// Every text field is already trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cdr {
    /// Call identifier from the PABX (repeats across legs)
    pub call_id: i64,

    /// Internal line that placed or received the call
    pub extension: i64,

    /// Dialing authorization / account token
    pub auth: String,

    /// `<year>-<month>-<day time>`, year taken from the wall clock
    pub call_time: String,

    /// Duration as formatted by the PABX
    pub duration: String,

    /// Two character call classification
    pub type_code: String,

    /// Dialed number
    pub dialed: String,

    /// Account code
    pub account: String,

    /// Decimal cost, kept as the PABX printed it
    pub cost: String,

    /// Caller ID number
    pub clid: String,

    /// Caller ID name (empty for short records)
    pub clid_name: String,

    /// Pilot / hunt group number (empty for short records)
    pub pilot_number: String,

    /// Ring time (empty for short records)
    pub ring_time: String,

    /// Report layout the record was parsed from
    pub format: RecordFormat,
}

impl Cdr {
    /// Check if this record came with the caller-ID appendix
    #[inline]
    pub fn has_caller_id_appendix(&self) -> bool {
        self.format.has_caller_id_appendix()
    }

    /// Check if the call is associated with a hunt group
    #[inline]
    pub fn has_pilot_number(&self) -> bool {
        !self.pilot_number.is_empty()
    }
}

impl Default for Cdr {
    fn default() -> Self {
        Self {
            call_id: 0,
            extension: 0,
            auth: String::new(),
            call_time: String::new(),
            duration: String::new(),
            type_code: String::new(),
            dialed: String::new(),
            account: String::new(),
            cost: String::new(),
            clid: String::new(),
            clid_name: String::new(),
            pilot_number: String::new(),
            ring_time: String::new(),
            format: RecordFormat::Short,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_len() {
        assert_eq!(RecordFormat::from_len(154), Some(RecordFormat::Long));
        assert_eq!(RecordFormat::from_len(122), Some(RecordFormat::Short));
        assert_eq!(RecordFormat::from_len(0), None);
        assert_eq!(RecordFormat::from_len(153), None);
        assert_eq!(RecordFormat::from_len(155), None);
        assert_eq!(RecordFormat::from_len(123), None);
    }

    #[test]
    fn test_format_len_matches_from_len() {
        for format in [RecordFormat::Long, RecordFormat::Short] {
            assert_eq!(RecordFormat::from_len(format.byte_len()), Some(format));
        }
    }

    #[test]
    fn test_caller_id_appendix() {
        assert!(RecordFormat::Long.has_caller_id_appendix());
        assert!(!RecordFormat::Short.has_caller_id_appendix());

        let cdr = Cdr {
            format: RecordFormat::Long,
            pilot_number: "600".to_string(),
            ..Default::default()
        };
        assert!(cdr.has_caller_id_appendix());
        assert!(cdr.has_pilot_number());
    }

    #[test]
    fn test_format_serialization() {
        let json = serde_json::to_string(&RecordFormat::Long).unwrap();
        assert_eq!(json, "\"long\"");
        assert_eq!(RecordFormat::Short.to_string(), "short");
    }
}
