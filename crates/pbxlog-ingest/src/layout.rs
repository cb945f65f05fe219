//! Fixed-offset record layout
//!
//! The PABX prints every field at a fixed column. Both report formats share
//! the same columns up to the caller-ID number; the long format appends
//! caller-ID name, pilot number and ring time.

use pbxlog_core::models::RecordFormat;
use std::ops::Range;

/// A column of the PABX report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CallId,
    Extension,
    Auth,
    Month,
    DayTime,
    Duration,
    TypeCode,
    Dialed,
    Account,
    Cost,
    Clid,
    ClidName,
    PilotNumber,
    RingTime,
}

impl Field {
    /// Columns present in both formats
    pub const COMMON: [Field; 11] = [
        Field::CallId,
        Field::Extension,
        Field::Auth,
        Field::Month,
        Field::DayTime,
        Field::Duration,
        Field::TypeCode,
        Field::Dialed,
        Field::Account,
        Field::Cost,
        Field::Clid,
    ];

    /// Columns only the long format carries
    pub const CALLER_ID_APPENDIX: [Field; 3] =
        [Field::ClidName, Field::PilotNumber, Field::RingTime];

    /// Half-open byte range of this column
    pub const fn span(self) -> Range<usize> {
        match self {
            Field::CallId => 2..8,
            Field::Extension => 9..15,
            Field::Auth => 16..25,
            Field::Month => 26..28,
            Field::DayTime => 29..40,
            Field::Duration => 41..49,
            Field::TypeCode => 50..52,
            Field::Dialed => 53..71,
            Field::Account => 72..89,
            Field::Cost => 90..100,
            Field::Clid => 101..117,
            Field::ClidName => 118..136,
            Field::PilotNumber => 137..143,
            Field::RingTime => 143..151,
        }
    }

    pub const fn is_appendix(self) -> bool {
        matches!(self, Field::ClidName | Field::PilotNumber | Field::RingTime)
    }
}

/// Field table for one record format, selected by total record length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    format: RecordFormat,
}

impl RecordLayout {
    pub const fn new(format: RecordFormat) -> Self {
        Self { format }
    }

    /// Layout for a record of this exact length, if it is a recognized one
    pub fn for_record(record: &[u8]) -> Option<Self> {
        RecordFormat::from_len(record.len()).map(Self::new)
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Byte range of `field`, or `None` when this format lacks it
    pub fn span(&self, field: Field) -> Option<Range<usize>> {
        if field.is_appendix() && !self.format.has_caller_id_appendix() {
            return None;
        }
        Some(field.span())
    }

    /// Trimmed text of `field`; empty when the format lacks it.
    ///
    /// `record` must have this layout's length.
    pub fn text(&self, record: &[u8], field: Field) -> String {
        self.span(field)
            .and_then(|span| record.get(span))
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
            .unwrap_or_default()
    }
}

/// Writes field values into a blank record of a given format.
///
/// Values are left aligned and cut to the column width. Fields the format
/// lacks are ignored.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    layout: RecordLayout,
    bytes: Vec<u8>,
}

impl RecordBuilder {
    pub fn new(format: RecordFormat) -> Self {
        Self {
            layout: RecordLayout::new(format),
            bytes: vec![b' '; format.byte_len()],
        }
    }

    pub fn field(mut self, field: Field, value: &str) -> Self {
        if let Some(span) = self.layout.span(field) {
            let width = span.len();
            let value = value.as_bytes();
            let n = value.len().min(width);
            self.bytes[span.start..span.start + n].copy_from_slice(&value[..n]);
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}
