//! PABX record parsing
//!
//! Turns one framed, banner-free record into a [`Cdr`]. Only the two known
//! record lengths are accepted; anything else is reported as invalid without
//! looking at its contents.

use crate::layout::{Field, RecordLayout};
use chrono::{Datelike, Local};
use pbxlog_core::models::Cdr;
use std::fmt;
use tracing::{debug, warn};

/// A record whose length matches no known report format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRecord {
    /// Observed byte length
    pub len: usize,
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized record length {}", self.len)
    }
}

impl std::error::Error for InvalidRecord {}

/// Current wall-clock year; records do not carry one
pub fn current_year() -> i32 {
    Local::now().year()
}

/// Parse a record, stamping its call time with `year`.
///
/// Total for records of a recognized length: malformed integer columns become
/// zero instead of rejecting the record.
pub fn parse_record(record: &[u8], year: i32) -> Result<Cdr, InvalidRecord> {
    let layout = RecordLayout::for_record(record).ok_or(InvalidRecord { len: record.len() })?;
    let text = |field: Field| layout.text(record, field);

    let call_time = format!("{}-{}-{}", year, text(Field::Month), text(Field::DayTime));

    Ok(Cdr {
        call_id: parse_int(Field::CallId, &text(Field::CallId)),
        extension: parse_int(Field::Extension, &text(Field::Extension)),
        auth: text(Field::Auth),
        call_time,
        duration: text(Field::Duration),
        type_code: text(Field::TypeCode),
        dialed: text(Field::Dialed),
        account: text(Field::Account),
        cost: text(Field::Cost),
        clid: text(Field::Clid),
        clid_name: text(Field::ClidName),
        pilot_number: text(Field::PilotNumber),
        ring_time: text(Field::RingTime),
        format: layout.format(),
    })
}

fn parse_int(field: Field, value: &str) -> i64 {
    match value.parse() {
        Ok(n) => n,
        Err(_) if value.is_empty() => {
            debug!(?field, "Empty integer column, using 0");
            0
        }
        Err(_) => {
            warn!(?field, value, "Unparseable integer column, using 0");
            0
        }
    }
}
