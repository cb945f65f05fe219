//! PABX call record ingestion for pbxlog
//!
//! This crate turns the byte stream a PABX writes to its CDR port into stored
//! call records.
//!
//! # Features
//!
//! - NUL delimited framing over any `AsyncRead` with a record size limit
//! - Banner (report header) detection and removal
//! - Fixed-offset field extraction for the long and short report formats
//! - Raw mirror and error dump side files
//! - Sequential persistence with bounded retry and exponential backoff
//!
//! # Architecture
//!
//! ```text
//!        PABX (TCP)
//!            |
//!            v
//!   RecordCodec (framing) ----> RawMirror
//!            |
//!            v
//!   skip_header (banner)
//!            |
//!            v
//!   parse_record (layout) ----> ErrorSink (invalid length)
//!            |
//!            v
//!   CallStore::append (retry)
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use pbxlog_ingest::{connect, ErrorSink, Ingestor, RawMirror};
//!
//! let stream = connect("10.0.0.5:1752").await?;
//! let mut ingestor = Ingestor::new(store, RawMirror::disabled(), ErrorSink::disabled(), retry, 65_536);
//! let stats = ingestor.run(stream).await?;
//! ```

pub mod codec;
pub mod header;
pub mod layout;
pub mod parser;
pub mod pipeline;
pub mod sink;

pub use codec::{FrameError, RecordCodec};
pub use header::{has_banner, skip_header};
pub use layout::{Field, RecordBuilder, RecordLayout};
pub use parser::{parse_record, InvalidRecord};
pub use pipeline::{connect, IngestStats, Ingestor, RecordOutcome};
pub use sink::{ErrorSink, RawMirror};

/// Wire protocol constants
pub mod constants {
    /// Record terminator
    pub const RECORD_DELIMITER: u8 = 0x00;

    /// First byte of a record that carries a report banner
    pub const FORM_FEED: u8 = 0x0C;

    /// Marker closing the banner; the last occurrence counts
    pub const BANNER_TAG: &[u8] = b"====";

    /// Separator bytes between the banner tag and the record data
    pub const BANNER_TRAILER_LEN: usize = 2;

    /// Default upper bound for a single framed record
    pub const DEFAULT_MAX_RECORD_BYTES: usize = 64 * 1024;

    /// Log ingestion counters every this many records
    pub const STATS_LOG_INTERVAL: u64 = 1_000;
}
