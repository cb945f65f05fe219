//! Domain models for pbxlog
//!
//! This module contains the records produced by the ingestion pipeline and
//! the rows returned by the read path.

pub mod call;
pub mod cdr;

pub use call::{CallPage, CallRow, StoredCall};
pub use cdr::{Cdr, RecordFormat};
