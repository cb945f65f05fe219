//! Stream framing
//!
//! Splits the PABX byte stream into records on a single NUL byte. The
//! delimiter is consumed and never part of the record.

use crate::constants::{DEFAULT_MAX_RECORD_BYTES, RECORD_DELIMITER};
use bytes::{Bytes, BytesMut};
use pbxlog_core::AppError;
use std::{cmp, io};
use thiserror::Error;
use tokio_util::codec::Decoder;

/// Errors that end framing. None of them are recoverable: the framer does
/// not resynchronise.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("record exceeds {limit} bytes without a delimiter")]
    RecordTooLong { limit: usize },

    #[error("stream ended inside a record ({len} bytes without a delimiter)")]
    Unterminated { len: usize },

    #[error("socket read failed: {0}")]
    Io(#[from] io::Error),
}

impl From<FrameError> for AppError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(e) => AppError::PabxConnection(e.to_string()),
            other => AppError::Framing(other.to_string()),
        }
    }
}

/// NUL delimited record decoder
#[derive(Debug, Clone)]
pub struct RecordCodec {
    /// Where the delimiter search resumes in the buffered bytes
    next_index: usize,
    max_length: usize,
}

impl RecordCodec {
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_RECORD_BYTES)
    }

    /// Records longer than `max_length` bytes are a fatal framing error
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RecordCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        // A record of exactly max_length bytes still needs room for its delimiter
        let read_to = cmp::min(self.max_length.saturating_add(1), buf.len());
        // The buffer may have been replaced since the last call
        let start = cmp::min(self.next_index, read_to);

        let found = buf[start..read_to]
            .iter()
            .position(|b| *b == RECORD_DELIMITER);

        match found {
            Some(offset) => {
                let end = start + offset;
                self.next_index = 0;
                let mut record = buf.split_to(end + 1);
                record.truncate(end);
                Ok(Some(record.freeze()))
            }
            None if buf.len() > self.max_length => {
                self.next_index = 0;
                Err(FrameError::RecordTooLong {
                    limit: self.max_length,
                })
            }
            None => {
                self.next_index = read_to;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        match self.decode(buf)? {
            Some(record) => Ok(Some(record)),
            None => {
                self.next_index = 0;
                if buf.is_empty() {
                    Ok(None)
                } else {
                    Err(FrameError::Unterminated { len: buf.len() })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    #[test]
    fn test_splits_on_nul_and_drops_delimiter() {
        let mut codec = RecordCodec::new();
        let mut buf = BytesMut::from(&b"first\0second\0tail"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"first"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"second"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"tail");
    }

    #[test]
    fn test_empty_record_between_delimiters() {
        let mut codec = RecordCodec::new();
        let mut buf = BytesMut::from(&b"\0\0"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().len(), 0);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().len(), 0);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_record_split_across_reads() {
        let mut codec = RecordCodec::new();
        let mut buf = BytesMut::from(&b"abc"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"def\0");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"abcdef"[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_max_length_boundary() {
        let mut codec = RecordCodec::with_max_length(4);
        let mut buf = BytesMut::from(&b"abcd\0"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"abcd"[..]);

        let mut buf = BytesMut::from(&b"abcde"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::RecordTooLong { limit: 4 })
        ));
    }

    #[test]
    fn test_eof_inside_record_is_an_error() {
        let mut codec = RecordCodec::new();
        let mut buf = BytesMut::from(&b"partial"[..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(FrameError::Unterminated { len: 7 })
        ));

        let mut buf = BytesMut::new();
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_codec_reusable_after_errors() {
        let mut codec = RecordCodec::with_max_length(4);

        let mut buf = BytesMut::from(&b"abcdefgh"[..]);
        assert!(codec.decode(&mut buf).is_err());
        let mut buf = BytesMut::from(&b"ok\0"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"ok"[..]);

        let mut buf = BytesMut::from(&b"abc"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(codec.decode_eof(&mut buf).is_err());
        let mut buf = BytesMut::from(&b"ok\0"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"ok"[..]);
    }

    #[test]
    fn test_partial_buffer_replaced() {
        let mut codec = RecordCodec::new();
        let mut buf = BytesMut::from(&b"partial"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        let mut fresh = BytesMut::from(&b"ok\0"[..]);
        assert_eq!(codec.decode(&mut fresh).unwrap().unwrap(), &b"ok"[..]);
    }

    #[test]
    fn test_frame_error_mapping() {
        let err: AppError = FrameError::RecordTooLong { limit: 10 }.into();
        assert!(matches!(err, AppError::Framing(_)));

        let io = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let err: AppError = FrameError::from(io).into();
        assert!(matches!(err, AppError::PabxConnection(_)));
    }

    #[tokio::test]
    async fn test_framed_read_over_stream() {
        let data: &[u8] = b"one\0two\0three\0";
        let mut frames = FramedRead::new(data, RecordCodec::new());

        let mut records = Vec::new();
        while let Some(frame) = frames.next().await {
            records.push(frame.unwrap());
        }
        assert_eq!(records, vec![&b"one"[..], &b"two"[..], &b"three"[..]]);
    }
}
