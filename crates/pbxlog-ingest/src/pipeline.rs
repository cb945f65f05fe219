//! Ingestion pipeline
//!
//! Drives one PABX connection from the first byte to the end of the stream:
//! frame, mirror, strip banner, parse, then persist or dump. Records are
//! handled strictly one at a time so storage order equals arrival order.

use crate::codec::RecordCodec;
use crate::constants::STATS_LOG_INTERVAL;
use crate::header::{has_banner, skip_header};
use crate::parser::{current_year, parse_record};
use crate::sink::{ErrorSink, RawMirror};
use futures::StreamExt;
use pbxlog_core::config::RetryConfig;
use pbxlog_core::models::Cdr;
use pbxlog_core::traits::CallStore;
use pbxlog_core::{AppError, AppResult};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, instrument, warn};

/// Open the TCP connection to the PABX CDR port
pub async fn connect(address: &str) -> AppResult<TcpStream> {
    info!("Connecting to PABX: {}", address);

    let stream = TcpStream::connect(address)
        .await
        .map_err(|e| AppError::PabxConnection(format!("{}: {}", address, e)))?;

    info!("✅ Connected to PABX: {}", address);
    Ok(stream)
}

/// Running counters for one ingestion session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Framed records, including invalid ones
    pub records: u64,
    pub stored: u64,
    pub invalid: u64,
    /// Records that arrived with a report banner
    pub banners: u64,
}

/// What happened to one framed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Stored(Box<Cdr>),
    Invalid { len: usize },
}

pub struct Ingestor {
    store: Arc<dyn CallStore>,
    mirror: RawMirror,
    errors: ErrorSink,
    retry: RetryConfig,
    max_record_bytes: usize,
    year: fn() -> i32,
    stats: IngestStats,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn CallStore>,
        mirror: RawMirror,
        errors: ErrorSink,
        retry: RetryConfig,
        max_record_bytes: usize,
    ) -> Self {
        Self {
            store,
            mirror,
            errors,
            retry,
            max_record_bytes,
            year: current_year,
            stats: IngestStats::default(),
        }
    }

    /// Replace the clock used to stamp call times
    pub fn with_year_source(mut self, year: fn() -> i32) -> Self {
        self.year = year;
        self
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Consume `reader` until it ends or fails.
    ///
    /// Returns the session counters on a clean end of stream. Framing errors,
    /// read errors and exhausted persistence retries end the run with an
    /// error.
    pub async fn run<R>(&mut self, reader: R) -> AppResult<IngestStats>
    where
        R: AsyncRead + Unpin,
    {
        let mut frames = FramedRead::new(reader, RecordCodec::with_max_length(self.max_record_bytes));

        while let Some(frame) = frames.next().await {
            let record = match frame {
                Ok(record) => record,
                Err(e) => {
                    error!("Ingestion stopped after {} records: {}", self.stats.records, e);
                    return Err(e.into());
                }
            };
            self.process_record(&record).await?;
        }

        info!(
            records = self.stats.records,
            stored = self.stats.stored,
            invalid = self.stats.invalid,
            "PABX stream ended"
        );
        Ok(self.stats)
    }

    /// Handle one framed record (delimiter already removed)
    #[instrument(skip(self, record), fields(len = record.len()))]
    pub async fn process_record(&mut self, record: &[u8]) -> AppResult<RecordOutcome> {
        self.stats.records += 1;
        self.mirror.write_record(record).await;

        if has_banner(record) {
            self.stats.banners += 1;
            debug!("Stripping report banner");
        }
        let data = skip_header(record);

        let outcome = match parse_record(data, (self.year)()) {
            Ok(cdr) => {
                self.store_with_retry(&cdr).await?;
                self.stats.stored += 1;
                debug!(call_id = cdr.call_id, format = %cdr.format, "Stored call record");
                RecordOutcome::Stored(Box::new(cdr))
            }
            Err(invalid) => {
                self.stats.invalid += 1;
                warn!("Invalid record: {}", invalid);
                self.errors.record(record, invalid.len).await;
                RecordOutcome::Invalid { len: invalid.len }
            }
        };

        if self.stats.records % STATS_LOG_INTERVAL == 0 {
            info!(
                records = self.stats.records,
                stored = self.stats.stored,
                invalid = self.stats.invalid,
                banners = self.stats.banners,
                "📊 Ingestion progress"
            );
        }

        Ok(outcome)
    }

    async fn store_with_retry(&self, cdr: &Cdr) -> AppResult<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.append(cdr).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.retry.max_attempts => {
                    error!(
                        call_id = cdr.call_id,
                        attempts = attempt,
                        "Giving up on call record: {}",
                        e
                    );
                    return Err(AppError::PersistenceExhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        call_id = cdr.call_id,
                        attempt,
                        "Failed to store call record, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
