//! Call repository implementation
//!
//! PostgreSQL-backed append-only storage for parsed PABX records and the
//! ordered, name-enriched read used by the call listing.
//! Uses runtime queries (not compile-time macros) to avoid requiring
//! database connection at build time.

use async_trait::async_trait;
use pbxlog_core::{
    models::{Cdr, StoredCall},
    traits::{CallQuery, CallStore, PageWindow},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use tracing::{debug, error, instrument, warn};

/// PostgreSQL implementation of `CallStore` and `CallQuery`
#[derive(Clone)]
pub struct PgCallRepository {
    pool: PgPool,
    lookup_table: bool,
}

impl PgCallRepository {
    /// Create a new call repository
    ///
    /// With `lookup_table` off, directory names are always empty and the
    /// directory table is never touched.
    pub fn new(pool: PgPool, lookup_table: bool) -> Self {
        Self { pool, lookup_table }
    }
}

const INSERT_CALL: &str = r#"
    INSERT INTO calls (
        callid, extension, auth, calltime,
        duration, code, dialed, account,
        cost, clid, clidname, gpno, ringtime
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
"#;

const SELECT_CALLS_WITH_NAMES: &str = r#"
    SELECT
        c.callid, c.extension, COALESCE(ext.name, '') AS extension_name,
        c.auth, COALESCE(au.name, '') AS auth_name,
        c.calltime, c.duration, c.code, c.dialed, c.account,
        c.cost, c.clid, c.clidname, c.gpno, c.ringtime
    FROM calls c
    LEFT JOIN directory ext ON ext.code = c.extension::text
    LEFT JOIN directory au ON au.code = c.auth
    ORDER BY c.calltime DESC, c.callid DESC
    LIMIT $1 OFFSET $2
"#;

const SELECT_CALLS: &str = r#"
    SELECT
        c.callid, c.extension, '' AS extension_name,
        c.auth, '' AS auth_name,
        c.calltime, c.duration, c.code, c.dialed, c.account,
        c.cost, c.clid, c.clidname, c.gpno, c.ringtime
    FROM calls c
    ORDER BY c.calltime DESC, c.callid DESC
    LIMIT $1 OFFSET $2
"#;

/// Convert the PABX cost text into a NUMERIC bind value.
///
/// Empty or non-numeric text is stored as NULL.
pub fn cost_to_decimal(cost: &str) -> Option<Decimal> {
    if cost.is_empty() {
        return None;
    }
    Decimal::from_str(cost).ok()
}

/// The cost text a record carried that cannot be stored as NUMERIC
pub fn unparsed_cost(cdr: &Cdr) -> Option<&str> {
    if !cdr.cost.is_empty() && cost_to_decimal(&cdr.cost).is_none() {
        Some(cdr.cost.as_str())
    } else {
        None
    }
}

#[async_trait]
impl CallStore for PgCallRepository {
    #[instrument(skip(self, cdr), fields(call_id = cdr.call_id))]
    async fn append(&self, cdr: &Cdr) -> AppResult<()> {
        debug!("Appending call record");

        let cost = cost_to_decimal(&cdr.cost);
        if let Some(text) = unparsed_cost(cdr) {
            warn!(
                call_id = cdr.call_id,
                format = %cdr.format,
                "Non-numeric cost {:?} stored as NULL",
                text
            );
        }

        sqlx::query(INSERT_CALL)
            .bind(cdr.call_id)
            .bind(cdr.extension)
            .bind(&cdr.auth)
            .bind(&cdr.call_time)
            .bind(&cdr.duration)
            .bind(&cdr.type_code)
            .bind(&cdr.dialed)
            .bind(&cdr.account)
            .bind(cost)
            .bind(&cdr.clid)
            .bind(&cdr.clid_name)
            .bind(&cdr.pilot_number)
            .bind(&cdr.ring_time)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error appending call {}: {}", cdr.call_id, e);
                AppError::Database(format!("Failed to insert call: {}", e))
            })?;

        Ok(())
    }
}

#[async_trait]
impl CallQuery for PgCallRepository {
    #[instrument(skip(self))]
    async fn fetch_calls(&self, window: PageWindow) -> AppResult<Vec<StoredCall>> {
        debug!(
            "Fetching calls with limit {} offset {}",
            window.limit, window.offset
        );

        let query = if self.lookup_table {
            SELECT_CALLS_WITH_NAMES
        } else {
            SELECT_CALLS
        };

        let rows = sqlx::query_as::<sqlx::Postgres, CallRow>(query)
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching calls: {}", e);
                AppError::Database(format!("Failed to fetch calls: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows to the read model.
///
/// Every column is nullable since the table carries no constraints.
#[derive(Debug, sqlx::FromRow)]
struct CallRow {
    callid: Option<i64>,
    extension: Option<i64>,
    extension_name: Option<String>,
    auth: Option<String>,
    auth_name: Option<String>,
    calltime: Option<String>,
    duration: Option<String>,
    code: Option<String>,
    dialed: Option<String>,
    account: Option<String>,
    cost: Option<Decimal>,
    clid: Option<String>,
    clidname: Option<String>,
    gpno: Option<String>,
    ringtime: Option<String>,
}

impl From<CallRow> for StoredCall {
    fn from(row: CallRow) -> Self {
        Self {
            call_id: row.callid.unwrap_or_default(),
            extension: row.extension.unwrap_or_default(),
            extension_name: row.extension_name.unwrap_or_default(),
            auth: row.auth.unwrap_or_default(),
            auth_name: row.auth_name.unwrap_or_default(),
            call_time: row.calltime.unwrap_or_default(),
            duration: row.duration.unwrap_or_default(),
            type_code: row.code.unwrap_or_default(),
            dialed: row.dialed.unwrap_or_default(),
            account: row.account.unwrap_or_default(),
            cost: row.cost.map(|c| c.to_string()).unwrap_or_default(),
            clid: row.clid.unwrap_or_default(),
            clid_name: row.clidname.unwrap_or_default(),
            pilot_number: row.gpno.unwrap_or_default(),
            ring_time: row.ringtime.unwrap_or_default(),
        }
    }
}
