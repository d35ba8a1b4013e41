//! # Session Repository
//!
//! Cash register sessions: open, accumulate sales, close, and the daily
//! balance read.
//!
//! ## Single Open Session
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │           One open session per register, enforced by the DB            │
//! │                                                                         │
//! │  open("Caja 1") ──► INSERT ... status = 'open'                         │
//! │                          │                                              │
//! │        partial unique index (register_name) WHERE status = 'open'      │
//! │                          │                                              │
//! │        second concurrent open ──► UNIQUE violation ──► Conflict        │
//! │                                                                         │
//! │  No read-then-insert check: two racing opens cannot both succeed.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All reconciliation math (`expected`, `difference`, the daily
//! aggregate) lives in farmapos-core; this module only persists state.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use farmapos_core::session::DailyBalance;
use farmapos_core::types::{CashRegisterSession, TenderType};
use farmapos_core::validation;
use farmapos_core::CoreError;

use crate::error::{DbError, DbResult};

const SESSION_COLUMNS: &str = "id, register_name, opening_cents, closing_cents, \
     total_sales_cents, total_cash_cents, total_card_cents, total_other_cents, \
     status, opened_at, closed_at, notes, user_id, updated_at";

/// Repository for cash register sessions.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens a session for a register with the counted opening amount.
    ///
    /// ## Errors
    /// * `DbError::Core(Validation)` - empty register name or negative amount
    /// * [`DbError::Conflict`] - the register already has an open session;
    ///   the partial unique index fires, so two racing opens cannot both win
    pub async fn open(
        &self,
        register_name: &str,
        opening_cents: i64,
        user_id: Option<&str>,
    ) -> DbResult<CashRegisterSession> {
        validation::validate_register_name(register_name).map_err(CoreError::from)?;
        validation::validate_drawer_amount("opening_amount", opening_cents)
            .map_err(CoreError::from)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let inserted = sqlx::query(
            "INSERT INTO cash_register_sessions \
             (id, register_name, opening_cents, total_sales_cents, total_cash_cents, \
              total_card_cents, total_other_cents, status, opened_at, user_id, updated_at) \
             VALUES (?, ?, ?, 0, 0, 0, 0, 'open', ?, ?, ?)",
        )
        .bind(&id)
        .bind(register_name.trim())
        .bind(opening_cents)
        .bind(now)
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await;

        if let Err(err) = inserted {
            return match DbError::from(err) {
                DbError::UniqueViolation { .. } => Err(DbError::conflict(format!(
                    "a session is already open for register '{}'",
                    register_name.trim()
                ))),
                other => Err(other),
            };
        }

        info!(session_id = %id, register = %register_name, "Session opened");
        self.get(&id).await
    }

    /// Accumulates one completed sale into the open session's totals.
    ///
    /// `total_sales` always grows; the per-tender bucket decides whether
    /// the amount also lands in the drawer (`cash`) or not (`card`,
    /// `other`).
    ///
    /// ## Errors
    /// * `DbError::Core(SessionNotOpen)` - the session exists but is closed
    /// * [`DbError::NotFound`] - unknown session id
    pub async fn record_sale(
        &self,
        session_id: &str,
        tender: TenderType,
        amount_cents: i64,
    ) -> DbResult<CashRegisterSession> {
        validation::validate_sale_amount(amount_cents).map_err(CoreError::from)?;

        let tender_column = match tender {
            TenderType::Cash => "total_cash_cents",
            TenderType::Card => "total_card_cents",
            TenderType::Other => "total_other_cents",
        };

        // Column name comes from the match above, never from input.
        let sql = format!(
            "UPDATE cash_register_sessions \
             SET total_sales_cents = total_sales_cents + ?, \
                 {tender_column} = {tender_column} + ?, \
                 updated_at = ? \
             WHERE id = ? AND status = 'open'"
        );

        let result = sqlx::query(&sql)
            .bind(amount_cents)
            .bind(amount_cents)
            .bind(Utc::now())
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // Distinguish "closed" from "never existed"
            self.get(session_id).await?;
            return Err(CoreError::SessionNotOpen {
                session_id: session_id.to_string(),
            }
            .into());
        }

        debug!(session_id = %session_id, amount_cents, ?tender, "Sale accumulated");
        self.get(session_id).await
    }

    /// Closes the session with the counted drawer amount.
    ///
    /// Sets `closing`/`closed_at` exactly once; the reconciliation values
    /// (`expected`, `difference`) stay derived, never stored ahead of the
    /// stored fields they are computed from.
    ///
    /// ## Errors
    /// * `DbError::Core(SessionClosed)` - already closed, close is not
    ///   repeatable
    /// * [`DbError::NotFound`] - unknown session id
    pub async fn close(
        &self,
        session_id: &str,
        closing_cents: i64,
        notes: Option<&str>,
    ) -> DbResult<CashRegisterSession> {
        validation::validate_drawer_amount("closing_amount", closing_cents)
            .map_err(CoreError::from)?;
        if let Some(notes) = notes {
            validation::validate_notes(notes).map_err(CoreError::from)?;
        }

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE cash_register_sessions \
             SET closing_cents = ?, status = 'closed', closed_at = ?, \
                 notes = coalesce(?, notes), updated_at = ? \
             WHERE id = ? AND status = 'open'",
        )
        .bind(closing_cents)
        .bind(now)
        .bind(notes)
        .bind(now)
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            self.get(session_id).await?;
            return Err(CoreError::SessionClosed {
                session_id: session_id.to_string(),
            }
            .into());
        }

        let session = self.get(session_id).await?;
        info!(
            session_id = %session_id,
            difference_cents = session.difference().cents(),
            "Session closed"
        );
        Ok(session)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a session by id.
    pub async fn get(&self, session_id: &str) -> DbResult<CashRegisterSession> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM cash_register_sessions WHERE id = ?");
        let session = sqlx::query_as::<_, CashRegisterSession>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Session", session_id))?;

        Ok(session)
    }

    /// Fetches the open session for a register, if any.
    pub async fn get_open(&self, register_name: &str) -> DbResult<Option<CashRegisterSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_register_sessions \
             WHERE register_name = ? AND status = 'open'"
        );
        let session = sqlx::query_as::<_, CashRegisterSession>(&sql)
            .bind(register_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Lists sessions newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<CashRegisterSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_register_sessions \
             ORDER BY opened_at DESC LIMIT ?"
        );
        let sessions = sqlx::query_as::<_, CashRegisterSession>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    /// Sessions OPENED within the given calendar day (UTC), both bounds
    /// inclusive. Open and closed sessions alike.
    pub async fn sessions_for_day(&self, date: NaiveDate) -> DbResult<Vec<CashRegisterSession>> {
        let (start, end) = day_window(date);

        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_register_sessions \
             WHERE opened_at >= ? AND opened_at <= ? \
             ORDER BY opened_at ASC"
        );
        let sessions = sqlx::query_as::<_, CashRegisterSession>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    /// Computes the daily balance for a calendar day.
    ///
    /// Fetches the day's sessions and delegates the aggregation (sum raw
    /// fields, derive ONE combined difference) to farmapos-core.
    pub async fn daily_balance(&self, date: NaiveDate) -> DbResult<DailyBalance> {
        let sessions = self.sessions_for_day(date).await?;
        Ok(DailyBalance::compute(date, sessions))
    }
}

/// Inclusive [start, end] instants of a calendar day in UTC. Mirrors the
/// window the in-memory aggregator uses, so SQL pre-filtering and the
/// core filter agree.
fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

// =============================================================================
// Unit Tests
// =============================================================================
