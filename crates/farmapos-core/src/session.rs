//! # Cash Session Math & Daily Balance
//!
//! Derived computations over [`CashRegisterSession`]: the expected-vs-
//! actual reconciliation used identically in the session list, the
//! currently-open summary and the daily balance, plus the read-side
//! aggregator that consolidates a calendar day.
//!
//! ## Reconciliation Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Expected vs Actual (signed difference)                  │
//! │                                                                         │
//! │  expected  = opening_amount + total_cash                               │
//! │              (only CASH lands in the drawer - card/other never enter   │
//! │               the expected amount)                                     │
//! │                                                                         │
//! │  difference = closing_amount - expected                                │
//! │              positive → surplus   negative → shortage                  │
//! │              open session → no closing yet → difference is zero        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Daily Balance: Sum First, Subtract Last
//! Open sessions contribute 0 to the closing side. Summing per-session
//! differences would therefore bias the day's result; the aggregator sums
//! the raw fields first and computes ONE combined difference at the end.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CashRegisterSession, SessionStatus};

// =============================================================================
// Session Derived Values
// =============================================================================

impl CashRegisterSession {
    /// True while the session is accumulating sales.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Opening drawer amount.
    #[inline]
    pub fn opening(&self) -> Money {
        Money::from_cents(self.opening_cents)
    }

    /// Counted amount at close, when closed.
    #[inline]
    pub fn closing(&self) -> Option<Money> {
        self.closing_cents.map(Money::from_cents)
    }

    /// Cash the drawer SHOULD hold: `opening + total_cash`.
    #[inline]
    pub fn expected(&self) -> Money {
        Money::from_cents(self.opening_cents + self.total_cash_cents)
    }

    /// Signed reconciliation result: `(closing ?? expected) - expected`.
    ///
    /// An open session has no meaningful difference and yields zero -
    /// deliberately not an error, so list views can render uniformly.
    pub fn difference(&self) -> Money {
        let expected = self.expected();
        match self.closing() {
            Some(closing) => closing - expected,
            None => Money::zero(),
        }
    }
}

// =============================================================================
// Daily Balance
// =============================================================================

/// Consolidated report of all sessions opened on one calendar day.
///
/// Ephemeral and derived - computed on read, never persisted, never
/// mutates any session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyBalance {
    /// The calendar day (session `opened_at` decides membership).
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Number of contributing sessions.
    pub session_count: usize,

    /// Raw sums across the contributing sessions.
    pub total_opening_cents: i64,
    pub total_closing_cents: i64,
    pub total_sales_cents: i64,
    pub total_cash_cents: i64,
    pub total_card_cents: i64,
    pub total_other_cents: i64,

    /// `sum(opening) + sum(cash)`.
    pub expected_cents: i64,

    /// `sum(closing) - expected` - ONE combined pair, not an average of
    /// per-session differences.
    pub difference_cents: i64,

    /// The contributing sessions, retained for drill-down display.
    pub sessions: Vec<CashRegisterSession>,
}

impl DailyBalance {
    /// Consolidates the sessions whose `opened_at` falls on `date`.
    ///
    /// ## Window Semantics
    /// Membership is `opened_at ∈ [start_of_day, end_of_day]`, inclusive
    /// on BOTH bounds (end of day = 23:59:59.999). Instants are
    /// continuous so the closed upper bound cannot double count, and it
    /// preserves the single-calendar-day intent.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use farmapos_core::session::DailyBalance;
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    /// let balance = DailyBalance::compute(date, vec![]);
    /// assert_eq!(balance.session_count, 0);
    /// assert_eq!(balance.difference_cents, 0);
    /// ```
    pub fn compute(date: NaiveDate, sessions: Vec<CashRegisterSession>) -> DailyBalance {
        let (start, end) = day_window(date);

        let sessions: Vec<CashRegisterSession> = sessions
            .into_iter()
            .filter(|s| s.opened_at >= start && s.opened_at <= end)
            .collect();

        // Sum the raw fields first; open sessions contribute 0 closing.
        let mut total_opening = 0;
        let mut total_closing = 0;
        let mut total_sales = 0;
        let mut total_cash = 0;
        let mut total_card = 0;
        let mut total_other = 0;

        for s in &sessions {
            total_opening += s.opening_cents;
            total_closing += s.closing_cents.unwrap_or(0);
            total_sales += s.total_sales_cents;
            total_cash += s.total_cash_cents;
            total_card += s.total_card_cents;
            total_other += s.total_other_cents;
        }

        let expected = total_opening + total_cash;
        let difference = total_closing - expected;

        DailyBalance {
            date,
            session_count: sessions.len(),
            total_opening_cents: total_opening,
            total_closing_cents: total_closing,
            total_sales_cents: total_sales,
            total_cash_cents: total_cash,
            total_card_cents: total_card,
            total_other_cents: total_other,
            expected_cents: expected,
            difference_cents: difference,
            sessions,
        }
    }

    /// Combined difference as Money (positive = surplus).
    #[inline]
    pub fn difference(&self) -> Money {
        Money::from_cents(self.difference_cents)
    }
}

/// Inclusive [start, end] instants of a calendar day.
fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionStatus;
    use chrono::TimeZone;

    fn session(
        id: &str,
        opened_at: DateTime<Utc>,
        opening: i64,
        cash: i64,
        closing: Option<i64>,
    ) -> CashRegisterSession {
        let closed = closing.is_some();
        CashRegisterSession {
            id: id.to_string(),
            register_name: "Caja 1".to_string(),
            opening_cents: opening,
            closing_cents: closing,
            total_sales_cents: cash,
            total_cash_cents: cash,
            total_card_cents: 0,
            total_other_cents: 0,
            status: if closed {
                SessionStatus::Closed
            } else {
                SessionStatus::Open
            },
            opened_at,
            closed_at: closed.then(|| opened_at + Duration::hours(8)),
            notes: None,
            user_id: None,
            updated_at: opened_at,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    /// Spec scenario 4: opening 50.00, two cash sales 30.00 + 20.00,
    /// close at 100.00 → expected 100.00, difference 0.
    #[test]
    fn test_balanced_session() {
        let s = session("a", at(2026, 3, 14, 9, 0), 5000, 5000, Some(10000));
        assert_eq!(s.expected().cents(), 10000);
        assert_eq!(s.difference().cents(), 0);
    }

    #[test]
    fn test_shortage_is_negative() {
        let s = session("a", at(2026, 3, 14, 9, 0), 5000, 5000, Some(9500));
        assert_eq!(s.difference().cents(), -500);
        assert!(s.difference().is_negative());
    }

    #[test]
    fn test_open_session_difference_is_zero() {
        let s = session("a", at(2026, 3, 14, 9, 0), 5000, 2500, None);
        assert_eq!(s.difference().cents(), 0);
    }

    /// Spec scenario 5: A (50/50/100) + B (100/25/120) →
    /// opening 150, cash 75, closing 220, expected 225, difference -5.00.
    #[test]
    fn test_daily_balance_two_sessions() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let sessions = vec![
            session("a", at(2026, 3, 14, 8, 0), 5000, 5000, Some(10000)),
            session("b", at(2026, 3, 14, 14, 0), 10000, 2500, Some(12000)),
        ];

        let balance = DailyBalance::compute(date, sessions);
        assert_eq!(balance.session_count, 2);
        assert_eq!(balance.total_opening_cents, 15000);
        assert_eq!(balance.total_cash_cents, 7500);
        assert_eq!(balance.total_closing_cents, 22000);
        assert_eq!(balance.expected_cents, 22500);
        assert_eq!(balance.difference_cents, -500);
        assert_eq!(balance.difference().to_string(), "-$5.00");
    }

    /// Additivity (P6): summed fields equal per-field arithmetic sums.
    #[test]
    fn test_daily_balance_additivity() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let inputs = [
            (3000_i64, 1200_i64, Some(4100_i64)),
            (5000, 800, Some(5900)),
            (2000, 450, Some(2450)),
        ];
        let sessions: Vec<_> = inputs
            .iter()
            .enumerate()
            .map(|(i, (op, cash, close))| {
                session(&format!("s{i}"), at(2026, 3, 14, 9 + i as u32, 0), *op, *cash, *close)
            })
            .collect();

        let balance = DailyBalance::compute(date, sessions);
        let sum_opening: i64 = inputs.iter().map(|(op, _, _)| op).sum();
        let sum_cash: i64 = inputs.iter().map(|(_, c, _)| c).sum();
        let sum_closing: i64 = inputs.iter().filter_map(|(_, _, cl)| *cl).sum();

        assert_eq!(balance.total_opening_cents, sum_opening);
        assert_eq!(balance.total_cash_cents, sum_cash);
        assert_eq!(balance.total_closing_cents, sum_closing);
        assert_eq!(
            balance.difference_cents,
            sum_closing - (sum_opening + sum_cash)
        );
    }

    /// An open session biases the naive per-session approach; summing raw
    /// fields first keeps the combined pair correct.
    #[test]
    fn test_daily_balance_with_open_session() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let sessions = vec![
            session("closed", at(2026, 3, 14, 8, 0), 5000, 5000, Some(10000)),
            session("open", at(2026, 3, 14, 16, 0), 4000, 1000, None),
        ];

        let balance = DailyBalance::compute(date, sessions);
        // expected = (5000+4000) + (5000+1000); closing side = 10000 + 0
        assert_eq!(balance.expected_cents, 15000);
        assert_eq!(balance.total_closing_cents, 10000);
        assert_eq!(balance.difference_cents, -5000);
    }

    /// Both bounds of the day window are inclusive.
    #[test]
    fn test_day_window_inclusive_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let midnight = at(2026, 3, 14, 0, 0);
        let last_instant = Utc
            .with_ymd_and_hms(2026, 3, 14, 23, 59, 59)
            .unwrap()
            + Duration::milliseconds(999);
        let next_day = at(2026, 3, 15, 0, 0);

        let sessions = vec![
            session("first", midnight, 1000, 0, Some(1000)),
            session("last", last_instant, 2000, 0, Some(2000)),
            session("next", next_day, 4000, 0, Some(4000)),
        ];

        let balance = DailyBalance::compute(date, sessions);
        assert_eq!(balance.session_count, 2);
        assert_eq!(balance.total_opening_cents, 3000);
    }

    #[test]
    fn test_daily_balance_never_mutates_sessions() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let original = session("a", at(2026, 3, 14, 8, 0), 5000, 5000, Some(9000));
        let balance = DailyBalance::compute(date, vec![original.clone()]);

        assert_eq!(balance.sessions.len(), 1);
        assert_eq!(balance.sessions[0].closing_cents, original.closing_cents);
        assert_eq!(balance.sessions[0].status, original.status);
    }
}
