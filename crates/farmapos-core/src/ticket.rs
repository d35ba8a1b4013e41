//! # Close Ticket & Printer Observer
//!
//! The structured payload handed to the printing collaborator when a cash
//! session closes, and the explicit publish/subscribe service that
//! replaces the original module-level printer singleton.
//!
//! ## Why No Global Singleton
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Ticket Delivery                                      │
//! │                                                                         │
//! │  close(session) ──► CloseTicket (typed value, named optional fields)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TicketService::publish(&ticket)                                       │
//! │       │                                                                 │
//! │       ├──► subscriber: receipt printer adapter                         │
//! │       └──► subscriber: cash-drawer kick                                │
//! │                                                                         │
//! │  The service is constructed once at application start and passed by    │
//! │  reference to consumers. subscribe() returns an unsubscribe handle.    │
//! │  Formatting/sending to a physical device is the subscriber's job -    │
//! │  this crate's responsibility ends at the structured value.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use ts_rs::TS;

use crate::money::Money;
use crate::types::CashRegisterSession;

// =============================================================================
// Close Ticket
// =============================================================================

/// Structured cash-close payload: session totals plus the reconciliation
/// result. Replaces the loosely-typed bag of fields the print code used
/// to receive - every optional is named, no implicit presence branching.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CloseTicket {
    pub session_id: String,
    pub register_name: String,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,

    pub opening_cents: i64,
    pub closing_cents: i64,

    pub total_sales_cents: i64,
    pub total_cash_cents: i64,
    pub total_card_cents: i64,
    pub total_other_cents: i64,

    /// `opening + total_cash`.
    pub expected_cents: i64,
    /// `closing - expected`; positive = surplus, negative = shortage.
    pub difference_cents: i64,

    pub notes: Option<String>,
    pub user_id: Option<String>,
}

impl CloseTicket {
    /// Builds the ticket from a CLOSED session.
    ///
    /// Returns `None` while the session is still open (no closing amount
    /// to reconcile against yet).
    pub fn from_session(session: &CashRegisterSession) -> Option<CloseTicket> {
        let closing_cents = session.closing_cents?;
        let closed_at = session.closed_at?;

        let expected = session.expected();
        let difference = Money::from_cents(closing_cents) - expected;

        Some(CloseTicket {
            session_id: session.id.clone(),
            register_name: session.register_name.clone(),
            opened_at: session.opened_at,
            closed_at,
            opening_cents: session.opening_cents,
            closing_cents,
            total_sales_cents: session.total_sales_cents,
            total_cash_cents: session.total_cash_cents,
            total_card_cents: session.total_card_cents,
            total_other_cents: session.total_other_cents,
            expected_cents: expected.cents(),
            difference_cents: difference.cents(),
            notes: session.notes.clone(),
            user_id: session.user_id.clone(),
        })
    }

    /// Signed reconciliation result as Money.
    #[inline]
    pub fn difference(&self) -> Money {
        Money::from_cents(self.difference_cents)
    }
}

// =============================================================================
// Ticket Service (observer)
// =============================================================================

type TicketCallback = Arc<dyn Fn(&CloseTicket) + Send + Sync>;
type SubscriberList = Arc<Mutex<Vec<(u64, TicketCallback)>>>;

/// Publish/subscribe hub for close tickets.
///
/// Construct once at application start and inject into consumers - no
/// hidden global state. Subscribers are invoked synchronously, in
/// subscription order, on the publisher's thread. Callbacks may call
/// back into the service (subscribe, unsubscribe, count) without
/// deadlocking: delivery runs against a snapshot taken with the lock
/// released.
pub struct TicketService {
    subscribers: SubscriberList,
    next_id: AtomicU64,
}

impl TicketService {
    /// Creates an empty service.
    pub fn new() -> Self {
        TicketService {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a subscriber and returns its unsubscribe handle.
    ///
    /// ## Example
    /// ```rust
    /// use farmapos_core::ticket::TicketService;
    ///
    /// let service = TicketService::new();
    /// let sub = service.subscribe(|ticket| {
    ///     println!("cierre {}: {}", ticket.register_name, ticket.difference());
    /// });
    /// // later:
    /// sub.unsubscribe();
    /// ```
    pub fn subscribe(
        &self,
        callback: impl Fn(&CloseTicket) + Send + Sync + 'static,
    ) -> TicketSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, Arc::new(callback)));

        TicketSubscription {
            id,
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    /// Delivers the ticket to every subscriber present when the call
    /// starts.
    ///
    /// The subscriber list is snapshotted and the lock released before
    /// any callback runs, so callbacks may re-enter the service. A
    /// subscriber registered during delivery receives subsequent
    /// tickets only.
    pub fn publish(&self, ticket: &CloseTicket) {
        let subscribers: Vec<TicketCallback> =
            self.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();

        for callback in subscribers {
            callback(ticket);
        }
    }

    /// Number of live subscribers (diagnostics).
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u64, TicketCallback)>> {
        // A poisoned list is still structurally valid; keep serving.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TicketService {
    fn default() -> Self {
        TicketService::new()
    }
}

impl std::fmt::Debug for TicketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketService")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle returned by [`TicketService::subscribe`]; consumes itself to
/// deregister.
pub struct TicketSubscription {
    id: u64,
    subscribers: SubscriberList,
}

impl TicketSubscription {
    /// Removes the subscriber from the service.
    pub fn unsubscribe(self) {
        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subs.retain(|(id, _)| *id != self.id);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
