//! Accrual window resolution.
//!
//! A partner is invoiced on a rolling 30-day cadence. The resolver is a pure function over three timestamps so the
//! cadence rules can be tested without a database in sight.
use chrono::{DateTime, Duration, Utc};

use crate::traits::BillingWindow;

/// The length of a partner accrual window.
pub const ACCRUAL_WINDOW: Duration = Duration::days(30);

/// Decides whether a partner is due for invoicing at `now`, and if so, what the window boundaries are.
///
/// * If the partner has been invoiced before, a new window opens once `now` is at least 30 days past the last
///   invoice's `end_date`, and starts exactly at that `end_date`. Windows are therefore contiguous and
///   non-overlapping across a partner's whole invoice history.
/// * A never-invoiced partner becomes due 30 days after registration; the first window is the trailing 30 days.
/// * Otherwise the partner is not due this cycle.
///
/// Note that the boundary only advances when an invoice is actually created. A window with no eligible fees is
/// skipped, not recorded, and the same boundary is re-evaluated on the next cycle.
pub fn resolve_billing_window(
    partner_created_at: DateTime<Utc>,
    last_invoice_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<BillingWindow> {
    match last_invoice_end {
        Some(end) if now - end >= ACCRUAL_WINDOW => Some(BillingWindow::new(end, now)),
        Some(_) => None,
        None if now - partner_created_at >= ACCRUAL_WINDOW => Some(BillingWindow::new(now - ACCRUAL_WINDOW, now)),
        None => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
        now - Duration::days(days)
    }

    #[test]
    fn new_partner_is_not_due_before_thirty_days() {
        let now = Utc::now();
        let window = resolve_billing_window(days_ago(now, 29), None, now);
        assert!(window.is_none());
    }

    #[test]
    fn new_partner_is_due_at_exactly_thirty_days() {
        let now = Utc::now();
        let window = resolve_billing_window(days_ago(now, 30), None, now).unwrap();
        assert_eq!(window.end, now);
        assert_eq!(window.end - window.start, ACCRUAL_WINDOW);
    }

    #[test]
    fn first_window_is_the_trailing_thirty_days() {
        let now = Utc::now();
        let window = resolve_billing_window(days_ago(now, 45), None, now).unwrap();
        assert_eq!(window.start, days_ago(now, 30));
        assert_eq!(window.end, now);
    }

    #[test]
    fn invoiced_partner_is_not_due_before_thirty_days_elapse() {
        let now = Utc::now();
        let window = resolve_billing_window(days_ago(now, 400), Some(days_ago(now, 29)), now);
        assert!(window.is_none());
    }

    #[test]
    fn next_window_starts_at_the_previous_end_date() {
        let now = Utc::now();
        let last_end = days_ago(now, 31);
        let window = resolve_billing_window(days_ago(now, 400), Some(last_end), now).unwrap();
        assert_eq!(window.start, last_end);
        assert_eq!(window.end, now);
        // A late run produces a window longer than 30 days rather than a gap
        assert!(window.end - window.start > ACCRUAL_WINDOW);
    }

    #[test]
    fn last_invoice_takes_precedence_over_partner_age() {
        // Once any invoice exists, the partner registration time is irrelevant
        let now = Utc::now();
        let window = resolve_billing_window(days_ago(now, 400), Some(days_ago(now, 10)), now);
        assert!(window.is_none());
    }
}
