//! Date-range conflict detection for room bookings.

use chrono::NaiveDate;

use crate::models::Booking;

/// Whether a requested stay `[new_in, new_out)` collides with an existing `[ex_in, ex_out)`.
///
/// The four clauses overlap one another; they are kept as separate checks so
/// degenerate ranges behave exactly as the stored bookings expect. A stay may
/// start on the day another one checks out.
pub fn ranges_conflict(
    new_in: NaiveDate,
    new_out: NaiveDate,
    ex_in: NaiveDate,
    ex_out: NaiveDate,
) -> bool {
    let starts_inside = ex_in < new_in && new_in < ex_out;
    let ends_inside = ex_in < new_out && new_out < ex_out;
    let nested = new_in >= ex_in && new_out <= ex_out;
    let encompasses = new_in <= ex_in && new_out >= ex_out;

    starts_inside || ends_inside || nested || encompasses
}

/// First booking in `existing` that the requested stay collides with.
///
/// Every booking passed in is considered, whatever its `status`.
pub fn find_conflict(
    existing: &[Booking],
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Option<&Booking> {
    existing.iter().find(|booking| {
        ranges_conflict(
            check_in,
            check_out,
            booking.check_in_date,
            booking.check_out_date,
        )
    })
}
