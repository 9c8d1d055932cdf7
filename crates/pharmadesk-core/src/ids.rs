//! # Identifiers
//!
//! Human-readable ids for patients, invoices and supplier bills.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┬─────────────────────┐
//! │ Id           │ Shape                        │ Example             │
//! ├──────────────┼──────────────────────────────┼─────────────────────┤
//! │ UHID         │ YYMM + letter + NNN          │ 2410R007            │
//! │ temp UHID    │ TEMP-YYYYMMDDHHMMSS          │ TEMP-20241005143210 │
//! │ invoice      │ PM + YY + DDD + SS           │ PM2427903           │
//! │ sale line    │ invoice + LL                 │ PM242790302         │
//! │ supplier bill│ bill_no + "-" + YYMMDD       │ INV-77-241005       │
//! └──────────────┴──────────────────────────────┴─────────────────────┘
//! ```
//!
//! Every function takes the date and the current count as arguments.
//! Reading the clock and counting rows is the caller's job.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// First alphabetic character of `name`, upper-cased. `A` when there is none.
pub fn name_letter(name: &str) -> char {
    name.trim()
        .chars()
        .find(|c| c.is_alphabetic())
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('A')
}

/// UHID for a new patient.
///
/// `month_letter_count` is how many UHIDs already issued this month start
/// with the same letter.
///
/// ```rust
/// use chrono::NaiveDate;
/// use pharmadesk_core::ids::uhid;
///
/// let date = NaiveDate::from_ymd_opt(2024, 10, 5).unwrap();
/// assert_eq!(uhid("ravi kumar", date, 6), "2410R007");
/// ```
pub fn uhid(name: &str, date: NaiveDate, month_letter_count: i64) -> String {
    format!(
        "{}{}{:03}",
        date.format("%y%m"),
        name_letter(name),
        month_letter_count + 1
    )
}

/// The `YYMM` + letter prefix shared by every UHID of that letter and month.
pub fn uhid_prefix(name: &str, date: NaiveDate) -> String {
    format!("{}{}", date.format("%y%m"), name_letter(name))
}

/// Placeholder UHID for walk-in patients who gave no phone number.
pub fn temp_uhid(now: NaiveDateTime) -> String {
    format!("TEMP-{}", now.format("%Y%m%d%H%M%S"))
}

/// Whether `uhid` is a walk-in placeholder.
pub fn is_temp_uhid(uhid: &str) -> bool {
    uhid.starts_with("TEMP-")
}

/// Invoice id for the next invoice of `date`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use pharmadesk_core::ids::invoice_id;
///
/// let date = NaiveDate::from_ymd_opt(2024, 10, 5).unwrap();
/// assert_eq!(invoice_id(date, 2), "PM2427903");
/// ```
pub fn invoice_id(date: NaiveDate, invoices_today: i64) -> String {
    format!(
        "PM{}{:03}{:02}",
        date.format("%y"),
        date.ordinal(),
        invoices_today + 1
    )
}

/// Id of the `index`-th (1-based) line of an invoice.
///
/// Invoices hold at most [`MAX_LINES_PER_BILL`] lines, so the suffix is
/// always exactly two digits and ids from different invoices never collide.
///
/// [`MAX_LINES_PER_BILL`]: crate::validation::MAX_LINES_PER_BILL
pub fn sale_line_id(invoice_id: &str, index: usize) -> String {
    format!("{}{:02}", invoice_id, index)
}

/// Supplier bill id from bill number and bill date.
pub fn bill_id(bill_no: &str, bill_date: NaiveDate) -> String {
    format!("{}-{}", bill_no, bill_date.format("%y%m%d"))
}
