//! # Price-Difference Annotator
//!
//! Per-unit spread between catalog MRP and the negotiated purchase price.
//!
//! ```text
//! MRP ₹100.00, bought at ₹80.00   ──►  +₹20.00   margin
//! MRP ₹100.00, bought at ₹120.00  ──►  -₹20.00   buying above MRP
//! MRP missing, bought at ₹80.00   ──►  -₹80.00   (missing MRP counts as zero)
//! ```
//!
//! Informational only. It never blocks a line or a submission.

use crate::money::Money;

/// Returns `catalog_mrp − unit_price`.
#[inline]
pub fn annotate(unit_price: Money, catalog_mrp: Money) -> Money {
    catalog_mrp - unit_price
}

/// Like [`annotate`], with the MRP taken from raw catalog text.
pub fn annotate_raw(unit_price: Money, catalog_mrp: Option<&str>) -> Money {
    annotate(unit_price, Money::parse_lenient(catalog_mrp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_margin_and_loss() {
        let mrp = Money::from_paise(10000);
        assert_eq!(annotate(Money::from_paise(8000), mrp).paise(), 2000);
        assert_eq!(annotate(Money::from_paise(12000), mrp).paise(), -2000);
    }

    #[test]
    fn test_annotate_missing_mrp_is_zero() {
        let price = Money::from_paise(8000);
        assert_eq!(annotate_raw(price, None).paise(), -8000);
        assert_eq!(annotate_raw(price, Some("")).paise(), -8000);
        assert_eq!(annotate_raw(price, Some("100")).paise(), 2000);
    }
}
