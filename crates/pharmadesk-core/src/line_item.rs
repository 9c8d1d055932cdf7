//! # Line Item Model
//!
//! Priced bill lines and the ordered, id-stamped collection that holds them.
//!
//! ## Line Identity
//! ```text
//! add Paracetamol  ──► id 1   [1]
//! add Amoxicillin  ──► id 2   [1, 2]
//! add Cetirizine   ──► id 3   [1, 2, 3]
//! remove 2         ──►        [1, 3]       (no compaction, no renumbering)
//! add Azithromycin ──► id 4   [1, 3, 4]    (2 is never handed out again)
//! ```
//!
//! Ids are local to one draft. They are not persisted identity; the server
//! numbers submitted lines by position.
//!
//! ## Derived Values
//! `line_total` and `price_difference` are methods, not fields. There is
//! nothing stored that could drift away from quantity and unit price.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::price::annotate;
use crate::validation::{
    validate_item_name, validate_price, validate_quantity, ValidationResult, MAX_LINES_PER_BILL,
};

/// Local, per-draft line identifier.
pub type LineId = u32;

// =============================================================================
// BillLine Trait
// =============================================================================

/// A line that can live in [`LineItems`].
///
/// Implemented by the outbound [`LineItem`] and the inbound [`PurchaseLineItem`].
pub trait BillLine: Sized {
    /// What the operator enters before the line exists.
    type Candidate;

    /// Validates the candidate and stamps it with `id`.
    fn build(id: LineId, candidate: Self::Candidate) -> CoreResult<Self>;

    fn id(&self) -> LineId;

    /// quantity × unit price, recomputed on every call.
    fn line_total(&self) -> Money;
}

// =============================================================================
// Outbound Line
// =============================================================================

/// Operator input for one bill line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineCandidate {
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub batch_no: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
}

impl LineCandidate {
    pub fn new(item_name: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        LineCandidate {
            item_name: item_name.into(),
            quantity,
            unit_price,
            batch_no: None,
            expiry: None,
        }
    }

    pub fn with_batch(mut self, batch_no: impl Into<String>, expiry: impl Into<String>) -> Self {
        self.batch_no = Some(batch_no.into());
        self.expiry = Some(expiry.into());
        self
    }

    /// Checks name, quantity and price.
    ///
    /// ## Rules
    /// - Name must not be blank
    /// - Quantity in `1..=MAX_ITEM_QUANTITY`
    /// - Unit price in `0..=MAX_PRICE_PAISE`
    pub fn validate(&self) -> ValidationResult<()> {
        validate_item_name(&self.item_name)?;
        validate_quantity(self.quantity)?;
        validate_price("unit_price", self.unit_price)?;

        if self
            .unit_price
            .checked_multiply_quantity(self.quantity)
            .is_none()
        {
            return Err(ValidationError::invalid_format(
                "line_total",
                "quantity × unit price is too large",
            ));
        }

        Ok(())
    }
}

/// One priced line on a pharmacy bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    id: LineId,
    item_name: String,
    quantity: i64,
    unit_price: Money,
    batch_no: Option<String>,
    expiry: Option<String>,
}

impl LineItem {
    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn batch_no(&self) -> Option<&str> {
        self.batch_no.as_deref()
    }

    pub fn expiry(&self) -> Option<&str> {
        self.expiry.as_deref()
    }
}

impl BillLine for LineItem {
    type Candidate = LineCandidate;

    fn build(id: LineId, candidate: LineCandidate) -> CoreResult<Self> {
        candidate.validate()?;
        Ok(LineItem {
            id,
            item_name: candidate.item_name.trim().to_string(),
            quantity: candidate.quantity,
            unit_price: candidate.unit_price,
            batch_no: candidate.batch_no.filter(|b| !b.trim().is_empty()),
            expiry: candidate.expiry.filter(|e| !e.trim().is_empty()),
        })
    }

    fn id(&self) -> LineId {
        self.id
    }

    fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Inbound Line
// =============================================================================

/// Operator input for one purchase line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseCandidate {
    #[serde(flatten)]
    pub line: LineCandidate,
    /// Catalog MRP at add time. Missing MRP is zero.
    #[serde(default)]
    pub catalog_mrp: Money,
}

/// A purchase-entry line: a [`LineItem`] plus the catalog MRP it was bought against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseLineItem {
    line: LineItem,
    catalog_mrp: Money,
}

impl PurchaseLineItem {
    pub fn line(&self) -> &LineItem {
        &self.line
    }

    pub fn catalog_mrp(&self) -> Money {
        self.catalog_mrp
    }

    /// MRP − unit price. Positive is margin, negative is buying above MRP.
    pub fn price_difference(&self) -> Money {
        annotate(self.line.unit_price, self.catalog_mrp)
    }

    pub fn set_unit_price(&mut self, unit_price: Money) -> ValidationResult<()> {
        validate_price("unit_price", unit_price)?;
        self.line.unit_price = unit_price;
        Ok(())
    }

    pub fn set_catalog_mrp(&mut self, catalog_mrp: Money) -> ValidationResult<()> {
        validate_price("catalog_mrp", catalog_mrp)?;
        self.catalog_mrp = catalog_mrp;
        Ok(())
    }
}

impl BillLine for PurchaseLineItem {
    type Candidate = PurchaseCandidate;

    fn build(id: LineId, candidate: PurchaseCandidate) -> CoreResult<Self> {
        validate_price("catalog_mrp", candidate.catalog_mrp)?;
        Ok(PurchaseLineItem {
            line: LineItem::build(id, candidate.line)?,
            catalog_mrp: candidate.catalog_mrp,
        })
    }

    fn id(&self) -> LineId {
        self.line.id
    }

    fn line_total(&self) -> Money {
        self.line.line_total()
    }
}

// =============================================================================
// Line Collection
// =============================================================================

/// Ordered lines of one draft with a monotonic id counter.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItems<L> {
    lines: Vec<L>,
    next_id: LineId,
}

impl<L: BillLine> LineItems<L> {
    pub fn new() -> Self {
        LineItems {
            lines: Vec::new(),
            next_id: 1,
        }
    }

    /// Validates and appends a line, returning its id.
    ///
    /// At most [`MAX_LINES_PER_BILL`] lines. On error nothing changes,
    /// including the id counter.
    pub fn add_line(&mut self, candidate: L::Candidate) -> CoreResult<LineId> {
        if self.lines.len() >= MAX_LINES_PER_BILL {
            return Err(ValidationError::OutOfRange {
                field: "lines".to_string(),
                min: 1,
                max: MAX_LINES_PER_BILL as i64,
            }
            .into());
        }

        let id = self.next_id;
        let line = L::build(id, candidate)?;
        self.lines.push(line);
        self.next_id += 1;
        Ok(id)
    }

    /// Removes the line with `id`. Absent ids are a no-op.
    ///
    /// Returns whether a line was removed.
    pub fn remove_line(&mut self, id: LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id() != id);
        self.lines.len() != before
    }

    pub fn get(&self, id: LineId) -> Option<&L> {
        self.lines.iter().find(|line| line.id() == id)
    }

    pub fn get_mut(&mut self, id: LineId) -> Option<&mut L> {
        self.lines.iter_mut().find(|line| line.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, L> {
        self.lines.iter()
    }

    pub fn as_slice(&self) -> &[L] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drops every line and restarts numbering.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.next_id = 1;
    }
}

impl<L: BillLine> Default for LineItems<L> {
    fn default() -> Self {
        LineItems::new()
    }
}

impl<'a, L> IntoIterator for &'a LineItems<L> {
    type Item = &'a L;
    type IntoIter = std::slice::Iter<'a, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

// =============================================================================
// Raw Input
// =============================================================================

/// Parses a quantity typed by the operator.
///
/// ```rust
/// use pharmadesk_core::line_item::parse_quantity;
///
/// assert_eq!(parse_quantity(" 3 ").unwrap(), 3);
/// assert!(parse_quantity("2.5").is_err());
/// assert!(parse_quantity("0").is_err());
/// ```
pub fn parse_quantity(raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::required("quantity"));
    }

    let qty: i64 = raw
        .parse()
        .map_err(|_| ValidationError::invalid_format("quantity", "must be a whole number"))?;

    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(qty)
}

// =============================================================================
// Unit Tests
// =============================================================================
