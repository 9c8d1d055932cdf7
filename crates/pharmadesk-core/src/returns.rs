//! # Supplier Returns

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::stock::StockSnapshot;
use crate::types::ReturnReason;
use crate::validation::{validate_medicine_name, validate_quantity, validate_required};

/// Stock going back to an agency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRequest {
    pub medicine_name: String,
    pub quantity: i64,
    pub agency: String,
    pub reason: ReturnReason,
    #[serde(default)]
    pub batch_no: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[ts(as = "String")]
    pub return_date: NaiveDate,
}

impl ReturnRequest {
    /// Field checks, then the quantity against the shelf stock.
    pub fn validate(&self, stock: &StockSnapshot) -> CoreResult<()> {
        validate_medicine_name(&self.medicine_name)?;
        validate_required("agency", &self.agency)?;
        validate_quantity(self.quantity)?;
        stock.check(self.quantity)
    }
}
