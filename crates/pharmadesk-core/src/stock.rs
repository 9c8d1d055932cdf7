//! # Stock Validator
//!
//! Advisory check of a requested quantity against the last fetched stock.
//!
//! ```text
//! select medicine ──► GET details ──► StockSnapshot { current_stock: 5 }
//!                                            │
//!              qty 5 ──► validate_quantity ──┼──► Ok (exact depletion)
//!              qty 6 ──► validate_quantity ──┴──► InsufficientStock { 5, 6 }
//! ```
//!
//! Nothing here reserves or decrements stock. The server decrements on
//! invoice acceptance and its answer wins.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Stock level of one medicine as of the last fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSnapshot {
    pub medicine_name: String,
    pub current_stock: i64,
}

impl StockSnapshot {
    /// Negative stock readings are clamped to zero.
    pub fn new(medicine_name: impl Into<String>, current_stock: i64) -> Self {
        StockSnapshot {
            medicine_name: medicine_name.into(),
            current_stock: current_stock.max(0),
        }
    }

    /// Checks `requested` against this snapshot.
    pub fn check(&self, requested: i64) -> CoreResult<()> {
        validate_quantity(requested, self.current_stock)
    }
}

/// Fails only when `requested > available`.
pub fn validate_quantity(requested: i64, available: i64) -> CoreResult<()> {
    if requested > available {
        return Err(CoreError::InsufficientStock {
            available,
            requested,
        });
    }
    Ok(())
}
