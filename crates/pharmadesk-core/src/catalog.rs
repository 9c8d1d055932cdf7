//! # Medicine Catalog Inputs

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    validate_medicine_name, validate_price, validate_required, validate_stock_level,
    ValidationResult,
};

/// A catalog entry to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMedicine {
    pub name: String,
    pub mrp: Money,
    #[serde(default)]
    pub ptr: Money,
    #[serde(default)]
    pub company: Option<String>,
    pub medicine_type: String,
    /// Opening stock.
    #[serde(default)]
    pub current_stock: i64,
}

impl NewMedicine {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_medicine_name(&self.name)?;
        validate_required("medicine_type", &self.medicine_type)?;
        validate_price("mrp", self.mrp)?;
        validate_price("ptr", self.ptr)?;
        validate_stock_level("current_stock", self.current_stock)
    }
}

/// New MRP and/or PTR for an existing medicine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceUpdate {
    #[serde(default)]
    pub mrp: Option<Money>,
    #[serde(default)]
    pub ptr: Option<Money>,
}

impl PriceUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.mrp.is_none() && self.ptr.is_none() {
            return Err(ValidationError::required("mrp or ptr"));
        }
        if let Some(mrp) = self.mrp {
            validate_price("mrp", mrp)?;
        }
        if let Some(ptr) = self.ptr {
            validate_price("ptr", ptr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_medicine_validate() {
        let med = NewMedicine {
            name: "Cetirizine".into(),
            mrp: Money::from_paise(2500),
            ptr: Money::from_paise(1800),
            company: None,
            medicine_type: "Tablets".into(),
            current_stock: 0,
        };
        assert!(med.validate().is_ok());

        let mut bad = med.clone();
        bad.medicine_type = String::new();
        assert!(bad.validate().is_err());

        let mut bad = med.clone();
        bad.current_stock = -1;
        assert!(bad.validate().is_err());

        let mut bad = med.clone();
        bad.current_stock = i64::MAX;
        assert!(matches!(bad.validate(), Err(ValidationError::OutOfRange { .. })));

        let mut bad = med;
        bad.mrp = Money::from_paise(i64::MAX);
        assert!(matches!(bad.validate(), Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_price_update_validate() {
        assert!(PriceUpdate::default().validate().is_err());
        assert!(PriceUpdate {
            mrp: Some(Money::from_paise(100)),
            ptr: None
        }
        .validate()
        .is_ok());
        assert!(PriceUpdate {
            mrp: None,
            ptr: Some(Money::from_paise(-1))
        }
        .validate()
        .is_err());
    }
}
