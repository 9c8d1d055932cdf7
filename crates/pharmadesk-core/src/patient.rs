//! # Patient Registration
//!
//! Input types for the registration desk and the patient block of an invoice.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PaymentMode, VisitKind};
use crate::validation::{
    validate_age, validate_patient_name, validate_phone, validate_price, validate_required,
    ValidationResult,
};

/// A registration-desk submission: upserts the patient and records one visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientRegistration {
    /// Generated server-side when absent.
    #[serde(default)]
    pub uhid: Option<String>,
    pub name: String,
    pub phone: String,
    pub age: i64,
    pub gender: String,
    #[serde(default)]
    pub address: Option<String>,
    #[ts(as = "String")]
    pub visit_date: NaiveDate,
    pub kind: VisitKind,
    /// Required for [`VisitKind::Procedure`].
    #[serde(default)]
    pub procedure_name: Option<String>,
    #[serde(default)]
    pub payment_mode: Option<PaymentMode>,
    #[serde(default)]
    pub amount_paid: Money,
}

impl PatientRegistration {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_patient_name(&self.name)?;
        validate_phone(&self.phone)?;
        validate_age(self.age)?;
        validate_required("gender", &self.gender)?;
        validate_price("amount_paid", self.amount_paid)?;

        if self.kind == VisitKind::Procedure {
            let name = self.procedure_name.as_deref().unwrap_or_default();
            validate_required("procedure_name", name)?;
        }
        Ok(())
    }

    /// The supplied UHID, if it is not blank.
    pub fn given_uhid(&self) -> Option<&str> {
        self.uhid.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Who an invoice is for.
///
/// A known patient carries a UHID. A walk-in does not; the server either
/// registers them (phone given) or issues a `TEMP-` id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientInfo {
    #[serde(default)]
    pub uhid: Option<String>,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl PatientInfo {
    pub fn walk_in(name: impl Into<String>) -> Self {
        PatientInfo {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_patient_name(&self.name)?;
        if let Some(phone) = self.phone() {
            validate_phone(phone)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        Ok(())
    }

    pub fn given_uhid(&self) -> Option<&str> {
        self.uhid.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// The phone number, if it is not blank.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Rejects a registration whose amount is set without a payment mode.
pub fn check_visit_payment(mode: Option<PaymentMode>, amount: Money) -> ValidationResult<()> {
    if mode.is_none() && amount.is_positive() {
        return Err(ValidationError::required("payment_mode"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> PatientRegistration {
        PatientRegistration {
            uhid: None,
            name: "Ravi Kumar".into(),
            phone: "9876543210".into(),
            age: 42,
            gender: "M".into(),
            address: None,
            visit_date: NaiveDate::from_ymd_opt(2024, 10, 5).unwrap(),
            kind: VisitKind::Op,
            procedure_name: None,
            payment_mode: Some(PaymentMode::Cash),
            amount_paid: Money::from_paise(30000),
        }
    }

    #[test]
    fn test_registration_valid() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn test_procedure_needs_name() {
        let mut reg = registration();
        reg.kind = VisitKind::Procedure;
        assert_eq!(
            reg.validate(),
            Err(ValidationError::required("procedure_name"))
        );
        reg.procedure_name = Some("Dressing".into());
        assert!(reg.validate().is_ok());
    }

    #[test]
    fn test_registration_required_fields() {
        let mut reg = registration();
        reg.gender = " ".into();
        assert!(reg.validate().is_err());

        let mut reg = registration();
        reg.phone = String::new();
        assert!(reg.validate().is_err());
    }

    #[test]
    fn test_given_uhid_ignores_blank() {
        let mut reg = registration();
        reg.uhid = Some("  ".into());
        assert_eq!(reg.given_uhid(), None);
        reg.uhid = Some("2410R007".into());
        assert_eq!(reg.given_uhid(), Some("2410R007"));
    }

    #[test]
    fn test_patient_info() {
        let info = PatientInfo::walk_in("Anita");
        assert!(info.validate().is_ok());
        assert_eq!(info.phone(), None);
        assert!(PatientInfo::walk_in("").validate().is_err());
    }

    #[test]
    fn test_check_visit_payment() {
        assert!(check_visit_payment(None, Money::zero()).is_ok());
        assert!(check_visit_payment(None, Money::from_paise(100)).is_err());
    }
}
