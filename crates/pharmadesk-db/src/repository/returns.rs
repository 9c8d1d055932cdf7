//! # Supplier Return Repository
//!
//! Stock sent back to an agency. The quantity is checked against the shelf
//! and taken out of stock in the same transaction as the return record.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::medicine::{current_stock, decrement_stock};
use crate::error::{DbError, DbResult};
use pharmadesk_core::returns::ReturnRequest;
use pharmadesk_core::validation::validate_medicine_name;
use pharmadesk_core::SupplierReturn;

const SELECT_RETURN: &str = r#"
    SELECT
        id,
        medicine_name,
        quantity,
        agency,
        reason,
        batch_no,
        note,
        return_date
    FROM supplier_returns
"#;

/// Repository for supplier returns.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Records a return and removes the quantity from stock.
    ///
    /// ## Returns
    /// * `Ok(SupplierReturn)` - Stored
    /// * `Err(DbError::Rule(InsufficientStock))` - More than is on the shelf
    /// * `Err(DbError::NotFound)` - Medicine not in the catalog
    pub async fn create(&self, request: &ReturnRequest, operator: &str) -> DbResult<SupplierReturn> {
        validate_medicine_name(&request.medicine_name)?;

        let mut tx = self.pool.begin().await?;

        let name = request.medicine_name.trim();
        let stock = current_stock(&mut tx, name)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", name))?;
        request.validate(&stock)?;

        let id = sqlx::query(
            r#"
            INSERT INTO supplier_returns (
                medicine_name, quantity, agency, reason,
                batch_no, note, return_date, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&stock.medicine_name)
        .bind(request.quantity)
        .bind(request.agency.trim())
        .bind(request.reason)
        .bind(request.batch_no.as_deref().map(str::trim).filter(|b| !b.is_empty()))
        .bind(request.note.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .bind(request.return_date)
        .bind(operator)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        decrement_stock(&mut tx, name, request.quantity).await?;

        tx.commit().await?;

        info!(
            id = %id,
            medicine = %stock.medicine_name,
            quantity = request.quantity,
            agency = %request.agency.trim(),
            "Supplier return recorded"
        );

        let sql = format!("{SELECT_RETURN} WHERE id = ?1");
        let stored = sqlx::query_as::<_, SupplierReturn>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(stored)
    }

    /// Lists returns, newest first, optionally for one agency.
    pub async fn list(&self, agency: Option<&str>) -> DbResult<Vec<SupplierReturn>> {
        let agency = agency.map(str::trim).filter(|a| !a.is_empty());
        let returns = match agency {
            Some(agency) => {
                let sql = format!(
                    "{SELECT_RETURN} WHERE agency = ?1 COLLATE NOCASE ORDER BY return_date DESC, id DESC"
                );
                sqlx::query_as::<_, SupplierReturn>(&sql)
                    .bind(agency)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{SELECT_RETURN} ORDER BY return_date DESC, id DESC");
                sqlx::query_as::<_, SupplierReturn>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use pharmadesk_core::catalog::NewMedicine;
    use pharmadesk_core::{CoreError, Money, ReturnReason};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.medicines()
            .insert(&NewMedicine {
                name: "Amoxicillin".to_string(),
                mrp: Money::from_paise(10000),
                ptr: Money::from_paise(8000),
                company: None,
                medicine_type: "Capsules".to_string(),
                current_stock: 10,
            })
            .await
            .unwrap();
        db
    }

    fn request(qty: i64) -> ReturnRequest {
        ReturnRequest {
            medicine_name: "amoxicillin".to_string(),
            quantity: qty,
            agency: "Sri Sai Agencies".to_string(),
            reason: ReturnReason::Expired,
            batch_no: Some("AMX-22".to_string()),
            note: None,
            return_date: NaiveDate::from_ymd_opt(2024, 10, 5).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_return_decrements_stock() {
        let db = seeded().await;
        let stored = db.returns().create(&request(4), "store1").await.unwrap();

        assert_eq!(stored.medicine_name, "Amoxicillin");
        assert_eq!(stored.reason, ReturnReason::Expired);

        let med = db.medicines().get_by_name("Amoxicillin").await.unwrap().unwrap();
        assert_eq!(med.current_stock, 6);

        assert_eq!(db.returns().list(None).await.unwrap().len(), 1);
        assert_eq!(db.returns().list(Some("SRI SAI AGENCIES")).await.unwrap().len(), 1);
        assert!(db.returns().list(Some("Medplus")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_return_over_stock_rejected() {
        let db = seeded().await;
        let err = db.returns().create(&request(11), "store1").await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock {
                available: 10,
                requested: 11
            })
        ));
        assert!(db.returns().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_return_of_unknown_medicine() {
        let db = seeded().await;
        let mut unknown = request(1);
        unknown.medicine_name = "Crocin".to_string();

        let err = db.returns().create(&unknown, "store1").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
