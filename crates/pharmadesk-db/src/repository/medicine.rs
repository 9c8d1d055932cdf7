//! # Medicine Repository
//!
//! Database operations for the medicine catalog and its stock levels.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Moves Stock                                      │
//! │                                                                         │
//! │  supplier bill accepted ──► increment_stock (+qty, last_delivery_date) │
//! │  invoice accepted       ──► decrement_stock (−qty)                     │
//! │  supplier return        ──► decrement_stock (−qty)                     │
//! │                                                                         │
//! │  Decrements are guarded:                                               │
//! │     UPDATE medicines SET current_stock = current_stock - ?1            │
//! │     WHERE name = ?2 AND current_stock >= ?1                            │
//! │                                                                         │
//! │  0 rows affected ──► InsufficientStock (or NotFound) ──► rollback      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock helpers take a bare connection so they run inside the caller's
//! transaction.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharmadesk_core::catalog::{NewMedicine, PriceUpdate};
use pharmadesk_core::stock::StockSnapshot;
use pharmadesk_core::validation::MAX_STOCK;
use pharmadesk_core::{CoreError, Medicine, MedicineDetails, ValidationError};

const SELECT_MEDICINE: &str = r#"
    SELECT
        id,
        name,
        mrp_paise,
        ptr_paise,
        company,
        medicine_type,
        current_stock,
        last_delivery_date
    FROM medicines
"#;

/// Repository for medicine catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = MedicineRepository::new(pool);
///
/// // Details for the billing screen
/// let details = repo.details("Dolo 650").await?;
///
/// // Snapshot for the Stock Validator
/// let snapshot = repo.stock_snapshot("Dolo 650").await?;
/// ```
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Lists the whole catalog ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Medicine>> {
        let sql = format!("{SELECT_MEDICINE} ORDER BY name");
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(medicines)
    }

    /// Gets a medicine by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Medicine>> {
        let sql = format!("{SELECT_MEDICINE} WHERE id = ?1");
        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(medicine)
    }

    /// Gets a medicine by name (case-insensitive).
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Medicine>> {
        let sql = format!("{SELECT_MEDICINE} WHERE name = ?1");
        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(medicine)
    }

    /// Details shown when a medicine is picked on the billing screen.
    ///
    /// `batch_no` is the batch of the most recent delivery that named one.
    pub async fn details(&self, name: &str) -> DbResult<Option<MedicineDetails>> {
        debug!(name = %name, "Fetching medicine details");

        let details = sqlx::query_as::<_, MedicineDetails>(
            r#"
            SELECT
                m.name,
                m.mrp_paise,
                m.ptr_paise,
                m.current_stock,
                m.medicine_type,
                m.company,
                (
                    SELECT d.batch_no
                    FROM stock_deliveries d
                    WHERE d.medicine_name = m.name
                      AND d.batch_no IS NOT NULL
                      AND d.batch_no <> ''
                    ORDER BY d.delivery_date DESC, d.id DESC
                    LIMIT 1
                ) AS batch_no
            FROM medicines m
            WHERE m.name = ?1
            "#,
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(details)
    }

    /// Current stock of `name` as a [`StockSnapshot`].
    pub async fn stock_snapshot(&self, name: &str) -> DbResult<Option<StockSnapshot>> {
        let mut conn = self.pool.acquire().await?;
        current_stock(&mut conn, name).await
    }

    /// Adds a medicine to the catalog.
    ///
    /// ## Returns
    /// * `Ok(Medicine)` - Inserted row
    /// * `Err(DbError::UniqueViolation)` - Name already exists (any case)
    pub async fn insert(&self, medicine: &NewMedicine) -> DbResult<Medicine> {
        medicine.validate()?;

        let name = medicine.name.trim();
        debug!(name = %name, "Inserting medicine");

        let id = sqlx::query(
            r#"
            INSERT INTO medicines (
                name, mrp_paise, ptr_paise, company,
                medicine_type, current_stock, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(name)
        .bind(medicine.mrp.paise())
        .bind(medicine.ptr.paise())
        .bind(medicine.company.as_deref().map(str::trim))
        .bind(medicine.medicine_type.trim())
        .bind(medicine.current_stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(name))?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", id.to_string()))
    }

    /// Updates MRP and/or PTR. Fields left `None` keep their value.
    ///
    /// ## Returns
    /// * `Ok(Medicine)` - Row after the update
    /// * `Err(DbError::NotFound)` - Unknown id
    pub async fn update_price(&self, id: i64, update: &PriceUpdate) -> DbResult<Medicine> {
        update.validate()?;

        debug!(id = %id, "Updating medicine price");

        let result = sqlx::query(
            r#"
            UPDATE medicines SET
                mrp_paise = COALESCE(?2, mrp_paise),
                ptr_paise = COALESCE(?3, ptr_paise)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.mrp.map(|m| m.paise()))
        .bind(update.ptr.map(|m| m.paise()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id.to_string()));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", id.to_string()))
    }

    /// All medicine names, ordered.
    pub async fn names(&self) -> DbResult<Vec<String>> {
        let names = sqlx::query_scalar("SELECT name FROM medicines ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }

    /// Distinct medicine types, ordered.
    pub async fn types(&self) -> DbResult<Vec<String>> {
        let types = sqlx::query_scalar(
            "SELECT DISTINCT medicine_type FROM medicines WHERE medicine_type <> '' ORDER BY medicine_type",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }

    /// Counts catalog entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Stock helpers (transaction-scoped)
// =============================================================================

/// Reads the stock of `name` on `conn`.
pub(crate) async fn current_stock(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Option<StockSnapshot>> {
    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT name, current_stock FROM medicines WHERE name = ?1")
            .bind(name.trim())
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(|(name, stock)| StockSnapshot::new(name, stock)))
}

/// Takes `quantity` out of stock, failing instead of going negative.
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    name: &str,
    quantity: i64,
) -> DbResult<()> {
    debug!(name = %name, quantity = %quantity, "Decrementing stock");

    let result = sqlx::query(
        r#"
        UPDATE medicines
        SET current_stock = current_stock - ?1
        WHERE name = ?2 AND current_stock >= ?1
        "#,
    )
    .bind(quantity)
    .bind(name.trim())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return match current_stock(conn, name).await? {
            Some(snapshot) => Err(CoreError::InsufficientStock {
                available: snapshot.current_stock,
                requested: quantity,
            }
            .into()),
            None => Err(DbError::not_found("Medicine", name.trim())),
        };
    }

    Ok(())
}

/// Adds delivered `quantity` to stock and stamps the delivery date.
///
/// Refuses to lift the stock above [`MAX_STOCK`], so the column stays an
/// INTEGER even for absurd deliveries.
pub(crate) async fn increment_stock(
    conn: &mut SqliteConnection,
    name: &str,
    quantity: i64,
    delivery_date: NaiveDate,
) -> DbResult<()> {
    debug!(name = %name, quantity = %quantity, "Incrementing stock");

    let result = sqlx::query(
        r#"
        UPDATE medicines SET
            current_stock = current_stock + ?1,
            last_delivery_date = CASE
                WHEN last_delivery_date IS NULL OR last_delivery_date < ?3 THEN ?3
                ELSE last_delivery_date
            END
        WHERE name = ?2 AND ?1 BETWEEN 0 AND ?4 AND current_stock <= ?4 - ?1
        "#,
    )
    .bind(quantity)
    .bind(name.trim())
    .bind(delivery_date)
    .bind(MAX_STOCK)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return match current_stock(conn, name).await? {
            Some(_) => Err(CoreError::from(ValidationError::OutOfRange {
                field: "current_stock".to_string(),
                min: 0,
                max: MAX_STOCK,
            })
            .into()),
            None => Err(DbError::not_found("Medicine", name.trim())),
        };
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use pharmadesk_core::Money;

    fn dolo() -> NewMedicine {
        NewMedicine {
            name: "Dolo 650".to_string(),
            mrp: Money::from_paise(3200),
            ptr: Money::from_paise(2450),
            company: Some("Micro Labs".to_string()),
            medicine_type: "Tablets".to_string(),
            current_stock: 150,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_lookup_case_insensitive() {
        let db = db().await;
        let inserted = db.medicines().insert(&dolo()).await.unwrap();
        assert_eq!(inserted.current_stock, 150);
        assert_eq!(inserted.mrp(), Money::from_paise(3200));

        let found = db.medicines().get_by_name("DOLO 650").await.unwrap().unwrap();
        assert_eq!(found.id, inserted.id);

        let snap = db.medicines().stock_snapshot("dolo 650").await.unwrap().unwrap();
        assert_eq!(snap.current_stock, 150);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let db = db().await;
        db.medicines().insert(&dolo()).await.unwrap();

        let mut dup = dolo();
        dup.name = "dolo 650".to_string();
        let err = db.medicines().insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_price_partial() {
        let db = db().await;
        let med = db.medicines().insert(&dolo()).await.unwrap();

        let update = PriceUpdate {
            mrp: Some(Money::from_paise(3500)),
            ptr: None,
        };
        let updated = db.medicines().update_price(med.id, &update).await.unwrap();
        assert_eq!(updated.mrp_paise, 3500);
        assert_eq!(updated.ptr_paise, 2450);

        let err = db.medicines().update_price(9999, &update).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_guarded_decrement() {
        let db = db().await;
        db.medicines().insert(&dolo()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        decrement_stock(&mut conn, "Dolo 650", 150).await.unwrap();
        let err = decrement_stock(&mut conn, "Dolo 650", 1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock {
                available: 0,
                requested: 1
            })
        ));

        let err = decrement_stock(&mut conn, "Crocin", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_increment_keeps_latest_delivery_date() {
        let db = db().await;
        db.medicines().insert(&dolo()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let later = NaiveDate::from_ymd_opt(2024, 10, 10).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        increment_stock(&mut conn, "Dolo 650", 10, later).await.unwrap();
        increment_stock(&mut conn, "Dolo 650", 5, earlier).await.unwrap();
        drop(conn);

        let med = db.medicines().get_by_name("Dolo 650").await.unwrap().unwrap();
        assert_eq!(med.current_stock, 165);
        assert_eq!(med.last_delivery_date, Some(later));
    }

    #[tokio::test]
    async fn test_increment_refuses_to_exceed_max_stock() {
        let db = db().await;
        db.medicines().insert(&dolo()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 10, 10).unwrap();

        let err = increment_stock(&mut conn, "Dolo 650", i64::MAX, day)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // Exactly up to the ceiling is fine
        increment_stock(&mut conn, "Dolo 650", MAX_STOCK - 150, day)
            .await
            .unwrap();
        assert!(increment_stock(&mut conn, "Dolo 650", 1, day).await.is_err());
        drop(conn);

        let snap = db.medicines().stock_snapshot("Dolo 650").await.unwrap().unwrap();
        assert_eq!(snap.current_stock, MAX_STOCK);
    }

    #[tokio::test]
    async fn test_names_and_types() {
        let db = db().await;
        db.medicines().insert(&dolo()).await.unwrap();
        let mut syrup = dolo();
        syrup.name = "Ascoril".to_string();
        syrup.medicine_type = "Syrup".to_string();
        db.medicines().insert(&syrup).await.unwrap();

        assert_eq!(
            db.medicines().names().await.unwrap(),
            vec!["Ascoril".to_string(), "Dolo 650".to_string()]
        );
        assert_eq!(
            db.medicines().types().await.unwrap(),
            vec!["Syrup".to_string(), "Tablets".to_string()]
        );
        assert_eq!(db.medicines().count().await.unwrap(), 2);
    }
}
