//! # Invoice Repository
//!
//! Accepts pharmacy invoices and serves them back for reprint.
//!
//! ## Submission Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create(submission)                                   │
//! │                                                                         │
//! │  1. submission.validate()      lines, aggregator, reconcile_payment    │
//! │  2. BEGIN                                                              │
//! │  3. resolve patient            UHID as given │ new UHID │ TEMP-…       │
//! │  4. allocate invoice id        PM + YY + day-of-year + daily seq       │
//! │  5. INSERT invoices                                                    │
//! │  6. for each line:                                                     │
//! │       INSERT invoice_lines     (sale_line_id, running total)           │
//! │       decrement_stock          guarded, shortfall ──► ROLLBACK         │
//! │  7. COMMIT ──► InvoiceReceipt                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either every line is stored and every stock level drops, or nothing
//! changes at all.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::medicine::decrement_stock;
use super::patient::{next_uhid, upsert_patient, PatientRow};
use crate::error::{DbError, DbResult};
use pharmadesk_core::draft::{InvoiceReceipt, InvoiceSubmission};
use pharmadesk_core::ids;
use pharmadesk_core::line_item::BillLine;
use pharmadesk_core::patient::PatientInfo;
use pharmadesk_core::{Invoice, InvoiceLine, InvoiceWithLines, Money};

const SELECT_INVOICE: &str = r#"
    SELECT
        invoice_id,
        uhid,
        patient_name,
        invoice_date,
        subtotal_paise,
        discount_paise,
        final_amount_paise,
        payment_mode,
        cash_paise,
        upi_paise,
        comments,
        created_by,
        created_at
    FROM invoices
"#;

/// Repository for pharmacy invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Validates and stores an invoice, decrementing stock for every line.
    ///
    /// ## Arguments
    /// * `submission` - The operator's bill
    /// * `operator` - Username recorded as `created_by`
    /// * `at` - Server wall-clock time; fixes the invoice date
    ///
    /// ## Returns
    /// * `Ok(InvoiceReceipt)` - Stored; the receipt's amounts are authoritative
    /// * `Err(DbError::Rule(InsufficientStock))` - A line exceeds shelf stock
    /// * `Err(DbError::NotFound)` - A line names a medicine not in the catalog
    pub async fn create(
        &self,
        submission: &InvoiceSubmission,
        operator: &str,
        at: NaiveDateTime,
    ) -> DbResult<InvoiceReceipt> {
        let validated = submission.validate()?;
        let invoice_date = at.date();

        let mut tx = self.pool.begin().await?;

        let uhid = resolve_patient(&mut tx, &submission.patient, at).await?;

        let invoices_today = count_on(&mut tx, invoice_date).await?;
        let invoice_id = ids::invoice_id(invoice_date, invoices_today);

        debug!(invoice_id = %invoice_id, uhid = %uhid, lines = validated.lines.len(), "Creating invoice");

        let totals = validated.totals;
        let payment = validated.payment;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, uhid, patient_name, invoice_date,
                subtotal_paise, discount_paise, final_amount_paise,
                payment_mode, cash_paise, upi_paise,
                comments, created_by, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13
            )
            "#,
        )
        .bind(&invoice_id)
        .bind(&uhid)
        .bind(submission.patient.name.trim())
        .bind(invoice_date)
        .bind(totals.subtotal.paise())
        .bind(totals.discount_applied.paise())
        .bind(totals.final_amount.paise())
        .bind(payment.mode)
        .bind(payment.cash.paise())
        .bind(payment.upi.paise())
        .bind(
            submission
                .comments
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty()),
        )
        .bind(operator)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value(&invoice_id))?;

        let mut running = Money::zero();
        for (index, line) in validated.lines.iter().enumerate() {
            let line_no = index + 1;
            running += line.line_total();

            sqlx::query(
                r#"
                INSERT INTO invoice_lines (
                    sale_line_id, invoice_id, line_no, item_name,
                    quantity, unit_price_paise, line_total_paise, running_total_paise,
                    batch_no, expiry
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(ids::sale_line_id(&invoice_id, line_no))
            .bind(&invoice_id)
            .bind(line_no as i64)
            .bind(line.item_name())
            .bind(line.quantity())
            .bind(line.unit_price().paise())
            .bind(line.line_total().paise())
            .bind(running.paise())
            .bind(line.batch_no())
            .bind(line.expiry())
            .execute(&mut *tx)
            .await?;

            decrement_stock(&mut tx, line.item_name(), line.quantity()).await?;
        }

        tx.commit().await?;

        info!(
            invoice_id = %invoice_id,
            final_amount = %totals.final_amount,
            operator = %operator,
            "Invoice accepted"
        );

        Ok(InvoiceReceipt {
            invoice_id,
            uhid,
            subtotal: totals.subtotal,
            discount: totals.discount_applied,
            final_amount: totals.final_amount,
            cash_amount: payment.cash,
            upi_amount: payment.upi,
        })
    }

    /// Gets an invoice with its lines.
    pub async fn get(&self, invoice_id: &str) -> DbResult<Option<InvoiceWithLines>> {
        let sql = format!("{SELECT_INVOICE} WHERE invoice_id = ?1");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_id.trim())
            .fetch_optional(&self.pool)
            .await?;

        match invoice {
            Some(invoice) => Ok(Some(self.with_lines(invoice).await?)),
            None => Ok(None),
        }
    }

    /// The most recently stored invoice, for reprint.
    pub async fn last(&self) -> DbResult<Option<InvoiceWithLines>> {
        let sql = format!("{SELECT_INVOICE} ORDER BY rowid DESC LIMIT 1");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        match invoice {
            Some(invoice) => Ok(Some(self.with_lines(invoice).await?)),
            None => Ok(None),
        }
    }

    /// Invoices of one day in the order they were issued.
    pub async fn list_on(&self, date: NaiveDate) -> DbResult<Vec<Invoice>> {
        let sql = format!("{SELECT_INVOICE} WHERE invoice_date = ?1 ORDER BY rowid");
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Lines of an invoice in print order.
    pub async fn lines(&self, invoice_id: &str) -> DbResult<Vec<InvoiceLine>> {
        let lines = sqlx::query_as::<_, InvoiceLine>(
            r#"
            SELECT
                sale_line_id,
                invoice_id,
                line_no,
                item_name,
                quantity,
                unit_price_paise,
                line_total_paise,
                running_total_paise,
                batch_no,
                expiry
            FROM invoice_lines
            WHERE invoice_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn with_lines(&self, invoice: Invoice) -> DbResult<InvoiceWithLines> {
        let lines = self.lines(&invoice.invoice_id).await?;
        Ok(InvoiceWithLines { invoice, lines })
    }
}

/// Number of invoices already issued on `date`.
async fn count_on(conn: &mut SqliteConnection, date: NaiveDate) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE invoice_date = ?1")
        .bind(date)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

/// UHID the invoice is filed under.
///
/// ```text
/// uhid given           ──► as given
/// no uhid, phone given ──► register under the next UHID
/// no uhid, no phone    ──► TEMP-YYYYMMDDHHMMSS (no patient row)
/// ```
async fn resolve_patient(
    conn: &mut SqliteConnection,
    patient: &PatientInfo,
    at: NaiveDateTime,
) -> DbResult<String> {
    if let Some(uhid) = patient.given_uhid() {
        return Ok(uhid.to_string());
    }

    let Some(phone) = patient.phone() else {
        return Ok(ids::temp_uhid(at));
    };

    let name = patient.name.trim();
    let uhid = next_uhid(conn, name, at.date()).await?;
    upsert_patient(
        conn,
        &PatientRow {
            uhid: &uhid,
            name,
            phone: Some(phone),
            age: patient.age,
            gender: patient.gender.as_deref().map(str::trim),
            address: None,
        },
        Utc::now(),
    )
    .await?;

    debug!(uhid = %uhid, "Registered walk-in patient from invoice");
    Ok(uhid)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use pharmadesk_core::catalog::NewMedicine;
    use pharmadesk_core::line_item::LineCandidate;
    use pharmadesk_core::{CoreError, PaymentMode};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 5)
            .unwrap()
            .and_hms_opt(11, 30, 0)
            .unwrap()
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (name, stock) in [("Paracetamol", 50), ("Amoxicillin", 3)] {
            db.medicines()
                .insert(&NewMedicine {
                    name: name.to_string(),
                    mrp: Money::from_paise(2000),
                    ptr: Money::from_paise(1500),
                    company: None,
                    medicine_type: "Tablets".to_string(),
                    current_stock: stock,
                })
                .await
                .unwrap();
        }
        db
    }

    fn submission() -> InvoiceSubmission {
        InvoiceSubmission {
            patient: PatientInfo::walk_in("Ravi Kumar"),
            lines: vec![
                LineCandidate::new("Paracetamol", 2, Money::from_paise(1000)),
                LineCandidate::new("Amoxicillin", 3, Money::from_paise(1500)),
            ],
            discount: Money::from_paise(500),
            payment_mode: Some(PaymentMode::Cash),
            cash_amount: Money::zero(),
            upi_amount: Money::zero(),
            comments: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_invoice_end_to_end() {
        let db = seeded().await;

        let receipt = db
            .invoices()
            .create(&submission(), "counter1", at())
            .await
            .unwrap();

        assert_eq!(receipt.invoice_id, "PM2427901");
        assert!(receipt.uhid.starts_with("TEMP-20241005113000"));
        assert_eq!(receipt.subtotal, Money::from_paise(6500));
        assert_eq!(receipt.final_amount, Money::from_paise(6000));
        assert_eq!(receipt.cash_amount, Money::from_paise(6000));
        assert_eq!(receipt.upi_amount, Money::zero());

        let stored = db.invoices().last().await.unwrap().unwrap();
        assert_eq!(stored.invoice.created_by, "counter1");
        assert_eq!(stored.invoice.comments, None);
        assert_eq!(stored.lines.len(), 2);
        assert_eq!(stored.lines[0].sale_line_id, "PM242790101");
        assert_eq!(stored.lines[0].running_total_paise, 2000);
        assert_eq!(stored.lines[1].running_total_paise, 6500);

        let amox = db.medicines().get_by_name("Amoxicillin").await.unwrap().unwrap();
        assert_eq!(amox.current_stock, 0);

        let second = db
            .invoices()
            .create(
                &InvoiceSubmission {
                    lines: vec![LineCandidate::new("Paracetamol", 1, Money::from_paise(1000))],
                    discount: Money::zero(),
                    ..submission()
                },
                "counter1",
                at(),
            )
            .await
            .unwrap();
        assert_eq!(second.invoice_id, "PM2427902");
        assert_eq!(db.invoices().list_on(at().date()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_shortfall_rolls_back_everything() {
        let db = seeded().await;
        let mut bill = submission();
        bill.lines[1].quantity = 4;

        let err = db
            .invoices()
            .create(&bill, "counter1", at())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock {
                available: 3,
                requested: 4
            })
        ));

        assert!(db.invoices().last().await.unwrap().is_none());
        let para = db.medicines().get_by_name("Paracetamol").await.unwrap().unwrap();
        assert_eq!(para.current_stock, 50);
    }

    #[tokio::test]
    async fn test_walk_in_with_phone_is_registered() {
        let db = seeded().await;
        let mut bill = submission();
        bill.patient.phone = Some("9876543210".to_string());

        let receipt = db.invoices().create(&bill, "counter1", at()).await.unwrap();
        assert_eq!(receipt.uhid, "2410R001");

        let patient = db.patients().get("2410R001").await.unwrap().unwrap();
        assert_eq!(patient.name, "Ravi Kumar");
        assert_eq!(patient.phone.as_deref(), Some("9876543210"));
    }

    #[tokio::test]
    async fn test_mismatched_split_rejected_before_any_write() {
        let db = seeded().await;
        let mut bill = submission();
        bill.payment_mode = Some(PaymentMode::Both);
        bill.cash_amount = Money::from_paise(3000);
        bill.upi_amount = Money::from_paise(2000);

        let err = db.invoices().create(&bill, "counter1", at()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::PaymentMismatch { .. })));
        assert!(db.invoices().last().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_medicine_not_found() {
        let db = seeded().await;
        let mut bill = submission();
        bill.lines.push(LineCandidate::new("Crocin", 1, Money::from_paise(100)));

        let err = db.invoices().create(&bill, "counter1", at()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
