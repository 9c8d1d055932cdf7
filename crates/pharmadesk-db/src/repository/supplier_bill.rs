//! # Supplier Bill Repository
//!
//! Inbound purchases: bill entry with stock deliveries, listing, and the
//! unpaid → paid transition (single and bulk).
//!
//! ## Bill Entry Transaction
//! ```text
//! BEGIN
//!   INSERT supplier_bills            status = 'unpaid'
//!   for each line:
//!     INSERT stock_deliveries        price_difference = MRP − unit price
//!     increment_stock                + qty, last_delivery_date
//! COMMIT
//! ```
//!
//! ## Payment Guard
//! ```text
//! UPDATE supplier_bills SET payment_status = 'paid', ...
//! WHERE bill_id = ?1 AND payment_status = 'unpaid'
//!
//! 0 rows ──► bill exists? BillAlreadyPaid : NotFound
//! ```

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::medicine::increment_stock;
use crate::error::{DbError, DbResult};
use pharmadesk_core::supplier_bill::{
    mark_paid, plan_bulk_payment, BulkAllocation, BulkPaymentRequest, MarkPaidRequest,
    SupplierBillSubmission,
};
use pharmadesk_core::{
    BillStatusFilter, CoreError, PaymentStatus, StockDelivery, SupplierBill, SupplierPaymentMode,
};

const SELECT_BILL: &str = r#"
    SELECT
        bill_id,
        bill_no,
        bill_date,
        delivery_date,
        agency,
        bill_amount_paise,
        tax_amount_paise,
        discount_in_bill,
        discount_amount_paise,
        discount_bps,
        bill_total_paise,
        payment_status,
        payment_date,
        payment_mode,
        amount_paid_paise,
        transaction_details
    FROM supplier_bills
"#;

/// Filters for the supplier bill list. Dates apply to the bill date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillQuery {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub status: BillStatusFilter,
}

/// Repository for supplier bills and their payments.
#[derive(Debug, Clone)]
pub struct SupplierBillRepository {
    pool: SqlitePool,
}

impl SupplierBillRepository {
    /// Creates a new SupplierBillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierBillRepository { pool }
    }

    /// Records a supplier bill and receives its lines into stock.
    ///
    /// ## Returns
    /// * `Ok(SupplierBill)` - Stored, `Unpaid`
    /// * `Err(DbError::UniqueViolation)` - Same bill number and date already entered
    /// * `Err(DbError::NotFound)` - A line names a medicine not in the catalog
    /// * `Err(DbError::Rule)` - Invalid input, or a delivery would push stock past `MAX_STOCK`
    pub async fn create(&self, submission: &SupplierBillSubmission) -> DbResult<SupplierBill> {
        let lines = submission.validate()?;
        let bill_id = submission.bill_id();

        debug!(bill_id = %bill_id, lines = lines.len(), "Entering supplier bill");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO supplier_bills (
                bill_id, bill_no, bill_date, delivery_date, agency,
                bill_amount_paise, tax_amount_paise,
                discount_in_bill, discount_amount_paise, discount_bps,
                bill_total_paise, payment_status, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13
            )
            "#,
        )
        .bind(&bill_id)
        .bind(submission.bill_no.trim())
        .bind(submission.bill_date)
        .bind(submission.delivery_date)
        .bind(submission.agency.trim())
        .bind(submission.bill_amount.paise())
        .bind(submission.tax_amount.paise())
        .bind(submission.discount_in_bill)
        .bind(submission.discount_amount.paise())
        .bind(submission.discount_bps())
        .bind(submission.bill_total().paise())
        .bind(PaymentStatus::Unpaid)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value(&bill_id))?;

        for item in lines.iter() {
            let line = item.line();
            sqlx::query(
                r#"
                INSERT INTO stock_deliveries (
                    bill_id, medicine_name, quantity, batch_no, expiry,
                    unit_price_paise, mrp_paise, price_difference_paise, delivery_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&bill_id)
            .bind(line.item_name())
            .bind(line.quantity())
            .bind(line.batch_no())
            .bind(line.expiry())
            .bind(line.unit_price().paise())
            .bind(item.catalog_mrp().paise())
            .bind(item.price_difference().paise())
            .bind(submission.delivery_date)
            .execute(&mut *tx)
            .await?;

            increment_stock(
                &mut tx,
                line.item_name(),
                line.quantity(),
                submission.delivery_date,
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            bill_id = %bill_id,
            agency = %submission.agency.trim(),
            bill_total = %submission.bill_total(),
            "Supplier bill entered"
        );

        self.get(&bill_id)
            .await?
            .ok_or_else(|| DbError::not_found("SupplierBill", &bill_id))
    }

    /// Gets a bill by id.
    pub async fn get(&self, bill_id: &str) -> DbResult<Option<SupplierBill>> {
        let mut conn = self.pool.acquire().await?;
        fetch_bill(&mut conn, bill_id).await
    }

    /// Lists bills, newest bill date first.
    pub async fn list(&self, query: &BillQuery) -> DbResult<Vec<SupplierBill>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_BILL);
        builder.push(" WHERE 1 = 1");

        if let Some(status) = query.status.status() {
            builder.push(" AND payment_status = ").push_bind(status);
        }
        if let Some(from) = query.date_from {
            builder.push(" AND bill_date >= ").push_bind(from);
        }
        if let Some(to) = query.date_to {
            builder.push(" AND bill_date <= ").push_bind(to);
        }
        if let Some(agency) = query
            .agency
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
        {
            builder
                .push(" AND agency = ")
                .push_bind(agency.to_string())
                .push(" COLLATE NOCASE");
        }
        builder.push(" ORDER BY bill_date DESC, bill_id");

        let bills = builder
            .build_query_as::<SupplierBill>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = bills.len(), "Listed supplier bills");
        Ok(bills)
    }

    /// Delivery lines of one bill in entry order.
    pub async fn deliveries(&self, bill_id: &str) -> DbResult<Vec<StockDelivery>> {
        let deliveries = sqlx::query_as::<_, StockDelivery>(
            r#"
            SELECT
                id,
                bill_id,
                medicine_name,
                quantity,
                batch_no,
                expiry,
                unit_price_paise,
                mrp_paise,
                price_difference_paise,
                delivery_date
            FROM stock_deliveries
            WHERE bill_id = ?1
            ORDER BY id
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(deliveries)
    }

    /// Distinct agencies on file.
    pub async fn agencies(&self) -> DbResult<Vec<String>> {
        let agencies = sqlx::query_scalar(
            "SELECT DISTINCT agency FROM supplier_bills ORDER BY agency COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(agencies)
    }

    /// Marks one bill paid. `today` is the server's date.
    ///
    /// ## Returns
    /// * `Ok(SupplierBill)` - Bill after the transition
    /// * `Err(DbError::Rule(BillAlreadyPaid))` - Not `Unpaid` any more
    /// * `Err(DbError::NotFound)` - Unknown bill id
    pub async fn mark_paid(
        &self,
        bill_id: &str,
        request: &MarkPaidRequest,
        today: NaiveDate,
    ) -> DbResult<SupplierBill> {
        let mut conn = self.pool.acquire().await?;
        let bill = fetch_bill(&mut conn, bill_id)
            .await?
            .ok_or_else(|| DbError::not_found("SupplierBill", bill_id))?;

        let record = mark_paid(&bill, request, today)?;

        guarded_pay(
            &mut conn,
            &record.bill_id,
            record.payment_date,
            record.mode,
            record.amount_paid.paise(),
            &record.transaction_details,
        )
        .await?;

        info!(
            bill_id = %record.bill_id,
            mode = %record.mode,
            amount_paid = %record.amount_paid,
            "Supplier bill paid"
        );

        fetch_bill(&mut conn, bill_id)
            .await?
            .ok_or_else(|| DbError::not_found("SupplierBill", bill_id))
    }

    /// Settles several bills with one payment, all or nothing.
    pub async fn bulk_pay(&self, request: &BulkPaymentRequest) -> DbResult<Vec<BulkAllocation>> {
        let mut ids: Vec<&str> = Vec::with_capacity(request.bill_ids.len());
        for id in request.bill_ids.iter().map(|id| id.trim()) {
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut tx = self.pool.begin().await?;

        let mut bills = Vec::with_capacity(ids.len());
        for id in &ids {
            let bill = fetch_bill(&mut tx, id)
                .await?
                .ok_or_else(|| DbError::not_found("SupplierBill", *id))?;
            bills.push(bill);
        }

        let allocations = plan_bulk_payment(
            &bills,
            request.discount_bps,
            request.amount_paid,
            request.transaction_details.as_deref().unwrap_or_default(),
        )?;

        for allocation in &allocations {
            guarded_pay(
                &mut tx,
                &allocation.bill_id,
                request.payment_date,
                request.mode,
                allocation.amount_paid.paise(),
                &allocation.transaction_details,
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            bills = allocations.len(),
            amount_paid = %request.amount_paid,
            discount_bps = request.discount_bps,
            "Bulk supplier payment recorded"
        );

        Ok(allocations)
    }
}

async fn fetch_bill(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<Option<SupplierBill>> {
    let sql = format!("{SELECT_BILL} WHERE bill_id = ?1");
    let bill = sqlx::query_as::<_, SupplierBill>(&sql)
        .bind(bill_id.trim())
        .fetch_optional(&mut *conn)
        .await?;

    Ok(bill)
}

/// The unpaid → paid UPDATE. Never touches a paid bill.
async fn guarded_pay(
    conn: &mut SqliteConnection,
    bill_id: &str,
    payment_date: NaiveDate,
    mode: SupplierPaymentMode,
    amount_paid_paise: i64,
    transaction_details: &str,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE supplier_bills SET
            payment_status = 'paid',
            payment_date = ?2,
            payment_mode = ?3,
            amount_paid_paise = ?4,
            transaction_details = ?5
        WHERE bill_id = ?1 AND payment_status = 'unpaid'
        "#,
    )
    .bind(bill_id)
    .bind(payment_date)
    .bind(mode)
    .bind(amount_paid_paise)
    .bind(transaction_details)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return match fetch_bill(conn, bill_id).await? {
            Some(_) => Err(CoreError::BillAlreadyPaid {
                bill_id: bill_id.to_string(),
            }
            .into()),
            None => Err(DbError::not_found("SupplierBill", bill_id)),
        };
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
