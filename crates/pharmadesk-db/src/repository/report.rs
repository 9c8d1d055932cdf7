//! # Report Repository
//!
//! Stock report: catalog rows joined with the expiry dates of their
//! deliveries, classified by `pharmadesk_core::report`.
//!
//! ```text
//! medicines (filtered) ──┐
//!                        ├──► StockRow::build(medicine, expiries, today)
//! stock_deliveries ──────┘           │
//!   expiry texts by name             ▼
//!                              StockReport { rows, statistics }
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use pharmadesk_core::report::{StockFilter, StockFilterOptions, StockReport, StockRow};
use pharmadesk_core::Medicine;

/// Repository for read-only reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Builds the stock report for `filter` as of `today`.
    pub async fn stock_report(&self, filter: StockFilter, today: NaiveDate) -> DbResult<StockReport> {
        let filter = filter.normalized();

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                id, name, mrp_paise, ptr_paise, company,
                medicine_type, current_stock, last_delivery_date
            FROM medicines
            WHERE 1 = 1
            "#,
        );
        if let Some(name) = filter.medicine {
            builder.push(" AND name = ").push_bind(name);
        }
        if let Some(medicine_type) = filter.medicine_type {
            builder
                .push(" AND medicine_type = ")
                .push_bind(medicine_type)
                .push(" COLLATE NOCASE");
        }
        if let Some(company) = filter.company {
            builder
                .push(" AND company = ")
                .push_bind(company)
                .push(" COLLATE NOCASE");
        }
        builder.push(" ORDER BY name");

        let medicines = builder
            .build_query_as::<Medicine>()
            .fetch_all(&self.pool)
            .await?;

        let expiries = self.expiries_by_medicine().await?;

        let rows: Vec<StockRow> = medicines
            .iter()
            .map(|medicine| {
                let texts = expiries
                    .get(&medicine.name.to_lowercase())
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                StockRow::build(medicine, texts.iter().map(String::as_str), today)
            })
            .collect();

        debug!(rows = rows.len(), "Stock report built");
        Ok(StockReport::new(rows))
    }

    /// Values for the report's filter drop-downs.
    pub async fn filter_options(&self) -> DbResult<StockFilterOptions> {
        let names = sqlx::query_scalar("SELECT name FROM medicines ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        let types = sqlx::query_scalar(
            "SELECT DISTINCT medicine_type FROM medicines WHERE medicine_type <> '' ORDER BY medicine_type",
        )
        .fetch_all(&self.pool)
        .await?;
        let companies = sqlx::query_scalar(
            r#"
            SELECT DISTINCT company FROM medicines
            WHERE company IS NOT NULL AND company <> ''
            ORDER BY company COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(StockFilterOptions {
            names,
            types,
            companies,
        })
    }

    /// Non-empty delivery expiry texts keyed by lower-cased medicine name.
    async fn expiries_by_medicine(&self) -> DbResult<HashMap<String, Vec<String>>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT medicine_name, expiry
            FROM stock_deliveries
            WHERE expiry IS NOT NULL AND TRIM(expiry) <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, expiry) in rows {
            map.entry(name.to_lowercase()).or_default().push(expiry);
        }
        Ok(map)
    }
}
