//! # Patient Repository
//!
//! Registration desk: patients, their visits, and UHID allocation.
//!
//! ## UHID Allocation
//! ```text
//! name "Ravi Kumar", date 2024-10-05
//!      │
//!      ▼
//! prefix "2410R" ──► COUNT(*) patients WHERE uhid LIKE '2410R%' ──► 6
//!      │
//!      ▼
//! "2410R007"
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use pharmadesk_core::ids;
use pharmadesk_core::patient::{check_visit_payment, PatientRegistration};
use pharmadesk_core::validation::validate_search_query;
use pharmadesk_core::{Patient, PatientSearchField, PatientVisit, ValidationError};

const SELECT_VISIT: &str = r#"
    SELECT
        v.visit_id,
        v.uhid,
        p.name,
        p.phone,
        p.age,
        p.gender,
        v.visit_date,
        v.kind,
        v.procedure_name,
        v.payment_mode,
        v.amount_paid_paise
    FROM visits v
    INNER JOIN patients p ON p.uhid = v.uhid
"#;

/// Repository for patients and visits.
#[derive(Debug, Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

impl PatientRepository {
    /// Creates a new PatientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PatientRepository { pool }
    }

    /// Registers a visit, creating or refreshing the patient record.
    ///
    /// ## What This Does
    /// 1. Validates the form
    /// 2. Uses the given UHID, or allocates the next one for the month
    /// 3. Upserts the patient and inserts the visit in one transaction
    pub async fn register(
        &self,
        registration: &PatientRegistration,
        now: DateTime<Utc>,
    ) -> DbResult<PatientVisit> {
        registration.validate()?;
        check_visit_payment(registration.payment_mode, registration.amount_paid)?;

        let mut tx = self.pool.begin().await?;

        let uhid = match registration.given_uhid() {
            Some(uhid) => uhid.to_string(),
            None => next_uhid(&mut tx, &registration.name, registration.visit_date).await?,
        };

        upsert_patient(
            &mut tx,
            &PatientRow {
                uhid: &uhid,
                name: registration.name.trim(),
                phone: Some(registration.phone.trim()),
                age: Some(registration.age),
                gender: Some(registration.gender.trim()),
                address: registration.address.as_deref().map(str::trim),
            },
            now,
        )
        .await?;

        let visit_id = sqlx::query(
            r#"
            INSERT INTO visits (
                uhid, visit_date, kind, procedure_name,
                payment_mode, amount_paid_paise
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&uhid)
        .bind(registration.visit_date)
        .bind(registration.kind)
        .bind(
            registration
                .procedure_name
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty()),
        )
        .bind(registration.payment_mode)
        .bind(registration.amount_paid.paise())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        info!(uhid = %uhid, visit_id = %visit_id, "Patient visit registered");

        self.visit(visit_id)
            .await?
            .ok_or_else(|| DbError::not_found("Visit", visit_id.to_string()))
    }

    /// Previews the UHID the next registration of `name` on `date` would get.
    pub async fn preview_uhid(&self, name: &str, date: NaiveDate) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        next_uhid(&mut conn, name, date).await
    }

    /// Gets a patient by UHID.
    pub async fn get(&self, uhid: &str) -> DbResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            SELECT uhid, name, phone, age, gender, address, created_at
            FROM patients
            WHERE uhid = ?1
            "#,
        )
        .bind(uhid.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(patient)
    }

    /// Gets one visit by id.
    pub async fn visit(&self, visit_id: i64) -> DbResult<Option<PatientVisit>> {
        let sql = format!("{SELECT_VISIT} WHERE v.visit_id = ?1");
        let visit = sqlx::query_as::<_, PatientVisit>(&sql)
            .bind(visit_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(visit)
    }

    /// Visits registered on `date`, oldest first.
    pub async fn visits_on(&self, date: NaiveDate) -> DbResult<Vec<PatientVisit>> {
        let sql = format!("{SELECT_VISIT} WHERE v.visit_date = ?1 ORDER BY v.visit_id");
        let visits = sqlx::query_as::<_, PatientVisit>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(visits)
    }

    /// Searches visits by one field.
    ///
    /// Name and phone match substrings ignoring case; UHID and date match
    /// exactly. Dates are `YYYY-MM-DD`.
    pub async fn search(
        &self,
        field: PatientSearchField,
        term: &str,
    ) -> DbResult<Vec<PatientVisit>> {
        let term = validate_search_query(term)?;
        if term.is_empty() {
            return Err(ValidationError::required("query").into());
        }

        debug!(field = ?field, term = %term, "Searching patients");

        let (clause, value) = match field {
            PatientSearchField::Name => ("p.name LIKE ?1 ESCAPE '\\'", like_pattern(&term)),
            PatientSearchField::Phone => ("p.phone LIKE ?1 ESCAPE '\\'", like_pattern(&term)),
            PatientSearchField::Uhid => ("v.uhid = ?1 COLLATE NOCASE", term),
            PatientSearchField::Date => {
                let date = NaiveDate::parse_from_str(&term, "%Y-%m-%d")
                    .map_err(|_| ValidationError::invalid_format("date", "expected YYYY-MM-DD"))?;
                ("v.visit_date = ?1", date.format("%Y-%m-%d").to_string())
            }
        };

        let sql = format!(
            "{SELECT_VISIT} WHERE {clause} ORDER BY v.visit_date DESC, v.visit_id DESC LIMIT 200"
        );
        let visits = sqlx::query_as::<_, PatientVisit>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        Ok(visits)
    }
}

// =============================================================================
// Shared helpers (also used by invoice submission)
// =============================================================================

pub(crate) struct PatientRow<'a> {
    pub uhid: &'a str,
    pub name: &'a str,
    pub phone: Option<&'a str>,
    pub age: Option<i64>,
    pub gender: Option<&'a str>,
    pub address: Option<&'a str>,
}

/// Next UHID for `name` in the month of `date`.
pub(crate) async fn next_uhid(
    conn: &mut SqliteConnection,
    name: &str,
    date: NaiveDate,
) -> DbResult<String> {
    let prefix = ids::uhid_prefix(name, date);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients WHERE uhid LIKE ?1")
        .bind(format!("{prefix}%"))
        .fetch_one(&mut *conn)
        .await?;

    Ok(ids::uhid(name, date, count))
}

/// Inserts the patient, or refreshes the details of an existing UHID.
/// Blank optional fields never erase stored values.
pub(crate) async fn upsert_patient(
    conn: &mut SqliteConnection,
    row: &PatientRow<'_>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO patients (uhid, name, phone, age, gender, address, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT (uhid) DO UPDATE SET
            name = excluded.name,
            phone = COALESCE(excluded.phone, patients.phone),
            age = COALESCE(excluded.age, patients.age),
            gender = COALESCE(excluded.gender, patients.gender),
            address = COALESCE(excluded.address, patients.address)
        "#,
    )
    .bind(row.uhid)
    .bind(row.name)
    .bind(row.phone.filter(|p| !p.is_empty()))
    .bind(row.age)
    .bind(row.gender.filter(|g| !g.is_empty()))
    .bind(row.address.filter(|a| !a.is_empty()))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// `%term%` with LIKE wildcards escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// =============================================================================
// Unit Tests
// =============================================================================
