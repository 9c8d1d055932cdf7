//! End-to-end tests against the router, driven with `oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use pharmadesk_api::{build_router, ApiConfig, AppState, Clock};
use pharmadesk_core::catalog::NewMedicine;
use pharmadesk_core::Money;
use pharmadesk_db::{Database, DbConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

// =============================================================================
// Harness
// =============================================================================

struct TestApp {
    router: Router,
    db: Database,
}

async fn spawn_app() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.users().create("counter1", "counter-pass", "Counter One").await.unwrap();
    db.users().create("owner", "owner-pass", "Owner").await.unwrap();

    for (name, stock) in [("Paracetamol", 50), ("Amoxicillin", 3)] {
        db.medicines()
            .insert(&NewMedicine {
                name: name.to_string(),
                mrp: Money::from_paise(2000),
                ptr: Money::from_paise(1500),
                company: Some("Cipla".to_string()),
                medicine_type: "Tablets".to_string(),
                current_stock: stock,
            })
            .await
            .unwrap();
    }

    let mut config = ApiConfig::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.auth.bulk_payers = vec!["owner".to_string()];

    let at = NaiveDate::from_ymd_opt(2024, 10, 5)
        .unwrap()
        .and_hms_opt(11, 30, 0)
        .unwrap();
    let state = AppState::new(db.clone(), config).with_clock(Clock::Fixed(at));

    TestApp {
        router: build_router(state),
        db,
    }
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }
}

fn invoice_body(amoxicillin_qty: i64, payment: Value) -> Value {
    let mut body = json!({
        "patient": { "name": "Ravi Kumar" },
        "lines": [
            { "item_name": "Paracetamol", "quantity": 2, "unit_price": 1000 },
            { "item_name": "Amoxicillin", "quantity": amoxicillin_qty, "unit_price": 1500 }
        ],
        "discount": 500
    });
    if let (Some(target), Some(extra)) = (body.as_object_mut(), payment.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    body
}

fn bill_body() -> Value {
    json!({
        "bill_no": "INV/7",
        "bill_date": "2024-10-01",
        "delivery_date": "2024-10-03",
        "agency": "Apex Distributors",
        "bill_amount": 100000,
        "tax_amount": 12000,
        "discount_in_bill": "yes",
        "discount_amount": 5000,
        "lines": [
            {
                "item_name": "Paracetamol",
                "quantity": 10,
                "unit_price": 1800,
                "batch_no": "B12",
                "expiry": "2025-03",
                "catalog_mrp": 2000
            }
        ]
    })
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_login_and_verify() {
    let app = spawn_app().await;
    let token = app.login("counter1", "counter-pass").await;

    let (status, body) = app.call(Method::GET, "/api/auth/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["operator"], "counter1");
    assert_eq!(body["display_name"], "Counter One");

    let (status, _) = app.call(Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_bad_credentials_and_missing_token() {
    let app = spawn_app().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "counter1", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = app.call(Method::GET, "/api/medicines", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.call(Method::GET, "/api/medicines", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Invoices
// =============================================================================

#[tokio::test]
async fn test_invoice_flow() {
    let app = spawn_app().await;
    let token = app.login("counter1", "counter-pass").await;

    let (status, receipt) = app
        .call(
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(invoice_body(3, json!({ "payment_mode": "cash" }))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", receipt);
    assert_eq!(receipt["invoice_id"], "PM2427901");
    assert_eq!(receipt["subtotal"], 6500);
    assert_eq!(receipt["final_amount"], 6000);
    assert_eq!(receipt["cash_amount"], 6000);
    assert_eq!(receipt["upi_amount"], 0);

    let (status, last) = app.call(Method::GET, "/api/invoices/last", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(last["invoice"]["invoice_id"], "PM2427901");

    let (status, stock) = app
        .call(Method::GET, "/api/medicines/stock?name=Amoxicillin", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock["current_stock"], 0);

    let (status, listed) = app.call(Method::GET, "/api/invoices", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invoice_insufficient_stock() {
    let app = spawn_app().await;
    let token = app.login("counter1", "counter-pass").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(invoice_body(4, json!({ "payment_mode": "upi" }))),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    // Nothing was written.
    let stock = app.db.medicines().stock_snapshot("Paracetamol").await.unwrap().unwrap();
    assert_eq!(stock.current_stock, 50);
}

#[tokio::test]
async fn test_invoice_payment_rules() {
    let app = spawn_app().await;
    let token = app.login("counter1", "counter-pass").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(invoice_body(
                1,
                json!({ "payment_mode": "both", "cash_amount": 1000, "upi_amount": 1000 }),
            )),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "PAYMENT_MISMATCH");

    let (status, body) = app
        .call(Method::POST, "/api/invoices", Some(&token), Some(invoice_body(1, json!({}))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, receipt) = app
        .call(
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(invoice_body(
                1,
                json!({ "payment_mode": "both", "cash_amount": 2000, "upi_amount": 1000 }),
            )),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", receipt);
    assert_eq!(receipt["final_amount"], 3000);
}

#[tokio::test]
async fn test_oversized_invoice_line_is_validation_error() {
    let app = spawn_app().await;
    let token = app.login("counter1", "counter-pass").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(invoice_body(i64::MAX / 2, json!({ "payment_mode": "cash" }))),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let mut huge_price = invoice_body(1, json!({ "payment_mode": "cash" }));
    huge_price["lines"][0]["unit_price"] = json!(i64::MAX);
    let (status, body) = app
        .call(Method::POST, "/api/invoices", Some(&token), Some(huge_price))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // The server is still healthy afterwards
    let (status, _) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let app = spawn_app().await;
    let token = app.login("counter1", "counter-pass").await;

    let (status, body) = app
        .call(Method::POST, "/api/invoices", Some(&token), Some(json!({ "lines": "nope" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_medicine_catalog() {
    let app = spawn_app().await;
    let token = app.login("counter1", "counter-pass").await;

    let new_medicine = json!({
        "name": "Paracetamol",
        "mrp": 2000,
        "medicine_type": "Tablets"
    });
    let (status, body) = app
        .call(Method::POST, "/api/medicines", Some(&token), Some(new_medicine))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, details) = app
        .call(Method::GET, "/api/medicines/details?name=Paracetamol", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["mrp_paise"], 2000);

    let (status, body) = app
        .call(Method::GET, "/api/medicines/details?name=Unknown", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let id = app.db.medicines().get_by_name("Paracetamol").await.unwrap().unwrap().id;
    let (status, updated) = app
        .call(
            Method::PUT,
            &format!("/api/medicines/{}/price", id),
            Some(&token),
            Some(json!({ "mrp": 2200 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["mrp_paise"], 2200);
    assert_eq!(updated["ptr_paise"], 1500);
}

// =============================================================================
// Supplier Bills
// =============================================================================

#[tokio::test]
async fn test_supplier_bill_payment_is_one_way() {
    let app = spawn_app().await;
    let token = app.login("counter1", "counter-pass").await;

    let (status, bill) = app
        .call(Method::POST, "/api/supplier-bills", Some(&token), Some(bill_body()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", bill);
    assert_eq!(bill["bill_id"], "INV/7-241001");
    assert_eq!(bill["bill_total_paise"], 107000);
    assert_eq!(bill["payment_status"], "unpaid");

    let (status, detail) = app
        .call(Method::GET, "/api/supplier-bills/INV%2F7-241001", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["deliveries"].as_array().unwrap().len(), 1);

    let (status, paid) = app
        .call(
            Method::POST,
            "/api/supplier-bills/INV%2F7-241001/pay",
            Some(&token),
            Some(json!({ "mode": "bank_transfer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", paid);
    assert_eq!(paid["payment_status"], "paid");
    assert_eq!(paid["amount_paid_paise"], 107000);
    assert_eq!(paid["payment_date"], "2024-10-05");

    let (status, body) = app
        .call(
            Method::POST,
            "/api/supplier-bills/INV%2F7-241001/pay",
            Some(&token),
            Some(json!({ "mode": "cash" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, unpaid) = app.call(Method::GET, "/api/supplier-bills", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(unpaid.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_pay_requires_bulk_payer() {
    let app = spawn_app().await;
    let counter = app.login("counter1", "counter-pass").await;
    let owner = app.login("owner", "owner-pass").await;

    let (status, _) = app
        .call(Method::POST, "/api/supplier-bills", Some(&counter), Some(bill_body()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let request = json!({
        "bill_ids": ["INV/7-241001"],
        "mode": "upi",
        "amount_paid": 107000,
        "payment_date": "2024-10-04"
    });

    let (status, body) = app
        .call(
            Method::POST,
            "/api/supplier-bills/bulk-pay",
            Some(&counter),
            Some(request.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, allocations) = app
        .call(Method::POST, "/api/supplier-bills/bulk-pay", Some(&owner), Some(request))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", allocations);
    assert_eq!(allocations.as_array().unwrap().len(), 1);
    assert_eq!(allocations[0]["bill_id"], "INV/7-241001");
}

// =============================================================================
// Reports & Health
// =============================================================================

#[tokio::test]
async fn test_stock_report() {
    let app = spawn_app().await;
    let token = app.login("counter1", "counter-pass").await;

    let (status, report) = app
        .call(Method::GET, "/api/reports/stock?company=Cipla", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["statistics"]["total_medicines"], 2);
    assert_eq!(report["statistics"]["low_stock_count"], 2);

    let (status, options) = app
        .call(Method::GET, "/api/reports/stock/filters", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(options["companies"], json!(["Cipla"]));
}

#[tokio::test]
async fn test_health_is_open() {
    let app = spawn_app().await;

    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["migrations_total"], body["migrations_applied"]);
}
