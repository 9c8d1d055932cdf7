//! # Pharmacy Client
//!
//! Typed calls to the PharmaDesk REST API.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Flow                                    │
//! │                                                                         │
//! │   PharmacyClient::stock_snapshot("Dolo 650")                            │
//! │        │                                                                │
//! │        ├── session.token() ── None ──► NotAuthenticated (nothing sent)  │
//! │        ▼                                                                │
//! │   GET /api/medicines/stock?name=Dolo%20650   (Bearer token)             │
//! │        │                                                                │
//! │        ├── 2xx + JSON body      ──► Ok(StockSnapshot)                   │
//! │        ├── 401                  ──► session.invalidate(), Unauthorized  │
//! │        ├── other 4xx            ──► Api { status, code, message }       │
//! │        ├── 5xx                  ──► Transport                           │
//! │        └── no answer / timeout  ──► Transport                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no automatic retry. A failed call is reported and the operator
//! decides.

use pharmadesk_core::catalog::PriceUpdate;
use pharmadesk_core::draft::{GatewayError, InvoiceGateway, InvoiceReceipt, InvoiceSubmission};
use pharmadesk_core::stock::StockSnapshot;
use pharmadesk_core::supplier_bill::{MarkPaidRequest, SupplierBillSubmission};
use pharmadesk_core::{InvoiceWithLines, Medicine, MedicineDetails, SupplierBill};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionContext;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    operator: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    operator: String,
}

/// The server's error body: `{ "code": "...", "message": "..." }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Anonymous,
    Bearer,
}

// =============================================================================
// Pharmacy Client
// =============================================================================

/// HTTP client bound to one [`SessionContext`].
#[derive(Debug, Clone)]
pub struct PharmacyClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionContext,
}

impl PharmacyClient {
    /// Builds the HTTP client from `config`.
    pub fn new(config: &ClientConfig, session: SessionContext) -> ClientResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(PharmacyClient {
            http,
            base_url: config.base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Logs in and stores the token in the session.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<String> {
        let url = self.endpoint(&["api", "auth", "login"])?;
        let request = self
            .http
            .post(url)
            .json(&LoginRequest { username, password });

        let response: LoginResponse = self.send_json(request, Auth::Anonymous).await?;
        self.session
            .establish(response.token, response.operator.clone())
            .await;

        Ok(response.operator)
    }

    /// Confirms the token is still accepted and returns the operator.
    pub async fn verify(&self) -> ClientResult<String> {
        let request = self.request(Method::GET, &["api", "auth", "verify"])?;
        let response: VerifyResponse = self.send_json(request, Auth::Bearer).await?;
        Ok(response.operator)
    }

    /// Tells the server and forgets the token. The local session is cleared
    /// even when the server cannot be reached.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = match self.request(Method::POST, &["api", "auth", "logout"]) {
            Ok(request) => self.send(request, Auth::Bearer).await.map(drop),
            Err(e) => Err(e),
        };
        self.session.clear().await;
        result
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Price, stock, type and latest batch for one medicine.
    pub async fn medicine_details(&self, name: &str) -> ClientResult<MedicineDetails> {
        let request = self
            .request(Method::GET, &["api", "medicines", "details"])?
            .query(&[("name", name)]);
        self.send_json(request, Auth::Bearer).await
    }

    /// The stock reading the draft validates quantities against.
    pub async fn stock_snapshot(&self, name: &str) -> ClientResult<StockSnapshot> {
        let request = self
            .request(Method::GET, &["api", "medicines", "stock"])?
            .query(&[("name", name)]);
        self.send_json(request, Auth::Bearer).await
    }

    /// Updates MRP and/or PTR. Only a confirmed server answer is success.
    pub async fn update_price(&self, medicine_id: i64, update: &PriceUpdate) -> ClientResult<Medicine> {
        let id = medicine_id.to_string();
        let request = self
            .request(Method::PUT, &["api", "medicines", &id, "price"])?
            .json(update);
        self.send_json(request, Auth::Bearer).await
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Posts an invoice. Prefer `BillDraft::submit`, which goes through
    /// the [`InvoiceGateway`] impl below.
    pub async fn create_invoice(&self, submission: &InvoiceSubmission) -> ClientResult<InvoiceReceipt> {
        let request = self
            .request(Method::POST, &["api", "invoices"])?
            .json(submission);
        self.send_json(request, Auth::Bearer).await
    }

    /// The most recent invoice, for reprint. `None` when there is none yet.
    pub async fn last_invoice(&self) -> ClientResult<Option<InvoiceWithLines>> {
        let request = self.request(Method::GET, &["api", "invoices", "last"])?;
        match self.send_json(request, Auth::Bearer).await {
            Ok(invoice) => Ok(Some(invoice)),
            Err(ClientError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Supplier Bills
    // =========================================================================

    pub async fn submit_supplier_bill(
        &self,
        submission: &SupplierBillSubmission,
    ) -> ClientResult<SupplierBill> {
        let request = self
            .request(Method::POST, &["api", "supplier-bills"])?
            .json(submission);
        self.send_json(request, Auth::Bearer).await
    }

    /// Moves one bill from unpaid to paid. The server sets the date.
    pub async fn mark_bill_paid(
        &self,
        bill_id: &str,
        payment: &MarkPaidRequest,
    ) -> ClientResult<SupplierBill> {
        let request = self
            .request(Method::POST, &["api", "supplier-bills", bill_id, "pay"])?
            .json(payment);
        self.send_json(request, Auth::Bearer).await
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ClientResult<RequestBuilder> {
        Ok(self.http.request(method, self.endpoint(segments)?))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, auth: Auth) -> ClientResult<T> {
        let response = self.send(request, auth).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Sends and sorts the answer into success or a [`ClientError`].
    async fn send(&self, request: RequestBuilder, auth: Auth) -> ClientResult<Response> {
        let request = match auth {
            Auth::Anonymous => request,
            Auth::Bearer => {
                let token = self
                    .session
                    .token()
                    .await
                    .ok_or(ClientError::NotAuthenticated)?;
                request.bearer_auth(token)
            }
        };

        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(method = %method, path = %path, "Sending request");

        let response = self.http.execute(request).await.map_err(|e| {
            warn!(method = %method, path = %path, error = %e, "Request failed");
            ClientError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) => (err.code, err.message),
            Err(_) => (
                status.canonical_reason().unwrap_or("ERROR").to_uppercase(),
                body,
            ),
        };
        warn!(method = %method, path = %path, status = status.as_u16(), code = %code, "Request rejected");

        if status == StatusCode::UNAUTHORIZED {
            if auth == Auth::Bearer {
                self.session.invalidate().await;
            }
            return Err(ClientError::Unauthorized(message));
        }

        if status.is_server_error() {
            return Err(ClientError::Transport(format!("server error {}: {}", status.as_u16(), message)));
        }

        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

// =============================================================================
// Invoice Gateway
// =============================================================================

impl InvoiceGateway for PharmacyClient {
    async fn submit_invoice(
        &self,
        submission: &InvoiceSubmission,
    ) -> Result<InvoiceReceipt, GatewayError> {
        self.create_invoice(submission).await.map_err(GatewayError::from)
    }
}
