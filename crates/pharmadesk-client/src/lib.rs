//! # pharmadesk-client: Operator-Side Network Layer
//!
//! Everything the counter and store-room screens need to reach the
//! PharmaDesk API: an explicit session, typed calls and the HTTP
//! implementation of [`InvoiceGateway`](pharmadesk_core::draft::InvoiceGateway).
//!
//! ## Wiring at Process Start
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   let session = SessionContext::new(|| show_login_screen());            │
//! │   let config  = ClientConfig::from_env()?;                              │
//! │   let client  = PharmacyClient::new(&config, session.clone())?;         │
//! │                                                                         │
//! │   client.login("counter1", "…").await?;                                 │
//! │   let snap = client.stock_snapshot("Dolo 650").await?;                  │
//! │   draft.add_line(candidate, Some(&snap))?;                              │
//! │   let receipt = draft.submit(&client).await?;                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`] - Token, operator and invalidation callback
//! - [`client`] - `PharmacyClient` and its `InvoiceGateway` impl
//! - [`config`] - Base URL and timeout
//! - [`error`] - `ClientError`

pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use client::PharmacyClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use session::SessionContext;
