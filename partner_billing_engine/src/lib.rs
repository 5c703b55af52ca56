//! Partner Billing Engine
//!
//! The billing engine closes each partner's rolling 30-day accrual windows into invoices, and reconciles
//! asynchronous payment-gateway notifications against those invoices. This library contains the core logic and is
//! transport-agnostic; the HTTP surface lives in the server crate.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]): [`BillingApi`] for fee accrual and window closing, and
//!    [`ReconciliationApi`] for payment attachment and settlement. Backends implement the [`BillingDatabase`] trait
//!    in order to drive these APIs.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when invoices are
//! created or paid, and are the hook point for fire-and-forget collaborators such as partner notifications.
pub mod api;
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use sqlite::{db_url, new_pool, run_migrations, SqliteDatabase};

pub use api::{billing_api::BillingApi, reconciliation_api::ReconciliationApi};
pub use traits::{BillingDatabase, BillingError, BillingRunSummary, BillingWindow};
