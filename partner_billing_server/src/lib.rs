//! # Partner Billing Server
//! This module hosts the HTTP surface of the partner billing gateway. It is responsible for:
//! Listening for incoming payment webhook notifications from the payment gateway.
//! Reconciling those notifications against open invoices via the billing engine.
//! Hosting the daily billing worker that closes partner accrual windows into invoices.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/payment`: The webhook route for receiving payment events from the gateway.
//! * `/partners`, `/partners/{id}/fees`, `/partners/{id}/invoices`: integration routes for the platform.
//! * `/partners/{id}/invoices/{invoice_id}/payment`: attaches gateway payment details to a pending invoice.
//! * `/billing/run`: triggers one billing cycle immediately and returns the run summary.

pub mod billing_worker;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
