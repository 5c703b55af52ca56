pub mod billing_window;

pub use billing_window::{resolve_billing_window, ACCRUAL_WINDOW};
