pub mod fees;
pub mod invoices;
pub mod partners;
