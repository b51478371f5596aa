pub mod bank_csv;
pub mod brokerage_csv;
pub mod fidelity_csv;
pub mod holdings_csv;
pub mod pdf_summary;
pub mod pdf_transactions;
