pub mod account;
pub mod entity;
pub mod parse;
pub mod staging;

pub use account::{Account, AccountId, AccountType, CreditCardPaymentMode, LoanTerms, PaymentFrequency};
pub use entity::{BalanceSnapshot, HoldingSnapshot, ImportBatch, Transaction, TxnKind};
pub use parse::{parse_amount_cents, parse_date, parse_quantity, ParseError};
pub use staging::{LiabilityHints, StagedBalance, StagedHolding, StagedImport, StagedTransaction};
