use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnKind {
    Bank,
    Fee,
    Interest,
    Transfer,
    Buy,
    Sell,
    Dividend,
    Deposit,
    Withdrawal,
    Adjustment,
}

impl std::fmt::Display for TxnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxnKind::Bank => "bank",
            TxnKind::Fee => "fee",
            TxnKind::Interest => "interest",
            TxnKind::Transfer => "transfer",
            TxnKind::Buy => "buy",
            TxnKind::Sell => "sell",
            TxnKind::Dividend => "dividend",
            TxnKind::Deposit => "deposit",
            TxnKind::Withdrawal => "withdrawal",
            TxnKind::Adjustment => "adjustment",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TxnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank" => Ok(TxnKind::Bank),
            "fee" => Ok(TxnKind::Fee),
            "interest" => Ok(TxnKind::Interest),
            "transfer" => Ok(TxnKind::Transfer),
            "buy" => Ok(TxnKind::Buy),
            "sell" => Ok(TxnKind::Sell),
            "dividend" => Ok(TxnKind::Dividend),
            "deposit" => Ok(TxnKind::Deposit),
            "withdrawal" => Ok(TxnKind::Withdrawal),
            "adjustment" => Ok(TxnKind::Adjustment),
            other => Err(format!("Unknown transaction kind: '{other}'")),
        }
    }
}

/// A persisted ledger transaction.
///
/// Two hashes coexist: `hash_key` is recomputed whenever the visible fields
/// change (user edits included); `import_hash_key` is assigned once at first
/// insert and never touched again — it is the identity used when re-importing
/// into the same batch, which is what lets a user edit a transaction without
/// breaking its match against a later re-import of the same statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date_posted: NaiveDate,
    pub amount_cents: i64,
    pub payee: String,
    pub memo: Option<String>,
    pub kind: TxnKind,
    pub external_id: Option<String>,
    pub symbol: Option<String>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub fees_cents: Option<i64>,
    pub hash_key: String,
    pub import_hash_key: Option<String>,
    pub account: AccountId,
    pub import_batch: Option<i64>,
    pub linked_transaction_id: Option<i64>,
    pub is_user_created: bool,
    pub is_user_edited: bool,
    pub is_excluded: bool,
    /// Set once any user edit has occurred; gates overwrite during re-import.
    pub is_user_modified: bool,
    /// Audit trail, captured once on the first user edit.
    pub original_amount_cents: Option<i64>,
    pub original_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub id: i64,
    pub as_of_date: NaiveDate,
    pub balance_cents: i64,
    /// APR as a fraction (0.0525 = 5.25%).
    pub interest_rate_apr: Option<Decimal>,
    pub interest_rate_scale: Option<u32>,
    pub account: AccountId,
    pub import_batch: Option<i64>,
    pub is_user_created: bool,
    pub is_excluded: bool,
    pub is_user_modified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingSnapshot {
    pub id: i64,
    pub as_of_date: NaiveDate,
    pub symbol: String,
    pub quantity: Decimal,
    pub market_value_cents: Option<i64>,
    pub account: AccountId,
    pub import_batch: Option<i64>,
    pub is_user_modified: bool,
}

/// The set of entities produced by one import action, trackable and
/// revocable as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub source_file_name: String,
    pub parser_id: Option<String>,
}
