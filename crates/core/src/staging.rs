use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountType;
use super::entity::TxnKind;

/// A parsed transaction awaiting review. Ephemeral — lives only between
/// parse and commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedTransaction {
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
    /// Raw account label as it appeared in the document ("Visa Signature").
    pub source_account_label: Option<String>,
    pub include: bool,
}

impl StagedTransaction {
    pub fn new(date_posted: NaiveDate, amount_cents: i64, payee: &str) -> Self {
        StagedTransaction {
            date_posted,
            amount_cents,
            payee: payee.to_string(),
            memo: None,
            kind: TxnKind::Bank,
            external_id: None,
            symbol: None,
            quantity: None,
            price: None,
            fees_cents: None,
            source_account_label: None,
            include: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedBalance {
    pub as_of_date: NaiveDate,
    pub balance_cents: i64,
    pub interest_rate_apr: Option<Decimal>,
    /// Decimal digits of precision the rate was printed with.
    pub interest_rate_scale: Option<u32>,
    pub source_account_label: Option<String>,
    pub include: bool,
}

impl StagedBalance {
    pub fn new(as_of_date: NaiveDate, balance_cents: i64) -> Self {
        StagedBalance {
            as_of_date,
            balance_cents,
            interest_rate_apr: None,
            interest_rate_scale: None,
            source_account_label: None,
            include: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedHolding {
    pub as_of_date: NaiveDate,
    pub symbol: String,
    pub quantity: Decimal,
    pub market_value_cents: Option<i64>,
    pub include: bool,
}

/// Liability terms detected during classification, carried alongside the
/// staged entities so resolution can promote them into the account's loan
/// terms (never over a user-set value).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiabilityHints {
    pub minimum_payment_cents: Option<i64>,
    pub due_day: Option<u32>,
}

impl LiabilityHints {
    pub fn is_empty(&self) -> bool {
        self.minimum_payment_cents.is_none() && self.due_day.is_none()
    }
}

/// The canonical intermediate representation of one parsed statement,
/// decoupled from persistent storage. One per user-initiated import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedImport {
    pub parser_id: String,
    pub source_file_name: String,
    pub suggested_account_type: Option<AccountType>,
    pub transactions: Vec<StagedTransaction>,
    pub balances: Vec<StagedBalance>,
    pub holdings: Vec<StagedHolding>,
    pub liability_hints: LiabilityHints,
}

impl StagedImport {
    pub fn new(parser_id: &str, source_file_name: &str) -> Self {
        StagedImport {
            parser_id: parser_id.to_string(),
            source_file_name: source_file_name.to_string(),
            suggested_account_type: None,
            transactions: Vec::new(),
            balances: Vec::new(),
            holdings: Vec::new(),
            liability_hints: LiabilityHints::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.balances.is_empty() && self.holdings.is_empty()
    }

    /// Staged transactions the user has left included.
    pub fn included_transactions(&self) -> impl Iterator<Item = &StagedTransaction> {
        self.transactions.iter().filter(|t| t.include)
    }

    pub fn included_balances(&self) -> impl Iterator<Item = &StagedBalance> {
        self.balances.iter().filter(|b| b.include)
    }

    pub fn included_holdings(&self) -> impl Iterator<Item = &StagedHolding> {
        self.holdings.iter().filter(|h| h.include)
    }
}
