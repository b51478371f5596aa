use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Loan,
    Cash,
    Brokerage,
    Other,
}

impl AccountType {
    /// Liability accounts store balances as the amount owed (non-positive).
    pub fn is_liability(self) -> bool {
        matches!(self, AccountType::CreditCard | AccountType::Loan)
    }

    /// Only deposit accounts may be split into multiple accounts by
    /// source label during resolution.
    pub fn allows_label_split(self) -> bool {
        matches!(self, AccountType::Checking | AccountType::Savings)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Checking => write!(f, "checking"),
            AccountType::Savings => write!(f, "savings"),
            AccountType::CreditCard => write!(f, "creditCard"),
            AccountType::Loan => write!(f, "loan"),
            AccountType::Cash => write!(f, "cash"),
            AccountType::Brokerage => write!(f, "brokerage"),
            AccountType::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            "creditCard" => Ok(AccountType::CreditCard),
            "loan" => Ok(AccountType::Loan),
            "cash" => Ok(AccountType::Cash),
            "brokerage" => Ok(AccountType::Brokerage),
            "other" => Ok(AccountType::Other),
            other => Err(format!("Unknown account type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Biweekly,
    Weekly,
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentFrequency::Monthly => write!(f, "monthly"),
            PaymentFrequency::Biweekly => write!(f, "biweekly"),
            PaymentFrequency::Weekly => write!(f, "weekly"),
        }
    }
}

impl std::str::FromStr for PaymentFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(PaymentFrequency::Monthly),
            "biweekly" => Ok(PaymentFrequency::Biweekly),
            "weekly" => Ok(PaymentFrequency::Weekly),
            other => Err(format!("Unknown payment frequency: '{other}'")),
        }
    }
}

/// Terms attached to a liability account, populated either by the user or
/// promoted from values detected during statement classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Annual percentage rate as a fraction (0.2199 = 21.99%).
    pub apr: Option<Decimal>,
    /// Decimal digits of precision the APR was printed with in the source.
    pub apr_scale: Option<u32>,
    pub typical_payment_cents: Option<i64>,
    /// Day of month a payment is due (1–31).
    pub due_day: Option<u32>,
    pub payment_frequency: PaymentFrequency,
    /// True once the user has set the APR by hand; import-detected values
    /// must not overwrite it.
    pub apr_user_set: bool,
    /// Same lock for the typical payment.
    pub payment_user_set: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditCardPaymentMode {
    FullBalance,
    MinimumPayment,
    FixedAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<AccountId>,
    pub name: String,
    pub account_type: AccountType,
    pub institution_name: Option<String>,
    pub currency_code: String,
    pub loan_terms: Option<LoanTerms>,
    pub credit_card_payment_mode: Option<CreditCardPaymentMode>,
}

impl Account {
    pub fn new(name: &str, account_type: AccountType) -> Self {
        Account {
            id: None,
            name: name.to_string(),
            account_type,
            institution_name: None,
            currency_code: "USD".to_string(),
            loan_terms: None,
            credit_card_payment_mode: None,
        }
    }

    pub fn with_institution(mut self, institution: &str) -> Self {
        self.institution_name = Some(institution.to_string());
        self
    }
}
