use std::collections::BTreeMap;

use ledgerport_core::{Account, AccountId, AccountType, StagedImport};
use ledgerport_import::classify::{infer_institution, normalize_label};

use crate::error::LedgerError;
use crate::store::Ledger;

/// Outcome of mapping a staged import onto concrete accounts. Labeled
/// transaction groups (multi-account bank exports) each get their own entry;
/// everything unlabeled lands on the default account.
#[derive(Debug)]
pub struct ResolvedAccounts {
    pub default_account: AccountId,
    by_label: BTreeMap<String, AccountId>,
    pub created: Vec<AccountId>,
}

impl ResolvedAccounts {
    pub fn account_for(&self, label: Option<&str>) -> AccountId {
        label
            .map(normalize_label)
            .filter(|l| !l.is_empty())
            .and_then(|l| self.by_label.get(&l).copied())
            .unwrap_or(self.default_account)
    }
}

/// Map a staged import onto ledger accounts, creating any that do not exist.
///
/// Selection order per group: the caller-selected account when its type
/// matches, then an existing account of the same type whose institution
/// matches the one inferred from the file name, then a fresh account.
/// Liability hints (APR, minimum payment, due day) are promoted into the
/// resolved accounts' loan terms, never over a user-set value.
pub fn resolve_accounts(
    ledger: &mut Ledger,
    staged: &StagedImport,
    account_type: AccountType,
    selected: Option<AccountId>,
) -> Result<ResolvedAccounts, LedgerError> {
    let institution = infer_institution(&staged.source_file_name);
    let mut created = Vec::new();

    let selected = match selected {
        Some(id) => {
            let account = ledger.account(id).ok_or(LedgerError::UnknownAccount(id.0))?;
            if account.account_type == account_type {
                Some(id)
            } else {
                tracing::warn!(
                    account = id.0,
                    selected = %account.account_type,
                    detected = %account_type,
                    "selected account type does not match the statement, falling back"
                );
                None
            }
        }
        None => None,
    };
    let default_account = match selected {
        Some(id) => id,
        None => match find_by_institution(ledger, account_type, institution) {
            Some(id) => id,
            None => {
                let id = create_account(ledger, account_type, institution, None);
                created.push(id);
                id
            }
        },
    };

    // Only checking/savings exports carry trustworthy per-row account labels;
    // card and brokerage files reuse the label column for other things.
    let mut by_label = BTreeMap::new();
    if account_type.allows_label_split() {
        for txn in staged.included_transactions() {
            let Some(raw) = txn.source_account_label.as_deref() else {
                continue;
            };
            let key = normalize_label(raw);
            if key.is_empty() || by_label.contains_key(&key) {
                continue;
            }
            let id = match find_by_label(ledger, account_type, &key) {
                Some(id) => id,
                None => {
                    let id = create_account(ledger, account_type, institution, Some(raw));
                    created.push(id);
                    id
                }
            };
            by_label.insert(key, id);
        }
    }

    if account_type.is_liability() {
        promote_liability_hints(ledger, default_account, staged);
    }

    Ok(ResolvedAccounts {
        default_account,
        by_label,
        created,
    })
}

fn create_account(
    ledger: &mut Ledger,
    account_type: AccountType,
    institution: Option<&'static str>,
    label: Option<&str>,
) -> AccountId {
    let name = match (label, institution) {
        (Some(label), _) => label.to_string(),
        (None, Some(inst)) => format!("{inst} {}", type_label(account_type)),
        (None, None) => type_label(account_type).to_string(),
    };
    let mut account = Account::new(&name, account_type);
    if let Some(inst) = institution {
        account = account.with_institution(inst);
    }
    tracing::info!(name = %account.name, kind = %account_type, "creating account");
    ledger.insert_account(account)
}

fn find_by_institution(
    ledger: &Ledger,
    account_type: AccountType,
    institution: Option<&str>,
) -> Option<AccountId> {
    let institution = institution?;
    let wanted = institution_tokens(institution);
    if wanted.is_empty() {
        return None;
    }
    ledger
        .accounts
        .values()
        .filter(|a| a.account_type == account_type)
        .find(|a| {
            a.institution_name
                .as_deref()
                .is_some_and(|name| tokens_match(&institution_tokens(name), &wanted))
        })
        .and_then(|a| a.id)
}

fn find_by_label(ledger: &Ledger, account_type: AccountType, key: &str) -> Option<AccountId> {
    ledger
        .accounts
        .values()
        .filter(|a| a.account_type == account_type)
        .find(|a| normalize_label(&a.name) == key)
        .and_then(|a| a.id)
}

const CORPORATE_SUFFIXES: &[&str] = &[
    "inc", "incorporated", "llc", "corp", "corporation", "co", "company", "bank", "na",
    "services", "investments", "financial",
];

/// Lowercase word tokens with punctuation and corporate boilerplate removed,
/// so "Chase Bank, N.A." and "chase" compare equal.
fn institution_tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty() && !CORPORATE_SUFFIXES.contains(w))
        .map(str::to_string)
        .collect()
}

fn tokens_match(a: &[String], b: &[String]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.iter().all(|t| b.contains(t)) || b.iter().all(|t| a.contains(t))
}

fn promote_liability_hints(ledger: &mut Ledger, account_id: AccountId, staged: &StagedImport) {
    let detected_apr = staged
        .balances
        .iter()
        .find_map(|b| b.interest_rate_apr.map(|apr| (apr, b.interest_rate_scale)));
    let hints = &staged.liability_hints;
    if detected_apr.is_none() && hints.is_empty() {
        return;
    }

    let Some(account) = ledger.accounts.get_mut(&account_id.0) else {
        return;
    };
    let terms = account.loan_terms.get_or_insert_with(Default::default);
    if let Some((apr, scale)) = detected_apr {
        if !terms.apr_user_set {
            terms.apr = Some(apr);
            terms.apr_scale = scale;
        }
    }
    if let Some(payment) = hints.minimum_payment_cents {
        if !terms.payment_user_set {
            terms.typical_payment_cents = Some(payment);
        }
    }
    if let Some(day) = hints.due_day {
        if terms.due_day.is_none() {
            terms.due_day = Some(day);
        }
    }
}

fn type_label(account_type: AccountType) -> &'static str {
    match account_type {
        AccountType::Checking => "Checking",
        AccountType::Savings => "Savings",
        AccountType::CreditCard => "Credit Card",
        AccountType::Loan => "Loan",
        AccountType::Cash => "Cash",
        AccountType::Brokerage => "Brokerage",
        AccountType::Other => "Account",
    }
}
