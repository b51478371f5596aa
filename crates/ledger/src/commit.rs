use chrono::{DateTime, Utc};
use std::collections::HashSet;

use ledgerport_core::{
    BalanceSnapshot, HoldingSnapshot, ImportBatch, StagedImport, Transaction,
};

use crate::events::{push_unique, ChangeEvent};
use crate::fingerprint::staged_fingerprint;
use crate::resolve::ResolvedAccounts;
use crate::store::Ledger;

#[derive(Debug)]
pub struct CommitOutcome {
    pub batch_id: i64,
    pub inserted_transactions: Vec<i64>,
    pub inserted_balances: usize,
    pub inserted_holdings: usize,
    pub skipped_duplicates: usize,
    pub events: Vec<ChangeEvent>,
}

/// First-time commit of a staged import. Creates the batch, dedup-inserts
/// transactions per account, and inserts balance and holding snapshots unless
/// the target date(s) are already covered.
///
/// Duplicate detection compares the staged fingerprint against every existing
/// transaction's `import_hash_key` (falling back to `hash_key` for rows that
/// predate it) within the destination account only. The same coffee purchase
/// in two different accounts is two transactions.
pub fn commit_import(
    ledger: &mut Ledger,
    staged: &StagedImport,
    resolved: &ResolvedAccounts,
    now: DateTime<Utc>,
) -> CommitOutcome {
    let batch_id = ledger.allocate_id();
    ledger.insert_batch(ImportBatch {
        id: batch_id,
        created_at: now,
        source_file_name: staged.source_file_name.clone(),
        parser_id: Some(staged.parser_id.clone()),
    });

    let mut outcome = CommitOutcome {
        batch_id,
        inserted_transactions: Vec::new(),
        inserted_balances: 0,
        inserted_holdings: 0,
        skipped_duplicates: 0,
        events: Vec::new(),
    };

    // Fingerprints inserted during this very commit also count as seen, so a
    // statement that repeats a row verbatim only lands once.
    let mut seen: HashSet<(i64, String)> = ledger
        .transactions
        .values()
        .map(|t| {
            let key = t.import_hash_key.clone().unwrap_or_else(|| t.hash_key.clone());
            (t.account.0, key)
        })
        .collect();

    for staged_txn in staged.included_transactions() {
        let account = resolved.account_for(staged_txn.source_account_label.as_deref());
        let fp = staged_fingerprint(staged_txn);
        if !seen.insert((account.0, fp.clone())) {
            outcome.skipped_duplicates += 1;
            continue;
        }
        let id = ledger.allocate_id();
        ledger.insert_transaction(Transaction {
            id,
            date_posted: staged_txn.date_posted,
            amount_cents: staged_txn.amount_cents,
            payee: staged_txn.payee.clone(),
            memo: staged_txn.memo.clone(),
            kind: staged_txn.kind,
            external_id: staged_txn.external_id.clone(),
            symbol: staged_txn.symbol.clone(),
            quantity: staged_txn.quantity,
            price: staged_txn.price,
            fees_cents: staged_txn.fees_cents,
            hash_key: fp.clone(),
            import_hash_key: Some(fp),
            account,
            import_batch: Some(batch_id),
            linked_transaction_id: None,
            is_user_created: false,
            is_user_edited: false,
            is_excluded: false,
            is_user_modified: false,
            original_amount_cents: None,
            original_date: None,
        });
        outcome.inserted_transactions.push(id);
    }

    for staged_balance in staged.included_balances() {
        let account = resolved.account_for(staged_balance.source_account_label.as_deref());
        if ledger.has_balance_on(account, staged_balance.as_of_date) {
            continue;
        }
        let is_liability = ledger_is_liability(ledger, account);
        let id = ledger.allocate_id();
        ledger.insert_balance(BalanceSnapshot {
            id,
            as_of_date: staged_balance.as_of_date,
            balance_cents: coerce_sign(is_liability, staged_balance.balance_cents),
            interest_rate_apr: staged_balance.interest_rate_apr,
            interest_rate_scale: staged_balance.interest_rate_scale,
            account,
            import_batch: Some(batch_id),
            is_user_created: false,
            is_excluded: false,
            is_user_modified: false,
        });
        outcome.inserted_balances += 1;
    }

    for staged_holding in staged.included_holdings() {
        let account = resolved.default_account;
        if ledger.has_holding_on(account, &staged_holding.symbol, staged_holding.as_of_date) {
            continue;
        }
        let id = ledger.allocate_id();
        ledger.insert_holding(HoldingSnapshot {
            id,
            as_of_date: staged_holding.as_of_date,
            symbol: staged_holding.symbol.clone(),
            quantity: staged_holding.quantity,
            market_value_cents: staged_holding.market_value_cents,
            account,
            import_batch: Some(batch_id),
            is_user_modified: false,
        });
        outcome.inserted_holdings += 1;
    }

    if !outcome.inserted_transactions.is_empty()
        || outcome.inserted_balances > 0
        || outcome.inserted_holdings > 0
    {
        push_unique(&mut outcome.events, ChangeEvent::TransactionsChanged);
    }
    if !resolved.created.is_empty() {
        push_unique(&mut outcome.events, ChangeEvent::AccountsChanged);
    }

    tracing::info!(
        batch = batch_id,
        transactions = outcome.inserted_transactions.len(),
        balances = outcome.inserted_balances,
        holdings = outcome.inserted_holdings,
        duplicates = outcome.skipped_duplicates,
        "committed import"
    );
    outcome
}

/// Balances on liability accounts are stored as what is owed: never positive.
pub(crate) fn coerce_sign(is_liability: bool, balance_cents: i64) -> i64 {
    if is_liability {
        -balance_cents.abs()
    } else {
        balance_cents
    }
}

pub(crate) fn ledger_is_liability(ledger: &Ledger, account: ledgerport_core::AccountId) -> bool {
    ledger
        .account(account)
        .map(|a| a.account_type.is_liability())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_accounts;
    use chrono::NaiveDate;
    use ledgerport_core::{AccountType, StagedBalance, StagedHolding, StagedTransaction};
    use rust_decimal::Decimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn bank_staged() -> StagedImport {
        let mut staged = StagedImport::new("bank-csv", "chase-checking.csv");
        staged
            .transactions
            .push(StagedTransaction::new(date(15), -450, "Coffee Shop"));
        staged
            .transactions
            .push(StagedTransaction::new(date(16), 125_000, "Payroll"));
        staged
    }

    fn commit_bank(ledger: &mut Ledger, staged: &StagedImport) -> CommitOutcome {
        let resolved = resolve_accounts(ledger, staged, AccountType::Checking, None).unwrap();
        commit_import(ledger, staged, &resolved, now())
    }

    #[test]
    fn first_commit_inserts_everything() {
        let mut ledger = Ledger::new();
        let outcome = commit_bank(&mut ledger, &bank_staged());
        assert_eq!(outcome.inserted_transactions.len(), 2);
        assert_eq!(outcome.skipped_duplicates, 0);
        assert!(outcome.events.contains(&ChangeEvent::TransactionsChanged));
        assert!(outcome.events.contains(&ChangeEvent::AccountsChanged));
        assert!(ledger.batches.contains_key(&outcome.batch_id));
    }

    #[test]
    fn reimport_is_idempotent() {
        let mut ledger = Ledger::new();
        let staged = bank_staged();
        commit_bank(&mut ledger, &staged);
        let second = commit_bank(&mut ledger, &staged);
        assert_eq!(second.inserted_transactions.len(), 0);
        assert_eq!(second.skipped_duplicates, 2);
        assert_eq!(ledger.transactions.len(), 2);
    }

    #[test]
    fn dedup_is_per_account_not_global() {
        let mut ledger = Ledger::new();
        let staged = bank_staged();
        commit_bank(&mut ledger, &staged);

        // The identical rows aimed at a different institution's account insert.
        let mut other = bank_staged();
        other.source_file_name = "ally-checking.csv".to_string();
        let outcome = commit_bank(&mut ledger, &other);
        assert_eq!(outcome.inserted_transactions.len(), 2);
        assert_eq!(ledger.transactions.len(), 4);
    }

    #[test]
    fn repeated_row_within_one_statement_inserts_once() {
        let mut ledger = Ledger::new();
        let mut staged = bank_staged();
        staged
            .transactions
            .push(StagedTransaction::new(date(15), -450, "Coffee Shop"));
        let outcome = commit_bank(&mut ledger, &staged);
        assert_eq!(outcome.inserted_transactions.len(), 2);
        assert_eq!(outcome.skipped_duplicates, 1);
    }

    #[test]
    fn liability_balance_stored_non_positive() {
        let mut ledger = Ledger::new();
        let mut staged = StagedImport::new("pdf-summary", "amex.pdf");
        staged.balances.push(StagedBalance::new(date(31), 210_000));

        let resolved =
            resolve_accounts(&mut ledger, &staged, AccountType::CreditCard, None).unwrap();
        commit_import(&mut ledger, &staged, &resolved, now());
        let balance = ledger.balances.values().next().unwrap();
        assert_eq!(balance.balance_cents, -210_000);
    }

    #[test]
    fn balance_skipped_when_date_already_covered() {
        let mut ledger = Ledger::new();
        let mut staged = StagedImport::new("pdf-summary", "amex.pdf");
        staged.balances.push(StagedBalance::new(date(31), 210_000));

        let resolved =
            resolve_accounts(&mut ledger, &staged, AccountType::CreditCard, None).unwrap();
        let first = commit_import(&mut ledger, &staged, &resolved, now());
        assert_eq!(first.inserted_balances, 1);
        let second = commit_import(&mut ledger, &staged, &resolved, now());
        assert_eq!(second.inserted_balances, 0);
        assert_eq!(ledger.balances.len(), 1);
    }

    #[test]
    fn holdings_keyed_by_symbol_and_date() {
        let mut ledger = Ledger::new();
        let mut staged = StagedImport::new("holdings-csv", "fidelity-positions.csv");
        staged.holdings.push(StagedHolding {
            as_of_date: date(31),
            symbol: "VTI".to_string(),
            quantity: Decimal::from(10),
            market_value_cents: Some(240_000),
            include: true,
        });
        let resolved =
            resolve_accounts(&mut ledger, &staged, AccountType::Brokerage, None).unwrap();
        let first = commit_import(&mut ledger, &staged, &resolved, now());
        let second = commit_import(&mut ledger, &staged, &resolved, now());
        assert_eq!(first.inserted_holdings, 1);
        assert_eq!(second.inserted_holdings, 0);
    }

    #[test]
    fn excluded_staged_rows_are_not_committed() {
        let mut ledger = Ledger::new();
        let mut staged = bank_staged();
        staged.transactions[0].include = false;
        let outcome = commit_bank(&mut ledger, &staged);
        assert_eq!(outcome.inserted_transactions.len(), 1);
    }
}
