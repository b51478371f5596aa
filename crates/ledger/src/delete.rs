use std::collections::BTreeSet;

use ledgerport_core::AccountId;

use crate::error::LedgerError;
use crate::events::{push_unique, ChangeEvent};
use crate::store::Ledger;

#[derive(Debug)]
pub struct DeleteOutcome {
    pub transactions_deleted: usize,
    pub balances_deleted: usize,
    pub holdings_deleted: usize,
    pub accounts_deleted: Vec<AccountId>,
    pub events: Vec<ChangeEvent>,
}

/// Delete an import batch and everything it owns, then sweep any account the
/// deletion emptied out. Accounts still holding manual rows (or rows from
/// other batches) survive. Transfer links pointing at a deleted leg are
/// cleared so no dangling ids remain.
pub fn delete_batch(ledger: &mut Ledger, batch_id: i64) -> Result<DeleteOutcome, LedgerError> {
    if ledger.batches.remove(&batch_id).is_none() {
        return Err(LedgerError::UnknownBatch(batch_id));
    }

    let mut touched: BTreeSet<AccountId> = BTreeSet::new();

    let txn_ids: Vec<i64> = ledger
        .transactions_in_batch(batch_id)
        .map(|t| t.id)
        .collect();
    for id in &txn_ids {
        if let Some(txn) = ledger.transactions.remove(id) {
            touched.insert(txn.account);
        }
    }
    let deleted: BTreeSet<i64> = txn_ids.iter().copied().collect();
    for txn in ledger.transactions.values_mut() {
        if txn
            .linked_transaction_id
            .is_some_and(|linked| deleted.contains(&linked))
        {
            txn.linked_transaction_id = None;
        }
    }

    let balance_ids: Vec<i64> = ledger.balances_in_batch(batch_id).map(|b| b.id).collect();
    for id in &balance_ids {
        if let Some(balance) = ledger.balances.remove(id) {
            touched.insert(balance.account);
        }
    }

    let holding_ids: Vec<i64> = ledger.holdings_in_batch(batch_id).map(|h| h.id).collect();
    for id in &holding_ids {
        if let Some(holding) = ledger.holdings.remove(id) {
            touched.insert(holding.account);
        }
    }

    let mut accounts_deleted = Vec::new();
    for account in touched {
        if !ledger.account_has_entities(account) {
            ledger.accounts.remove(&account.0);
            accounts_deleted.push(account);
        }
    }

    let mut events = Vec::new();
    if !txn_ids.is_empty() || !balance_ids.is_empty() || !holding_ids.is_empty() {
        push_unique(&mut events, ChangeEvent::TransactionsChanged);
    }
    if !accounts_deleted.is_empty() {
        push_unique(&mut events, ChangeEvent::AccountsChanged);
    }

    tracing::info!(
        batch = batch_id,
        transactions = txn_ids.len(),
        accounts = accounts_deleted.len(),
        "deleted batch"
    );
    Ok(DeleteOutcome {
        transactions_deleted: txn_ids.len(),
        balances_deleted: balance_ids.len(),
        holdings_deleted: holding_ids.len(),
        accounts_deleted,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::commit_import;
    use crate::resolve::resolve_accounts;
    use crate::transfer::TransferReconciler;
    use chrono::{DateTime, NaiveDate, Utc};
    use ledgerport_core::{Account, AccountType, StagedImport, StagedTransaction, Transaction, TxnKind};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn seed(ledger: &mut Ledger) -> (i64, AccountId) {
        let mut staged = StagedImport::new("bank-csv", "chase-checking.csv");
        staged
            .transactions
            .push(StagedTransaction::new(date(15), -450, "Coffee Shop"));
        let resolved =
            resolve_accounts(ledger, &staged, AccountType::Checking, None).unwrap();
        let outcome = commit_import(ledger, &staged, &resolved, now());
        (outcome.batch_id, resolved.default_account)
    }

    #[test]
    fn cascade_deletes_batch_and_orphan_account() {
        let mut ledger = Ledger::new();
        let (batch, account) = seed(&mut ledger);

        let outcome = delete_batch(&mut ledger, batch).unwrap();
        assert_eq!(outcome.transactions_deleted, 1);
        assert_eq!(outcome.accounts_deleted, vec![account]);
        assert!(ledger.transactions.is_empty());
        assert!(ledger.accounts.is_empty());
        assert!(ledger.batches.is_empty());
        assert!(outcome.events.contains(&ChangeEvent::AccountsChanged));
    }

    #[test]
    fn account_with_manual_rows_survives() {
        let mut ledger = Ledger::new();
        let (batch, account) = seed(&mut ledger);

        let id = ledger.allocate_id();
        ledger.insert_transaction(Transaction {
            id,
            date_posted: date(20),
            amount_cents: -1_000,
            payee: "Manual entry".to_string(),
            memo: None,
            kind: TxnKind::Bank,
            external_id: None,
            symbol: None,
            quantity: None,
            price: None,
            fees_cents: None,
            hash_key: "manual".to_string(),
            import_hash_key: None,
            account,
            import_batch: None,
            linked_transaction_id: None,
            is_user_created: true,
            is_user_edited: false,
            is_excluded: false,
            is_user_modified: true,
            original_amount_cents: None,
            original_date: None,
        });

        let outcome = delete_batch(&mut ledger, batch).unwrap();
        assert!(outcome.accounts_deleted.is_empty());
        assert!(ledger.accounts.contains_key(&account.0));
        assert_eq!(ledger.transactions.len(), 1);
    }

    #[test]
    fn dangling_transfer_links_are_cleared() {
        let mut ledger = Ledger::new();
        let (batch, _) = seed(&mut ledger);

        // A transfer counterpart in a separate, batchless account.
        let savings = ledger.insert_account(Account::new("Savings", AccountType::Savings));
        let batch_txn_id = ledger
            .transactions_in_batch(batch)
            .map(|t| t.id)
            .next()
            .unwrap();
        let other_id = ledger.allocate_id();
        let counterpart = Transaction {
            id: other_id,
            date_posted: date(15),
            amount_cents: 450,
            payee: "TRANSFER IN".to_string(),
            memo: None,
            kind: TxnKind::Bank,
            external_id: None,
            symbol: None,
            quantity: None,
            price: None,
            fees_cents: None,
            hash_key: "cp".to_string(),
            import_hash_key: None,
            account: savings,
            import_batch: None,
            linked_transaction_id: None,
            is_user_created: true,
            is_user_edited: false,
            is_excluded: false,
            is_user_modified: true,
            original_amount_cents: None,
            original_date: None,
        };
        ledger.insert_transaction(counterpart);
        TransferReconciler::default().reconcile(&mut ledger, &[batch_txn_id]);
        assert_eq!(
            ledger.transactions[&other_id].linked_transaction_id,
            Some(batch_txn_id)
        );

        delete_batch(&mut ledger, batch).unwrap();
        assert_eq!(ledger.transactions[&other_id].linked_transaction_id, None);
    }

    #[test]
    fn unknown_batch() {
        let mut ledger = Ledger::new();
        assert!(matches!(
            delete_batch(&mut ledger, 42),
            Err(LedgerError::UnknownBatch(42))
        ));
    }
}
