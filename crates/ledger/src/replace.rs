use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use ledgerport_core::{
    AccountId, BalanceSnapshot, HoldingSnapshot, StagedImport, Transaction,
};

use crate::commit::{coerce_sign, ledger_is_liability};
use crate::error::LedgerError;
use crate::events::{push_unique, ChangeEvent};
use crate::fingerprint::staged_fingerprint;
use crate::store::Ledger;

/// Keys the user has explicitly approved for overwrite even though the row
/// carries local edits. Overwriting via force also clears the edit flag.
#[derive(Debug, Default)]
pub struct ForceKeys {
    pub transactions: HashSet<String>,
    pub balances: HashSet<NaiveDate>,
    pub holdings: HashSet<(String, NaiveDate)>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceCounts {
    pub updated: usize,
    pub inserted: usize,
    pub deleted: usize,
}

#[derive(Debug)]
pub struct ReplaceOutcome {
    pub transactions: ReplaceCounts,
    pub balances: ReplaceCounts,
    pub holdings: ReplaceCounts,
    pub events: Vec<ChangeEvent>,
}

/// Re-import a statement into an existing batch: three-way reconciliation of
/// the staged rows against the batch's current contents.
///
/// Transactions are keyed by `import_hash_key`, balances by as-of date,
/// holdings by (symbol, as-of date). Matched rows update in place unless the
/// user has modified them and the key is not in `force`; a matched row whose
/// fields already agree with the staged values is left alone and not counted,
/// so re-importing an identical statement reports all-zero counts. Staged
/// rows with no match insert into the batch. Batch rows absent from the staged set delete,
/// but never a user-modified one.
pub fn replace_batch(
    ledger: &mut Ledger,
    batch_id: i64,
    staged: &StagedImport,
    force: &ForceKeys,
) -> Result<ReplaceOutcome, LedgerError> {
    if !ledger.batches.contains_key(&batch_id) {
        return Err(LedgerError::UnknownBatch(batch_id));
    }
    let target = infer_target_account(ledger, batch_id)?;

    let mut outcome = ReplaceOutcome {
        transactions: ReplaceCounts::default(),
        balances: ReplaceCounts::default(),
        holdings: ReplaceCounts::default(),
        events: Vec::new(),
    };

    reconcile_transactions(ledger, batch_id, staged, force, target, &mut outcome);
    reconcile_balances(ledger, batch_id, staged, force, target, &mut outcome);
    reconcile_holdings(ledger, batch_id, staged, force, target, &mut outcome);

    let changed = [outcome.transactions, outcome.balances, outcome.holdings]
        .iter()
        .any(|c| c.updated + c.inserted + c.deleted > 0);
    if changed {
        push_unique(&mut outcome.events, ChangeEvent::TransactionsChanged);
    }

    tracing::info!(
        batch = batch_id,
        tx_updated = outcome.transactions.updated,
        tx_inserted = outcome.transactions.inserted,
        tx_deleted = outcome.transactions.deleted,
        "replaced batch"
    );
    Ok(outcome)
}

/// New rows surfacing in a re-import attach to the batch's existing account:
/// the one its transactions live in, else its balances', else its holdings'.
fn infer_target_account(ledger: &Ledger, batch_id: i64) -> Result<AccountId, LedgerError> {
    ledger
        .transactions_in_batch(batch_id)
        .map(|t| t.account)
        .next()
        .or_else(|| ledger.balances_in_batch(batch_id).map(|b| b.account).next())
        .or_else(|| ledger.holdings_in_batch(batch_id).map(|h| h.account).next())
        .ok_or(LedgerError::NoAccountToInfer(batch_id))
}

fn reconcile_transactions(
    ledger: &mut Ledger,
    batch_id: i64,
    staged: &StagedImport,
    force: &ForceKeys,
    target: AccountId,
    outcome: &mut ReplaceOutcome,
) {
    let existing: HashMap<String, i64> = ledger
        .transactions_in_batch(batch_id)
        .map(|t| {
            let key = t.import_hash_key.clone().unwrap_or_else(|| t.hash_key.clone());
            (key, t.id)
        })
        .collect();

    let mut staged_keys = HashSet::new();
    for staged_txn in staged.included_transactions() {
        let fp = staged_fingerprint(staged_txn);
        staged_keys.insert(fp.clone());

        match existing.get(&fp) {
            Some(&id) => {
                let forced = force.transactions.contains(&fp);
                if let Some(txn) = ledger.transactions.get_mut(&id) {
                    if txn.is_user_modified && !forced {
                        continue;
                    }
                    // A leg the transfer pass has linked keeps its
                    // classification and annotation across re-imports.
                    let linked = txn.linked_transaction_id.is_some();
                    let unchanged = txn.date_posted == staged_txn.date_posted
                        && txn.amount_cents == staged_txn.amount_cents
                        && txn.payee == staged_txn.payee
                        && txn.symbol == staged_txn.symbol
                        && txn.quantity == staged_txn.quantity
                        && txn.price == staged_txn.price
                        && txn.fees_cents == staged_txn.fees_cents
                        && (linked
                            || (txn.memo == staged_txn.memo && txn.kind == staged_txn.kind));
                    if unchanged && !forced {
                        continue;
                    }
                    txn.date_posted = staged_txn.date_posted;
                    txn.amount_cents = staged_txn.amount_cents;
                    txn.payee = staged_txn.payee.clone();
                    if !linked {
                        txn.memo = staged_txn.memo.clone();
                        txn.kind = staged_txn.kind;
                    }
                    txn.symbol = staged_txn.symbol.clone();
                    txn.quantity = staged_txn.quantity;
                    txn.price = staged_txn.price;
                    txn.fees_cents = staged_txn.fees_cents;
                    txn.hash_key = fp;
                    if forced {
                        txn.is_user_modified = false;
                        txn.is_user_edited = false;
                        txn.original_amount_cents = None;
                        txn.original_date = None;
                    }
                    outcome.transactions.updated += 1;
                }
            }
            None => {
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
                    account: target,
                    import_batch: Some(batch_id),
                    linked_transaction_id: None,
                    is_user_created: false,
                    is_user_edited: false,
                    is_excluded: false,
                    is_user_modified: false,
                    original_amount_cents: None,
                    original_date: None,
                });
                outcome.transactions.inserted += 1;
            }
        }
    }

    let doomed: Vec<i64> = existing
        .iter()
        .filter(|(key, _)| !staged_keys.contains(*key))
        .map(|(_, &id)| id)
        .filter(|id| {
            ledger
                .transactions
                .get(id)
                .is_some_and(|t| !t.is_user_modified)
        })
        .collect();
    for id in doomed {
        ledger.transactions.remove(&id);
        outcome.transactions.deleted += 1;
    }
}

fn reconcile_balances(
    ledger: &mut Ledger,
    batch_id: i64,
    staged: &StagedImport,
    force: &ForceKeys,
    target: AccountId,
    outcome: &mut ReplaceOutcome,
) {
    let existing: HashMap<NaiveDate, i64> = ledger
        .balances_in_batch(batch_id)
        .map(|b| (b.as_of_date, b.id))
        .collect();

    let mut staged_keys = HashSet::new();
    for staged_balance in staged.included_balances() {
        staged_keys.insert(staged_balance.as_of_date);

        match existing.get(&staged_balance.as_of_date) {
            Some(&id) => {
                let forced = force.balances.contains(&staged_balance.as_of_date);
                let is_liability = ledger
                    .balances
                    .get(&id)
                    .map(|b| ledger_is_liability(ledger, b.account))
                    .unwrap_or(false);
                if let Some(balance) = ledger.balances.get_mut(&id) {
                    if balance.is_user_modified && !forced {
                        continue;
                    }
                    let staged_cents = coerce_sign(is_liability, staged_balance.balance_cents);
                    let unchanged = balance.balance_cents == staged_cents
                        && balance.interest_rate_apr == staged_balance.interest_rate_apr
                        && balance.interest_rate_scale == staged_balance.interest_rate_scale;
                    if unchanged && !forced {
                        continue;
                    }
                    balance.balance_cents = staged_cents;
                    balance.interest_rate_apr = staged_balance.interest_rate_apr;
                    balance.interest_rate_scale = staged_balance.interest_rate_scale;
                    if forced {
                        balance.is_user_modified = false;
                    }
                    outcome.balances.updated += 1;
                }
            }
            None => {
                let is_liability = ledger_is_liability(ledger, target);
                let id = ledger.allocate_id();
                ledger.insert_balance(BalanceSnapshot {
                    id,
                    as_of_date: staged_balance.as_of_date,
                    balance_cents: coerce_sign(is_liability, staged_balance.balance_cents),
                    interest_rate_apr: staged_balance.interest_rate_apr,
                    interest_rate_scale: staged_balance.interest_rate_scale,
                    account: target,
                    import_batch: Some(batch_id),
                    is_user_created: false,
                    is_excluded: false,
                    is_user_modified: false,
                });
                outcome.balances.inserted += 1;
            }
        }
    }

    let doomed: Vec<i64> = existing
        .iter()
        .filter(|(date, _)| !staged_keys.contains(*date))
        .map(|(_, &id)| id)
        .filter(|id| ledger.balances.get(id).is_some_and(|b| !b.is_user_modified))
        .collect();
    for id in doomed {
        ledger.balances.remove(&id);
        outcome.balances.deleted += 1;
    }
}

fn reconcile_holdings(
    ledger: &mut Ledger,
    batch_id: i64,
    staged: &StagedImport,
    force: &ForceKeys,
    target: AccountId,
    outcome: &mut ReplaceOutcome,
) {
    let existing: HashMap<(String, NaiveDate), i64> = ledger
        .holdings_in_batch(batch_id)
        .map(|h| ((h.symbol.clone(), h.as_of_date), h.id))
        .collect();

    let mut staged_keys = HashSet::new();
    for staged_holding in staged.included_holdings() {
        let key = (staged_holding.symbol.clone(), staged_holding.as_of_date);
        staged_keys.insert(key.clone());

        match existing.get(&key) {
            Some(&id) => {
                let forced = force.holdings.contains(&key);
                if let Some(holding) = ledger.holdings.get_mut(&id) {
                    if holding.is_user_modified && !forced {
                        continue;
                    }
                    let unchanged = holding.quantity == staged_holding.quantity
                        && holding.market_value_cents == staged_holding.market_value_cents;
                    if unchanged && !forced {
                        continue;
                    }
                    holding.quantity = staged_holding.quantity;
                    holding.market_value_cents = staged_holding.market_value_cents;
                    if forced {
                        holding.is_user_modified = false;
                    }
                    outcome.holdings.updated += 1;
                }
            }
            None => {
                let id = ledger.allocate_id();
                ledger.insert_holding(HoldingSnapshot {
                    id,
                    as_of_date: staged_holding.as_of_date,
                    symbol: staged_holding.symbol.clone(),
                    quantity: staged_holding.quantity,
                    market_value_cents: staged_holding.market_value_cents,
                    account: target,
                    import_batch: Some(batch_id),
                    is_user_modified: false,
                });
                outcome.holdings.inserted += 1;
            }
        }
    }

    let doomed: Vec<i64> = existing
        .iter()
        .filter(|(key, _)| !staged_keys.contains(*key))
        .map(|(_, &id)| id)
        .filter(|id| ledger.holdings.get(id).is_some_and(|h| !h.is_user_modified))
        .collect();
    for id in doomed {
        ledger.holdings.remove(&id);
        outcome.holdings.deleted += 1;
    }
}
