use ledgerport_core::TxnKind;

use crate::store::Ledger;

/// Pairs up the two legs of a money movement between the user's own accounts
/// after a commit, so a payment does not read as spending in one account and
/// income in the other.
pub struct TransferReconciler {
    pub window_days: i64,
}

impl Default for TransferReconciler {
    fn default() -> Self {
        TransferReconciler { window_days: 3 }
    }
}

impl TransferReconciler {
    /// Scan the given newly inserted transactions for counterparts anywhere
    /// in the ledger. A counterpart is an unlinked Bank transaction in a
    /// *different* account with the exact opposite amount, posted within the
    /// date window. Among candidates the closest date wins; on a tie, the
    /// lowest transaction id, so the pairing is deterministic.
    ///
    /// Both legs are linked to each other, reclassified as transfers, and
    /// given a memo if they had none. Finding nothing is normal.
    pub fn reconcile(&self, ledger: &mut Ledger, new_ids: &[i64]) -> Vec<(i64, i64)> {
        let mut pairs = Vec::new();
        for &id in new_ids {
            let Some(txn) = ledger.transactions.get(&id) else {
                continue;
            };
            if txn.kind != TxnKind::Bank
                || txn.linked_transaction_id.is_some()
                || txn.amount_cents == 0
            {
                continue;
            }
            let (account, date, amount) = (txn.account, txn.date_posted, txn.amount_cents);

            let best = ledger
                .transactions
                .values()
                .filter(|other| {
                    other.id != id
                        && other.account != account
                        && other.kind == TxnKind::Bank
                        && other.linked_transaction_id.is_none()
                        && other.amount_cents == -amount
                })
                .filter_map(|other| {
                    let distance = (other.date_posted - date).num_days().abs();
                    (distance <= self.window_days).then_some((distance, other.id))
                })
                .min();

            if let Some((_, other_id)) = best {
                self.link(ledger, id, other_id);
                pairs.push((id, other_id));
            }
        }
        if !pairs.is_empty() {
            tracing::info!(linked = pairs.len(), "reconciled transfers");
        }
        pairs
    }

    fn link(&self, ledger: &mut Ledger, a: i64, b: i64) {
        let name_of = |ledger: &Ledger, id: i64| {
            ledger
                .transactions
                .get(&id)
                .and_then(|t| ledger.account(t.account))
                .map(|acct| acct.name.clone())
        };
        let name_a = name_of(ledger, a);
        let name_b = name_of(ledger, b);

        if let Some(txn) = ledger.transactions.get_mut(&a) {
            txn.linked_transaction_id = Some(b);
            txn.kind = TxnKind::Transfer;
            if txn.memo.is_none() {
                txn.memo = name_b.map(|n| transfer_memo(txn.amount_cents, &n));
            }
        }
        if let Some(txn) = ledger.transactions.get_mut(&b) {
            txn.linked_transaction_id = Some(a);
            txn.kind = TxnKind::Transfer;
            if txn.memo.is_none() {
                txn.memo = name_a.map(|n| transfer_memo(txn.amount_cents, &n));
            }
        }
    }
}

fn transfer_memo(amount_cents: i64, other_account: &str) -> String {
    if amount_cents < 0 {
        format!("Transfer to {other_account}")
    } else {
        format!("Transfer from {other_account}")
    }
}
