use chrono::NaiveDate;

use ledgerport_core::TxnKind;

use crate::error::LedgerError;
use crate::fingerprint::transaction_fingerprint;
use crate::store::Ledger;

/// Field changes for one transaction; `None` leaves the field alone.
#[derive(Debug, Default, Clone)]
pub struct TransactionEdit {
    pub date_posted: Option<NaiveDate>,
    pub amount_cents: Option<i64>,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub kind: Option<TxnKind>,
    pub excluded: Option<bool>,
}

/// Apply a user edit. The pre-edit amount and date are captured once, the
/// first time either changes, as an audit trail; `hash_key` is recomputed so
/// it keeps tracking the visible content, while `import_hash_key` stays
/// frozen so re-imports still recognize the row.
pub fn apply_user_edit(
    ledger: &mut Ledger,
    id: i64,
    edit: TransactionEdit,
) -> Result<(), LedgerError> {
    let txn = ledger
        .transactions
        .get_mut(&id)
        .ok_or(LedgerError::UnknownTransaction(id))?;

    if let Some(amount) = edit.amount_cents {
        if amount != txn.amount_cents && txn.original_amount_cents.is_none() {
            txn.original_amount_cents = Some(txn.amount_cents);
        }
        txn.amount_cents = amount;
    }
    if let Some(date) = edit.date_posted {
        if date != txn.date_posted && txn.original_date.is_none() {
            txn.original_date = Some(txn.date_posted);
        }
        txn.date_posted = date;
    }
    if let Some(payee) = edit.payee {
        txn.payee = payee;
    }
    if let Some(memo) = edit.memo {
        txn.memo = Some(memo);
    }
    if let Some(kind) = edit.kind {
        txn.kind = kind;
    }
    if let Some(excluded) = edit.excluded {
        txn.is_excluded = excluded;
    }

    txn.is_user_edited = true;
    txn.is_user_modified = true;
    txn.hash_key = transaction_fingerprint(txn);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::commit_import;
    use crate::resolve::resolve_accounts;
    use chrono::{DateTime, Utc};
    use ledgerport_core::{AccountType, StagedImport, StagedTransaction};

    fn seeded() -> (Ledger, i64) {
        let mut ledger = Ledger::new();
        let mut staged = StagedImport::new("bank-csv", "chase.csv");
        staged.transactions.push(StagedTransaction::new(
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            -450,
            "Coffee Shop",
        ));
        let resolved =
            resolve_accounts(&mut ledger, &staged, AccountType::Checking, None).unwrap();
        let now = DateTime::parse_from_rfc3339("2026-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let outcome = commit_import(&mut ledger, &staged, &resolved, now);
        let id = outcome.inserted_transactions[0];
        (ledger, id)
    }

    #[test]
    fn amount_edit_captures_original_once() {
        let (mut ledger, id) = seeded();
        apply_user_edit(
            &mut ledger,
            id,
            TransactionEdit { amount_cents: Some(-500), ..TransactionEdit::default() },
        )
        .unwrap();
        apply_user_edit(
            &mut ledger,
            id,
            TransactionEdit { amount_cents: Some(-600), ..TransactionEdit::default() },
        )
        .unwrap();

        let txn = &ledger.transactions[&id];
        assert_eq!(txn.amount_cents, -600);
        assert_eq!(txn.original_amount_cents, Some(-450));
        assert!(txn.is_user_modified);
    }

    #[test]
    fn hash_key_moves_import_hash_key_does_not() {
        let (mut ledger, id) = seeded();
        let before = ledger.transactions[&id].clone();
        apply_user_edit(
            &mut ledger,
            id,
            TransactionEdit { payee: Some("Renamed".to_string()), ..TransactionEdit::default() },
        )
        .unwrap();
        let after = &ledger.transactions[&id];
        assert_ne!(after.hash_key, before.hash_key);
        assert_eq!(after.import_hash_key, before.import_hash_key);
    }

    #[test]
    fn unknown_transaction() {
        let mut ledger = Ledger::new();
        assert!(matches!(
            apply_user_edit(&mut ledger, 5, TransactionEdit::default()),
            Err(LedgerError::UnknownTransaction(5))
        ));
    }
}
