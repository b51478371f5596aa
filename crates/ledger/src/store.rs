use std::collections::BTreeMap;

use ledgerport_core::{
    Account, AccountId, BalanceSnapshot, HoldingSnapshot, ImportBatch, Transaction,
};

/// The in-memory ledger. Merge and reconciliation mutate this arena directly;
/// persistence is an atomic snapshot save handled by the storage crate.
///
/// Ids are drawn from one monotonic counter shared by every entity kind, so a
/// deleted row's id is never reissued.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    pub accounts: BTreeMap<i64, Account>,
    pub transactions: BTreeMap<i64, Transaction>,
    pub balances: BTreeMap<i64, BalanceSnapshot>,
    pub holdings: BTreeMap<i64, HoldingSnapshot>,
    pub batches: BTreeMap<i64, ImportBatch>,
    next_id: i64,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            next_id: 1,
            ..Ledger::default()
        }
    }

    pub fn allocate_id(&mut self) -> i64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    /// Keep the counter ahead of an id assigned elsewhere (rows loaded from
    /// the database). Must be called for every externally-assigned id.
    pub fn observe_id(&mut self, id: i64) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }

    // ── inserts ──────────────────────────────────────────────────────────────

    /// Insert an account, assigning an id if it has none. Returns the id.
    pub fn insert_account(&mut self, mut account: Account) -> AccountId {
        let id = match account.id {
            Some(AccountId(id)) => {
                self.observe_id(id);
                id
            }
            None => {
                let id = self.allocate_id();
                account.id = Some(AccountId(id));
                id
            }
        };
        self.accounts.insert(id, account);
        AccountId(id)
    }

    pub fn insert_transaction(&mut self, txn: Transaction) -> i64 {
        self.observe_id(txn.id);
        let id = txn.id;
        self.transactions.insert(id, txn);
        id
    }

    pub fn insert_balance(&mut self, snapshot: BalanceSnapshot) -> i64 {
        self.observe_id(snapshot.id);
        let id = snapshot.id;
        self.balances.insert(id, snapshot);
        id
    }

    pub fn insert_holding(&mut self, snapshot: HoldingSnapshot) -> i64 {
        self.observe_id(snapshot.id);
        let id = snapshot.id;
        self.holdings.insert(id, snapshot);
        id
    }

    pub fn insert_batch(&mut self, batch: ImportBatch) -> i64 {
        self.observe_id(batch.id);
        let id = batch.id;
        self.batches.insert(id, batch);
        id
    }

    // ── queries ──────────────────────────────────────────────────────────────

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id.0)
    }

    pub fn transactions_for_account(
        &self,
        account: AccountId,
    ) -> impl Iterator<Item = &Transaction> {
        self.transactions.values().filter(move |t| t.account == account)
    }

    pub fn transactions_in_batch(&self, batch_id: i64) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .values()
            .filter(move |t| t.import_batch == Some(batch_id))
    }

    pub fn balances_in_batch(&self, batch_id: i64) -> impl Iterator<Item = &BalanceSnapshot> {
        self.balances
            .values()
            .filter(move |b| b.import_batch == Some(batch_id))
    }

    pub fn holdings_in_batch(&self, batch_id: i64) -> impl Iterator<Item = &HoldingSnapshot> {
        self.holdings
            .values()
            .filter(move |h| h.import_batch == Some(batch_id))
    }

    /// True if any transaction, balance or holding still references the
    /// account. Batches do not count; they own entities, not accounts.
    pub fn account_has_entities(&self, account: AccountId) -> bool {
        self.transactions.values().any(|t| t.account == account)
            || self.balances.values().any(|b| b.account == account)
            || self.holdings.values().any(|h| h.account == account)
    }

    pub fn has_balance_on(&self, account: AccountId, as_of_date: chrono::NaiveDate) -> bool {
        self.balances
            .values()
            .any(|b| b.account == account && b.as_of_date == as_of_date)
    }

    pub fn has_holding_on(
        &self,
        account: AccountId,
        symbol: &str,
        as_of_date: chrono::NaiveDate,
    ) -> bool {
        self.holdings
            .values()
            .any(|h| h.account == account && h.symbol == symbol && h.as_of_date == as_of_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerport_core::AccountType;

    #[test]
    fn ids_are_monotonic_across_kinds() {
        let mut ledger = Ledger::new();
        let a = ledger.insert_account(Account::new("Checking", AccountType::Checking));
        let next = ledger.allocate_id();
        assert_eq!(a.0, 1);
        assert_eq!(next, 2);
    }

    #[test]
    fn observe_id_never_reissues() {
        let mut ledger = Ledger::new();
        ledger.observe_id(40);
        assert_eq!(ledger.allocate_id(), 41);
        ledger.observe_id(10);
        assert_eq!(ledger.allocate_id(), 42);
    }

    #[test]
    fn loaded_account_keeps_its_id() {
        let mut ledger = Ledger::new();
        let mut account = Account::new("Loaded", AccountType::Savings);
        account.id = Some(AccountId(7));
        let id = ledger.insert_account(account);
        assert_eq!(id, AccountId(7));
        assert_eq!(ledger.allocate_id(), 8);
    }

    #[test]
    fn transactions_for_account_filters_by_owner() {
        let mut ledger = Ledger::new();
        let a = ledger.insert_account(Account::new("Checking", AccountType::Checking));
        let b = ledger.insert_account(Account::new("Savings", AccountType::Savings));
        for (account, payee) in [(a, "Coffee"), (a, "Payroll"), (b, "Interest")] {
            let id = ledger.allocate_id();
            ledger.insert_transaction(txn(id, account, payee));
        }
        assert_eq!(ledger.transactions_for_account(a).count(), 2);
        let payees: Vec<_> = ledger
            .transactions_for_account(b)
            .map(|t| t.payee.as_str())
            .collect();
        assert_eq!(payees, ["Interest"]);
    }

    fn txn(id: i64, account: AccountId, payee: &str) -> Transaction {
        Transaction {
            id,
            date_posted: chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            amount_cents: -100,
            payee: payee.to_string(),
            memo: None,
            kind: ledgerport_core::TxnKind::Bank,
            external_id: None,
            symbol: None,
            quantity: None,
            price: None,
            fees_cents: None,
            hash_key: format!("{payee}-{id}"),
            import_hash_key: None,
            account,
            import_batch: None,
            linked_transaction_id: None,
            is_user_created: true,
            is_user_edited: false,
            is_excluded: false,
            is_user_modified: false,
            original_amount_cents: None,
            original_date: None,
        }
    }

    #[test]
    fn account_has_entities_checks_all_kinds() {
        let mut ledger = Ledger::new();
        let a = ledger.insert_account(Account::new("Empty", AccountType::Cash));
        assert!(!ledger.account_has_entities(a));
    }
}
