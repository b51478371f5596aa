use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};

use ledgerport_core::{
    Account, AccountId, AccountType, BalanceSnapshot, HoldingSnapshot, ImportBatch, LoanTerms,
    Transaction, TxnKind,
};
use ledgerport_ledger::Ledger;

use crate::error::StorageError;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            institution_name TEXT,
            currency_code TEXT NOT NULL DEFAULT 'USD',
            loan_terms TEXT,
            credit_card_payment_mode TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY,
            date_posted TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            payee TEXT NOT NULL,
            memo TEXT,
            kind TEXT NOT NULL,
            external_id TEXT,
            symbol TEXT,
            quantity TEXT,
            price TEXT,
            fees_cents INTEGER,
            hash_key TEXT NOT NULL,
            import_hash_key TEXT,
            account_id INTEGER NOT NULL,
            import_batch_id INTEGER,
            linked_transaction_id INTEGER,
            is_user_created INTEGER NOT NULL DEFAULT 0,
            is_user_edited INTEGER NOT NULL DEFAULT 0,
            is_excluded INTEGER NOT NULL DEFAULT 0,
            is_user_modified INTEGER NOT NULL DEFAULT 0,
            original_amount_cents INTEGER,
            original_date TEXT,
            FOREIGN KEY (account_id) REFERENCES accounts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS balance_snapshots (
            id INTEGER PRIMARY KEY,
            as_of_date TEXT NOT NULL,
            balance_cents INTEGER NOT NULL,
            interest_rate_apr TEXT,
            interest_rate_scale INTEGER,
            account_id INTEGER NOT NULL,
            import_batch_id INTEGER,
            is_user_created INTEGER NOT NULL DEFAULT 0,
            is_excluded INTEGER NOT NULL DEFAULT 0,
            is_user_modified INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (account_id) REFERENCES accounts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS holding_snapshots (
            id INTEGER PRIMARY KEY,
            as_of_date TEXT NOT NULL,
            symbol TEXT NOT NULL,
            quantity TEXT NOT NULL,
            market_value_cents INTEGER,
            account_id INTEGER NOT NULL,
            import_batch_id INTEGER,
            is_user_modified INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (account_id) REFERENCES accounts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_batches (
            id INTEGER PRIMARY KEY,
            created_at TEXT NOT NULL,
            source_file_name TEXT NOT NULL,
            parser_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── load ─────────────────────────────────────────────────────────────────────

/// Read the whole database into an in-memory [`Ledger`]. The dataset is one
/// person's finances; loading it wholesale is cheaper than being clever.
pub async fn load_ledger(pool: &DbPool) -> Result<Ledger, StorageError> {
    let mut ledger = Ledger::new();

    let rows = sqlx::query("SELECT * FROM accounts ORDER BY id")
        .fetch_all(pool)
        .await?;
    for row in rows {
        let type_str: String = row.try_get("account_type")?;
        let account_type = AccountType::from_str(&type_str)
            .map_err(|e| corrupt("accounts", e))?;
        let loan_terms: Option<LoanTerms> = row
            .try_get::<Option<String>, _>("loan_terms")?
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| corrupt("accounts", e))?;
        let payment_mode = row
            .try_get::<Option<String>, _>("credit_card_payment_mode")?
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| corrupt("accounts", e))?;
        ledger.insert_account(Account {
            id: Some(AccountId(row.try_get("id")?)),
            name: row.try_get("name")?,
            account_type,
            institution_name: row.try_get("institution_name")?,
            currency_code: row.try_get("currency_code")?,
            loan_terms,
            credit_card_payment_mode: payment_mode,
        });
    }

    let rows = sqlx::query("SELECT * FROM transactions ORDER BY id")
        .fetch_all(pool)
        .await?;
    for row in rows {
        let kind_str: String = row.try_get("kind")?;
        ledger.insert_transaction(Transaction {
            id: row.try_get("id")?,
            date_posted: row.try_get::<NaiveDate, _>("date_posted")?,
            amount_cents: row.try_get("amount_cents")?,
            payee: row.try_get("payee")?,
            memo: row.try_get("memo")?,
            kind: TxnKind::from_str(&kind_str).map_err(|e| corrupt("transactions", e))?,
            external_id: row.try_get("external_id")?,
            symbol: row.try_get("symbol")?,
            quantity: decimal_opt(&row, "quantity", "transactions")?,
            price: decimal_opt(&row, "price", "transactions")?,
            fees_cents: row.try_get("fees_cents")?,
            hash_key: row.try_get("hash_key")?,
            import_hash_key: row.try_get("import_hash_key")?,
            account: AccountId(row.try_get("account_id")?),
            import_batch: row.try_get("import_batch_id")?,
            linked_transaction_id: row.try_get("linked_transaction_id")?,
            is_user_created: row.try_get("is_user_created")?,
            is_user_edited: row.try_get("is_user_edited")?,
            is_excluded: row.try_get("is_excluded")?,
            is_user_modified: row.try_get("is_user_modified")?,
            original_amount_cents: row.try_get("original_amount_cents")?,
            original_date: row.try_get::<Option<NaiveDate>, _>("original_date")?,
        });
    }

    let rows = sqlx::query("SELECT * FROM balance_snapshots ORDER BY id")
        .fetch_all(pool)
        .await?;
    for row in rows {
        ledger.insert_balance(BalanceSnapshot {
            id: row.try_get("id")?,
            as_of_date: row.try_get::<NaiveDate, _>("as_of_date")?,
            balance_cents: row.try_get("balance_cents")?,
            interest_rate_apr: decimal_opt(&row, "interest_rate_apr", "balance_snapshots")?,
            interest_rate_scale: row
                .try_get::<Option<i64>, _>("interest_rate_scale")?
                .map(|s| s as u32),
            account: AccountId(row.try_get("account_id")?),
            import_batch: row.try_get("import_batch_id")?,
            is_user_created: row.try_get("is_user_created")?,
            is_excluded: row.try_get("is_excluded")?,
            is_user_modified: row.try_get("is_user_modified")?,
        });
    }

    let rows = sqlx::query("SELECT * FROM holding_snapshots ORDER BY id")
        .fetch_all(pool)
        .await?;
    for row in rows {
        let quantity: String = row.try_get("quantity")?;
        ledger.insert_holding(HoldingSnapshot {
            id: row.try_get("id")?,
            as_of_date: row.try_get::<NaiveDate, _>("as_of_date")?,
            symbol: row.try_get("symbol")?,
            quantity: Decimal::from_str(&quantity)
                .map_err(|e| corrupt("holding_snapshots", e))?,
            market_value_cents: row.try_get("market_value_cents")?,
            account: AccountId(row.try_get("account_id")?),
            import_batch: row.try_get("import_batch_id")?,
            is_user_modified: row.try_get("is_user_modified")?,
        });
    }

    let rows = sqlx::query("SELECT * FROM import_batches ORDER BY id")
        .fetch_all(pool)
        .await?;
    for row in rows {
        ledger.insert_batch(ImportBatch {
            id: row.try_get("id")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            source_file_name: row.try_get("source_file_name")?,
            parser_id: row.try_get("parser_id")?,
        });
    }

    Ok(ledger)
}

// ── save ─────────────────────────────────────────────────────────────────────

/// Rewrite every table from the in-memory ledger inside one SQL transaction.
/// Either the whole snapshot lands or none of it does.
pub async fn save_ledger(pool: &DbPool, ledger: &Ledger) -> Result<(), StorageError> {
    let mut tx = pool.begin().await?;

    let result = write_all(&mut tx, ledger).await;
    match result {
        Ok(()) => {
            tx.commit().await.map_err(StorageError::CommitFailed)?;
            tracing::debug!(
                accounts = ledger.accounts.len(),
                transactions = ledger.transactions.len(),
                "saved ledger"
            );
            Ok(())
        }
        Err(e) => {
            // Rollback failure is secondary; the original error matters more.
            let _ = tx.rollback().await;
            Err(StorageError::CommitFailed(e))
        }
    }
}

async fn write_all(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    ledger: &Ledger,
) -> Result<(), sqlx::Error> {
    for table in [
        "transactions",
        "balance_snapshots",
        "holding_snapshots",
        "import_batches",
        "accounts",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut **tx)
            .await?;
    }

    for account in ledger.accounts.values() {
        let loan_terms = account
            .loan_terms
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let payment_mode = account
            .credit_card_payment_mode
            .map(|m| serde_json::to_string(&m))
            .transpose()
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query(
            "INSERT INTO accounts (id, name, account_type, institution_name, currency_code, loan_terms, credit_card_payment_mode)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(account.id.map(|a| a.0))
        .bind(&account.name)
        .bind(account.account_type.to_string())
        .bind(&account.institution_name)
        .bind(&account.currency_code)
        .bind(loan_terms)
        .bind(payment_mode)
        .execute(&mut **tx)
        .await?;
    }

    for txn in ledger.transactions.values() {
        sqlx::query(
            "INSERT INTO transactions (id, date_posted, amount_cents, payee, memo, kind,
                external_id, symbol, quantity, price, fees_cents, hash_key, import_hash_key,
                account_id, import_batch_id, linked_transaction_id, is_user_created,
                is_user_edited, is_excluded, is_user_modified, original_amount_cents, original_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(txn.id)
        .bind(txn.date_posted)
        .bind(txn.amount_cents)
        .bind(&txn.payee)
        .bind(&txn.memo)
        .bind(txn.kind.to_string())
        .bind(&txn.external_id)
        .bind(&txn.symbol)
        .bind(txn.quantity.map(|q| q.to_string()))
        .bind(txn.price.map(|p| p.to_string()))
        .bind(txn.fees_cents)
        .bind(&txn.hash_key)
        .bind(&txn.import_hash_key)
        .bind(txn.account.0)
        .bind(txn.import_batch)
        .bind(txn.linked_transaction_id)
        .bind(txn.is_user_created)
        .bind(txn.is_user_edited)
        .bind(txn.is_excluded)
        .bind(txn.is_user_modified)
        .bind(txn.original_amount_cents)
        .bind(txn.original_date)
        .execute(&mut **tx)
        .await?;
    }

    for balance in ledger.balances.values() {
        sqlx::query(
            "INSERT INTO balance_snapshots (id, as_of_date, balance_cents, interest_rate_apr,
                interest_rate_scale, account_id, import_batch_id, is_user_created, is_excluded,
                is_user_modified)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(balance.id)
        .bind(balance.as_of_date)
        .bind(balance.balance_cents)
        .bind(balance.interest_rate_apr.map(|r| r.to_string()))
        .bind(balance.interest_rate_scale.map(|s| s as i64))
        .bind(balance.account.0)
        .bind(balance.import_batch)
        .bind(balance.is_user_created)
        .bind(balance.is_excluded)
        .bind(balance.is_user_modified)
        .execute(&mut **tx)
        .await?;
    }

    for holding in ledger.holdings.values() {
        sqlx::query(
            "INSERT INTO holding_snapshots (id, as_of_date, symbol, quantity, market_value_cents,
                account_id, import_batch_id, is_user_modified)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(holding.id)
        .bind(holding.as_of_date)
        .bind(&holding.symbol)
        .bind(holding.quantity.to_string())
        .bind(holding.market_value_cents)
        .bind(holding.account.0)
        .bind(holding.import_batch)
        .bind(holding.is_user_modified)
        .execute(&mut **tx)
        .await?;
    }

    for batch in ledger.batches.values() {
        sqlx::query(
            "INSERT INTO import_batches (id, created_at, source_file_name, parser_id)
             VALUES (?, ?, ?, ?)",
        )
        .bind(batch.id)
        .bind(batch.created_at)
        .bind(&batch.source_file_name)
        .bind(&batch.parser_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

fn decimal_opt(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
    table: &'static str,
) -> Result<Option<Decimal>, StorageError> {
    row.try_get::<Option<String>, _>(column)?
        .map(|s| Decimal::from_str(&s))
        .transpose()
        .map_err(|e| corrupt(table, e))
}

fn corrupt(table: &'static str, err: impl std::fmt::Display) -> StorageError {
    StorageError::CorruptRow {
        table,
        detail: err.to_string(),
    }
}
