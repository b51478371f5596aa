use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};

use ledgerport_core::{AccountId, AccountType};
use ledgerport_import::{stage_csv, stage_pdf, ImportConfig, PreparedImport};
use ledgerport_ledger::{
    commit_import, delete_batch, replace_batch, resolve_accounts, ForceKeys, TransferReconciler,
};
use ledgerport_storage::{create_db, load_ledger, save_ledger, DbPool};

mod pdftotext;

#[derive(Parser)]
#[command(name = "ledgerport", version, about = "Import bank and brokerage statements into a local ledger")]
struct Cli {
    /// Database file. Defaults to the platform data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML file tuning statement-summary extraction.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stage a statement file, commit it, and reconcile transfers.
    Import {
        file: PathBuf,
        /// Account type when the file does not reveal it (e.g. "creditCard").
        #[arg(long)]
        account_type: Option<String>,
        /// Commit into this existing account instead of resolving one.
        #[arg(long)]
        account: Option<i64>,
        /// Transfer pairing window in days.
        #[arg(long, default_value_t = 3)]
        window_days: i64,
    },
    /// Re-import a statement into an existing batch.
    Reimport {
        #[arg(long)]
        batch: i64,
        file: PathBuf,
        /// Overwrite rows you have edited locally.
        #[arg(long)]
        force_all: bool,
        #[arg(long)]
        account_type: Option<String>,
    },
    /// List accounts.
    Accounts,
    /// List import batches.
    Batches,
    /// Delete a batch and everything it imported.
    DeleteBatch { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let pool = create_db(&db_path).await.context("opening database")?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Import { file, account_type, account, window_days } => {
            cmd_import(&pool, &config, &file, account_type, account, window_days).await
        }
        Command::Reimport { batch, file, force_all, account_type } => {
            cmd_reimport(&pool, &config, batch, &file, force_all, account_type).await
        }
        Command::Accounts => cmd_accounts(&pool).await,
        Command::Batches => cmd_batches(&pool).await,
        Command::DeleteBatch { id } => cmd_delete_batch(&pool, id).await,
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "anomalyco", "ledgerport")
        .context("cannot determine data directory; pass --db")?;
    std::fs::create_dir_all(dirs.data_dir())?;
    Ok(dirs.data_dir().join("ledger.db"))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ImportConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ImportConfig::from_toml(&text).map_err(|e| anyhow::anyhow!(e))
        }
        None => Ok(ImportConfig::default()),
    }
}

fn parse_type(s: &str) -> anyhow::Result<AccountType> {
    AccountType::from_str(s).map_err(|e| anyhow::anyhow!(e))
}

fn stage_file(
    config: &ImportConfig,
    file: &Path,
    type_hint: Option<AccountType>,
) -> anyhow::Result<PreparedImport> {
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let today = Local::now().date_naive();

    let is_pdf = file
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    let prepared = if is_pdf {
        let pages = pdftotext::extract_pages(file)?;
        stage_pdf(&pages, &file_name, &config.summary, today, type_hint)?
    } else {
        let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
        stage_csv(&data, &file_name, today, type_hint)?
    };
    Ok(prepared)
}

async fn cmd_import(
    pool: &DbPool,
    config: &ImportConfig,
    file: &Path,
    account_type: Option<String>,
    account: Option<i64>,
    window_days: i64,
) -> anyhow::Result<()> {
    let type_hint = account_type.as_deref().map(parse_type).transpose()?;
    let prepared = stage_file(config, file, type_hint)?;

    print_review(&prepared);
    let account_type = prepared
        .staged
        .suggested_account_type
        .or(type_hint)
        .context("account type could not be inferred; pass --account-type")?;

    let mut ledger = load_ledger(pool).await?;
    let resolved = resolve_accounts(
        &mut ledger,
        &prepared.staged,
        account_type,
        account.map(AccountId),
    )?;
    let outcome = commit_import(&mut ledger, &prepared.staged, &resolved, Utc::now());
    let pairs = TransferReconciler { window_days }
        .reconcile(&mut ledger, &outcome.inserted_transactions);
    save_ledger(pool, &ledger).await?;

    println!(
        "Batch {}: {} transactions, {} balances, {} holdings ({} duplicates skipped, {} transfers linked)",
        outcome.batch_id,
        outcome.inserted_transactions.len(),
        outcome.inserted_balances,
        outcome.inserted_holdings,
        outcome.skipped_duplicates,
        pairs.len(),
    );
    Ok(())
}

async fn cmd_reimport(
    pool: &DbPool,
    config: &ImportConfig,
    batch: i64,
    file: &Path,
    force_all: bool,
    account_type: Option<String>,
) -> anyhow::Result<()> {
    let type_hint = account_type.as_deref().map(parse_type).transpose()?;
    let prepared = stage_file(config, file, type_hint)?;

    let mut ledger = load_ledger(pool).await?;
    let mut force = ForceKeys::default();
    if force_all {
        for txn in prepared.staged.included_transactions() {
            force
                .transactions
                .insert(ledgerport_ledger::staged_fingerprint(txn));
        }
        for balance in prepared.staged.included_balances() {
            force.balances.insert(balance.as_of_date);
        }
        for holding in prepared.staged.included_holdings() {
            force
                .holdings
                .insert((holding.symbol.clone(), holding.as_of_date));
        }
    }
    let outcome = replace_batch(&mut ledger, batch, &prepared.staged, &force)?;
    save_ledger(pool, &ledger).await?;

    for (label, counts) in [
        ("transactions", outcome.transactions),
        ("balances", outcome.balances),
        ("holdings", outcome.holdings),
    ] {
        println!(
            "{label}: {} updated, {} inserted, {} deleted",
            counts.updated, counts.inserted, counts.deleted
        );
    }
    Ok(())
}

async fn cmd_accounts(pool: &DbPool) -> anyhow::Result<()> {
    let ledger = load_ledger(pool).await?;
    if ledger.accounts.is_empty() {
        println!("No accounts.");
        return Ok(());
    }
    for account in ledger.accounts.values() {
        let id = account.id.map(|a| a.0).unwrap_or_default();
        let institution = account.institution_name.as_deref().unwrap_or("-");
        let txns = account
            .id
            .map(|a| ledger.transactions_for_account(a).count())
            .unwrap_or_default();
        println!(
            "{id:>4}  {:<12} {:<30} {institution:<20} {txns} txns",
            account.account_type.to_string(),
            account.name,
        );
    }
    Ok(())
}

async fn cmd_batches(pool: &DbPool) -> anyhow::Result<()> {
    let ledger = load_ledger(pool).await?;
    if ledger.batches.is_empty() {
        println!("No import batches.");
        return Ok(());
    }
    for batch in ledger.batches.values() {
        let txns = ledger.transactions_in_batch(batch.id).count();
        let parser = batch.parser_id.as_deref().unwrap_or("-");
        println!(
            "{:>4}  {}  {:<16} {:>5} txns  {}",
            batch.id,
            batch.created_at.format("%Y-%m-%d %H:%M"),
            parser,
            txns,
            batch.source_file_name,
        );
    }
    Ok(())
}

async fn cmd_delete_batch(pool: &DbPool, id: i64) -> anyhow::Result<()> {
    let mut ledger = load_ledger(pool).await?;
    let outcome = delete_batch(&mut ledger, id)?;
    save_ledger(pool, &ledger).await?;
    println!(
        "Deleted batch {id}: {} transactions, {} balances, {} holdings, {} accounts removed",
        outcome.transactions_deleted,
        outcome.balances_deleted,
        outcome.holdings_deleted,
        outcome.accounts_deleted.len(),
    );
    Ok(())
}

fn print_review(prepared: &PreparedImport) {
    let staged = &prepared.staged;
    for advisory in &prepared.advisories {
        eprintln!("note: {advisory}");
    }

    if !staged.transactions.is_empty() {
        println!("Transactions ({}):", staged.transactions.len());
        for txn in &staged.transactions {
            println!(
                "  {}  {:>12}  {}",
                txn.date_posted,
                format_cents(txn.amount_cents),
                txn.payee,
            );
        }
    }
    for balance in &staged.balances {
        println!(
            "Balance as of {}: {}",
            balance.as_of_date,
            format_cents(balance.balance_cents)
        );
    }
    if !staged.holdings.is_empty() {
        println!("Holdings ({}):", staged.holdings.len());
        for holding in &staged.holdings {
            println!(
                "  {:<8} {:>14}  {}",
                holding.symbol,
                holding.quantity,
                holding
                    .market_value_cents
                    .map(format_cents)
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}
