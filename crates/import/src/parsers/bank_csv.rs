use ledgerport_core::{parse_amount_cents, parse_date, StagedImport, StagedTransaction};

use crate::classify;
use crate::error::ImportError;
use crate::parser::{ParserContext, RawDocument, StatementParser};
use crate::table::RawTable;

/// Generic bank/credit-card activity CSV: a date, a description, and either a
/// signed amount column or a debit/credit pair.
pub struct BankCsvParser;

/// Headers that mark a table as brokerage-shaped; the bank parser declines
/// those so the stricter brokerage parsers get their turn.
const EXCLUDED_HEADERS: &[&str] = &["symbol", "ticker", "cusip", "shares"];

struct Columns {
    date: usize,
    description: usize,
    amount: Option<usize>,
    debit: Option<usize>,
    credit: Option<usize>,
    memo: Option<usize>,
    label: Option<usize>,
}

fn locate_columns(table: &RawTable) -> Option<Columns> {
    let headers = table.normalized_headers();
    if headers
        .iter()
        .any(|h| EXCLUDED_HEADERS.iter().any(|x| h.contains(x)))
    {
        return None;
    }

    let date = headers.iter().position(|h| h.contains("date"))?;
    let description = headers
        .iter()
        .position(|h| h.contains("description") || h.contains("payee") || h.contains("merchant"))?;

    let amount = table.column_index("amount");
    let debit = table.column_index("debit");
    let credit = table.column_index("credit");
    if amount.is_none() && (debit.is_none() || credit.is_none()) {
        return None;
    }

    Some(Columns {
        date,
        description,
        amount,
        debit,
        credit,
        memo: table.column_containing("memo").or_else(|| table.column_containing("notes")),
        label: table
            .column_index("account")
            .or_else(|| table.column_index("card"))
            .or_else(|| table.column_index("account name")),
    })
}

impl StatementParser for BankCsvParser {
    fn id(&self) -> &'static str {
        "bank-csv"
    }

    fn can_parse(&self, doc: &RawDocument) -> bool {
        doc.table().and_then(locate_columns).is_some()
    }

    fn parse(&self, doc: &RawDocument, ctx: &ParserContext) -> Result<StagedImport, ImportError> {
        let table = doc.table().ok_or(ImportError::FormatUnrecognized)?;
        let cols = locate_columns(table).ok_or(ImportError::FormatUnrecognized)?;

        let mut staged = StagedImport::new(self.id(), &ctx.file_name);
        for row in &table.rows {
            let Some(date_cell) = row.get(cols.date) else { continue };
            // Totals rows and page furniture fail date parsing; skip them.
            let Ok(date) = parse_date(date_cell, "%m/%d/%Y") else { continue };

            let payee = row.get(cols.description).map(String::as_str).unwrap_or("").trim();
            let amount_cents = match row_amount(row, &cols) {
                Some(cents) => cents,
                None => continue,
            };

            let mut txn = StagedTransaction::new(date, amount_cents, payee);
            txn.memo = cols
                .memo
                .and_then(|i| row.get(i))
                .filter(|s| !s.is_empty())
                .cloned();
            txn.source_account_label = cols
                .label
                .and_then(|i| row.get(i))
                .filter(|s| !s.is_empty())
                .cloned();
            staged.transactions.push(txn);
        }

        if staged.transactions.is_empty() {
            return Err(ImportError::FormatUnrecognized);
        }

        staged.suggested_account_type = classify::classify_account_type(
            &table.headers,
            &table.rows,
            &ctx.file_name,
            ctx.type_hint,
        );
        Ok(staged)
    }
}

/// Signed ledger convention: money leaving the account is negative. A signed
/// amount column is taken verbatim; debit/credit pairs are folded with debit
/// as outflow.
fn row_amount(row: &[String], cols: &Columns) -> Option<i64> {
    if let Some(i) = cols.amount {
        return parse_amount_cents(row.get(i)?).ok();
    }
    let debit = cols
        .debit
        .and_then(|i| row.get(i))
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| parse_amount_cents(s).ok());
    let credit = cols
        .credit
        .and_then(|i| row.get(i))
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| parse_amount_cents(s).ok());
    match (debit, credit) {
        (Some(d), None) => Some(-d.abs()),
        (None, Some(c)) => Some(c.abs()),
        _ => None,
    }
}
