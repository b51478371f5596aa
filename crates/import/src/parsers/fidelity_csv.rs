use ledgerport_core::{parse_amount_cents, parse_date, parse_quantity, AccountType, StagedImport, StagedTransaction};

use crate::error::ImportError;
use crate::parser::{ParserContext, RawDocument, StatementParser};
use crate::parsers::brokerage_csv::kind_from_action;
use crate::table::RawTable;

/// Fidelity activity export: "Run Date" plus unit-decorated columns
/// ("Price ($)", "Amount ($)") that the generic brokerage parser declines.
pub struct FidelityCsvParser;

struct Columns {
    date: usize,
    action: usize,
    symbol: usize,
    amount: usize,
    quantity: Option<usize>,
    price: Option<usize>,
    fees: Option<usize>,
}

fn locate_columns(table: &RawTable) -> Option<Columns> {
    let headers = table.normalized_headers();
    let date = headers.iter().position(|h| h.contains("run date"))?;
    Some(Columns {
        date,
        action: table.column_containing("action")?,
        symbol: table.column_containing("symbol")?,
        amount: table.column_containing("amount")?,
        quantity: table.column_containing("quantity"),
        price: table.column_containing("price"),
        fees: table.column_containing("fees"),
    })
}

impl StatementParser for FidelityCsvParser {
    fn id(&self) -> &'static str {
        "fidelity-csv"
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
            let Ok(date) = parse_date(date_cell, "%m/%d/%Y") else { continue };
            let Some(amount_cents) = row.get(cols.amount).and_then(|s| parse_amount_cents(s).ok())
            else {
                continue;
            };
            let action = row.get(cols.action).map(String::as_str).unwrap_or("").trim();
            let symbol = row
                .get(cols.symbol)
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty());

            let payee = match &symbol {
                Some(sym) => format!("{action} {sym}"),
                None => action.to_string(),
            };
            let mut txn = StagedTransaction::new(date, amount_cents, payee.trim());
            txn.kind = kind_from_action(action);
            txn.symbol = symbol;
            txn.quantity = cols.quantity.and_then(|i| row.get(i)).and_then(|s| parse_quantity(s));
            txn.price = cols.price.and_then(|i| row.get(i)).and_then(|s| parse_quantity(s));
            txn.fees_cents = cols
                .fees
                .and_then(|i| row.get(i))
                .and_then(|s| parse_amount_cents(s).ok());
            staged.transactions.push(txn);
        }

        if staged.transactions.is_empty() {
            return Err(ImportError::FormatUnrecognized);
        }
        staged.suggested_account_type = Some(AccountType::Brokerage);
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_csv;
    use chrono::NaiveDate;
    use ledgerport_core::TxnKind;

    fn ctx() -> ParserContext {
        ParserContext::new("Fidelity_Activity.csv", NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
    }

    const SAMPLE: &[u8] = b"Run Date,Action,Symbol,Description,Quantity,Price ($),Fees ($),Amount ($)\n\
        01/15/2026,YOU BOUGHT,VTI,VANGUARD TOTAL STOCK,2,225.00,0.00,-450.00\n\
        01/31/2026,DIVIDEND RECEIVED,VTI,VANGUARD TOTAL STOCK,,,,12.11\n";

    #[test]
    fn parses_fidelity_export() {
        let doc = RawDocument::Table(read_csv(SAMPLE).unwrap());
        assert!(FidelityCsvParser.can_parse(&doc));
        let staged = FidelityCsvParser.parse(&doc, &ctx()).unwrap();
        assert_eq!(staged.parser_id, "fidelity-csv");
        assert_eq!(staged.transactions.len(), 2);
        assert_eq!(staged.transactions[0].kind, TxnKind::Buy);
        assert_eq!(staged.transactions[0].amount_cents, -45_000);
        assert_eq!(staged.transactions[1].kind, TxnKind::Dividend);
        assert_eq!(staged.suggested_account_type, Some(AccountType::Brokerage));
    }

    #[test]
    fn declines_plain_bank_table() {
        let doc = RawDocument::Table(
            read_csv(b"Date,Description,Amount\n01/15/2026,Coffee,-4.50\n".as_ref()).unwrap(),
        );
        assert!(!FidelityCsvParser.can_parse(&doc));
    }
}
