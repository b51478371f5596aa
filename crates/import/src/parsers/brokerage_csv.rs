use ledgerport_core::{parse_amount_cents, parse_date, parse_quantity, AccountType, StagedImport, StagedTransaction, TxnKind};

use crate::error::ImportError;
use crate::parser::{ParserContext, RawDocument, StatementParser};
use crate::table::RawTable;

/// Generic brokerage activity CSV: symbol + action + signed amount, with
/// optional quantity/price/fee columns. Uses exact column names; exports with
/// decorated headers ("Amount ($)") fall through to the institution variants.
pub struct BrokerageCsvParser;

struct Columns {
    date: usize,
    action: usize,
    symbol: usize,
    amount: usize,
    quantity: Option<usize>,
    price: Option<usize>,
    fees: Option<usize>,
    description: Option<usize>,
}

fn locate_columns(table: &RawTable) -> Option<Columns> {
    let headers = table.normalized_headers();
    let date = headers.iter().position(|h| h.contains("date"))?;
    let action = headers
        .iter()
        .position(|h| h == "action" || h == "activity" || h == "transaction type")?;
    Some(Columns {
        date,
        action,
        symbol: table.column_index("symbol")?,
        amount: table.column_index("amount")?,
        quantity: table.column_index("quantity").or_else(|| table.column_index("shares")),
        price: table.column_index("price"),
        fees: table.column_index("fees"),
        description: table.column_index("description"),
    })
}

/// Map an activity phrase onto a transaction kind. Unrecognized activity
/// stays at the base kind and is left for user review.
pub(crate) fn kind_from_action(action: &str) -> TxnKind {
    let lower = action.to_lowercase();
    if lower.contains("buy")
        || lower.contains("bought")
        || lower.contains("purchase")
        || lower.contains("reinvest")
    {
        TxnKind::Buy
    } else if lower.contains("sell") || lower.contains("sold") || lower.contains("sale") {
        TxnKind::Sell
    } else if lower.contains("div") {
        TxnKind::Dividend
    } else if lower.contains("interest") {
        TxnKind::Interest
    } else if lower.contains("fee") {
        TxnKind::Fee
    } else if lower.contains("deposit") || lower.contains("contribution") {
        TxnKind::Deposit
    } else if lower.contains("withdraw") || lower.contains("distribution") {
        TxnKind::Withdrawal
    } else {
        TxnKind::Bank
    }
}

impl StatementParser for BrokerageCsvParser {
    fn id(&self) -> &'static str {
        "brokerage-csv"
    }

    fn can_parse(&self, doc: &RawDocument) -> bool {
        doc.table().and_then(locate_columns).is_some()
    }

    fn parse(&self, doc: &RawDocument, ctx: &ParserContext) -> Result<StagedImport, ImportError> {
        let table = doc.table().ok_or(ImportError::FormatUnrecognized)?;
        let cols = locate_columns(table).ok_or(ImportError::FormatUnrecognized)?;

        let mut staged = StagedImport::new(self.id(), &ctx.file_name);
        for row in &table.rows {
            if let Some(txn) = parse_row(row, &cols) {
                staged.transactions.push(txn);
            }
        }

        if staged.transactions.is_empty() {
            return Err(ImportError::FormatUnrecognized);
        }
        staged.suggested_account_type = Some(AccountType::Brokerage);
        Ok(staged)
    }
}

fn parse_row(row: &[String], cols: &Columns) -> Option<StagedTransaction> {
    let date = parse_date(row.get(cols.date)?, "%m/%d/%Y").ok()?;
    let amount_cents = parse_amount_cents(row.get(cols.amount)?).ok()?;
    let action = row.get(cols.action)?.trim();

    let symbol = row
        .get(cols.symbol)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());
    let payee = cols
        .description
        .and_then(|i| row.get(i))
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| match &symbol {
            Some(sym) => format!("{action} {sym}"),
            None => action.to_string(),
        });

    let mut txn = StagedTransaction::new(date, amount_cents, payee.trim());
    txn.kind = kind_from_action(action);
    txn.symbol = symbol;
    txn.quantity = cols.quantity.and_then(|i| row.get(i)).and_then(|s| parse_quantity(s));
    txn.price = cols.price.and_then(|i| row.get(i)).and_then(|s| parse_quantity(s));
    txn.fees_cents = cols
        .fees
        .and_then(|i| row.get(i))
        .and_then(|s| parse_amount_cents(s).ok());
    Some(txn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_csv;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn ctx() -> ParserContext {
        ParserContext::new("brokerage.csv", NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
    }

    fn doc(data: &[u8]) -> RawDocument {
        RawDocument::Table(read_csv(data).unwrap())
    }

    #[test]
    fn parses_buy_and_dividend_rows() {
        let doc = doc(
            b"Date,Action,Symbol,Quantity,Price,Amount\n\
              01/15/2026,BUY,VTI,2,225.00,-450.00\n\
              01/20/2026,DIVIDEND,VTI,,,12.11\n",
        );
        assert!(BrokerageCsvParser.can_parse(&doc));
        let staged = BrokerageCsvParser.parse(&doc, &ctx()).unwrap();
        assert_eq!(staged.suggested_account_type, Some(AccountType::Brokerage));
        assert_eq!(staged.transactions.len(), 2);

        let buy = &staged.transactions[0];
        assert_eq!(buy.kind, TxnKind::Buy);
        assert_eq!(buy.symbol.as_deref(), Some("VTI"));
        assert_eq!(buy.quantity, Some(Decimal::from(2)));
        assert_eq!(buy.amount_cents, -45_000);

        assert_eq!(staged.transactions[1].kind, TxnKind::Dividend);
    }

    #[test]
    fn declines_decorated_headers() {
        // "Amount ($)" is not an exact "amount" column; the Fidelity variant
        // handles that shape.
        let doc = doc(b"Run Date,Action,Symbol,Amount ($)\n01/15/2026,BUY,VTI,-450.00\n");
        assert!(!BrokerageCsvParser.can_parse(&doc));
    }

    #[test]
    fn kind_mapping() {
        assert_eq!(kind_from_action("Buy"), TxnKind::Buy);
        assert_eq!(kind_from_action("YOU BOUGHT"), TxnKind::Buy);
        assert_eq!(kind_from_action("YOU SOLD"), TxnKind::Sell);
        assert_eq!(kind_from_action("Sold 2 shares"), TxnKind::Sell);
        assert_eq!(kind_from_action("Qualified Dividend"), TxnKind::Dividend);
        assert_eq!(kind_from_action("Wire withdrawal"), TxnKind::Withdrawal);
        assert_eq!(kind_from_action("Mystery"), TxnKind::Bank);
    }

    #[test]
    fn synthesizes_payee_from_action_and_symbol() {
        let doc = doc(b"Date,Action,Symbol,Amount\n01/15/2026,BUY,VTI,-450.00\n");
        let staged = BrokerageCsvParser.parse(&doc, &ctx()).unwrap();
        assert_eq!(staged.transactions[0].payee, "BUY VTI");
    }
}
