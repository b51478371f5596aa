use ledgerport_core::{parse_amount_cents, parse_date, parse_quantity, AccountType, StagedHolding, StagedImport};

use crate::error::ImportError;
use crate::parser::{ParserContext, RawDocument, StatementParser};
use crate::table::RawTable;

/// Positions export: symbol + share count + optional market value. No action
/// column — that shape belongs to the activity parsers, which sit earlier in
/// the order.
pub struct HoldingsCsvParser;

struct Columns {
    symbol: usize,
    quantity: usize,
    value: Option<usize>,
    date: Option<usize>,
}

fn locate_columns(table: &RawTable) -> Option<Columns> {
    let headers = table.normalized_headers();
    if headers
        .iter()
        .any(|h| h == "action" || h == "activity" || h == "transaction type")
    {
        return None;
    }
    let symbol = headers.iter().position(|h| h.contains("symbol") || h.contains("ticker"))?;
    let quantity = headers
        .iter()
        .position(|h| h.contains("quantity") || h.contains("shares"))?;
    Some(Columns {
        symbol,
        quantity,
        value: headers
            .iter()
            .position(|h| h.contains("market value") || h.contains("current value") || h == "value"),
        date: headers.iter().position(|h| h.contains("date")),
    })
}

impl StatementParser for HoldingsCsvParser {
    fn id(&self) -> &'static str {
        "holdings-csv"
    }

    fn can_parse(&self, doc: &RawDocument) -> bool {
        doc.table().and_then(locate_columns).is_some()
    }

    fn parse(&self, doc: &RawDocument, ctx: &ParserContext) -> Result<StagedImport, ImportError> {
        let table = doc.table().ok_or(ImportError::FormatUnrecognized)?;
        let cols = locate_columns(table).ok_or(ImportError::FormatUnrecognized)?;

        let mut staged = StagedImport::new(self.id(), &ctx.file_name);
        for row in &table.rows {
            let symbol = match row.get(cols.symbol).map(|s| s.trim().to_uppercase()) {
                Some(s) if !s.is_empty() => s,
                _ => continue,
            };
            let Some(quantity) = row.get(cols.quantity).and_then(|s| parse_quantity(s)) else {
                continue;
            };
            // Positions exports are point-in-time; without a date column the
            // snapshot is dated to the import day.
            let as_of_date = cols
                .date
                .and_then(|i| row.get(i))
                .and_then(|s| parse_date(s, "%m/%d/%Y").ok())
                .unwrap_or(ctx.today);

            staged.holdings.push(StagedHolding {
                as_of_date,
                symbol,
                quantity,
                market_value_cents: cols
                    .value
                    .and_then(|i| row.get(i))
                    .and_then(|s| parse_amount_cents(s).ok()),
                include: true,
            });
        }

        if staged.holdings.is_empty() {
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
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn ctx() -> ParserContext {
        ParserContext::new("positions.csv", NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
    }

    #[test]
    fn parses_positions_export() {
        let doc = RawDocument::Table(
            read_csv(
                b"Symbol,Description,Quantity,Market Value\nVTI,Total Stock,10.5,2480.10\nBND,Total Bond,20,1500.00\n".as_ref(),
            )
            .unwrap(),
        );
        assert!(HoldingsCsvParser.can_parse(&doc));
        let staged = HoldingsCsvParser.parse(&doc, &ctx()).unwrap();
        assert_eq!(staged.holdings.len(), 2);
        assert_eq!(staged.holdings[0].symbol, "VTI");
        assert_eq!(staged.holdings[0].quantity, Decimal::from_str("10.5").unwrap());
        assert_eq!(staged.holdings[0].market_value_cents, Some(248_010));
        // No date column: snapshots dated to the import day.
        assert_eq!(staged.holdings[0].as_of_date, ctx().today);
        assert_eq!(staged.suggested_account_type, Some(AccountType::Brokerage));
    }

    #[test]
    fn declines_activity_export() {
        let doc = RawDocument::Table(
            read_csv(b"Date,Action,Symbol,Quantity,Amount\n01/15/2026,BUY,VTI,2,-450.00\n".as_ref())
                .unwrap(),
        );
        assert!(!HoldingsCsvParser.can_parse(&doc));
    }

    #[test]
    fn skips_footer_rows_without_symbol() {
        let doc = RawDocument::Table(
            read_csv(b"Symbol,Quantity,Market Value\nVTI,10,2480.10\n,,3980.10\n".as_ref()).unwrap(),
        );
        let staged = HoldingsCsvParser.parse(&doc, &ctx()).unwrap();
        assert_eq!(staged.holdings.len(), 1);
    }
}
