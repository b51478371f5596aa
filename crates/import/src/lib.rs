//! Statement import: raw file bytes in, a reviewable [`StagedImport`] out.
//!
//! Dispatch is an ordered first-match scan over [`StatementParser`]
//! implementations; specific formats sit ahead of generic ones.

pub mod classify;
pub mod config;
pub mod error;
pub mod parser;
pub mod parsers;
pub mod pdf;
pub mod summary;
pub mod table;

use chrono::NaiveDate;
use ledgerport_core::{AccountType, StagedImport, TxnKind};

pub use config::{ImportConfig, SummaryConfig};
pub use error::ImportError;
pub use parser::{default_parsers, parse_document, select_parser, ParserContext, RawDocument,
    StatementParser};
pub use pdf::{extract_pdf, PdfExtract};
pub use summary::{AprDetection, StatementSummary};
pub use table::{read_csv, RawTable};

/// A staged import plus anything the user should see before committing it.
#[derive(Debug)]
pub struct PreparedImport {
    pub staged: StagedImport,
    pub advisories: Vec<String>,
}

/// Stage a CSV export. `today` anchors snapshot dates when the file
/// carries none.
pub fn stage_csv(
    data: &[u8],
    file_name: &str,
    today: NaiveDate,
    type_hint: Option<AccountType>,
) -> Result<PreparedImport, ImportError> {
    let table = table::read_csv(data)?;
    let doc = RawDocument::Table(table);
    let mut ctx = ParserContext::new(file_name, today);
    ctx.type_hint = type_hint;
    let staged = parser::parse_document(&doc, &ctx)?;
    Ok(prepare(staged))
}

/// Stage an already-extracted PDF (one string per page, layout preserved).
pub fn stage_pdf(
    pages: &[String],
    file_name: &str,
    config: &SummaryConfig,
    today: NaiveDate,
    type_hint: Option<AccountType>,
) -> Result<PreparedImport, ImportError> {
    let extract = pdf::extract_pdf(pages, config, today);
    let doc = RawDocument::Pdf(extract);
    let mut ctx = ParserContext::new(file_name, today);
    ctx.type_hint = type_hint;
    let staged = parser::parse_document(&doc, &ctx)?;
    Ok(prepare(staged))
}

fn prepare(staged: StagedImport) -> PreparedImport {
    let mut advisories = Vec::new();
    if staged.suggested_account_type.is_none() {
        advisories.push(
            "Account type could not be inferred; it will be asked for at commit.".to_string(),
        );
    }
    let has_trades = staged
        .transactions
        .iter()
        .any(|t| matches!(t.kind, TxnKind::Buy | TxnKind::Sell));
    if has_trades && staged.balances.is_empty() {
        advisories.push(
            "Brokerage activity will not affect account totals until a balance snapshot is set."
                .to_string(),
        );
    }
    PreparedImport { staged, advisories }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn stage_csv_end_to_end() {
        let data = b"Date,Description,Amount\n01/15/2026,Coffee Shop,-4.50\n";
        let prepared = stage_csv(data, "checking.csv", today(), None).unwrap();
        assert_eq!(prepared.staged.parser_id, "bank-csv");
        assert_eq!(prepared.staged.transactions[0].amount_cents, -450);
    }

    #[test]
    fn unknown_format_is_an_error() {
        let data = b"Foo,Bar\nx,y\n";
        assert!(matches!(
            stage_csv(data, "junk.csv", today(), None),
            Err(ImportError::FormatUnrecognized)
        ));
    }

    #[test]
    fn brokerage_without_balance_gets_advisory() {
        let data = b"Date,Action,Symbol,Description,Quantity,Price,Amount\n\
01/15/2026,Buy,VTI,Bought 2 VTI,2,240.00,-480.00\n";
        let prepared = stage_csv(data, "brokerage.csv", today(), None).unwrap();
        assert!(prepared
            .advisories
            .iter()
            .any(|a| a.contains("balance snapshot")));
    }

    #[test]
    fn stage_pdf_end_to_end() {
        let pages = vec!["New Balance $2,100.00\nMinimum Payment Due $42.00".to_string()];
        let prepared = stage_pdf(
            &pages,
            "card.pdf",
            &SummaryConfig::default(),
            today(),
            None,
        )
        .unwrap();
        assert_eq!(prepared.staged.parser_id, "pdf-summary");
        assert_eq!(prepared.staged.balances[0].balance_cents, 210_000);
        assert_eq!(prepared.staged.liability_hints.minimum_payment_cents, Some(4_200));
        assert!(prepared.advisories.is_empty());
    }
}
