use chrono::NaiveDate;

use ledgerport_core::{AccountType, StagedImport};

use crate::error::ImportError;
use crate::pdf::PdfExtract;
use crate::table::RawTable;

/// Output of the raw extractor — either a normalized table (CSV) or the
/// heuristic PDF extract. Parser capability predicates match on this.
#[derive(Debug, Clone)]
pub enum RawDocument {
    Table(RawTable),
    Pdf(PdfExtract),
}

impl RawDocument {
    pub fn table(&self) -> Option<&RawTable> {
        match self {
            RawDocument::Table(t) => Some(t),
            RawDocument::Pdf(_) => None,
        }
    }

    pub fn pdf(&self) -> Option<&PdfExtract> {
        match self {
            RawDocument::Pdf(p) => Some(p),
            RawDocument::Table(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParserContext {
    pub file_name: String,
    /// Reference date for year-less statement rows and holdings as-of dates.
    pub today: NaiveDate,
    /// Caller-supplied account-type hint, used as the classification tier of
    /// last resort.
    pub type_hint: Option<AccountType>,
}

impl ParserContext {
    pub fn new(file_name: &str, today: NaiveDate) -> Self {
        ParserContext {
            file_name: file_name.to_string(),
            today,
            type_hint: None,
        }
    }
}

/// One format-specific parser. `parse` may still fail with
/// `FormatUnrecognized` when rows cannot be interpreted despite a positive
/// capability check.
pub trait StatementParser {
    fn id(&self) -> &'static str;
    fn can_parse(&self, doc: &RawDocument) -> bool;
    fn parse(&self, doc: &RawDocument, ctx: &ParserContext) -> Result<StagedImport, ImportError>;
}

/// The fixed parser order. Capability predicates are not mutually exclusive,
/// so this ordering is load-bearing: strict parsers sit ahead of loose ones
/// because a false positive from a loose parser costs more than a strict
/// parser declining a format it was not built for.
pub fn default_parsers() -> Vec<Box<dyn StatementParser>> {
    vec![
        Box::new(crate::parsers::pdf_summary::PdfSummaryParser),
        Box::new(crate::parsers::pdf_transactions::PdfTransactionsParser),
        Box::new(crate::parsers::bank_csv::BankCsvParser),
        Box::new(crate::parsers::brokerage_csv::BrokerageCsvParser),
        Box::new(crate::parsers::fidelity_csv::FidelityCsvParser),
        Box::new(crate::parsers::holdings_csv::HoldingsCsvParser),
    ]
}

/// First-match-wins selection over the fixed list.
pub fn select_parser<'a>(
    parsers: &'a [Box<dyn StatementParser>],
    doc: &RawDocument,
) -> Option<&'a dyn StatementParser> {
    parsers
        .iter()
        .map(|p| p.as_ref())
        .find(|p| p.can_parse(doc))
}

/// Run the full selection-and-parse step.
pub fn parse_document(doc: &RawDocument, ctx: &ParserContext) -> Result<StagedImport, ImportError> {
    let parsers = default_parsers();
    let parser = select_parser(&parsers, doc).ok_or(ImportError::FormatUnrecognized)?;
    tracing::debug!(parser = parser.id(), file = %ctx.file_name, "parser selected");
    parser.parse(doc, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_csv;

    fn ctx() -> ParserContext {
        ParserContext::new("statement.csv", NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
    }

    #[test]
    fn bank_csv_selected_for_plain_statement() {
        let table = read_csv(b"Date,Description,Amount\n01/15/2026,Coffee Shop,-4.50\n".as_ref()).unwrap();
        let doc = RawDocument::Table(table);
        let parsers = default_parsers();
        let parser = select_parser(&parsers, &doc).unwrap();
        assert_eq!(parser.id(), "bank-csv");
    }

    #[test]
    fn no_parser_for_unrelated_table() {
        let table = read_csv(b"Name,Age\nBob,41\n".as_ref()).unwrap();
        let doc = RawDocument::Table(table);
        let parsers = default_parsers();
        assert!(select_parser(&parsers, &doc).is_none());
        assert!(matches!(
            parse_document(&doc, &ctx()),
            Err(ImportError::FormatUnrecognized)
        ));
    }

    #[test]
    fn ordering_prefers_brokerage_over_holdings_for_activity_export() {
        let table = read_csv(
            b"Date,Action,Symbol,Quantity,Amount\n01/15/2026,BUY,VTI,2,-450.00\n".as_ref(),
        )
        .unwrap();
        let doc = RawDocument::Table(table);
        let parsers = default_parsers();
        assert_eq!(select_parser(&parsers, &doc).unwrap().id(), "brokerage-csv");
    }
}
