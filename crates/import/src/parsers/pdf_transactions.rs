use ledgerport_core::{StagedImport, StagedTransaction};

use crate::classify;
use crate::error::ImportError;
use crate::parser::{ParserContext, RawDocument, StatementParser};

/// Fallback for PDFs with no account-summary block but recognizable
/// transaction rows (checking/savings statements, mostly).
pub struct PdfTransactionsParser;

impl StatementParser for PdfTransactionsParser {
    fn id(&self) -> &'static str {
        "pdf-transactions"
    }

    fn can_parse(&self, doc: &RawDocument) -> bool {
        doc.pdf().is_some_and(|p| !p.rows.is_empty())
    }

    fn parse(&self, doc: &RawDocument, ctx: &ParserContext) -> Result<StagedImport, ImportError> {
        let extract = doc.pdf().ok_or(ImportError::FormatUnrecognized)?;
        if extract.rows.is_empty() {
            return Err(ImportError::FormatUnrecognized);
        }

        let mut staged = StagedImport::new(self.id(), &ctx.file_name);
        for row in &extract.rows {
            staged
                .transactions
                .push(StagedTransaction::new(row.date, row.amount_cents, &row.description));
        }
        staged.suggested_account_type =
            classify::classify_account_type(&[], &[], &ctx.file_name, ctx.type_hint);
        Ok(staged)
    }
}
