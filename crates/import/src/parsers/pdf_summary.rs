use chrono::Datelike;

use ledgerport_core::{AccountType, StagedBalance, StagedImport, StagedTransaction};

use crate::classify;
use crate::error::ImportError;
use crate::parser::{ParserContext, RawDocument, StatementParser};

/// Card/loan statement PDF with an account-summary block. Stages the new
/// balance (plus detected APR) as a balance snapshot and carries the
/// minimum-payment / due-date hints for loan-terms promotion at resolution.
pub struct PdfSummaryParser;

impl StatementParser for PdfSummaryParser {
    fn id(&self) -> &'static str {
        "pdf-summary"
    }

    fn can_parse(&self, doc: &RawDocument) -> bool {
        doc.pdf().is_some_and(|p| p.summary.is_some())
    }

    fn parse(&self, doc: &RawDocument, ctx: &ParserContext) -> Result<StagedImport, ImportError> {
        let extract = doc.pdf().ok_or(ImportError::FormatUnrecognized)?;
        let summary = extract
            .summary
            .as_ref()
            .ok_or(ImportError::FormatUnrecognized)?;

        let mut staged = StagedImport::new(self.id(), &ctx.file_name);

        // The balance is staged as printed (amount owed, positive);
        // liability sign coercion happens at account resolution.
        let mut balance = StagedBalance::new(ctx.today, summary.new_balance_cents);
        if let Some(apr) = &extract.apr {
            balance.interest_rate_apr = Some(apr.rate);
            balance.interest_rate_scale = Some(apr.scale);
        }
        staged.balances.push(balance);

        staged.liability_hints.minimum_payment_cents = summary.minimum_payment_cents;
        staged.liability_hints.due_day = summary.due_date.map(|d| d.day());

        // Any transaction rows recovered from the same document ride along.
        for row in &extract.rows {
            staged
                .transactions
                .push(StagedTransaction::new(row.date, row.amount_cents, &row.description));
        }

        staged.suggested_account_type =
            if summary.minimum_payment_cents.is_some() || extract.apr.is_some() {
                Some(AccountType::CreditCard)
            } else {
                classify::classify_account_type(&[], &[], &ctx.file_name, ctx.type_hint)
            };
        Ok(staged)
    }
}
