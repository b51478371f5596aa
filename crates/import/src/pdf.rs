use chrono::{Datelike, Days, NaiveDate};

use ledgerport_core::parse_amount_cents;

use crate::config::SummaryConfig;
use crate::summary::{self, AprDetection, StatementSummary};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        pub(crate) fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub(crate) use re;

re!(re_txn_row,
    r"^(?P<date>\d{1,2}/\d{1,2}(?:/\d{2,4})?)\s+(?P<desc>.+?)\s+(?P<amount>-?\(?\$?[\d,]+\.\d{2}\)?)(?:\s+(?P<balance>-?\$?[\d,]+\.\d{2}))?\s*$");
re!(re_page_footer, r"(?i)\bpage\s+\d+\s+of\s+\d+\b");
re!(re_any_digit, r"\d");

/// A `(date, description, amount[, balance])` row recovered from PDF text.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfRow {
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: i64,
    pub balance_cents: Option<i64>,
}

/// Everything the PDF raw extractor recovered from a document's page text.
/// Which parser consumes it is decided by the ordered parser set.
#[derive(Debug, Clone)]
pub struct PdfExtract {
    pub summary: Option<StatementSummary>,
    pub apr: Option<AprDetection>,
    pub rows: Vec<PdfRow>,
}

/// Run both extraction modes over per-page text.
pub fn extract_pdf(pages: &[String], config: &SummaryConfig, today: NaiveDate) -> PdfExtract {
    let lines: Vec<&str> = pages
        .iter()
        .flat_map(|p| p.lines())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let summary = summary::extract_summary(&lines, config);
    let apr = summary::extract_apr(&lines, config);
    let rows = extract_rows(&lines, today);

    tracing::debug!(
        rows = rows.len(),
        has_summary = summary.is_some(),
        has_apr = apr.is_some(),
        "pdf extraction finished"
    );

    PdfExtract { summary, apr, rows }
}

// ── Transactions mode ────────────────────────────────────────────────────────

/// Section-header phrases that PDF text extraction interleaves with real
/// transaction rows. Matched as substrings of the lowercased line.
const SECTION_PHRASES: &[&str] = &[
    "total electronic withdrawals",
    "total deposits and additions",
    "total withdrawals",
    "total checks paid",
    "total fees charged",
    "daily ending balance",
    "beginning balance",
    "ending balance",
    "previous balance",
    "transaction detail",
    "account summary",
    "summary of account activity",
    "interest charge calculation",
    "fees charged",
    "annual percentage rate",
];

/// Keywords that, combined with a "Total ..." prefix, mark a totals row.
const TOTAL_KEYWORDS: &[&str] = &[
    "withdrawal", "deposit", "fee", "balance", "check", "credit", "debit", "purchase", "payment",
    "interest",
];

/// Statement-period / page-furniture fragments.
const BOILERPLATE_PHRASES: &[&str] = &[
    "statement period",
    "statement date",
    "account number",
    "customer service",
    "member fdic",
    "p.o. box",
    "questions?",
    "continued on next page",
];

fn extract_rows(lines: &[&str], today: NaiveDate) -> Vec<PdfRow> {
    let mut rows = Vec::new();
    for line in lines {
        if reject_line(line) {
            continue;
        }
        if let Some(row) = parse_txn_line(line, today) {
            rows.push(row);
        }
    }
    rows
}

/// Layered denylist: the text layer gives no structural markup, so rows are
/// rejected by vocabulary rather than accepted by position.
pub fn reject_line(line: &str) -> bool {
    let lower = line.to_lowercase();

    if SECTION_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }

    if lower.starts_with("total") && TOTAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }

    if is_column_header(&lower) {
        return true;
    }

    if BOILERPLATE_PHRASES.iter().any(|p| lower.contains(p)) || re_page_footer().is_match(line) {
        return true;
    }

    if is_allcaps_furniture(line) {
        return true;
    }

    false
}

/// Running column-header rows ("Date Description Amount Balance") repeat on
/// every page.
fn is_column_header(lower: &str) -> bool {
    if re_any_digit().is_match(lower) {
        return false;
    }
    let has_date = lower.contains("date");
    let has_body = lower.contains("description") || lower.contains("amount");
    has_date && has_body
}

/// Short all-caps lines with no digits are headings, not rows.
fn is_allcaps_furniture(line: &str) -> bool {
    if line.len() > 40 || re_any_digit().is_match(line) {
        return false;
    }
    let alpha: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    alpha.len() >= 3 && alpha.iter().all(|c| c.is_uppercase())
}

fn parse_txn_line(line: &str, today: NaiveDate) -> Option<PdfRow> {
    let caps = re_txn_row().captures(line)?;

    let date = parse_row_date(caps.name("date")?.as_str(), today)?;
    let description = caps.name("desc")?.as_str().trim().to_string();
    if description.is_empty() {
        return None;
    }
    let amount_cents = parse_amount_cents(caps.name("amount")?.as_str()).ok()?;
    let balance_cents = caps
        .name("balance")
        .and_then(|m| parse_amount_cents(m.as_str()).ok());

    Some(PdfRow { date, description, amount_cents, balance_cents })
}

/// Statement rows frequently omit the year ("01/15"). Assume the current
/// year, rolling back one when that lands more than two weeks in the future
/// (a December statement read in January).
fn parse_row_date(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('/').collect();
    let month: u32 = parts.first()?.parse().ok()?;
    let day: u32 = parts.get(1)?.parse().ok()?;

    if let Some(year_str) = parts.get(2) {
        let mut year: i32 = year_str.parse().ok()?;
        if year < 100 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let candidate = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if candidate > today + Days::new(14) {
        NaiveDate::from_ymd_opt(today.year() - 1, month, day)
    } else {
        Some(candidate)
    }
}
