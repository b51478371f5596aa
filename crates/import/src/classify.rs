use ledgerport_core::AccountType;

// ── Signal vocabularies ──────────────────────────────────────────────────────

const BROKERAGE_HEADERS: &[&str] = &[
    "symbol", "ticker", "cusip", "shares", "quantity", "security description", "cost basis",
    "market value",
];

const BROKERAGE_ROW_SIGNALS: &[&str] = &[
    "buy", "sell", "dividend", "reinvest", "option", "capital gain", "contribution", "sweep",
];

const CREDIT_CARD_HEADERS: &[&str] = &["card member", "card no", "reference number"];

const CREDIT_CARD_ROW_SIGNALS: &[&str] = &[
    "minimum payment", "new balance", "credit limit", "available credit", "cash advance",
    "annual percentage rate", "payment due date",
];

const LOAN_HEADERS: &[&str] = &["principal balance", "escrow", "interest paid"];

const LOAN_ROW_SIGNALS: &[&str] = &[
    "principal balance", "escrow", "past due amount", "principal payment", "interest payment",
    "original loan amount", "maturity date",
];

/// Rows are sampled rather than scanned exhaustively; two independent hits is
/// the confidence bar for a row-signal tier.
const ROW_SIGNAL_THRESHOLD: usize = 2;
const ROW_SAMPLE_CAP: usize = 200;

/// Infer an account type from header shape, sampled row text, the filename,
/// and finally a caller-supplied hint. Tiers are checked in strict priority
/// order and short-circuit; `None` defers to the user.
pub fn classify_account_type(
    headers: &[String],
    rows: &[Vec<String>],
    file_name: &str,
    hint: Option<AccountType>,
) -> Option<AccountType> {
    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    // Tier 1: brokerage header vocabulary.
    if header_hit(&headers, BROKERAGE_HEADERS) {
        return Some(AccountType::Brokerage);
    }

    // Tier 2: brokerage activity keywords in the rows.
    if row_signal_count(rows, BROKERAGE_ROW_SIGNALS) >= ROW_SIGNAL_THRESHOLD {
        return Some(AccountType::Brokerage);
    }

    // Tier 3: credit card — header or row signals.
    if header_hit(&headers, CREDIT_CARD_HEADERS)
        || row_signal_count(rows, CREDIT_CARD_ROW_SIGNALS) >= ROW_SIGNAL_THRESHOLD
    {
        return Some(AccountType::CreditCard);
    }

    // Tier 4: loan — header or row signals.
    if header_hit(&headers, LOAN_HEADERS)
        || row_signal_count(rows, LOAN_ROW_SIGNALS) >= ROW_SIGNAL_THRESHOLD
    {
        return Some(AccountType::Loan);
    }

    // Tier 5: filename tokens.
    if let Some(t) = type_from_filename(file_name) {
        return Some(t);
    }

    // Tier 6: caller hint, last resort.
    hint
}

fn header_hit(headers: &[String], vocabulary: &[&str]) -> bool {
    headers
        .iter()
        .any(|h| vocabulary.iter().any(|v| h.contains(v)))
}

fn row_signal_count(rows: &[Vec<String>], signals: &[&str]) -> usize {
    let mut hits = 0;
    for row in rows.iter().take(ROW_SAMPLE_CAP) {
        let text = row.join(" ").to_lowercase();
        if signals.iter().any(|s| text.contains(s)) {
            hits += 1;
            if hits >= ROW_SIGNAL_THRESHOLD {
                break;
            }
        }
    }
    hits
}

fn type_from_filename(file_name: &str) -> Option<AccountType> {
    let lower = file_name.to_lowercase();
    if lower.contains("credit") || lower.contains("card") {
        Some(AccountType::CreditCard)
    } else if lower.contains("loan") || lower.contains("mortgage") {
        Some(AccountType::Loan)
    } else if lower.contains("savings") {
        Some(AccountType::Savings)
    } else if lower.contains("checking") {
        Some(AccountType::Checking)
    } else if lower.contains("brokerage") || lower.contains("invest") {
        Some(AccountType::Brokerage)
    } else {
        None
    }
}

// ── Institution inference ────────────────────────────────────────────────────

/// Known institution name fragments, matched against the lowercased,
/// separator-stripped filename. Deliberately no fallback to raw filename
/// tokens: a wrong institution guess silently corrupts account identity, so
/// an unmatched filename yields no guess and the user must say.
const INSTITUTION_FRAGMENTS: &[(&str, &str)] = &[
    ("chase", "Chase"),
    ("amex", "American Express"),
    ("americanexpress", "American Express"),
    ("bankofamerica", "Bank of America"),
    ("bofa", "Bank of America"),
    ("wellsfargo", "Wells Fargo"),
    ("citibank", "Citibank"),
    ("citi", "Citibank"),
    ("capitalone", "Capital One"),
    ("discover", "Discover"),
    ("usbank", "U.S. Bank"),
    ("ally", "Ally"),
    ("sofi", "SoFi"),
    ("usaa", "USAA"),
    ("fidelity", "Fidelity"),
    ("schwab", "Charles Schwab"),
    ("vanguard", "Vanguard"),
    ("etrade", "E*TRADE"),
    ("navient", "Navient"),
    ("nelnet", "Nelnet"),
    ("mohela", "MOHELA"),
];

pub fn infer_institution(file_name: &str) -> Option<&'static str> {
    let squashed: String = file_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    INSTITUTION_FRAGMENTS
        .iter()
        .find(|(frag, _)| squashed.contains(frag))
        .map(|(_, name)| *name)
}

// ── Label normalization ──────────────────────────────────────────────────────

/// Collapse an arbitrary source label ("Visa Signature ...1234") to a
/// canonical grouping key: lowercase alphanumerics only.
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(h: &[&str]) -> Vec<String> {
        h.iter().map(|s| s.to_string()).collect()
    }

    fn rows(r: &[&[&str]]) -> Vec<Vec<String>> {
        r.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    // ── account type tiers ───────────────────────────────────────────────────

    #[test]
    fn brokerage_header_wins_tier_one() {
        let t = classify_account_type(
            &headers(&["Date", "Symbol", "Amount"]),
            &[],
            "export.csv",
            None,
        );
        assert_eq!(t, Some(AccountType::Brokerage));
    }

    #[test]
    fn brokerage_row_signals_tier_two() {
        let t = classify_account_type(
            &headers(&["Date", "Description", "Amount"]),
            &rows(&[
                &["01/02/2026", "BUY VTI", "-450.00"],
                &["01/05/2026", "DIVIDEND RECEIVED", "12.11"],
            ]),
            "export.csv",
            None,
        );
        assert_eq!(t, Some(AccountType::Brokerage));
    }

    #[test]
    fn single_row_signal_is_not_enough() {
        let t = classify_account_type(
            &headers(&["Date", "Description", "Amount"]),
            &rows(&[
                &["01/02/2026", "BEST BUY STORE", "-450.00"],
                &["01/05/2026", "COFFEE SHOP", "-4.50"],
            ]),
            "export.csv",
            None,
        );
        // "best buy" contains "buy" but one hit stays below the bar.
        assert_eq!(t, None);
    }

    #[test]
    fn credit_card_header_tier_three() {
        let t = classify_account_type(
            &headers(&["Date", "Card Member", "Amount"]),
            &[],
            "export.csv",
            None,
        );
        assert_eq!(t, Some(AccountType::CreditCard));
    }

    #[test]
    fn credit_card_row_signals() {
        let t = classify_account_type(
            &headers(&["Field", "Value"]),
            &rows(&[
                &["New Balance", "2100.00"],
                &["Minimum Payment", "42.00"],
            ]),
            "export.csv",
            None,
        );
        assert_eq!(t, Some(AccountType::CreditCard));
    }

    #[test]
    fn loan_row_signals() {
        let t = classify_account_type(
            &headers(&["Field", "Value"]),
            &rows(&[
                &["Principal Balance", "182000.00"],
                &["Escrow", "410.00"],
            ]),
            "export.csv",
            None,
        );
        assert_eq!(t, Some(AccountType::Loan));
    }

    #[test]
    fn brokerage_outranks_credit_card() {
        // Headers carry both vocabularies; tier 1 short-circuits first.
        let t = classify_account_type(
            &headers(&["Symbol", "Card Member"]),
            &[],
            "export.csv",
            None,
        );
        assert_eq!(t, Some(AccountType::Brokerage));
    }

    #[test]
    fn filename_fallback_tier_five() {
        let t = classify_account_type(
            &headers(&["Date", "Description", "Amount"]),
            &[],
            "my_savings_2026.csv",
            None,
        );
        assert_eq!(t, Some(AccountType::Savings));
    }

    #[test]
    fn hint_is_last_resort() {
        let t = classify_account_type(
            &headers(&["Date", "Description", "Amount"]),
            &[],
            "statement.csv",
            Some(AccountType::Checking),
        );
        assert_eq!(t, Some(AccountType::Checking));
    }

    #[test]
    fn unknown_defers_to_user() {
        let t = classify_account_type(
            &headers(&["Date", "Description", "Amount"]),
            &rows(&[&["01/15/2026", "Coffee Shop", "-4.50"]]),
            "statement.csv",
            None,
        );
        assert_eq!(t, None);
    }

    // ── institution inference ────────────────────────────────────────────────

    #[test]
    fn institution_from_filename() {
        assert_eq!(infer_institution("Chase1234_Activity.csv"), Some("Chase"));
        assert_eq!(infer_institution("amex-statement-jan.pdf"), Some("American Express"));
        assert_eq!(infer_institution("wells_fargo_export.csv"), Some("Wells Fargo"));
        assert_eq!(infer_institution("Fidelity_Positions.csv"), Some("Fidelity"));
    }

    #[test]
    fn institution_no_guess_for_unknown() {
        assert_eq!(infer_institution("statement_january.csv"), None);
        assert_eq!(infer_institution("export.pdf"), None);
    }

    #[test]
    fn institution_ignores_separators_and_case() {
        assert_eq!(infer_institution("BANK-OF-AMERICA (2).csv"), Some("Bank of America"));
    }

    // ── label normalization ──────────────────────────────────────────────────

    #[test]
    fn normalize_label_collapses() {
        assert_eq!(normalize_label("Visa Signature"), "visasignature");
        assert_eq!(normalize_label("VISA-SIGNATURE ...1234"), "visasignature1234");
        assert_eq!(normalize_label(""), "");
    }
}
