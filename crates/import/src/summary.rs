use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use ledgerport_core::parse_amount_cents;

use crate::config::SummaryConfig;
use crate::pdf::re;

re!(re_dollar_amount, r"\$?\s*([\d,]+\.\d{2})\b");
re!(re_percent, r"(\d{1,3}(?:\.\d+)?)\s*%");
re!(re_date_slash, r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b");
re!(re_date_month_name,
    r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2}),?\s+(\d{4})\b");

/// Single-document fields recovered from a card or loan statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSummary {
    pub new_balance_cents: i64,
    pub minimum_payment_cents: Option<i64>,
    pub due_date: Option<NaiveDate>,
}

/// An APR read out of statement text, as a fraction, with the decimal-digit
/// precision it was printed with.
#[derive(Debug, Clone, PartialEq)]
pub struct AprDetection {
    pub rate: Decimal,
    pub scale: u32,
}

const NEW_BALANCE_LABELS: &[&str] = &["new balance", "statement balance", "current balance"];
const MIN_PAYMENT_LABELS: &[&str] = &["minimum payment due", "minimum payment", "minimum amount due"];
const DUE_DATE_LABELS: &[&str] = &["payment due date", "due date"];

/// Lines that sit near a label but carry unrelated dollar figures
/// ("if you make only the minimum payment...", "pay off the balance...").
const ADVISORY_PHRASES: &[&str] = &["if you", "pay off", "additional", "late fee", "warning"];

/// APR lines that quote a cap rather than the actual rate.
const APR_DISCLAIMER_PHRASES: &[&str] = &["will not exceed", "maximum"];

// ── Summary mode ─────────────────────────────────────────────────────────────

pub fn extract_summary(lines: &[&str], config: &SummaryConfig) -> Option<StatementSummary> {
    let new_balance_cents = find_labeled_amount(lines, NEW_BALANCE_LABELS, config)?;

    let candidates = collect_labeled_amounts(lines, MIN_PAYMENT_LABELS, config);
    let minimum_payment_cents =
        select_minimum_payment(&candidates, new_balance_cents, config);

    let due_date = find_labeled_date(lines, DUE_DATE_LABELS, config);

    Some(StatementSummary { new_balance_cents, minimum_payment_cents, due_date })
}

/// Same-line-then-lookahead search: try the amount on the label's own line,
/// then scan the next few lines, skipping advisory text. Returns the first
/// hit only.
fn find_labeled_amount(lines: &[&str], labels: &[&str], config: &SummaryConfig) -> Option<i64> {
    for (idx, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !labels.iter().any(|l| lower.contains(l)) {
            continue;
        }
        if let Some(cents) = first_amount(line) {
            return Some(cents);
        }
        for follow in lines.iter().skip(idx + 1).take(config.label_lookahead_lines) {
            if is_advisory(follow) {
                continue;
            }
            if let Some(cents) = first_amount(follow) {
                return Some(cents);
            }
        }
    }
    None
}

/// Like `find_labeled_amount` but keeps every candidate, so the plausibility
/// filter can arbitrate between them.
fn collect_labeled_amounts(lines: &[&str], labels: &[&str], config: &SummaryConfig) -> Vec<i64> {
    let mut candidates = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !labels.iter().any(|l| lower.contains(l)) {
            continue;
        }
        candidates.extend(first_amount(line));
        for follow in lines.iter().skip(idx + 1).take(config.label_lookahead_lines) {
            if is_advisory(follow) {
                continue;
            }
            candidates.extend(first_amount(follow));
        }
    }
    candidates.dedup();
    candidates
}

fn find_labeled_date(lines: &[&str], labels: &[&str], config: &SummaryConfig) -> Option<NaiveDate> {
    for (idx, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !labels.iter().any(|l| lower.contains(l)) {
            continue;
        }
        if let Some(d) = first_date(line) {
            return Some(d);
        }
        for follow in lines.iter().skip(idx + 1).take(config.label_lookahead_lines) {
            if let Some(d) = first_date(follow) {
                return Some(d);
            }
        }
    }
    None
}

/// Accept only whole-dollar candidates above the floor whose ratio to the new
/// balance falls inside the plausibility window; among survivors prefer the
/// one closest to the preferred ratio. Guards against capturing an unrelated
/// disclosure figure as the minimum payment.
pub fn select_minimum_payment(
    candidates: &[i64],
    new_balance_cents: i64,
    config: &SummaryConfig,
) -> Option<i64> {
    if new_balance_cents <= 0 {
        return None;
    }
    let balance = new_balance_cents as f64;
    candidates
        .iter()
        .copied()
        .filter(|&c| c % 100 == 0 && c >= config.min_payment_floor_cents)
        .filter(|&c| {
            let ratio = c as f64 / balance;
            ratio >= config.min_payment_ratio_low && ratio <= config.min_payment_ratio_high
        })
        .min_by(|&a, &b| {
            let da = (a as f64 / balance - config.min_payment_ratio_preferred).abs();
            let db = (b as f64 / balance - config.min_payment_ratio_preferred).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn is_advisory(line: &str) -> bool {
    let lower = line.to_lowercase();
    ADVISORY_PHRASES.iter().any(|p| lower.contains(p))
}

fn first_amount(line: &str) -> Option<i64> {
    let c = re_dollar_amount().captures(line)?;
    parse_amount_cents(c.get(1)?.as_str()).ok()
}

fn first_date(line: &str) -> Option<NaiveDate> {
    if let Some(c) = re_date_slash().captures(line) {
        let m: u32 = c.get(1)?.as_str().parse().ok()?;
        let d: u32 = c.get(2)?.as_str().parse().ok()?;
        let mut y: i32 = c.get(3)?.as_str().parse().ok()?;
        if y < 100 {
            y += 2000;
        }
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(c) = re_date_month_name().captures(line) {
        let m = month_to_num(c.get(1)?.as_str())?;
        let d: u32 = c.get(2)?.as_str().parse().ok()?;
        let y: i32 = c.get(3)?.as_str().parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    None
}

fn month_to_num(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "january" => Some(1), "february" => Some(2), "march" => Some(3),
        "april" => Some(4), "may" => Some(5), "june" => Some(6),
        "july" => Some(7), "august" => Some(8), "september" => Some(9),
        "october" => Some(10), "november" => Some(11), "december" => Some(12),
        _ => None,
    }
}

// ── APR extraction ───────────────────────────────────────────────────────────

/// Multi-tier search, most structured first. Every scan-forward step is
/// capped so a malformed document cannot cause unbounded work.
pub fn extract_apr(lines: &[&str], config: &SummaryConfig) -> Option<AprDetection> {
    if let Some(apr) = apr_from_rate_table(lines, config) {
        return Some(apr);
    }
    if let Some(apr) = apr_from_purchases_line(lines) {
        return Some(apr);
    }
    if let Some(apr) = apr_from_labeled_line(lines) {
        return Some(apr);
    }
    apr_generic(lines)
}

/// Tier 1: an "APR"/"type of balance" table header or an "interest charge
/// calculation" section, then the purchases (or cash advance) row below it.
/// Columnar layouts split label and value across lines, so the percentage
/// may trail the row by a few lines.
fn apr_from_rate_table(lines: &[&str], config: &SummaryConfig) -> Option<AprDetection> {
    let header_idx = lines.iter().position(|l| {
        let lower = l.to_lowercase();
        (lower.contains("apr") && lower.contains("type of balance"))
            || lower.contains("interest charge calculation")
    })?;

    let scan_end = (header_idx + 1 + config.apr_scan_lines).min(lines.len());
    let row_idx = (header_idx + 1..scan_end).find(|&i| {
        let lower = lines[i].to_lowercase();
        lower.contains("purchases") || lower.contains("cash advance")
    })?;

    let value_end = (row_idx + 1 + config.label_lookahead_lines).min(lines.len());
    (row_idx..value_end).find_map(|i| percent_on_line(lines[i]))
}

/// Tier 2: "purchases ... NN.NN%" on a single line.
fn apr_from_purchases_line(lines: &[&str]) -> Option<AprDetection> {
    lines.iter().find_map(|l| {
        let lower = l.to_lowercase();
        if lower.contains("purchases") {
            percent_on_line(l)
        } else {
            None
        }
    })
}

/// Tier 3: "purchases/cash advances ... apr ... NN%".
fn apr_from_labeled_line(lines: &[&str]) -> Option<AprDetection> {
    lines.iter().find_map(|l| {
        let lower = l.to_lowercase();
        let labeled = (lower.contains("purchases") || lower.contains("cash advance"))
            && lower.contains("apr");
        if labeled {
            percent_on_line(l)
        } else {
            None
        }
    })
}

/// Tier 4: any "apr ... NN%" line, excluding disclaimer caps.
fn apr_generic(lines: &[&str]) -> Option<AprDetection> {
    lines.iter().find_map(|l| {
        let lower = l.to_lowercase();
        if !lower.contains("apr") {
            return None;
        }
        if APR_DISCLAIMER_PHRASES.iter().any(|p| lower.contains(p)) {
            return None;
        }
        percent_on_line(l)
    })
}

/// Convert "21.99%" to a fraction, retaining the printed decimal-digit count
/// as display precision.
fn percent_on_line(line: &str) -> Option<AprDetection> {
    let c = re_percent().captures(line)?;
    let token = c.get(1)?.as_str();
    let scale = token.split('.').nth(1).map_or(0, |frac| frac.len() as u32);
    let mut rate = Decimal::from_str(token).ok()?;
    if rate > Decimal::ONE {
        rate /= Decimal::from(100);
    }
    Some(AprDetection { rate, scale })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SummaryConfig {
        SummaryConfig::default()
    }

    fn lines(text: &str) -> Vec<&str> {
        text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
    }

    // ── summary mode ─────────────────────────────────────────────────────────

    #[test]
    fn new_balance_same_line() {
        let l = lines("Account Summary\nNew Balance $2,100.00\nMinimum Payment Due $42.00");
        let s = extract_summary(&l, &cfg()).unwrap();
        assert_eq!(s.new_balance_cents, 210_000);
        assert_eq!(s.minimum_payment_cents, Some(4_200));
    }

    #[test]
    fn value_found_on_lookahead_line() {
        let l = lines("New Balance\n$1,543.21");
        let s = extract_summary(&l, &cfg()).unwrap();
        assert_eq!(s.new_balance_cents, 154_321);
    }

    #[test]
    fn lookahead_skips_advisory_lines() {
        let l = lines(
            "Minimum Payment Due\nIf you make only the minimum payment you will pay $1,843.00 in interest\n$42.00\nNew Balance $2,100.00",
        );
        let s = extract_summary(&l, &cfg()).unwrap();
        assert_eq!(s.minimum_payment_cents, Some(4_200));
    }

    #[test]
    fn no_summary_without_new_balance() {
        let l = lines("Minimum Payment Due $42.00");
        assert!(extract_summary(&l, &cfg()).is_none());
    }

    #[test]
    fn due_date_slash_format() {
        let l = lines("New Balance $500.00\nPayment Due Date 02/10/2026");
        let s = extract_summary(&l, &cfg()).unwrap();
        assert_eq!(s.due_date, Some(NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()));
    }

    #[test]
    fn due_date_month_name() {
        let l = lines("New Balance $500.00\nPayment Due Date: February 10, 2026");
        let s = extract_summary(&l, &cfg()).unwrap();
        assert_eq!(s.due_date, Some(NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()));
    }

    // ── plausibility filter ──────────────────────────────────────────────────

    #[test]
    fn plausibility_filter_picks_in_window_candidate() {
        // Ratios: 0.0086 (out), 0.02 (in), 0.143 (out).
        let picked = select_minimum_payment(&[1_800, 4_200, 30_000], 210_000, &cfg());
        assert_eq!(picked, Some(4_200));
    }

    #[test]
    fn plausibility_rejects_non_whole_dollar() {
        assert_eq!(select_minimum_payment(&[4_250], 210_000, &cfg()), None);
    }

    #[test]
    fn plausibility_rejects_below_floor() {
        // $20 is whole-dollar and inside the ratio window for a $500 balance,
        // but under the $25 floor.
        assert_eq!(select_minimum_payment(&[2_000], 50_000, &cfg()), None);
    }

    #[test]
    fn plausibility_prefers_closest_to_two_percent() {
        // $9,000 balance: $90 (1%), $180 (2%), $270 (3%) all plausible.
        let picked = select_minimum_payment(&[9_000, 18_000, 27_000], 900_000, &cfg());
        assert_eq!(picked, Some(18_000));
    }

    #[test]
    fn plausibility_none_for_zero_balance() {
        assert_eq!(select_minimum_payment(&[4_200], 0, &cfg()), None);
    }

    // ── APR tiers ────────────────────────────────────────────────────────────

    #[test]
    fn apr_tier1_rate_table() {
        let l = lines(
            "Interest Charge Calculation\nType of Balance APR Balance Subject to Interest\nPurchases 21.99% $1,204.00\nCash Advances 29.99% $0.00",
        );
        let apr = extract_apr(&l, &cfg()).unwrap();
        assert_eq!(apr.rate, Decimal::from_str("0.2199").unwrap());
        assert_eq!(apr.scale, 2);
    }

    #[test]
    fn apr_tier1_value_split_across_lines() {
        let l = lines("Type of Balance and APR\nPurchases\n21.99%");
        let apr = extract_apr(&l, &cfg()).unwrap();
        assert_eq!(apr.rate, Decimal::from_str("0.2199").unwrap());
    }

    #[test]
    fn apr_tier2_direct_purchases_line() {
        let l = lines("Purchases 19.24%");
        let apr = extract_apr(&l, &cfg()).unwrap();
        assert_eq!(apr.rate, Decimal::from_str("0.1924").unwrap());
        assert_eq!(apr.scale, 2);
    }

    #[test]
    fn apr_tier4_generic_excludes_disclaimers() {
        let l = lines("Your APR will not exceed 29.99%\nVariable APR 17.5%");
        let apr = extract_apr(&l, &cfg()).unwrap();
        assert_eq!(apr.rate, Decimal::from_str("0.175").unwrap());
        assert_eq!(apr.scale, 1);
    }

    #[test]
    fn apr_none_when_only_disclaimers() {
        let l = lines("Your APR will not exceed 29.99%");
        assert!(extract_apr(&l, &cfg()).is_none());
    }

    #[test]
    fn percent_scale_zero_for_whole_number() {
        let apr = percent_on_line("APR 6%").unwrap();
        assert_eq!(apr.rate, Decimal::from_str("0.06").unwrap());
        assert_eq!(apr.scale, 0);
    }

    #[test]
    fn percent_already_fraction_not_divided() {
        // A literal "0.06%" style token stays as written.
        let apr = percent_on_line("rate 0.5%").unwrap();
        assert_eq!(apr.rate, Decimal::from_str("0.5").unwrap());
    }
}
