use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use ledgerport_core::{StagedTransaction, Transaction};

/// Content fingerprint over the fields a statement can reproduce. Pure and
/// deterministic; the same row always hashes the same regardless of which
/// file or session it arrived in.
pub fn fingerprint(
    date: NaiveDate,
    amount_cents: i64,
    payee: &str,
    memo: Option<&str>,
    symbol: Option<&str>,
    quantity: Option<Decimal>,
) -> String {
    let quantity = quantity.map(|q| q.normalize().to_string()).unwrap_or_default();
    let canonical = format!(
        "{date}|{amount_cents}|{payee}|{memo}|{symbol}|{quantity}",
        memo = memo.unwrap_or(""),
        symbol = symbol.unwrap_or(""),
    );
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash: [u8; 32] = hasher.finalize().into();
    to_hex(&hash)
}

pub fn staged_fingerprint(t: &StagedTransaction) -> String {
    fingerprint(
        t.date_posted,
        t.amount_cents,
        &t.payee,
        t.memo.as_deref(),
        t.symbol.as_deref(),
        t.quantity,
    )
}

/// Recomputed whenever a transaction's visible fields change so `hash_key`
/// tracks the current content. `import_hash_key` is never recomputed.
pub fn transaction_fingerprint(t: &Transaction) -> String {
    fingerprint(
        t.date_posted,
        t.amount_cents,
        &t.payee,
        t.memo.as_deref(),
        t.symbol.as_deref(),
        t.quantity,
    )
}

fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn deterministic() {
        let a = fingerprint(date(), -450, "Coffee Shop", None, None, None);
        let b = fingerprint(date(), -450, "Coffee Shop", None, None, None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn every_field_participates() {
        let base = fingerprint(date(), -450, "Coffee Shop", None, None, None);
        assert_ne!(base, fingerprint(date(), -451, "Coffee Shop", None, None, None));
        assert_ne!(base, fingerprint(date(), -450, "Coffee Shop!", None, None, None));
        assert_ne!(base, fingerprint(date(), -450, "Coffee Shop", Some("m"), None, None));
        assert_ne!(base, fingerprint(date(), -450, "Coffee Shop", None, Some("VTI"), None));
    }

    #[test]
    fn quantity_is_normalized() {
        let a = fingerprint(date(), 0, "Buy", None, Some("VTI"), Decimal::from_str("2.50").ok());
        let b = fingerprint(date(), 0, "Buy", None, Some("VTI"), Decimal::from_str("2.5").ok());
        assert_eq!(a, b);
    }
}
