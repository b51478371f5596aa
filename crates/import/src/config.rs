use serde::Deserialize;

/// Tunable constants for the PDF summary heuristics. The plausibility window
/// for minimum-payment detection was tuned empirically, so it is carried as
/// configuration rather than hard-coded in the extraction code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Smallest believable minimum payment, in cents.
    pub min_payment_floor_cents: i64,
    /// Candidate must be at least this fraction of the new balance.
    pub min_payment_ratio_low: f64,
    /// ... and at most this fraction.
    pub min_payment_ratio_high: f64,
    /// When several candidates survive, prefer the one closest to this ratio.
    pub min_payment_ratio_preferred: f64,
    /// How many lines past a label to look for its value.
    pub label_lookahead_lines: usize,
    /// How far to scan past an APR table header for the purchases row.
    pub apr_scan_lines: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_payment_floor_cents: 2_500,
            min_payment_ratio_low: 0.01,
            min_payment_ratio_high: 0.10,
            min_payment_ratio_preferred: 0.02,
            label_lookahead_lines: 4,
            apr_scan_lines: 8,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub summary: SummaryConfig,
}

impl ImportConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, String> {
        toml::from_str(toml_content).map_err(|e| format!("Failed to parse TOML: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_constants() {
        let c = SummaryConfig::default();
        assert_eq!(c.min_payment_floor_cents, 2_500);
        assert_eq!(c.min_payment_ratio_low, 0.01);
        assert_eq!(c.min_payment_ratio_high, 0.10);
        assert_eq!(c.label_lookahead_lines, 4);
    }

    #[test]
    fn from_toml_overrides_selected_fields() {
        let c = ImportConfig::from_toml(
            "[summary]\nmin_payment_floor_cents = 1000\napr_scan_lines = 12\n",
        )
        .unwrap();
        assert_eq!(c.summary.min_payment_floor_cents, 1_000);
        assert_eq!(c.summary.apr_scan_lines, 12);
        // Untouched fields keep their defaults.
        assert_eq!(c.summary.min_payment_ratio_preferred, 0.02);
    }

    #[test]
    fn from_toml_rejects_garbage() {
        assert!(ImportConfig::from_toml("not toml [").is_err());
    }
}
