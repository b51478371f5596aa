use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context};

/// Extract a PDF's text with `pdftotext -layout`, one string per page.
/// Layout mode keeps columns aligned, which the row regexes depend on.
pub fn extract_pages(file: &Path) -> anyhow::Result<Vec<String>> {
    let file_str = file
        .to_str()
        .with_context(|| format!("invalid file path: {}", file.display()))?;

    let output = Command::new("pdftotext")
        .args(["-layout", file_str, "-"])
        .output()
        .context("failed to run pdftotext (install poppler-utils)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }

    let text = String::from_utf8_lossy(&output.stdout).to_string();
    if text.trim().is_empty() {
        bail!("PDF appears scanned or image-only, no text to extract");
    }

    // pdftotext separates pages with form feeds.
    Ok(text.split('\u{c}').map(str::to_string).collect())
}
