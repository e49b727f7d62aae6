//! Gap-worksheet recommendation extraction.
//!
//! A gap worksheet is a CSV artifact describing current-vs-target platform
//! state. Row 1 is a header; every data row carries, at fixed zero-based
//! offsets, `platform` (2), `tier` (3), `status` (4), and `recommendation`
//! (5). The extractor yields one `"<platform> → <recommendation>"` entry per
//! row with a non-empty recommendation, deduplicated across the worksheet.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use strategypipe_shared::{Result, StrategyPipeError};

/// Zero-based column index of the current platform.
const PLATFORM_COL: usize = 2;

/// Zero-based column index of the target recommendation.
const RECOMMENDATION_COL: usize = 5;

/// Extract the deduplicated set of upgrade recommendations from a worksheet.
///
/// Rows that fail the shape check (fewer columns than the recommendation
/// offset requires) are logged and skipped; a single malformed row never
/// aborts the extraction. Rows with an empty recommendation contribute
/// nothing.
pub fn extract_target_recommendations(path: &Path) -> Result<BTreeSet<String>> {
    let file = File::open(path)
        .map_err(|e| StrategyPipeError::Extraction(format!("{}: {e}", path.display())))?;
    let reader = BufReader::new(file);

    let mut upgrades = BTreeSet::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line
            .map_err(|e| StrategyPipeError::Extraction(format!("{}: {e}", path.display())))?;

        // Row 1 is the header; data begins at row 2.
        if idx == 0 || line.trim().is_empty() {
            continue;
        }

        let fields = csv_split(&line);
        if fields.len() <= RECOMMENDATION_COL {
            warn!(
                row = idx + 1,
                columns = fields.len(),
                path = %path.display(),
                "row too short for recommendation columns, skipping"
            );
            continue;
        }

        let platform = fields[PLATFORM_COL].trim();
        let recommendation = fields[RECOMMENDATION_COL].trim();

        if recommendation.is_empty() {
            continue;
        }

        upgrades.insert(format!("{platform} → {recommendation}"));
    }

    debug!(
        path = %path.display(),
        recommendations = upgrades.len(),
        "worksheet extraction complete"
    );

    Ok(upgrades)
}

/// Split a CSV line into fields, honoring double-quoted fields with embedded
/// commas and `""` escapes.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
