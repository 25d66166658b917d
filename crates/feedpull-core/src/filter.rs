//! Tab-separated record filtering.
//!
//! One sequential, single-pass scan primitive with three fronts: stop at the
//! first match, collect every match for one needle, or collect every match
//! for a needle set. Matching is uniform across all three: the field at the
//! resolved column index is compared trimmed and case-insensitively.
//!
//! The output file is append-only and opened fresh per appended match, so no
//! exclusive write handle is held across the scan. Re-running a filter
//! against a non-empty output appends duplicate matches; callers that want a
//! clean result start from a fresh output path.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Field separator of feed record files.
pub const SEPARATOR: char = '\t';

/// Counters from one filter scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Lines read from the input.
    pub lines: u64,
    /// Lines appended to the output.
    pub matches: u64,
    /// Lines skipped because they had no field at the requested index.
    pub short_lines: u64,
}

/// Scans for the first record whose column `index` matches `value`; appends
/// it to `output` and stops. Returns whether a match was found.
pub fn find_first(input: &Path, index: usize, value: &str, output: &Path) -> Result<bool> {
    let needle = normalize(value);
    let reader = open_input(input)?;
    for line in reader.lines() {
        let line = line.with_context(|| format!("read {}", input.display()))?;
        match field_at(&line, index) {
            Some(field) if normalize(field) == needle => {
                append_line(output, &line)?;
                return Ok(true);
            }
            _ => {}
        }
    }
    Ok(false)
}

/// Scans the whole file, appending every record whose column `index`
/// matches `value`.
pub fn find_all(input: &Path, index: usize, value: &str, output: &Path) -> Result<ScanSummary> {
    let needle = normalize(value);
    scan_appending(input, index, output, |field| normalize(field) == needle)
}

/// Scans the whole file, appending every record whose column `index`
/// matches any needle in `values`.
pub fn find_many(
    input: &Path,
    index: usize,
    values: &[String],
    output: &Path,
) -> Result<ScanSummary> {
    let needles: HashSet<String> = values.iter().map(|v| normalize(v)).collect();
    scan_appending(input, index, output, |field| {
        needles.contains(&normalize(field))
    })
}

fn scan_appending(
    input: &Path,
    index: usize,
    output: &Path,
    matches: impl Fn(&str) -> bool,
) -> Result<ScanSummary> {
    let mut summary = ScanSummary::default();
    let reader = open_input(input)?;
    for line in reader.lines() {
        let line = line.with_context(|| format!("read {}", input.display()))?;
        summary.lines += 1;
        match field_at(&line, index) {
            Some(field) => {
                if matches(field) {
                    append_line(output, &line)?;
                    summary.matches += 1;
                }
            }
            None => summary.short_lines += 1,
        }
    }
    if summary.short_lines > 0 {
        tracing::warn!(
            input = %input.display(),
            short_lines = summary.short_lines,
            "skipped records with too few fields"
        );
    }
    Ok(summary)
}

fn open_input(input: &Path) -> Result<BufReader<File>> {
    let file = File::open(input).with_context(|| format!("open {}", input.display()))?;
    Ok(BufReader::new(file))
}

fn field_at(line: &str, index: usize) -> Option<&str> {
    line.split(SEPARATOR).nth(index)
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Appends one matching record to the output, opening the file fresh so no
/// write handle outlives the append.
fn append_line(output: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output)
        .with_context(|| format!("open {} for append", output.display()))?;
    writeln!(file, "{line}").with_context(|| format!("append to {}", output.display()))?;
    Ok(())
}
