// File: report.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Local};
use colored::*;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::LoadResult;
use crate::outcome::OutcomeRecord;

pub const MAX_EXAMPLES_PER_KIND: usize = 3;
pub const DETAIL_DISPLAY_LIMIT: usize = 120;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBucket {
    pub kind: String,
    pub count: usize,
    pub examples: Vec<String>,
}

/// Aggregate view over the records of one run. Values that cannot be
/// computed (no records, no successes) are `None` and print as "N/A".
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub success_rate: Option<f64>,
    pub latency: Option<LatencyStats>,
    pub mean_dns_seconds: Option<f64>,
    pub mean_response_bytes: Option<f64>,
    pub error_histogram: Vec<ErrorBucket>,
    pub status_distribution: BTreeMap<u16, usize>,
    pub final_url: Option<String>,
    pub elapsed: Duration,
    pub throughput: Option<f64>,
}

impl RunSummary {
    pub fn from_records(records: &[OutcomeRecord], elapsed: Duration) -> Self {
        let total = records.len();
        let successful: Vec<&OutcomeRecord> = records.iter().filter(|r| r.success()).collect();
        let successes = successful.len();

        let latencies: Vec<f64> = successful
            .iter()
            .filter_map(|r| r.elapsed_seconds())
            .collect();
        let latency = if latencies.is_empty() {
            None
        } else {
            Some(LatencyStats {
                mean: mean(&latencies).unwrap_or(0.0),
                min: latencies.iter().copied().fold(f64::INFINITY, f64::min),
                max: latencies.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            })
        };

        let dns: Vec<f64> = successful
            .iter()
            .filter_map(|r| r.dns_seconds())
            .filter(|d| *d >= 0.0)
            .collect();
        let sizes: Vec<f64> = successful
            .iter()
            .map(|r| r.response_bytes() as f64)
            .collect();

        let mut status_distribution = BTreeMap::new();
        for status in records.iter().filter_map(|r| r.status_code()) {
            *status_distribution.entry(status).or_insert(0) += 1;
        }

        let secs = elapsed.as_secs_f64();

        RunSummary {
            total,
            successes,
            failures: total - successes,
            success_rate: if total > 0 {
                Some(successes as f64 / total as f64 * 100.0)
            } else {
                None
            },
            latency,
            mean_dns_seconds: mean(&dns),
            mean_response_bytes: mean(&sizes),
            error_histogram: error_histogram(records),
            status_distribution,
            final_url: successful.last().map(|r| r.final_url().to_string()),
            elapsed,
            throughput: if secs > 0.0 && total > 0 {
                Some(total as f64 / secs)
            } else {
                None
            },
        }
    }

    pub fn render(&self, title: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("\n{}\n", format!("Test results: {}", title).bold()));
        output.push_str(&format!(
            "Successful requests:  {}/{} ({})\n",
            self.successes,
            self.total,
            fmt_opt(self.success_rate, |v| format!("{:.1}%", v))
        ));
        output.push_str(&format!("Failed requests:      {}\n", self.failures));
        output.push_str(&format!(
            "Total test time:      {:.2}s\n",
            self.elapsed.as_secs_f64()
        ));
        output.push_str(&format!(
            "Throughput:           {}\n",
            fmt_opt(self.throughput, |v| format!("{:.1} req/s", v))
        ));

        output.push_str(&format!("\n{}\n", "Timing (successful requests)".bold()));
        output.push_str(&format!(
            "Average response:     {}\n",
            fmt_opt(self.latency.map(|l| l.mean), secs)
        ));
        output.push_str(&format!(
            "Fastest response:     {}\n",
            fmt_opt(self.latency.map(|l| l.min), secs)
        ));
        output.push_str(&format!(
            "Slowest response:     {}\n",
            fmt_opt(self.latency.map(|l| l.max), secs)
        ));
        output.push_str(&format!(
            "Average DNS lookup:   {}\n",
            fmt_opt(self.mean_dns_seconds, |v| format!("{:.4}s", v))
        ));
        output.push_str(&format!(
            "Average size:         {}\n",
            fmt_opt(self.mean_response_bytes, |v| format!("{:.0} bytes", v))
        ));

        if !self.status_distribution.is_empty() {
            output.push_str(&format!("\n{}\n", "Status codes".bold()));
            for (status, count) in &self.status_distribution {
                let line = format!("  {}: {}", status, count);
                if *status == 200 {
                    output.push_str(&format!("{}\n", line.green()));
                } else {
                    output.push_str(&format!("{}\n", line.yellow()));
                }
            }
        }

        if !self.error_histogram.is_empty() {
            output.push_str(&format!("\n{}\n", "Errors".bold()));
            for bucket in &self.error_histogram {
                output.push_str(&format!(
                    "{}\n",
                    format!("  {}: {}", bucket.kind, bucket.count).red()
                ));
                for example in &bucket.examples {
                    output.push_str(&format!("    - {}\n", truncate_detail(example)));
                }
            }
        }

        output.push_str(&format!(
            "\nFinal URL after redirects: {}\n",
            self.final_url.as_deref().unwrap_or("N/A")
        ));

        output
    }
}

/// Failed records grouped by kind, most frequent first, ties by label.
pub fn error_histogram(records: &[OutcomeRecord]) -> Vec<ErrorBucket> {
    let mut buckets: HashMap<String, ErrorBucket> = HashMap::new();

    for record in records.iter().filter(|r| !r.success()) {
        let kind = record
            .error_kind()
            .map(|k| k.label())
            .unwrap_or_else(|| "Unknown".to_string());
        let bucket = buckets.entry(kind.clone()).or_insert_with(|| ErrorBucket {
            kind,
            count: 0,
            examples: Vec::new(),
        });
        bucket.count += 1;
        if let Some(detail) = record.error_detail() {
            if bucket.examples.len() < MAX_EXAMPLES_PER_KIND
                && !bucket.examples.iter().any(|e| e == detail)
            {
                bucket.examples.push(detail.to_string());
            }
        }
    }

    let mut histogram: Vec<ErrorBucket> = buckets.into_values().collect();
    histogram.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));
    histogram
}

pub fn truncate_detail(detail: &str) -> String {
    if detail.chars().count() <= DETAIL_DISPLAY_LIMIT {
        detail.to_string()
    } else {
        let cut: String = detail.chars().take(DETAIL_DISPLAY_LIMIT - 3).collect();
        format!("{}...", cut)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn secs(value: f64) -> String {
    format!("{:.3}s", value)
}

fn fmt_opt<F: Fn(f64) -> String>(value: Option<f64>, f: F) -> String {
    value.map(f).unwrap_or_else(|| "N/A".to_string())
}

/// Turns an extra page path into a file name fragment: `/about/us` -> `about_us`.
pub fn slug(path: &str) -> String {
    SLUG_RE
        .replace_all(path, "_")
        .trim_matches('_')
        .to_lowercase()
}

pub struct ReportWriter;

impl ReportWriter {
    pub fn file_name(prefix: &str, timestamp: &DateTime<Local>) -> String {
        format!("{}_{}.json", prefix, timestamp.format("%Y%m%d_%H%M%S"))
    }

    /// Writes all records as one JSON array to `<dir>/<prefix>_<timestamp>.json`.
    pub fn write_json(
        records: &[OutcomeRecord],
        output_dir: &Path,
        prefix: &str,
        timestamp: &DateTime<Local>,
    ) -> LoadResult<PathBuf> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(Self::file_name(prefix, timestamp));

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writeln!(writer)?;
        writer.flush()?;

        info!("Wrote {} records to {}", records.len(), path.display());
        Ok(path)
    }
}
