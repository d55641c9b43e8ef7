// File: report_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#[cfg(test)]
mod tests {
    use crate::failure::FailureKind;
    use crate::outcome::{OutcomeRecord, RequestMethod, ResponseData, DNS_FAILED};
    use crate::report::*;
    use pretty_assertions::assert_eq;
    use chrono::{Local, TimeZone, Utc};
    use serde_json::Value;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn ok(index: u64, elapsed: f64, dns: f64, bytes: u64) -> OutcomeRecord {
        OutcomeRecord::from_response(
            index,
            RequestMethod::Get,
            "https://example.com/".to_string(),
            Utc::now(),
            Some(dns),
            Some("93.184.216.34".parse().unwrap()),
            ResponseData {
                status_code: 200,
                elapsed_seconds: elapsed,
                response_bytes: bytes,
                redirect_count: 0,
                final_url: "https://example.com/".to_string(),
            },
        )
    }

    fn failed(index: u64, kind: FailureKind, detail: &str) -> OutcomeRecord {
        OutcomeRecord::transport_failure(
            index,
            RequestMethod::Get,
            "https://example.com/".to_string(),
            Utc::now(),
            Some(DNS_FAILED),
            None,
            None,
            kind,
            detail,
        )
    }

    fn status(index: u64, code: u16) -> OutcomeRecord {
        OutcomeRecord::from_response(
            index,
            RequestMethod::Post,
            "https://example.com/".to_string(),
            Utc::now(),
            Some(0.01),
            None,
            ResponseData {
                status_code: code,
                elapsed_seconds: 0.1,
                response_bytes: 10,
                redirect_count: 0,
                final_url: "https://example.com/".to_string(),
            },
        )
    }

    #[test]
    fn test_empty_run() {
        let summary = RunSummary::from_records(&[], Duration::ZERO);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.successes, 0);
        assert_eq!(summary.success_rate, None);
        assert_eq!(summary.latency, None);
        assert_eq!(summary.mean_dns_seconds, None);
        assert_eq!(summary.mean_response_bytes, None);
        assert_eq!(summary.throughput, None);
        assert!(summary.error_histogram.is_empty());

        colored::control::set_override(false);
        let text = summary.render("empty");
        assert!(text.contains("0/0 (N/A)"));
        assert!(text.contains("Average response:     N/A"));
    }

    #[test]
    fn test_all_failures() {
        let records = vec![
            failed(0, FailureKind::Timeout, "operation timed out"),
            failed(1, FailureKind::Timeout, "operation timed out"),
            failed(2, FailureKind::Dns, "failed to resolve nowhere.invalid"),
        ];
        let summary = RunSummary::from_records(&records, Duration::from_secs(3));

        assert_eq!(summary.successes, 0);
        assert_eq!(summary.failures, 3);
        assert_eq!(summary.success_rate, Some(0.0));
        assert_eq!(summary.latency, None);
        assert_eq!(summary.mean_dns_seconds, None);
        assert_eq!(summary.final_url, None);
        assert_eq!(summary.throughput, Some(1.0));

        colored::control::set_override(false);
        let text = summary.render("all failed");
        assert!(text.contains("0/3 (0.0%)"));
        assert!(text.contains("Slowest response:     N/A"));
        assert!(text.contains("Timeout: 2"));
    }

    #[test]
    fn test_success_statistics() {
        let records = vec![
            ok(0, 0.2, 0.01, 100),
            ok(1, 0.4, 0.03, 300),
            failed(2, FailureKind::Connection, "connection refused"),
            ok(3, 0.6, 0.02, 200),
        ];
        let summary = RunSummary::from_records(&records, Duration::from_secs(2));

        assert_eq!(summary.total, 4);
        assert_eq!(summary.successes, 3);
        assert_eq!(summary.success_rate, Some(75.0));

        let latency = summary.latency.unwrap();
        assert!((latency.mean - 0.4).abs() < 1e-9);
        assert_eq!(latency.min, 0.2);
        assert_eq!(latency.max, 0.6);

        assert!((summary.mean_dns_seconds.unwrap() - 0.02).abs() < 1e-9);
        assert_eq!(summary.mean_response_bytes, Some(200.0));
        assert_eq!(summary.status_distribution.get(&200), Some(&3));
        assert_eq!(summary.final_url.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn test_status_failures_count_in_histogram() {
        let records = vec![ok(0, 0.1, 0.0, 5), status(1, 404), status(2, 404), status(3, 500)];
        let summary = RunSummary::from_records(&records, Duration::from_secs(1));

        assert_eq!(summary.successes, 1);
        assert_eq!(summary.error_histogram.len(), 1);
        assert_eq!(summary.error_histogram[0].kind, "HTTP Status Error");
        assert_eq!(summary.error_histogram[0].count, 3);
        assert_eq!(summary.status_distribution.get(&404), Some(&2));
        assert_eq!(summary.status_distribution.get(&500), Some(&1));
    }

    #[test]
    fn test_histogram_sorted_with_limited_examples() {
        let mut records = Vec::new();
        for i in 0..5 {
            records.push(failed(i, FailureKind::Timeout, &format!("timeout #{}", i)));
        }
        records.push(failed(5, FailureKind::Tls, "bad certificate"));
        records.push(failed(6, FailureKind::Connection, "reset"));
        records.push(failed(7, FailureKind::Connection, "reset"));

        let histogram = error_histogram(&records);

        let kinds: Vec<&str> = histogram.iter().map(|b| b.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Timeout", "Connection Error", "SSL/TLS Error"]);
        assert_eq!(histogram[0].count, 5);
        assert_eq!(histogram[0].examples.len(), MAX_EXAMPLES_PER_KIND);
        assert_eq!(histogram[1].examples, vec!["reset".to_string()]);
    }

    #[test]
    fn test_truncate_detail() {
        let short = "connection refused";
        assert_eq!(truncate_detail(short), short);

        let long = "x".repeat(500);
        let truncated = truncate_detail(&long);
        assert_eq!(truncated.chars().count(), DETAIL_DISPLAY_LIMIT);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_detail_multibyte() {
        let long = "ошибка ".repeat(40);
        let truncated = truncate_detail(&long);
        assert_eq!(truncated.chars().count(), DETAIL_DISPLAY_LIMIT);
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("/about"), "about");
        assert_eq!(slug("/About/Us?x=1"), "about_us_x_1");
        assert_eq!(slug("/"), "");
    }

    #[test]
    fn test_file_name_format() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            ReportWriter::file_name("load_test", &ts),
            "load_test_20240309_140507.json"
        );
    }

    #[test]
    fn test_write_json() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = temp_dir.path().join("nested");
        let records = vec![
            ok(0, 0.2, 0.01, 100),
            failed(1, FailureKind::Timeout, "operation timed out"),
        ];
        let ts = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let path = ReportWriter::write_json(&records, &out_dir, "run", &ts).unwrap();
        assert_eq!(path.file_name().unwrap(), "run_20240102_030405.json");

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["success"], true);
        assert_eq!(array[0]["status_code"], 200);
        assert!(array[0]["error_kind"].is_null());
        assert_eq!(array[1]["success"], false);
        assert_eq!(array[1]["error_kind"], "Timeout");
        assert_eq!(array[1]["dns_seconds"], -1.0);
    }

    #[test]
    fn test_write_empty_json() {
        let temp_dir = TempDir::new().unwrap();
        let ts = Local::now();
        let path = ReportWriter::write_json(&[], temp_dir.path(), "empty", &ts).unwrap();
        let parsed: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, Value::Array(vec![]));
    }
}
