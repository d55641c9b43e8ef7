// File: outcome.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;

use crate::failure::FailureKind;

/// `dns_seconds` value recorded when the hostname could not be resolved.
pub const DNS_FAILED: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Response-side data collected once a server answered.
#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status_code: u16,
    pub elapsed_seconds: f64,
    pub response_bytes: u64,
    pub redirect_count: u32,
    pub final_url: String,
}

/// Result of one request attempt. Built only through the constructors below,
/// so a successful record never carries an error and a failed one always does.
///
/// `dns_seconds` and `server_ip` describe the host of `url`. When redirects lead
/// to another host they are not updated; `final_url` names where the request
/// ended up.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    request_index: u64,
    method: RequestMethod,
    url: String,
    started_at: DateTime<Utc>,
    status_code: Option<u16>,
    elapsed_seconds: Option<f64>,
    dns_seconds: Option<f64>,
    success: bool,
    error_kind: Option<FailureKind>,
    error_detail: Option<String>,
    response_bytes: u64,
    redirect_count: u32,
    final_url: String,
    server_ip: Option<IpAddr>,
}

impl OutcomeRecord {
    /// Record for a received response. Only a 200 counts as success; any other
    /// status becomes an `HttpStatus` failure.
    pub fn from_response(
        request_index: u64,
        method: RequestMethod,
        url: String,
        started_at: DateTime<Utc>,
        dns_seconds: Option<f64>,
        server_ip: Option<IpAddr>,
        response: ResponseData,
    ) -> Self {
        let success = response.status_code == 200;
        let (error_kind, error_detail) = if success {
            (None, None)
        } else {
            (
                Some(FailureKind::HttpStatus),
                Some(status_detail(response.status_code)),
            )
        };

        OutcomeRecord {
            request_index,
            method,
            url,
            started_at,
            status_code: Some(response.status_code),
            elapsed_seconds: Some(response.elapsed_seconds),
            dns_seconds,
            success,
            error_kind,
            error_detail,
            response_bytes: response.response_bytes,
            redirect_count: response.redirect_count,
            final_url: response.final_url,
            server_ip,
        }
    }

    /// Record for an attempt that never produced a usable response.
    #[allow(clippy::too_many_arguments)]
    pub fn transport_failure(
        request_index: u64,
        method: RequestMethod,
        url: String,
        started_at: DateTime<Utc>,
        dns_seconds: Option<f64>,
        server_ip: Option<IpAddr>,
        elapsed_seconds: Option<f64>,
        kind: FailureKind,
        detail: &str,
    ) -> Self {
        let detail = if detail.trim().is_empty() || detail == "None" {
            kind.label()
        } else {
            detail.to_string()
        };

        OutcomeRecord {
            request_index,
            method,
            final_url: url.clone(),
            url,
            started_at,
            status_code: None,
            elapsed_seconds,
            dns_seconds,
            success: false,
            error_kind: Some(kind),
            error_detail: Some(detail),
            response_bytes: 0,
            redirect_count: 0,
            server_ip,
        }
    }

    pub fn request_index(&self) -> u64 {
        self.request_index
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn elapsed_seconds(&self) -> Option<f64> {
        self.elapsed_seconds
    }

    pub fn dns_seconds(&self) -> Option<f64> {
        self.dns_seconds
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error_kind(&self) -> Option<&FailureKind> {
        self.error_kind.as_ref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn response_bytes(&self) -> u64 {
        self.response_bytes
    }

    pub fn redirect_count(&self) -> u32 {
        self.redirect_count
    }

    pub fn final_url(&self) -> &str {
        &self.final_url
    }

    pub fn server_ip(&self) -> Option<IpAddr> {
        self.server_ip
    }
}

fn status_detail(status: u16) -> String {
    match reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("HTTP {} {}", status, reason),
        None => format!("HTTP {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> ResponseData {
        ResponseData {
            status_code: status,
            elapsed_seconds: 0.25,
            response_bytes: 512,
            redirect_count: 1,
            final_url: "https://example.com/home".to_string(),
        }
    }

    #[test]
    fn test_status_200_is_success() {
        let record = OutcomeRecord::from_response(
            3,
            RequestMethod::Get,
            "https://example.com/".to_string(),
            Utc::now(),
            Some(0.01),
            None,
            response(200),
        );
        assert!(record.success());
        assert_eq!(record.status_code(), Some(200));
        assert!(record.error_kind().is_none());
        assert!(record.error_detail().is_none());
        assert_eq!(record.final_url(), "https://example.com/home");
    }

    #[test]
    fn test_non_200_is_status_failure() {
        for status in [201u16, 301, 404, 503] {
            let record = OutcomeRecord::from_response(
                0,
                RequestMethod::Post,
                "https://example.com/".to_string(),
                Utc::now(),
                Some(0.01),
                None,
                response(status),
            );
            assert!(!record.success());
            assert_eq!(record.error_kind(), Some(&FailureKind::HttpStatus));
            assert!(record
                .error_detail()
                .unwrap()
                .starts_with(&format!("HTTP {}", status)));
            assert_eq!(record.response_bytes(), 512);
        }
    }

    #[test]
    fn test_transport_failure_never_has_empty_detail() {
        for detail in ["", "   ", "None"] {
            let record = OutcomeRecord::transport_failure(
                1,
                RequestMethod::Get,
                "https://example.com/".to_string(),
                Utc::now(),
                Some(DNS_FAILED),
                None,
                None,
                FailureKind::Dns,
                detail,
            );
            assert_eq!(record.error_detail(), Some("DNS/Resolution Error"));
            assert_eq!(record.status_code(), None);
            assert_eq!(record.response_bytes(), 0);
            assert!(!record.success());
        }
    }

    #[test]
    fn test_serialized_field_names() {
        let record = OutcomeRecord::transport_failure(
            9,
            RequestMethod::Post,
            "https://example.com/login".to_string(),
            Utc::now(),
            Some(0.002),
            Some("127.0.0.1".parse().unwrap()),
            Some(1.5),
            FailureKind::Timeout,
            "operation timed out",
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["request_index"], 9);
        assert_eq!(value["method"], "POST");
        assert_eq!(value["error_kind"], "Timeout");
        assert_eq!(value["server_ip"], "127.0.0.1");
        assert_eq!(value["success"], false);
        assert!(value["status_code"].is_null());
    }
}
