// File: failure.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::io;

/// Classification of a failed request attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Dns,
    Tls,
    Connection,
    Timeout,
    /// A response arrived, but its status was not 200.
    HttpStatus,
    /// Anything else, tagged with the category of the underlying error.
    Other(String),
}

impl FailureKind {
    pub fn label(&self) -> String {
        match self {
            Self::Dns => "DNS/Resolution Error".to_string(),
            Self::Tls => "SSL/TLS Error".to_string(),
            Self::Connection => "Connection Error".to_string(),
            Self::Timeout => "Timeout".to_string(),
            Self::HttpStatus => "HTTP Status Error".to_string(),
            Self::Other(name) => format!("Other ({})", name),
        }
    }

    /// Classifies a transport error coming out of the HTTP client.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }

        // The top-level message embeds the URL, so only the causes are inspected.
        if let Some(kind) = error.source().and_then(classify_chain) {
            return kind;
        }

        if error.is_connect() {
            Self::Connection
        } else {
            Self::Other(reqwest_category(error).to_string())
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for FailureKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Walks the source chain of `error` and returns the first recognisable
/// failure kind. Returns `None` when nothing in the chain is conclusive.
pub fn classify_chain(error: &(dyn Error + 'static)) -> Option<FailureKind> {
    let mut current: Option<&(dyn Error + 'static)> = Some(error);

    while let Some(err) = current {
        if err.is::<rustls::Error>() {
            return Some(FailureKind::Tls);
        }
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            // tokio-rustls reports handshake and record failures as InvalidData
            // with the rustls error inside. io::Error::source skips that layer.
            let wraps_tls = io_err
                .get_ref()
                .map_or(false, |inner| inner.is::<rustls::Error>());
            if wraps_tls || io_err.kind() == io::ErrorKind::InvalidData {
                return Some(FailureKind::Tls);
            }
            if let Some(kind) = classify_io_kind(io_err.kind()) {
                return Some(kind);
            }
        }

        let text = err.to_string().to_lowercase();
        if let Some(kind) = classify_message(&text) {
            return Some(kind);
        }

        current = err.source();
    }

    None
}

/// Flattens an error and its causes into one line, e.g.
/// `error sending request: client error (Connect): Connection refused`.
pub fn describe(error: &(dyn Error + 'static)) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current: Option<&(dyn Error + 'static)> = Some(error);

    while let Some(err) = current {
        let text = err.to_string();
        if !text.is_empty() && !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        current = err.source();
    }

    parts.join(": ")
}

pub fn classify_io_kind(kind: io::ErrorKind) -> Option<FailureKind> {
    match kind {
        io::ErrorKind::TimedOut => Some(FailureKind::Timeout),
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::UnexpectedEof => Some(FailureKind::Connection),
        _ => None,
    }
}

fn classify_message(text: &str) -> Option<FailureKind> {
    if text.contains("dns error") || text.contains("failed to lookup address") {
        return Some(FailureKind::Dns);
    }
    if text.contains("certificate")
        || text.contains("handshake")
        || text.contains("corrupt message")
        || text.contains("tls")
        || text.contains("ssl")
    {
        return Some(FailureKind::Tls);
    }
    if text.contains("timed out") {
        return Some(FailureKind::Timeout);
    }
    if text.contains("connection refused")
        || text.contains("connection reset")
        || text.contains("connection closed")
    {
        return Some(FailureKind::Connection);
    }
    None
}

fn reqwest_category(error: &reqwest::Error) -> &'static str {
    if error.is_builder() {
        "BuilderError"
    } else if error.is_redirect() {
        "RedirectError"
    } else if error.is_body() {
        "BodyError"
    } else if error.is_decode() {
        "DecodeError"
    } else if error.is_request() {
        "RequestError"
    } else {
        "reqwest::Error"
    }
}
