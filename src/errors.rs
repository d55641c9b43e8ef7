// File: errors.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;

/// Errors that abort a load test run. Failures of individual requests are
/// never represented here; they end up as failed outcome records instead.
#[derive(Debug)]
pub enum LoadError {
    InvalidConfig(String),
    InvalidUrl(String),
    Client(reqwest::Error),
    WorkerPool(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "Configuration error: {}", msg),
            Self::InvalidUrl(msg) => write!(f, "Invalid target URL: {}", msg),
            Self::Client(e) => write!(f, "Failed to build HTTP client: {}", e),
            Self::WorkerPool(msg) => write!(f, "Worker pool error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::InvalidUrl(_) => None,
            Self::Client(e) => Some(e),
            Self::WorkerPool(_) => None,
            Self::Io(e) => Some(e),
            Self::Serialization(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(error: reqwest::Error) -> Self {
        Self::Client(error)
    }
}

impl From<std::io::Error> for LoadError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

impl From<tokio::sync::AcquireError> for LoadError {
    fn from(error: tokio::sync::AcquireError) -> Self {
        Self::WorkerPool(error.to_string())
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
