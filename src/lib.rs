// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_inception)]
#![allow(clippy::bool_assert_comparison)]

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod executor;
pub mod failure;
pub mod getstate;
pub mod headers;
pub mod outcome;
pub mod progress;
pub mod report;
pub mod shutdown;

#[cfg(test)]
mod report_tests;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_imports() {
        let _ = config::ConfigParameter::default();
        let _ = getstate::GetState::new();
        let _ = headers::fallback_headers();
        let _ = progress::SilentProgress;
        let _ = report::RunSummary::from_records(&[], std::time::Duration::ZERO);
    }

    #[test]
    fn test_dispatcher_rejects_invalid_config() {
        let config = config::ConfigParameter::new();
        assert!(matches!(
            dispatcher::Dispatcher::new(config),
            Err(errors::LoadError::InvalidUrl(_))
        ));
    }
}
