// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::Parser;
use std::time::Duration;

use crate::config::ConfigParameter;
use crate::errors::{LoadError, LoadResult};

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[arg(help = "Target URL including scheme, e.g. https://example.com/")]
    pub url: String,

    #[arg(short = 'n', long = "requests", default_value_t = 100)]
    pub requests: u64,

    #[arg(
        short = 'w',
        long = "workers",
        default_value_t = 10,
        help = "Maximum number of requests in flight"
    )]
    pub workers: usize,

    #[arg(
        short = 'd',
        long = "duration",
        help = "Stop submitting new requests after this many seconds"
    )]
    pub duration: Option<f64>,

    #[arg(long = "connect-timeout", default_value_t = 5.0)]
    pub connect_timeout: f64,

    #[arg(long = "read-timeout", default_value_t = 10.0)]
    pub read_timeout: f64,

    #[arg(
        long = "post-ratio",
        default_value_t = 0.3,
        help = "Share of requests sent as POST (0.0 - 1.0)"
    )]
    pub post_ratio: f64,

    #[arg(long = "no-cache-bust", help = "Do not append a random query parameter to GETs")]
    pub no_cache_bust: bool,

    #[arg(long = "proxy", help = "Route all requests through this proxy URL")]
    pub proxy: Option<String>,

    #[arg(
        long = "jitter-ms",
        help = "Random pause between submissions, e.g. 10-100"
    )]
    pub jitter_ms: Option<String>,

    #[arg(long = "progress-ms", default_value_t = 500)]
    pub progress_ms: u64,

    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: String,

    #[arg(long = "prefix", default_value = "load_test")]
    pub prefix: String,

    #[arg(
        long = "path",
        help = "Additional page path to test after the main run (repeatable)"
    )]
    pub paths: Vec<String>,

    #[arg(long = "path-requests", default_value_t = 50)]
    pub path_requests: u64,

    #[arg(long = "pause-secs", default_value_t = 2.0)]
    pub pause_secs: f64,

    #[arg(long = "no-save", help = "Do not write the JSON result file")]
    pub no_save: bool,

    #[arg(
        short = 's',
        long = "suppress-stats",
        help = "Suppress the summary report"
    )]
    pub suppress_stats: bool,

    #[arg(short = 'q', long = "quiet", help = "Hide the progress bar")]
    pub quiet: bool,

    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,

    #[arg(long = "no-color", help = "Disable colored output")]
    pub no_color: bool,
}

impl Cli {
    pub fn to_config(&self) -> LoadResult<ConfigParameter> {
        let mut config = ConfigParameter::new();
        config.set_target(&self.url);
        config.set_requests(self.requests);
        config.set_workers(self.workers);
        config.set_duration(self.duration.map(|d| seconds(d, "--duration")).transpose()?);
        config.set_connect_timeout(seconds(self.connect_timeout, "--connect-timeout")?);
        config.set_read_timeout(seconds(self.read_timeout, "--read-timeout")?);
        config.set_post_ratio(self.post_ratio);
        config.set_cache_bust(!self.no_cache_bust);
        config.set_proxy(self.proxy.clone());
        config.set_submit_jitter(self.jitter_ms.as_deref().map(parse_jitter).transpose()?);
        config.set_progress_interval(Duration::from_millis(self.progress_ms));
        config.set_output_dir(&self.output_dir);
        config.set_output_prefix(&self.prefix);
        config.set_extra_paths(self.paths.clone());
        config.set_extra_requests(self.path_requests);
        config.set_extra_pause(seconds(self.pause_secs, "--pause-secs")?);
        config.set_no_save(self.no_save);
        config.set_suppress_stats(self.suppress_stats);
        Ok(config)
    }
}

fn seconds(value: f64, flag: &str) -> LoadResult<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| LoadError::InvalidConfig(format!("{}: {} ({})", flag, value, e)))
}

/// Parses `MIN-MAX` (or a single value) in milliseconds.
pub fn parse_jitter(spec: &str) -> LoadResult<(Duration, Duration)> {
    let invalid = || LoadError::InvalidConfig(format!("invalid jitter '{}', expected MIN-MAX", spec));
    let (min, max) = match spec.split_once('-') {
        Some((min, max)) => (min.trim(), max.trim()),
        None => (spec.trim(), spec.trim()),
    };
    let min: u64 = min.parse().map_err(|_| invalid())?;
    let max: u64 = max.parse().map_err(|_| invalid())?;
    Ok((Duration::from_millis(min), Duration::from_millis(max)))
}
