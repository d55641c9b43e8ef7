// File: config.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use reqwest::Url;
use std::time::Duration;

use crate::errors::{LoadError, LoadResult};

#[derive(Debug, Clone)]
pub struct ConfigParameter {
    target: String,
    requests: u64,
    workers: usize,
    duration: Option<Duration>,
    connect_timeout: Duration,
    read_timeout: Duration,
    post_ratio: f64,
    cache_bust: bool,
    proxy: Option<String>,
    submit_jitter: Option<(Duration, Duration)>,
    progress_interval: Duration,
    output_dir: String,
    output_prefix: String,
    suppress_stats: bool,
    no_save: bool,
    extra_paths: Vec<String>,
    extra_requests: u64,
    extra_pause: Duration,
}

impl Default for ConfigParameter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParameter {
    pub fn new() -> Self {
        Self {
            target: String::new(),
            requests: 100,
            workers: 10,
            duration: None,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            post_ratio: 0.3,
            cache_bust: true,
            proxy: None,
            submit_jitter: None,
            progress_interval: Duration::from_millis(500),
            output_dir: ".".to_string(),
            output_prefix: "load_test".to_string(),
            suppress_stats: false,
            no_save: false,
            extra_paths: Vec::new(),
            extra_requests: 50,
            extra_pause: Duration::from_secs(2),
        }
    }

    /// Checks the configuration and returns the parsed target URL.
    pub fn validate(&self) -> LoadResult<Url> {
        let url = parse_target(&self.target)?;

        if self.requests == 0 {
            return Err(LoadError::InvalidConfig(
                "request count must be at least 1".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(LoadError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.post_ratio) {
            return Err(LoadError::InvalidConfig(format!(
                "POST ratio must be between 0 and 1, got {}",
                self.post_ratio
            )));
        }
        if self.connect_timeout.is_zero() || self.read_timeout.is_zero() {
            return Err(LoadError::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if let Some(duration) = self.duration {
            if duration.is_zero() {
                return Err(LoadError::InvalidConfig(
                    "test duration must be greater than zero".to_string(),
                ));
            }
        }
        if let Some((min, max)) = self.submit_jitter {
            if min > max {
                return Err(LoadError::InvalidConfig(format!(
                    "jitter minimum {:?} exceeds maximum {:?}",
                    min, max
                )));
            }
        }
        if let Some(proxy) = &self.proxy {
            Url::parse(proxy)
                .map_err(|e| LoadError::InvalidConfig(format!("invalid proxy {}: {}", proxy, e)))?;
        }

        Ok(url)
    }

    /// Sum of connect and read timeouts; the longest a single request may take.
    pub fn request_timeout(&self) -> Duration {
        self.connect_timeout.saturating_add(self.read_timeout)
    }

    pub fn set_target(&mut self, target: &str) {
        self.target = target.to_string();
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_requests(&mut self, requests: u64) {
        self.requests = requests;
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn set_workers(&mut self, workers: usize) {
        self.workers = workers;
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn set_duration(&mut self, duration: Option<Duration>) {
        self.duration = duration;
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn set_post_ratio(&mut self, post_ratio: f64) {
        self.post_ratio = post_ratio;
    }

    pub fn post_ratio(&self) -> f64 {
        self.post_ratio
    }

    pub fn set_cache_bust(&mut self, cache_bust: bool) {
        self.cache_bust = cache_bust;
    }

    pub fn cache_bust(&self) -> bool {
        self.cache_bust
    }

    pub fn set_proxy(&mut self, proxy: Option<String>) {
        self.proxy = proxy;
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn set_submit_jitter(&mut self, jitter: Option<(Duration, Duration)>) {
        self.submit_jitter = jitter;
    }

    pub fn submit_jitter(&self) -> Option<(Duration, Duration)> {
        self.submit_jitter
    }

    pub fn set_progress_interval(&mut self, interval: Duration) {
        self.progress_interval = interval;
    }

    pub fn progress_interval(&self) -> Duration {
        self.progress_interval
    }

    pub fn set_output_dir(&mut self, output_dir: &str) {
        self.output_dir = output_dir.to_string();
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn set_output_prefix(&mut self, prefix: &str) {
        self.output_prefix = prefix.to_string();
    }

    pub fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    pub fn suppress_stats(&self) -> bool {
        self.suppress_stats
    }

    pub fn set_suppress_stats(&mut self, suppress_stats: bool) {
        self.suppress_stats = suppress_stats;
    }

    pub fn no_save(&self) -> bool {
        self.no_save
    }

    pub fn set_no_save(&mut self, no_save: bool) {
        self.no_save = no_save;
    }

    pub fn set_extra_paths(&mut self, paths: Vec<String>) {
        self.extra_paths = paths;
    }

    pub fn extra_paths(&self) -> &[String] {
        &self.extra_paths
    }

    pub fn set_extra_requests(&mut self, requests: u64) {
        self.extra_requests = requests;
    }

    pub fn extra_requests(&self) -> u64 {
        self.extra_requests
    }

    pub fn set_extra_pause(&mut self, pause: Duration) {
        self.extra_pause = pause;
    }

    pub fn extra_pause(&self) -> Duration {
        self.extra_pause
    }
}

pub fn parse_target(target: &str) -> LoadResult<Url> {
    let url = Url::parse(target.trim())
        .map_err(|e| LoadError::InvalidUrl(format!("{}: {}", target, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(LoadError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                target, other
            )))
        }
    }
    if url.host().is_none() {
        return Err(LoadError::InvalidUrl(format!("{}: missing host", target)));
    }

    Ok(url)
}

/// Joins an extra page path onto the target, e.g. `/about` onto
/// `https://site/` gives `https://site/about`.
pub fn join_path(base: &Url, path: &str) -> LoadResult<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    parse_target(&joined)
}
