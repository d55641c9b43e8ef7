// File: progress.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use std::fmt::Write;
use std::time::{Duration, Instant};

use crate::getstate::ProgressSnapshot;

/// Receives periodic progress observations from the dispatcher.
pub trait ProgressSink: Send + Sync {
    fn started(&self, _total: u64) {}
    fn observe(&self, snapshot: &ProgressSnapshot);
    fn finished(&self, _snapshot: &ProgressSnapshot) {}
}

pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn observe(&self, _snapshot: &ProgressSnapshot) {}
}

pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .map(|style| {
            style
                .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                })
                .progress_chars("█▉▊▋▌▍▎▏  ")
        })
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn started(&self, total: u64) {
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn observe(&self, snapshot: &ProgressSnapshot) {
        self.bar.set_position(snapshot.completed);
        self.bar.set_message(format!(
            "{:.1} req/s, {} errors",
            snapshot.requests_per_second(),
            snapshot.failed
        ));
    }

    fn finished(&self, snapshot: &ProgressSnapshot) {
        self.observe(snapshot);
        self.bar.finish();
    }
}

/// Gate that opens at most once per interval.
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(prev) if now.duration_since(prev) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
