/*
Copyright 2022 Volker Schwaberow <volker@schwaberow.de>
Permission is hereby granted, free of charge, to any person obtaining a
copy of this software and associated documentation files (the
"Software"), to deal in the Software without restriction, including without
limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the
Software is furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be
included in all copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR
OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE,
ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
DEALINGS IN THE SOFTWARE.
Author(s): Volker Schwaberow
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters of a run. Only the dispatcher writes them; progress
/// observers and callers may read them at any time.
#[derive(Debug, Default)]
pub struct GetState {
    total_requests: AtomicU64,
    submitted_requests: AtomicU64,
    completed_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
}

/// Point-in-time copy of the counters, handed to progress sinks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub submitted: u64,
    pub completed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}

impl GetState {
    pub fn new() -> GetState {
        GetState::default()
    }

    pub fn reset(&self, total_requests: u64) {
        self.total_requests.store(total_requests, Ordering::Relaxed);
        self.submitted_requests.store(0, Ordering::Relaxed);
        self.completed_requests.store(0, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
    }

    pub fn add_submitted(&self) {
        self.submitted_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_success(&self) {
        self.completed_requests.fetch_add(1, Ordering::Relaxed);
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_failure(&self) {
        self.completed_requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn submitted_requests(&self) -> u64 {
        self.submitted_requests.load(Ordering::Relaxed)
    }

    pub fn completed_requests(&self) -> u64 {
        self.completed_requests.load(Ordering::Relaxed)
    }

    pub fn successful_requests(&self) -> u64 {
        self.successful_requests.load(Ordering::Relaxed)
    }

    pub fn failed_requests(&self) -> u64 {
        self.failed_requests.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, elapsed: Duration) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total_requests(),
            submitted: self.submitted_requests(),
            completed: self.completed_requests(),
            succeeded: self.successful_requests(),
            failed: self.failed_requests(),
            elapsed,
        }
    }
}
