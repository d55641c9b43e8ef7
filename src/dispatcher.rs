// File: dispatcher.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Local, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, info, warn};
use rand::Rng;
use reqwest::Url;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::config::ConfigParameter;
use crate::errors::LoadResult;
use crate::executor::RequestExecutor;
use crate::failure::FailureKind;
use crate::getstate::GetState;
use crate::outcome::{OutcomeRecord, RequestMethod};
use crate::progress::{ProgressSink, ProgressThrottle};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub target: Url,
    pub started_at: DateTime<Local>,
    pub records: Vec<OutcomeRecord>,
    pub elapsed: Duration,
    pub stopped_early: bool,
}

/// Fires the configured number of requests at one target through a bounded
/// worker pool. The semaphore size is the only throughput control.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    target: Url,
    config: ConfigParameter,
    executor: Arc<RequestExecutor>,
    state: Arc<GetState>,
}

impl Dispatcher {
    pub fn new(config: ConfigParameter) -> LoadResult<Self> {
        let target = config.validate()?;
        let executor = Arc::new(RequestExecutor::new(&config)?);
        Ok(Dispatcher {
            target,
            config,
            executor,
            state: Arc::new(GetState::new()),
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn config(&self) -> &ConfigParameter {
        &self.config
    }

    pub fn state(&self) -> Arc<GetState> {
        Arc::clone(&self.state)
    }

    pub async fn run(&self, progress: &dyn ProgressSink) -> LoadResult<RunOutcome> {
        self.run_until(progress, std::future::pending::<()>()).await
    }

    /// Like [`Dispatcher::run`], but stops submitting new requests once
    /// `shutdown` resolves. Requests already in flight are always awaited.
    pub async fn run_until<F>(&self, progress: &dyn ProgressSink, shutdown: F) -> LoadResult<RunOutcome>
    where
        F: Future<Output = ()>,
    {
        let total = self.config.requests();
        let workers = self.config.workers();
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut in_flight = FuturesUnordered::new();
        let mut records = Vec::with_capacity(total.min(1 << 16) as usize);
        let mut throttle = ProgressThrottle::new(self.config.progress_interval());
        let mut next_index: u64 = 0;
        let mut submitting = true;
        let mut stopped_early = false;

        let started_at = Local::now();
        let started = Instant::now();
        let deadline = self
            .config
            .duration()
            .and_then(|cap| tokio::time::Instant::from_std(started).checked_add(cap));
        // Submission gate for the optional jitter; completions keep flowing while it is closed.
        let pause = tokio::time::sleep(Duration::ZERO);
        let mut paused = false;
        self.state.reset(total);
        progress.started(total);
        info!(
            "Starting load test of {}: {} requests, {} workers",
            self.target, total, workers
        );

        tokio::pin!(shutdown);
        tokio::pin!(pause);

        loop {
            if submitting {
                if next_index >= total {
                    submitting = false;
                } else if self.deadline_passed(started) {
                    info!(
                        "Test duration reached, stopping after {} of {} requests",
                        next_index, total
                    );
                    submitting = false;
                    stopped_early = true;
                }
            }
            if !submitting && in_flight.is_empty() {
                break;
            }

            tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned(), if submitting && !paused => {
                    let permit = permit?;
                    if self.deadline_passed(started) {
                        continue;
                    }

                    let index = next_index;
                    next_index += 1;
                    let executor = Arc::clone(&self.executor);
                    let target = self.target.clone();
                    let handle = tokio::spawn(async move {
                        let record = executor.execute(&target, index).await;
                        drop(permit);
                        record
                    });
                    in_flight.push(async move { (index, handle.await) });
                    self.state.add_submitted();

                    if let Some(jitter) = self.jitter() {
                        let mut until = tokio::time::Instant::now() + jitter;
                        if let Some(deadline) = deadline {
                            until = until.min(deadline);
                        }
                        pause.as_mut().reset(until);
                        paused = true;
                    }
                }
                () = &mut pause, if paused => {
                    paused = false;
                }
                Some((index, joined)) = in_flight.next(), if !in_flight.is_empty() => {
                    let record = match joined {
                        Ok(record) => record,
                        Err(e) => {
                            error!("Worker for request #{} failed: {}", index, e);
                            OutcomeRecord::transport_failure(
                                index,
                                RequestMethod::Get,
                                self.target.to_string(),
                                Utc::now(),
                                None,
                                None,
                                None,
                                FailureKind::Other("worker panic".to_string()),
                                &e.to_string(),
                            )
                        }
                    };

                    if record.success() {
                        self.state.add_success();
                    } else {
                        self.state.add_failure();
                    }
                    records.push(record);

                    if throttle.ready(Instant::now()) {
                        progress.observe(&self.state.snapshot(started.elapsed()));
                    }
                }
                _ = &mut shutdown, if submitting => {
                    warn!(
                        "Interrupted, waiting for {} in-flight requests to finish",
                        in_flight.len()
                    );
                    submitting = false;
                    stopped_early = true;
                }
                else => break,
            }
        }

        let elapsed = started.elapsed();
        progress.finished(&self.state.snapshot(elapsed));
        info!(
            "Finished {} requests against {} in {:.2}s",
            records.len(),
            self.target,
            elapsed.as_secs_f64()
        );

        Ok(RunOutcome {
            target: self.target.clone(),
            started_at,
            records,
            elapsed,
            stopped_early,
        })
    }

    fn deadline_passed(&self, started: Instant) -> bool {
        self.config
            .duration()
            .map_or(false, |cap| started.elapsed() >= cap)
    }

    fn jitter(&self) -> Option<Duration> {
        let (min, max) = self.config.submit_jitter()?;
        if min >= max {
            return Some(min);
        }
        Some(rand::thread_rng().gen_range(min..=max))
    }
}
