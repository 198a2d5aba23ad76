//! Monitoring cycle runner
//!
//! A cycle turns every target into two units of work, one per strategy,
//! and pushes them onto a FIFO queue drained by a fixed pool of worker
//! tasks. Each unit runs fetch → extract → append on its own; a failure at
//! any stage ends that unit only.
//!
//! `run_cycle` returns as soon as the units are queued. The returned
//! [`CycleHandle`] carries the per-unit completion channel: drop it to
//! fire and forget, or `wait()` on it for a [`CycleSummary`].

use crate::audit::AuditClient;
use crate::extract;
use crate::sink::ResultSink;
use crate::targets::TargetList;
use crate::types::{CycleSummary, FailureStage, Strategy, UnitOutcome, UnitReport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Worker pool sizing
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Units executing at once (default: 4)
    pub workers: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// One (target, strategy) chain waiting for a worker
struct WorkUnit {
    cycle_id: String,
    target: String,
    strategy: Strategy,
    reports: mpsc::UnboundedSender<UnitReport>,
}

/// Audit client and sink shared by every worker
struct Chain {
    client: Arc<dyn AuditClient>,
    sink: Arc<dyn ResultSink>,
}

/// Bounded worker pool executing audit units
///
/// Must be created inside a Tokio runtime; workers are spawned eagerly and
/// live until [`TaskRunner::shutdown`] or drop of the last queue sender.
pub struct TaskRunner {
    queue: mpsc::UnboundedSender<WorkUnit>,
    workers: Vec<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
    config: RunnerConfig,
}

impl TaskRunner {
    pub fn new(
        config: RunnerConfig,
        client: Arc<dyn AuditClient>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let worker_count = config.workers.max(1);
        let (queue, rx) = mpsc::unbounded_channel::<WorkUnit>();
        let rx = Arc::new(Mutex::new(rx));
        let chain = Arc::new(Chain { client, sink });
        let in_flight = Arc::new(AtomicUsize::new(0));

        let workers = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    rx.clone(),
                    chain.clone(),
                    in_flight.clone(),
                ))
            })
            .collect();

        tracing::debug!(
            workers = worker_count,
            client = chain.client.name(),
            sink = chain.sink.name(),
            "Task runner started"
        );

        Self {
            queue,
            workers,
            in_flight,
            config: RunnerConfig {
                workers: worker_count,
            },
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Units queued or executing, across all cycles
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Snapshot the target list and dispatch one cycle
    pub async fn run_cycle(&self, targets: &TargetList) -> CycleHandle {
        let snapshot = targets.snapshot().await;
        self.dispatch(&snapshot)
    }

    /// Dispatch one unit per (target, strategy) pair in `targets`
    ///
    /// Returns once every unit is queued; units are not awaited.
    pub fn dispatch(&self, targets: &[String]) -> CycleHandle {
        let cycle_id = format!("cyc-{}", uuid::Uuid::new_v4());
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();

        tracing::info!(
            cycle_id = %cycle_id,
            targets = targets.len(),
            units = targets.len() * Strategy::ALL.len(),
            "Starting audit cycle"
        );

        let mut dispatched = 0;
        for target in targets {
            for strategy in Strategy::ALL {
                let unit = WorkUnit {
                    cycle_id: cycle_id.clone(),
                    target: target.clone(),
                    strategy,
                    reports: reports_tx.clone(),
                };

                self.in_flight.fetch_add(1, Ordering::SeqCst);
                if self.queue.send(unit).is_err() {
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    tracing::error!(
                        cycle_id = %cycle_id,
                        target_url = %target,
                        %strategy,
                        "Worker pool is closed, unit dropped"
                    );
                    continue;
                }
                dispatched += 1;
            }
        }

        CycleHandle {
            cycle_id,
            dispatched,
            reports: reports_rx,
        }
    }

    /// Close the queue and wait for workers to drain what is already queued
    pub async fn shutdown(self) {
        drop(self.queue);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "Worker task ended abnormally");
            }
        }
        tracing::debug!("Task runner stopped");
    }

    /// `shutdown` for a runner behind an `Arc`
    ///
    /// Drains queued units when this is the last reference and returns
    /// `true`; otherwise logs what is still in flight and returns `false`.
    pub async fn shutdown_shared(self: Arc<Self>) -> bool {
        let pending = self.in_flight();
        match Arc::try_unwrap(self) {
            Ok(runner) => {
                if pending > 0 {
                    tracing::info!(pending_units = pending, "Waiting for in-flight audits");
                }
                runner.shutdown().await;
                true
            }
            Err(runner) => {
                tracing::warn!(
                    pending_units = runner.in_flight(),
                    "Task runner still shared, in-flight audits will be abandoned"
                );
                false
            }
        }
    }
}

/// Completion channel for one dispatched cycle
pub struct CycleHandle {
    cycle_id: String,
    dispatched: usize,
    reports: mpsc::UnboundedReceiver<UnitReport>,
}

impl CycleHandle {
    pub fn cycle_id(&self) -> &str {
        &self.cycle_id
    }

    /// Units queued by this cycle (2 per target)
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Next unit to finish, or `None` once every unit has reported
    pub async fn next_report(&mut self) -> Option<UnitReport> {
        self.reports.recv().await
    }

    /// Await every unit of the cycle and summarize
    pub async fn wait(mut self) -> CycleSummary {
        let mut summary = CycleSummary {
            cycle_id: self.cycle_id.clone(),
            dispatched: self.dispatched,
            ..Default::default()
        };
        while let Some(report) = self.reports.recv().await {
            summary.record(report);
        }

        tracing::info!(
            cycle_id = %summary.cycle_id,
            dispatched = summary.dispatched,
            completed = summary.completed,
            failed = summary.failed,
            "Audit cycle finished"
        );
        summary
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<WorkUnit>>>,
    chain: Arc<Chain>,
    in_flight: Arc<AtomicUsize>,
) {
    loop {
        // Lock only while waiting for the next unit; FIFO across workers
        let unit = { queue.lock().await.recv().await };
        let Some(unit) = unit else {
            break;
        };

        let started = Instant::now();
        let task_chain = chain.clone();
        let target = unit.target.clone();
        let strategy = unit.strategy;

        // Spawned so a panic in the chain fails this unit, not the worker
        let outcome = match tokio::spawn(async move {
            run_unit(
                task_chain.client.as_ref(),
                task_chain.sink.as_ref(),
                &target,
                strategy,
            )
            .await
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    worker = worker_id,
                    target_url = %unit.target,
                    %strategy,
                    error = %e,
                    "Audit unit panicked"
                );
                UnitOutcome::failed(FailureStage::Panic, e.to_string())
            }
        };

        in_flight.fetch_sub(1, Ordering::SeqCst);

        // Receiver gone means the cycle was dispatched fire-and-forget
        let _ = unit.reports.send(UnitReport {
            cycle_id: unit.cycle_id,
            target: unit.target,
            strategy,
            outcome,
            duration: started.elapsed(),
        });
    }

    tracing::trace!(worker = worker_id, "Worker exiting");
}

/// Run one fetch → extract → append chain and classify its outcome
///
/// Never returns an error: every failure is logged and folded into
/// [`UnitOutcome::Failed`]. A failed fetch never reaches the extractor or
/// the sink.
pub async fn run_unit(
    client: &dyn AuditClient,
    sink: &dyn ResultSink,
    target: &str,
    strategy: Strategy,
) -> UnitOutcome {
    let result = match client.fetch(target, strategy).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(
                target_url = %target,
                screen = strategy.label(),
                stage = %FailureStage::Fetch,
                error = %e,
                "Audit failed"
            );
            return UnitOutcome::failed(FailureStage::Fetch, e.to_string());
        }
    };

    let record = match extract::extract(Some(&result), target, strategy) {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(
                target_url = %target,
                screen = strategy.label(),
                stage = %FailureStage::Extract,
                error = %e,
                "Audit failed"
            );
            return UnitOutcome::failed(FailureStage::Extract, e.to_string());
        }
    };

    if let Err(e) = sink.append(&record).await {
        tracing::error!(
            target_url = %target,
            screen = strategy.label(),
            stage = %FailureStage::Append,
            sink = sink.name(),
            error = %e,
            "Audit failed"
        );
        return UnitOutcome::failed(FailureStage::Append, e.to_string());
    }

    UnitOutcome::Completed(record)
}
