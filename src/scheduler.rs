//! Periodic cycle scheduler
//!
//! Runs one cycle as soon as it starts, then one per `interval`. Due work
//! is checked on a coarse `poll_interval` tick, so a cycle can start up to
//! one tick late. Cycles are dispatched fire-and-forget; a background task
//! logs each cycle's summary once its units finish.

use crate::runner::TaskRunner;
use crate::targets::TargetList;
use crate::types::CycleSummary;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// Scheduler cadence
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between cycle starts (default: 4 hours)
    pub interval: Duration,

    /// How often due work is checked (default: 60 seconds)
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(4 * 60 * 60),
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// Scheduler events for monitoring
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    Started,
    Stopped,
    /// A cycle's units were queued
    CycleDispatched { cycle_id: String, units: usize },
    /// Every unit of a cycle reported back
    CycleFinished(CycleSummary),
}

/// Handle to one running automation loop
struct LoopRun {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Drives `TaskRunner::run_cycle` on a fixed cadence
pub struct Scheduler {
    runner: Arc<TaskRunner>,
    targets: TargetList,
    config: SchedulerConfig,
    event_tx: broadcast::Sender<SchedulerEvent>,
    /// At most one loop at a time; `stop` joins it before releasing
    run: Mutex<Option<LoopRun>>,
}

impl Scheduler {
    pub fn new(runner: Arc<TaskRunner>, targets: TargetList, config: SchedulerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            runner,
            targets,
            config,
            event_tx,
            run: Mutex::new(None),
        }
    }

    /// Subscribe to scheduler events
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start the background loop; a no-op if already running
    pub async fn start(&self) {
        let mut run = self.run.lock().await;
        if run.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            tracing::info!("Automation already running");
            return;
        }

        let (stop, stop_rx) = watch::channel(false);
        let _ = self.event_tx.send(SchedulerEvent::Started);
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "Automation started, first cycle runs now"
        );

        let handle = tokio::spawn(run_loop(
            self.runner.clone(),
            self.targets.clone(),
            self.config.clone(),
            self.event_tx.clone(),
            stop_rx,
        ));
        *run = Some(LoopRun { stop, handle });
    }

    /// Stop the loop and wait for it to exit; cycles already dispatched
    /// keep running
    pub async fn stop(&self) {
        let mut run = self.run.lock().await;
        let Some(current) = run.take() else {
            return;
        };

        let _ = current.stop.send(true);
        if let Err(e) = current.handle.await {
            tracing::warn!(error = %e, "Automation loop ended abnormally");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.run
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}

async fn run_loop(
    runner: Arc<TaskRunner>,
    targets: TargetList,
    config: SchedulerConfig,
    event_tx: broadcast::Sender<SchedulerEvent>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut next_run = Instant::now();

    loop {
        tokio::select! {
            biased;
            // Err means the scheduler was dropped
            _ = stop.changed() => break,
            _ = ticker.tick() => {}
        }

        if Instant::now() < next_run {
            continue;
        }

        dispatch_cycle(&runner, &targets, &event_tx).await;
        next_run = Instant::now() + config.interval;
        tracing::info!(
            next_in_secs = config.interval.as_secs(),
            "Waiting for next run"
        );
    }

    let _ = event_tx.send(SchedulerEvent::Stopped);
    tracing::info!("Automation stopped");
}

async fn dispatch_cycle(
    runner: &TaskRunner,
    targets: &TargetList,
    event_tx: &broadcast::Sender<SchedulerEvent>,
) {
    let pending = runner.in_flight();
    if pending > 0 {
        tracing::warn!(
            pending_units = pending,
            "Previous cycle still running, new units will queue behind it"
        );
    }

    let handle = runner.run_cycle(targets).await;
    let _ = event_tx.send(SchedulerEvent::CycleDispatched {
        cycle_id: handle.cycle_id().to_string(),
        units: handle.dispatched(),
    });

    let event_tx = event_tx.clone();
    tokio::spawn(async move {
        let summary = handle.wait().await;
        let _ = event_tx.send(SchedulerEvent::CycleFinished(summary));
    });
}
