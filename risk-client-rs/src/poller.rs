//! Scheduled prediction polling
//!
//! `PredictionPoller` runs a fallback scan right away and then once per
//! interval on a background task. At most one scan is outstanding at any time:
//! ticks that come due during a scan are skipped, and a manual `poll_now`
//! while a scan is running fails with `ServiceError::ScanInProgress`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::PredictionConfig;
use crate::core::PredictionSource;
use crate::error::{Result, ServiceError};
use crate::services::prediction::{PredictionResult, ScanOutcome};

pub const STATUS_READY: &str = "SYSTEM READY";
pub const STATUS_NETWORK_ERROR: &str = "NETWORK ERROR";

/// Snapshot of what the poller has seen so far
#[derive(Debug, Clone, Serialize)]
pub struct PollStatus {
    /// "SYSTEM READY", "LIVE DATA: <ms>ms" or "NETWORK ERROR"
    pub message: String,

    /// Failure messages, oldest first
    pub attempts: VecDeque<String>,

    /// Most recent prediction, kept across failed scans
    pub last_prediction: Option<PredictionResult>,

    /// Label of the endpoint that served `last_prediction`
    pub last_endpoint: Option<String>,

    /// When the last scan finished
    pub last_scan_at: Option<DateTime<Utc>>,

    /// Completed scans, successful or not
    pub scan_count: u64,

    /// Whether the background task is active
    pub running: bool,
}

impl Default for PollStatus {
    fn default() -> Self {
        Self {
            message: STATUS_READY.to_string(),
            attempts: VecDeque::new(),
            last_prediction: None,
            last_endpoint: None,
            last_scan_at: None,
            scan_count: 0,
            running: false,
        }
    }
}

impl PollStatus {
    fn record_success(&mut self, outcome: &ScanOutcome) {
        self.message = format!("LIVE DATA: {}ms", outcome.elapsed.as_millis());
        self.last_prediction = Some(outcome.prediction.clone());
        self.last_endpoint = Some(outcome.endpoint.label.clone());
        self.finish_scan();
    }

    fn record_failure(&mut self, err: &ServiceError, max_history: usize) {
        self.message = STATUS_NETWORK_ERROR.to_string();
        self.attempts.push_back(err.to_string());
        while self.attempts.len() > max_history {
            self.attempts.pop_front();
        }
        self.finish_scan();
    }

    fn finish_scan(&mut self) {
        self.scan_count += 1;
        self.last_scan_at = Some(Utc::now());
    }
}

/// State shared between the poller handle and its background task
struct Shared<S> {
    source: S,
    scan_guard: Mutex<()>,
    status: RwLock<PollStatus>,
    max_attempt_history: usize,
}

impl<S: PredictionSource> Shared<S> {
    async fn scan_once(&self) -> Result<ScanOutcome> {
        let _guard = self.scan_guard.try_lock().map_err(|_| ServiceError::ScanInProgress)?;

        let result = self.source.scan().await;

        let mut status = self.status.write().await;
        match &result {
            Ok(outcome) => status.record_success(outcome),
            Err(err) => status.record_failure(err, self.max_attempt_history),
        }

        result
    }
}

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Runs fallback scans on a fixed schedule
pub struct PredictionPoller<S: PredictionSource + 'static> {
    shared: Arc<Shared<S>>,
    interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl<S: PredictionSource + 'static> PredictionPoller<S> {
    /// Create a stopped poller
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                scan_guard: Mutex::new(()),
                status: RwLock::new(PollStatus::default()),
                max_attempt_history: PredictionConfig::default().max_attempt_history,
            }),
            interval,
            worker: Mutex::new(None),
        }
    }

    /// Create a stopped poller using the interval and history bound of a configuration
    pub fn from_config(source: S, config: &PredictionConfig) -> Self {
        Self::new(source, config.poll_interval)
            .with_max_attempt_history(config.max_attempt_history)
    }

    /// Bound the number of failure messages kept in the status
    pub fn with_max_attempt_history(mut self, max: usize) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.max_attempt_history = max;
        }
        self
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the background task; the first scan runs immediately
    ///
    /// Calling `start` on a running poller does nothing.
    pub async fn start(&self) {
        let mut worker = self.worker.lock().await;

        if let Some(existing) = worker.as_ref() {
            if !existing.handle.is_finished() {
                debug!("Prediction poller already running");
                return;
            }
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let interval = self.interval;

        shared.status.write().await.running = true;
        info!("Starting prediction poller, interval {:?}", interval);

        let handle = tokio::spawn(run_schedule(shared, interval, shutdown_rx));
        *worker = Some(Worker { shutdown, handle });
    }

    /// Stop the background task, letting an in-flight scan finish first
    pub async fn stop(&self) {
        let worker = self.worker.lock().await.take();

        if let Some(worker) = worker {
            let _ = worker.shutdown.send(true);
            if let Err(e) = worker.handle.await {
                warn!("Prediction poller task ended abnormally: {}", e);
            }
            info!("Prediction poller stopped");
        }

        self.shared.status.write().await.running = false;
    }

    pub async fn is_running(&self) -> bool {
        match self.worker.lock().await.as_ref() {
            Some(worker) => !worker.handle.is_finished(),
            None => false,
        }
    }

    /// Scan now, outside the schedule
    ///
    /// Fails with `ServiceError::ScanInProgress` instead of starting a second
    /// concurrent scan.
    pub async fn poll_now(&self) -> Result<ScanOutcome> {
        self.shared.scan_once().await
    }

    pub async fn status(&self) -> PollStatus {
        self.shared.status.read().await.clone()
    }
}

impl<S: PredictionSource + 'static> Drop for PredictionPoller<S> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            let _ = worker.shutdown.send(true);
        }
    }
}

async fn run_schedule<S: PredictionSource>(
    shared: Arc<Shared<S>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if *shutdown.borrow() {
                    break;
                }

                match shared.scan_once().await {
                    Ok(outcome) => debug!("Scheduled scan served by {}", outcome.endpoint.label),
                    Err(ServiceError::ScanInProgress) => debug!("Skipping tick, a scan is already in progress"),
                    Err(e) => debug!("Scheduled scan failed: {}", e),
                }
            }
        }
    }

    shared.status.write().await.running = false;
}
