//! Tests for the scheduled poller
//!
//! These tests drive the poller with a scripted in-memory source so the
//! schedule, the one-scan-at-a-time guarantee and the status record can be
//! checked without a network.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::config::Endpoint;
    use crate::core::PredictionSource;
    use crate::error::{AttemptFailure, Result, ServiceError};
    use crate::poller::{PredictionPoller, STATUS_NETWORK_ERROR, STATUS_READY};
    use crate::services::prediction::{PredictionResult, ScanOutcome};

    /// Source that counts scans and tracks how many run at once
    #[derive(Default)]
    struct ScriptedSource {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
        failing: AtomicBool,
    }

    impl ScriptedSource {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn failing() -> Self {
            let source = Self::default();
            source.failing.store(true, Ordering::SeqCst);
            source
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PredictionSource for ScriptedSource {
        async fn scan(&self) -> Result<ScanOutcome> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.load(Ordering::SeqCst) {
                return Err(ServiceError::exhausted(vec![AttemptFailure {
                    label: "Localhost".to_string(),
                    url: "http://localhost:8000".to_string(),
                    error: ServiceError::network(format!("Connection refused (call {})", call)),
                }]));
            }

            Ok(ScanOutcome {
                prediction: PredictionResult {
                    risk: "Low Accident Risk".to_string(),
                    probability: 0.2,
                    ..PredictionResult::default()
                },
                endpoint: Endpoint::new("Localhost", "http://localhost:8000"),
                elapsed: Duration::from_millis(42),
                failures: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_initial_status() {
        let poller = PredictionPoller::new(ScriptedSource::default(), Duration::from_secs(3600));
        let status = poller.status().await;

        assert_eq!(status.message, STATUS_READY);
        assert_eq!(status.scan_count, 0);
        assert!(status.attempts.is_empty());
        assert!(!status.running);
        assert!(!poller.is_running().await);
    }

    #[tokio::test]
    async fn test_start_scans_immediately() {
        let poller = PredictionPoller::new(ScriptedSource::default(), Duration::from_secs(3600));

        poller.start().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let status = poller.status().await;
        assert_eq!(poller.source().calls(), 1);
        assert_eq!(status.scan_count, 1);
        assert_eq!(status.message, "LIVE DATA: 42ms");
        assert_eq!(status.last_endpoint.as_deref(), Some("Localhost"));
        assert_eq!(status.last_prediction.unwrap().risk, "Low Accident Risk");
        assert!(status.running);

        poller.stop().await;
        assert!(!poller.is_running().await);
        assert!(!poller.status().await.running);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let poller = PredictionPoller::new(ScriptedSource::default(), Duration::from_secs(3600));

        poller.start().await;
        poller.start().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(poller.source().calls(), 1);
        poller.stop().await;
    }

    #[tokio::test]
    async fn test_stop_halts_scheduled_scans() {
        let poller = PredictionPoller::new(ScriptedSource::default(), Duration::from_millis(20));

        poller.start().await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        poller.stop().await;

        let calls_at_stop = poller.source().calls();
        assert!(calls_at_stop >= 2, "expected repeated scans, got {}", calls_at_stop);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(poller.source().calls(), calls_at_stop);
    }

    #[tokio::test]
    async fn test_stop_during_scan_starts_no_new_scan() {
        // A tick is already due when the in-flight scan returns
        for _ in 0..10 {
            let poller = PredictionPoller::new(
                ScriptedSource::with_delay(Duration::from_millis(100)),
                Duration::from_millis(10),
            );

            poller.start().await;
            tokio::time::sleep(Duration::from_millis(30)).await;
            assert_eq!(poller.source().calls(), 1);

            poller.stop().await;

            assert_eq!(poller.source().calls(), 1);
            assert_eq!(poller.status().await.scan_count, 1);
            assert!(!poller.is_running().await);
        }
    }

    #[tokio::test]
    async fn test_poll_now_rejects_overlap() {
        let poller = Arc::new(PredictionPoller::new(
            ScriptedSource::with_delay(Duration::from_millis(300)),
            Duration::from_secs(3600),
        ));

        let first = {
            let poller = Arc::clone(&poller);
            tokio::spawn(async move { poller.poll_now().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = poller.poll_now().await;

        assert!(matches!(second, Err(ServiceError::ScanInProgress)));
        assert!(first.await.unwrap().is_ok());
        assert_eq!(poller.source().calls(), 1);
        assert_eq!(poller.status().await.scan_count, 1);
    }

    #[tokio::test]
    async fn test_schedule_never_overlaps_scans() {
        // Scans take longer than the interval, and manual polls pile on top
        let poller = Arc::new(PredictionPoller::new(
            ScriptedSource::with_delay(Duration::from_millis(60)),
            Duration::from_millis(10),
        ));

        poller.start().await;

        let mut manual = Vec::new();
        for _ in 0..5 {
            let poller = Arc::clone(&poller);
            manual.push(tokio::spawn(async move { poller.poll_now().await }));
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        for handle in manual {
            let _ = handle.await.unwrap();
        }

        poller.stop().await;

        assert!(poller.source().calls() >= 2);
        assert_eq!(poller.source().max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_accumulate_with_bound() {
        let poller = PredictionPoller::new(ScriptedSource::failing(), Duration::from_secs(3600))
            .with_max_attempt_history(2);

        for _ in 0..3 {
            assert!(poller.poll_now().await.is_err());
        }

        let status = poller.status().await;
        assert_eq!(status.message, STATUS_NETWORK_ERROR);
        assert_eq!(status.scan_count, 3);
        assert_eq!(status.attempts.len(), 2);
        assert!(status.attempts[0].contains("call 2"));
        assert!(status.attempts[1].contains("call 3"));
        assert!(status.attempts[1].starts_with("Cannot connect to server. Tried:"));
        assert!(status.last_prediction.is_none());
    }

    #[tokio::test]
    async fn test_last_prediction_survives_failure() {
        let poller = PredictionPoller::new(ScriptedSource::default(), Duration::from_secs(3600));

        assert!(poller.poll_now().await.is_ok());
        poller.source().failing.store(true, Ordering::SeqCst);
        assert!(poller.poll_now().await.is_err());

        let status = poller.status().await;
        assert_eq!(status.message, STATUS_NETWORK_ERROR);
        assert_eq!(status.last_prediction.unwrap().risk, "Low Accident Risk");
        assert_eq!(status.attempts.len(), 1);
    }
}
