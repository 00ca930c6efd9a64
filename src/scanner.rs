use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::probe;
use crate::types::{PortResult, ScanUpdate};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Channel end handed to callers that want live updates. Unbounded so many
/// workers can send without blocking; a dropped receiver never stalls or
/// aborts a scan.
pub type ProgressSink = mpsc::UnboundedSender<ScanUpdate>;

/// Scan every port in the configured range and return the open ones.
///
/// Workers race for ports, so the returned order is completion order, not
/// port order. An unreachable or closed port is a normal negative outcome;
/// the only errors are an invalid config (checked before any worker starts)
/// and system resource exhaustion mid-scan.
pub async fn run(
    config: &ScanConfig,
    progress: Option<ProgressSink>,
) -> Result<Vec<PortResult>, ScanError> {
    run_with_cancel(config, progress, CancellationToken::new()).await
}

/// Variant that accepts a `CancellationToken`. Cancellation is observed at
/// the top of each worker's dequeue loop; probes already in flight run to
/// completion, bounded by the per-connection timeout.
pub async fn run_with_cancel(
    config: &ScanConfig,
    progress: Option<ProgressSink>,
    cancel: CancellationToken,
) -> Result<Vec<PortResult>, ScanError> {
    config.validate()?;
    log::info!(
        "scanning {} ports {}-{} with {} workers, timeout {:?}",
        config.target,
        config.start_port,
        config.end_port,
        config.concurrency,
        config.timeout
    );

    let target = config.target.clone();
    let timeout = config.timeout;
    let probe_fn = move |port: u16| {
        let target = target.clone();
        async move { probe::probe(&target, port, timeout).await }
    };

    let outcome = run_workers(config, probe_fn, progress.clone(), cancel).await;

    if let Some(tx) = &progress {
        let terminal = match &outcome {
            Ok(results) => ScanUpdate::Completed {
                results: results.clone(),
            },
            Err(e) => ScanUpdate::Failed {
                error: e.to_string(),
            },
        };
        let _ = tx.send(terminal);
    }
    outcome
}

/// Fractional completion for a dequeued port, in `[0, 100]`.
///
/// Derived from the port number rather than a completion counter, so values
/// can arrive out of order when workers race. A single-port range would
/// divide by zero; it reports 100 here and the orchestrator emits an
/// initial 0 before probing.
fn progress_fraction(port: u16, start: u16, end: u16) -> f64 {
    if end == start {
        100.0
    } else {
        f64::from(port - start) / f64::from(end - start) * 100.0
    }
}

/// Worker pool: `concurrency` workers drain a bounded port queue, probe
/// each port, and append open results under the results mutex. Generic over
/// the probe so tests can instrument it.
async fn run_workers<F, Fut>(
    config: &ScanConfig,
    probe_fn: F,
    progress: Option<ProgressSink>,
    cancel: CancellationToken,
) -> Result<Vec<PortResult>, ScanError>
where
    F: Fn(u16) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<Option<PortResult>, ScanError>> + Send + 'static,
{
    let (start, end) = (config.start_port, config.end_port);
    // Queue capacity equals the worker count, matching the backpressure the
    // pool itself provides.
    let (tx, rx) = mpsc::channel::<u16>(config.concurrency);
    let rx = Arc::new(Mutex::new(rx));
    let results: Arc<Mutex<Vec<PortResult>>> = Arc::new(Mutex::new(Vec::new()));

    if start == end {
        if let Some(p) = &progress {
            let _ = p.send(ScanUpdate::InProgress { fraction: 0.0 });
        }
    }

    let mut set = JoinSet::new();
    for _ in 0..config.concurrency {
        let rx = rx.clone();
        let results = results.clone();
        let progress = progress.clone();
        let cancel = cancel.clone();
        let probe_fn = probe_fn.clone();

        set.spawn(async move {
            loop {
                let port = tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = async { rx.lock().await.recv().await } => match next {
                        Some(p) => p,
                        // Queue closed and drained: normal termination.
                        None => break,
                    },
                };

                match probe_fn(port).await {
                    Ok(Some(result)) => results.lock().await.push(result),
                    Ok(None) => {}
                    Err(e) => {
                        // Resource exhaustion poisons the rest of the scan;
                        // wind the other workers down.
                        cancel.cancel();
                        return Err(e);
                    }
                }

                if let Some(p) = &progress {
                    let _ = p.send(ScanUpdate::InProgress {
                        fraction: progress_fraction(port, start, end),
                    });
                }
            }
            Ok(())
        });
    }

    // Single producer: enqueue the range in ascending order, then close the
    // queue. Closing is the workers' only termination signal.
    for port in start..=end {
        if cancel.is_cancelled() {
            break;
        }
        if tx.send(port).await.is_err() {
            // All workers exited early (fatal error); stop producing.
            break;
        }
    }
    drop(tx);

    let mut failure: Option<ScanError> = None;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failure.get_or_insert(e);
            }
            Err(e) => {
                cancel.cancel();
                failure.get_or_insert(ScanError::Worker(e.to_string()));
            }
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }

    let results = std::mem::take(&mut *results.lock().await);
    log::info!("scan finished: {} open ports", results.len());
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortState;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn cfg(start: u16, end: u16, concurrency: usize) -> ScanConfig {
        ScanConfig::new("test.invalid", start, end)
            .unwrap()
            .with_concurrency(concurrency)
            .unwrap()
    }

    fn open_result(port: u16) -> PortResult {
        PortResult {
            port,
            state: PortState::Open,
            service: crate::services::service_name(port).to_string(),
        }
    }

    #[test]
    fn fraction_spans_zero_to_hundred() {
        assert_eq!(progress_fraction(1, 1, 100), 0.0);
        assert_eq!(progress_fraction(100, 1, 100), 100.0);
        let mid = progress_fraction(50, 0, 100);
        assert!(mid > 49.0 && mid < 51.0);
    }

    #[test]
    fn fraction_single_port_never_divides_by_zero() {
        assert_eq!(progress_fraction(80, 80, 80), 100.0);
    }

    #[tokio::test]
    async fn in_flight_probes_never_exceed_concurrency() {
        let config = cfg(1, 40, 8);
        let inflight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let probe_fn = {
            let inflight = inflight.clone();
            let high_water = high_water.clone();
            move |_port: u16| {
                let inflight = inflight.clone();
                let high_water = high_water.clone();
                async move {
                    let now = inflight.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    inflight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, ScanError>(None)
                }
            }
        };

        let results = run_workers(&config, probe_fn, None, CancellationToken::new())
            .await
            .unwrap();
        assert!(results.is_empty());

        let hw = high_water.load(Ordering::SeqCst);
        assert!(hw >= 1, "at least one probe must run");
        assert!(hw <= 8, "in-flight probes exceeded concurrency: {hw}");
    }

    #[tokio::test]
    async fn one_progress_update_per_dequeued_port() {
        let config = cfg(10, 19, 3);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let probe_fn = |port: u16| async move {
            // Every third port pretends to be open.
            Ok::<_, ScanError>((port % 3 == 0).then(|| open_result(port)))
        };
        let results = run_workers(&config, probe_fn, Some(tx), CancellationToken::new())
            .await
            .unwrap();

        let mut fractions = Vec::new();
        while let Ok(update) = rx.try_recv() {
            match update {
                ScanUpdate::InProgress { fraction } => fractions.push(fraction),
                other => panic!("worker pool sent terminal update {other:?}"),
            }
        }
        assert_eq!(fractions.len(), 10);
        assert!(fractions.iter().all(|f| (0.0..=100.0).contains(f)));
        let mut ports: Vec<u16> = results.iter().map(|r| r.port).collect();
        ports.sort_unstable();
        assert_eq!(ports, vec![12, 15, 18]);
    }

    #[tokio::test]
    async fn excess_workers_exit_on_drained_queue() {
        let config = cfg(1, 3, 50);
        let probe_fn = |port: u16| async move { Ok::<_, ScanError>(Some(open_result(port))) };
        let mut results = run_workers(&config, probe_fn, None, CancellationToken::new())
            .await
            .unwrap();
        results.sort_unstable_by_key(|r| r.port);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.state == PortState::Open));
    }

    #[tokio::test]
    async fn resource_exhaustion_aborts_scan() {
        let config = cfg(1, 100, 4);
        let probe_fn = |port: u16| async move {
            if port == 5 {
                Err(ScanError::Resource(std::io::Error::from_raw_os_error(24)))
            } else {
                Ok::<_, ScanError>(None)
            }
        };
        let err = run_workers(&config, probe_fn, None, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Resource(_)));
    }

    #[tokio::test]
    async fn pre_cancelled_token_scans_nothing() {
        let config = cfg(1, 1000, 10);
        let probed = Arc::new(AtomicUsize::new(0));
        let probe_fn = {
            let probed = probed.clone();
            move |_port: u16| {
                let probed = probed.clone();
                async move {
                    probed.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ScanError>(None)
                }
            }
        };

        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = run_workers(&config, probe_fn, None, cancel).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(probed.load(Ordering::SeqCst), 0);
    }
}
