use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracker_core::PollPolicy;
use tracker_logging::{tracker_debug, tracker_info};

use crate::{EngineEvent, JobSource, ProgressSink};

/// Repeating job-list refresh with at most one fetch in flight.
///
/// `start` fetches immediately and then once per interval; a tick that
/// finds the previous fetch still running is skipped. Deciding when to stop
/// belongs to the caller, which sees every result as
/// [`EngineEvent::PollCompleted`].
pub struct PollingCoordinator {
    fetcher: PollFetcher,
    interval: Duration,
    timer: Option<Timer>,
}

struct Timer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Clone)]
struct PollFetcher {
    source: Arc<dyn JobSource>,
    sink: Arc<dyn ProgressSink>,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the fetch task ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PollingCoordinator {
    pub fn new(
        source: Arc<dyn JobSource>,
        sink: Arc<dyn ProgressSink>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            fetcher: PollFetcher {
                source,
                sink,
                in_flight: Arc::new(AtomicBool::new(false)),
            },
            interval: policy.interval,
            timer: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| !timer.task.is_finished())
    }

    /// Starts the timer. Returns `false` when it was already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_timer(
            self.fetcher.clone(),
            self.interval,
            cancel.clone(),
        ));
        self.timer = Some(Timer { cancel, task });
        tracker_info!("Polling started every {:?}", self.interval);
        true
    }

    /// Stops the timer. Returns `false` when it was not running.
    ///
    /// A fetch already in flight still reports its result.
    pub fn stop(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.cancel.cancel();
                timer.task.abort();
                tracker_info!("Polling stopped");
                true
            }
            None => false,
        }
    }

    /// Fetches once outside the interval. Returns `false` when a fetch is
    /// already in flight.
    pub fn poll_now(&self) -> bool {
        self.fetcher.spawn_fetch()
    }
}

impl Drop for PollingCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl PollFetcher {
    fn spawn_fetch(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracker_debug!("Previous job list fetch still pending; skipping");
            return false;
        }

        let guard = InFlightGuard(self.in_flight.clone());
        let source = self.source.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let result = source.list_jobs().await;
            match &result {
                Ok(records) => tracker_debug!("Fetched {} job(s)", records.len()),
                Err(err) => tracker_debug!("Job list fetch failed: {}", err),
            }
            sink.emit(EngineEvent::PollCompleted(result));
        });
        true
    }
}

async fn run_timer(fetcher: PollFetcher, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                fetcher.spawn_fetch();
            }
        }
    }
}
