use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracker_core::{reduce, JobKey, ProgressEvent, ProgressSnapshot, StreamCloseReason, StreamId};
use tracker_logging::{tracker_debug, tracker_info, tracker_trace, tracker_warn};

use crate::sse::SseDecoder;
use crate::{EngineEvent, ProgressSink, ProgressSource};

/// One live progress subscription for one job.
///
/// The subscription runs on its own task. It ends by itself on the terminal
/// event or on a transport error, reporting [`EngineEvent::StreamClosed`];
/// closing or dropping the reader cancels it without a report. Either way
/// the underlying connection is released with the task.
pub struct EventStreamReader {
    key: JobKey,
    stream_id: StreamId,
    cancel: CancellationToken,
    latest: watch::Receiver<ProgressSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl EventStreamReader {
    /// Spawns the subscription task. Must be called inside a tokio runtime.
    pub fn open(
        source: Arc<dyn ProgressSource>,
        key: JobKey,
        stream_id: StreamId,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (latest_tx, latest) = watch::channel(ProgressSnapshot::default());
        tracker_info!("Opening progress stream key={} stream_id={}", key, stream_id);

        let task = tokio::spawn(run_stream(
            source,
            key.clone(),
            stream_id,
            sink,
            cancel.clone(),
            latest_tx,
        ));

        Self {
            key,
            stream_id,
            cancel,
            latest,
            task: Some(task),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Most recent snapshot reduced from this stream.
    pub fn latest(&self) -> ProgressSnapshot {
        self.latest.borrow().clone()
    }

    /// True once the subscription task has ended (completion, error or close).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Closes the subscription and releases the connection.
    pub fn close(self) {
        tracker_debug!(
            "Closing progress stream key={} stream_id={}",
            self.key,
            self.stream_id
        );
    }
}

impl Drop for EventStreamReader {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_stream(
    source: Arc<dyn ProgressSource>,
    key: JobKey,
    stream_id: StreamId,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
    latest: watch::Sender<ProgressSnapshot>,
) {
    let reason = tokio::select! {
        _ = cancel.cancelled() => None,
        reason = read_stream(source.as_ref(), &key, stream_id, sink.as_ref(), &latest) => Some(reason),
    };

    match reason {
        Some(reason) => {
            match &reason {
                StreamCloseReason::Completed => {
                    tracker_info!("Progress stream completed key={} stream_id={}", key, stream_id)
                }
                StreamCloseReason::Transport(message) => tracker_warn!(
                    "Progress stream lost key={} stream_id={}: {}",
                    key,
                    stream_id,
                    message
                ),
            }
            sink.emit(EngineEvent::StreamClosed {
                key,
                stream_id,
                reason,
            });
        }
        None => tracker_debug!("Progress stream cancelled key={} stream_id={}", key, stream_id),
    }
}

async fn read_stream(
    source: &dyn ProgressSource,
    key: &str,
    stream_id: StreamId,
    sink: &dyn ProgressSink,
    latest: &watch::Sender<ProgressSnapshot>,
) -> StreamCloseReason {
    let mut body = match source.subscribe(key).await {
        Ok(body) => body,
        Err(err) => return StreamCloseReason::Transport(err.to_string()),
    };

    let mut decoder = SseDecoder::new();
    let mut snapshot: Option<ProgressSnapshot> = None;

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => return StreamCloseReason::Transport(err.to_string()),
        };

        for frame in decoder.push(&chunk) {
            let event = match ProgressEvent::decode(&frame.event, &frame.data) {
                Ok(ProgressEvent::Unknown { name }) => {
                    tracker_trace!("Ignoring unknown progress event {} key={}", name, key);
                    continue;
                }
                Ok(event) => event,
                Err(err) => {
                    tracker_warn!("Dropping progress event key={}: {}", key, err);
                    continue;
                }
            };

            let next = reduce(snapshot.as_ref(), &event);
            latest.send_replace(next.clone());
            sink.emit(EngineEvent::StreamSnapshot {
                key: key.to_string(),
                stream_id,
                snapshot: next.clone(),
            });
            let terminal = next.terminal;
            snapshot = Some(next);
            if terminal {
                return StreamCloseReason::Completed;
            }
        }
    }

    StreamCloseReason::Transport("stream ended before completion".to_string())
}
