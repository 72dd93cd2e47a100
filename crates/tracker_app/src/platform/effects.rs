use std::collections::HashMap;
use std::sync::Arc;

use tracker_core::{CommandKind, Effect, JobKey, Msg, NoticeLevel, PollPolicy, PropertyKind};
use tracker_engine::{
    EngineEvent, EventStreamReader, JobCommands, JobSource, PollingCoordinator, ProgressSink,
    ProgressSource, ReqwestApi,
};
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use super::ui::render::format_notice;

/// Carries out the effects `update` asks for. Everything that talks to the
/// backend runs on a spawned task and reports back through the sink.
pub struct EffectRunner {
    progress: Arc<dyn ProgressSource>,
    commands: Arc<dyn JobCommands>,
    sink: Arc<dyn ProgressSink>,
    polling: PollingCoordinator,
    streams: HashMap<JobKey, EventStreamReader>,
}

impl EffectRunner {
    pub fn new(api: Arc<ReqwestApi>, sink: Arc<dyn ProgressSink>, policy: PollPolicy) -> Self {
        let source: Arc<dyn JobSource> = api.clone();
        Self {
            progress: api.clone(),
            commands: api,
            polling: PollingCoordinator::new(source, sink.clone(), policy),
            sink,
            streams: HashMap::new(),
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartPolling => {
                    self.polling.start();
                }
                Effect::StopPolling => {
                    self.polling.stop();
                }
                Effect::PollNow => {
                    self.polling.poll_now();
                }
                Effect::OpenStream { key, stream_id } => self.open_stream(key, stream_id),
                Effect::CloseStream { key, stream_id } => self.close_stream(&key, stream_id),
                Effect::Register { code, kind } => self.spawn_register(code, kind),
                Effect::Retry { key, id } => self.spawn_retry(key, id),
                Effect::Remove { key, id } => self.spawn_remove(key, id),
                Effect::Notify { level, text } => notify(level, &text),
            }
        }
    }

    /// Number of readers still held open.
    pub fn open_streams(&self) -> usize {
        self.streams.len()
    }

    fn open_stream(&mut self, key: JobKey, stream_id: u64) {
        if let Some(previous) = self.streams.remove(&key) {
            tracker_warn!(
                "Replacing stream {} of {} with {}",
                previous.stream_id(),
                key,
                stream_id
            );
            previous.close();
        }
        let reader =
            EventStreamReader::open(self.progress.clone(), key.clone(), stream_id, self.sink.clone());
        self.streams.insert(key, reader);
    }

    fn close_stream(&mut self, key: &str, stream_id: u64) {
        let matches = self
            .streams
            .get(key)
            .is_some_and(|reader| reader.stream_id() == stream_id);
        if !matches {
            tracker_debug!("No open stream {} for {}; nothing to close", stream_id, key);
            return;
        }
        if let Some(reader) = self.streams.remove(key) {
            reader.close();
        }
    }

    fn spawn_register(&self, code: JobKey, kind: PropertyKind) {
        tracker_info!("Registering {} ({:?})", code, kind);
        let commands = self.commands.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let result = commands.register(&code, kind).await;
            sink.emit(EngineEvent::Registered { code, result });
        });
    }

    fn spawn_retry(&self, key: JobKey, id: u64) {
        tracker_info!("Requeueing {} (id {})", key, id);
        let commands = self.commands.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let result = commands.retry(id).await;
            sink.emit(EngineEvent::Retried { key, result });
        });
    }

    fn spawn_remove(&self, key: JobKey, id: u64) {
        tracker_info!("Removing {} (id {})", key, id);
        let commands = self.commands.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let result = commands.remove(id).await;
            sink.emit(EngineEvent::Removed { key, result });
        });
    }
}

fn notify(level: NoticeLevel, text: &str) {
    match level {
        NoticeLevel::Error => tracker_warn!("Notice: {}", text),
        _ => tracker_info!("Notice: {}", text),
    }
    println!("{}", format_notice(level, text));
}

/// Translates an engine report into the message `update` consumes.
pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PollCompleted(Ok(records)) => Msg::PollSucceeded(records),
        EngineEvent::PollCompleted(Err(err)) => Msg::PollFailed(err.to_string()),
        EngineEvent::StreamSnapshot {
            key,
            stream_id,
            snapshot,
        } => Msg::StreamSnapshot {
            key,
            stream_id,
            snapshot,
        },
        EngineEvent::StreamClosed {
            key,
            stream_id,
            reason,
        } => Msg::StreamClosed {
            key,
            stream_id,
            reason,
        },
        EngineEvent::Registered { code, result } => match result {
            Ok(record) => Msg::Registered(record),
            Err(err) => {
                tracker_warn!("Registering {} failed: {}", code, err);
                Msg::CommandFailed {
                    command: CommandKind::Register { code },
                    reason: err.user_message(),
                }
            }
        },
        EngineEvent::Retried { key, result } => match result {
            Ok(record) => Msg::Retried(record),
            Err(err) => {
                tracker_warn!("Requeueing {} failed: {}", key, err);
                Msg::CommandFailed {
                    command: CommandKind::Retry { key },
                    reason: err.user_message(),
                }
            }
        },
        EngineEvent::Removed { key, result } => match result {
            Ok(()) => Msg::Removed { key },
            Err(err) => {
                tracker_warn!("Removing {} failed: {}", key, err);
                Msg::CommandFailed {
                    command: CommandKind::Remove { key },
                    reason: err.user_message(),
                }
            }
        },
    }
}
