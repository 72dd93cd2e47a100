use crate::{JobKey, PropertyKind, StreamId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the polling coordinator (no-op when already running).
    StartPolling,
    /// Stop the polling coordinator (no-op when already stopped).
    StopPolling,
    /// Fetch the job list once, outside the regular interval.
    PollNow,
    OpenStream { key: JobKey, stream_id: StreamId },
    CloseStream { key: JobKey, stream_id: StreamId },
    Register { code: JobKey, kind: PropertyKind },
    Retry { key: JobKey, id: u64 },
    Remove { key: JobKey, id: u64 },
    Notify { level: NoticeLevel, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}
