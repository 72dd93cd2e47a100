use crate::{JobKey, JobRecord, ProgressSnapshot, PropertyKind, StreamId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The view came up; polling starts.
    Mounted,
    /// The view is being torn down; every stream closes and polling stops.
    Unmounted,
    /// The job list was fetched.
    PollSucceeded(Vec<JobRecord>),
    /// The job list fetch failed; the next tick will try again.
    PollFailed(String),
    /// A live stream reduced a new snapshot.
    StreamSnapshot {
        key: JobKey,
        stream_id: StreamId,
        snapshot: ProgressSnapshot,
    },
    /// A live stream ended on its own (completion or transport error).
    StreamClosed {
        key: JobKey,
        stream_id: StreamId,
        reason: StreamCloseReason,
    },
    /// Operator asked to register a region code.
    RegisterRequested { input: String, kind: PropertyKind },
    Registered(JobRecord),
    /// Operator asked to requeue a failed job.
    RetryRequested { key: JobKey },
    Retried(JobRecord),
    /// Operator asked to delete a job.
    RemoveRequested { key: JobKey },
    Removed { key: JobKey },
    /// A registration, retry or removal was rejected.
    CommandFailed { command: CommandKind, reason: String },
    /// Does nothing; lets callers map ignorable input to a message.
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamCloseReason {
    Completed,
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Register { code: JobKey },
    Retry { key: JobKey },
    Remove { key: JobKey },
}
