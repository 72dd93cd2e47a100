//! Tracker core: pure job registry, progress reducer and update function.
mod effect;
mod event;
mod job;
mod msg;
mod policy;
mod reducer;
mod registry;
mod snapshot;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, NoticeLevel};
pub use event::{EventDecodeError, ProgressEvent, KNOWN_EVENT_NAMES};
pub use job::{
    format_region_code, normalize_region_code, CoarseStatus, Job, JobKey, JobRecord, LiveStream,
    PropertyKind, StreamId,
};
pub use msg::{CommandKind, Msg, StreamCloseReason};
pub use policy::PollPolicy;
pub use reducer::reduce;
pub use registry::JobRegistry;
pub use snapshot::{Counter, ProgressSnapshot, StageKind};
pub use state::AppState;
pub use update::update;
pub use view_model::{AppViewModel, DashboardSummary, JobRowView, ProgressView};
