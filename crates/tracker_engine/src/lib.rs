//! Tracker engine: REST client, live progress streams and the polling loop.
mod api;
mod poll;
mod settings;
mod sink;
mod sse;
mod stream;
mod types;

pub use api::{ByteStream, JobCommands, JobSource, ProgressSource, ReqwestApi};
pub use poll::PollingCoordinator;
pub use settings::ApiSettings;
pub use sink::{ChannelProgressSink, ProgressSink};
pub use sse::{SseDecoder, SseFrame};
pub use stream::EventStreamReader;
pub use types::{ApiError, EngineEvent, FailureKind};
