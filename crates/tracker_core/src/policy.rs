use std::time::Duration;

/// How often the job list is refreshed and whether refreshing stops once
/// nothing is pending or active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub stop_when_idle: bool,
}

impl PollPolicy {
    /// Registration view: fast refresh, stops when every job settled.
    pub const REGISTRATION: Self = Self {
        interval: Duration::from_secs(5),
        stop_when_idle: true,
    };

    /// Aggregate dashboard: slow refresh for as long as the view is up.
    pub const DASHBOARD: Self = Self {
        interval: Duration::from_secs(30),
        stop_when_idle: false,
    };
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::REGISTRATION
    }
}
