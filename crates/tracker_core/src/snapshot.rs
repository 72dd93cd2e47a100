#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Lookup,
    Search,
    Enrich,
    Persist,
}

/// Bounded `{current, total}` progress within one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    pub current: u32,
    pub total: u32,
}

impl Counter {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (u64::from(self.current.min(self.total)) * 100 + u64::from(self.total) / 2)
            / u64::from(self.total);
        pct as u8
    }
}

/// Reduced view of one job's live event sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub source_label: Option<String>,
    pub stage_label: String,
    pub stage_kind: Option<StageKind>,
    pub site: Option<String>,
    pub cards_found: Option<u32>,
    pub enrichment: Option<Counter>,
    pub persistence: Option<Counter>,
    /// Listings the backend reported saved when the job completed.
    pub saved_total: Option<u32>,
    pub terminal: bool,
}

impl ProgressSnapshot {
    /// True until the first recognized event has been reduced.
    pub fn is_empty(&self) -> bool {
        self.stage_kind.is_none() && !self.terminal
    }
}
