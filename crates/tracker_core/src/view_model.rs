use crate::{format_region_code, CoarseStatus, Counter, Job, JobKey, JobRegistry, ProgressSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub polling: bool,
    pub jobs: Vec<JobRowView>,
    pub summary: DashboardSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub key: JobKey,
    pub display_code: String,
    pub kind_label: Option<&'static str>,
    pub status: CoarseStatus,
    pub badge: String,
    pub last_error: Option<String>,
    pub can_retry: bool,
    pub progress: Option<ProgressView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub source_label: Option<String>,
    pub stage_label: String,
    pub in_progress: bool,
    /// Enrichment bar, shown only while the job is still running.
    pub enrichment_percent: Option<u8>,
    pub persistence: Option<Counter>,
}

/// Aggregate counters shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardSummary {
    pub registered: usize,
    pub done: usize,
    pub in_flight: usize,
    pub failed: usize,
    pub total_results: u64,
}

impl AppViewModel {
    pub(crate) fn project(registry: &JobRegistry, polling: bool) -> Self {
        let jobs: Vec<JobRowView> = registry.iter().map(JobRowView::from_job).collect();
        let summary = DashboardSummary {
            registered: jobs.len(),
            done: count(registry, |status| status == CoarseStatus::Done),
            in_flight: count(registry, CoarseStatus::is_in_flight),
            failed: count(registry, |status| status == CoarseStatus::Failed),
            total_results: registry.iter().map(|job| u64::from(job.result_count)).sum(),
        };
        Self {
            polling,
            jobs,
            summary,
        }
    }

    /// Rows sorted failed first, then processing, pending and done.
    pub fn dashboard_order(&self) -> Vec<&JobRowView> {
        let mut rows: Vec<&JobRowView> = self.jobs.iter().collect();
        rows.sort_by_key(|row| status_priority(row.status));
        rows
    }
}

impl JobRowView {
    fn from_job(job: &Job) -> Self {
        let badge = match job.status {
            CoarseStatus::Pending => "pending".to_string(),
            CoarseStatus::Active => "processing".to_string(),
            CoarseStatus::Done => format!("done: {} listing(s)", job.result_count),
            CoarseStatus::Failed => format!("failed: attempt {}", job.attempts),
        };
        Self {
            key: job.key.clone(),
            display_code: format_region_code(&job.key),
            kind_label: job.kind.map(|kind| kind.short_label()),
            status: job.status,
            badge,
            last_error: job.last_error.clone(),
            can_retry: job.status == CoarseStatus::Failed,
            progress: job
                .live
                .as_ref()
                .map(|live| &live.snapshot)
                .or(job.completed.as_ref())
                .and_then(ProgressView::from_snapshot),
        }
    }
}

impl ProgressView {
    fn from_snapshot(snapshot: &ProgressSnapshot) -> Option<Self> {
        if snapshot.is_empty() {
            return None;
        }
        let in_progress = !snapshot.terminal;
        Some(Self {
            source_label: snapshot.source_label.clone(),
            stage_label: snapshot.stage_label.clone(),
            in_progress,
            enrichment_percent: snapshot
                .enrichment
                .filter(|_| in_progress)
                .map(|counter| counter.percent()),
            persistence: snapshot.persistence,
        })
    }
}

fn count(registry: &JobRegistry, predicate: impl Fn(CoarseStatus) -> bool) -> usize {
    registry.iter().filter(|job| predicate(job.status)).count()
}

fn status_priority(status: CoarseStatus) -> u8 {
    match status {
        CoarseStatus::Failed => 0,
        CoarseStatus::Active => 1,
        CoarseStatus::Pending => 2,
        CoarseStatus::Done => 3,
    }
}
