use tracker_core::{AppViewModel, JobRowView, NoticeLevel, ProgressView};

use crate::platform::config::ViewKind;

const BAR_WIDTH: usize = 20;

/// Renders the view model as console lines, headed by `clock`.
pub fn render(view: &AppViewModel, kind: ViewKind, clock: &str) -> Vec<String> {
    let polling = if view.polling { "polling" } else { "idle" };
    let mut lines = Vec::new();

    let rows: Vec<&JobRowView> = match kind {
        ViewKind::Registration => {
            lines.push(format!(
                "[{clock}] registration | {polling} | {} job(s)",
                view.jobs.len()
            ));
            view.jobs.iter().collect()
        }
        ViewKind::Dashboard => {
            let summary = &view.summary;
            lines.push(format!(
                "[{clock}] dashboard | {polling} | {} registered, {} in flight, {} done, {} failed, {} listing(s)",
                summary.registered,
                summary.in_flight,
                summary.done,
                summary.failed,
                summary.total_results
            ));
            view.dashboard_order()
        }
    };

    if rows.is_empty() {
        lines.push("  no jobs registered".to_string());
    }
    for row in rows {
        lines.push(format_job_row(row));
        if let Some(progress) = &row.progress {
            lines.push(format_progress(progress));
        }
        if let Some(error) = &row.last_error {
            lines.push(format!("      error: {error}"));
        }
    }
    lines
}

pub fn format_notice(level: NoticeLevel, text: &str) -> String {
    let prefix = match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("{prefix}: {text}")
}

fn format_job_row(row: &JobRowView) -> String {
    let kind = row.kind_label.unwrap_or("-");
    let retry = if row.can_retry { "  (retry available)" } else { "" };
    format!(
        "  {code:<10} {kind:<4}  {badge}{retry}",
        code = row.display_code,
        badge = row.badge
    )
}

fn format_progress(progress: &ProgressView) -> String {
    let mut line = match &progress.source_label {
        Some(source) => format!("      {source}: {}", progress.stage_label),
        None => format!("      {}", progress.stage_label),
    };
    if let Some(percent) = progress.enrichment_percent {
        line.push_str(&format!("  {} {percent}%", progress_bar(percent)));
    }
    if let Some(saved) = progress.persistence {
        line.push_str(&format!("  saved {}/{}", saved.current, saved.total));
    }
    line
}

fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
