use crate::{Counter, ProgressEvent, ProgressSnapshot, StageKind};

/// Pure reducer: folds one progress event into the previous snapshot.
///
/// A terminal snapshot is frozen and returned unchanged. Unknown events are
/// the identity. Entering a phase of a different kind clears the enrichment
/// and persistence counters; within a phase `current` never decreases and
/// every `total`, the card count included, keeps its first observed value.
pub fn reduce(previous: Option<&ProgressSnapshot>, event: &ProgressEvent) -> ProgressSnapshot {
    let mut next = previous.cloned().unwrap_or_default();
    if next.terminal {
        return next;
    }

    if let Some(source) = event.source() {
        next.source_label = Some(source.to_string());
    }

    match event {
        ProgressEvent::LookingUpAddress { .. } => {
            enter_phase(&mut next, StageKind::Lookup);
            clear_phase_counters(&mut next);
            next.stage_label = "looking up address".to_string();
        }
        ProgressEvent::AddressResolved { address, .. } => {
            enter_phase(&mut next, StageKind::Lookup);
            next.stage_label = format!("address resolved: {address}");
        }
        ProgressEvent::SearchStarted { site, .. } => {
            enter_phase(&mut next, StageKind::Search);
            clear_phase_counters(&mut next);
            next.site = Some(site.clone());
            next.stage_label = format!("searching {site}");
        }
        ProgressEvent::CardsFound { total, .. } => {
            let searching = next.stage_kind == Some(StageKind::Search);
            enter_phase(&mut next, StageKind::Search);
            let total = match next.cards_found {
                Some(first) if searching => first,
                _ => *total,
            };
            next.cards_found = Some(total);
            next.stage_label = format!("{total} cards found");
        }
        ProgressEvent::EnrichingDetail { current, total, .. } => {
            enter_phase(&mut next, StageKind::Enrich);
            let counter = advance(next.enrichment, *current, *total);
            next.enrichment = Some(counter);
            next.stage_label = format!("enriching detail {}/{}", counter.current, counter.total);
        }
        ProgressEvent::SiteFinished { listings, .. } => {
            enter_phase(&mut next, StageKind::Search);
            let site = next.site.as_deref().unwrap_or("source");
            next.stage_label = format!("{site} finished: {listings} listings");
        }
        ProgressEvent::ListingSaved { saved, total, .. } => {
            enter_phase(&mut next, StageKind::Persist);
            let counter = advance(next.persistence, *saved, *total);
            next.persistence = Some(counter);
            next.stage_label = format!("saving listings {}/{}", counter.current, counter.total);
        }
        ProgressEvent::Completed { total_saved, .. } => {
            next.terminal = true;
            next.saved_total = Some(*total_saved);
            next.stage_label = format!("completed: {total_saved} listings saved");
        }
        ProgressEvent::Unknown { .. } => {
            return previous.cloned().unwrap_or_default();
        }
    }

    next
}

fn enter_phase(snapshot: &mut ProgressSnapshot, kind: StageKind) {
    if snapshot.stage_kind != Some(kind) {
        snapshot.enrichment = None;
        snapshot.persistence = None;
        snapshot.stage_kind = Some(kind);
    }
}

fn clear_phase_counters(snapshot: &mut ProgressSnapshot) {
    snapshot.cards_found = None;
    snapshot.enrichment = None;
    snapshot.persistence = None;
}

fn advance(previous: Option<Counter>, current: u32, total: u32) -> Counter {
    match previous {
        Some(counter) => Counter {
            current: counter.current.max(current),
            total: counter.total,
        },
        None => Counter { current, total },
    }
}
