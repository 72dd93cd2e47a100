use pretty_assertions::assert_eq;
use tracker_core::{reduce, Counter, ProgressEvent, ProgressSnapshot, StageKind};

fn fold(events: &[ProgressEvent]) -> ProgressSnapshot {
    events
        .iter()
        .fold(None, |snapshot: Option<ProgressSnapshot>, event| {
            Some(reduce(snapshot.as_ref(), event))
        })
        .unwrap_or_default()
}

fn decoded(name: &str, data: &str) -> ProgressEvent {
    ProgressEvent::decode(name, data).expect("well-formed event")
}

fn full_run() -> Vec<ProgressEvent> {
    vec![
        decoded("consultando_viacep", r#"{"worker":"w-7"}"#),
        decoded("endereco_obtido", r#"{"endereco":"Rua das Flores, Joinville"}"#),
        decoded("busca_iniciada", r#"{"robo":"zap"}"#),
        decoded("cards_encontrados", r#"{"total":12}"#),
        decoded("enriquecendo_detalhe", r#"{"atual":1,"total":12}"#),
        decoded("enriquecendo_detalhe", r#"{"atual":2,"total":12}"#),
        decoded("robo_concluido", r#"{"anuncios":12}"#),
        decoded("anuncio_salvo", r#"{"salvos":1,"total":12}"#),
        decoded("anuncio_salvo", r#"{"salvos":9,"total":12}"#),
        decoded("concluido", r#"{"total_salvos":9}"#),
    ]
}

#[test]
fn replaying_the_same_events_gives_the_same_snapshot() {
    let events = full_run();
    for len in 0..=events.len() {
        assert_eq!(fold(&events[..len]), fold(&events[..len]));
    }
}

#[test]
fn search_then_enrichment_reports_counters() {
    let snapshot = fold(&[
        decoded("busca_iniciada", r#"{"robo":"X"}"#),
        decoded("cards_encontrados", r#"{"total":12}"#),
        decoded("enriquecendo_detalhe", r#"{"atual":3,"total":12}"#),
    ]);

    assert_eq!(snapshot.stage_kind, Some(StageKind::Enrich));
    assert_eq!(
        snapshot.enrichment,
        Some(Counter {
            current: 3,
            total: 12
        })
    );
    assert!(snapshot.stage_label.contains("3/12"));
    assert_eq!(snapshot.site.as_deref(), Some("X"));
    assert_eq!(snapshot.cards_found, Some(12));
    assert!(!snapshot.terminal);
}

#[test]
fn unknown_event_leaves_snapshot_unchanged() {
    let before = fold(&[decoded("busca_iniciada", r#"{"robo":"X"}"#)]);
    let unknown = decoded("foo_bar", r#"{"anything":true}"#);

    assert_eq!(reduce(Some(&before), &unknown), before);
    assert_eq!(reduce(None, &unknown), ProgressSnapshot::default());
}

#[test]
fn counters_never_move_backwards_within_a_phase() {
    let snapshot = fold(&[
        decoded("enriquecendo_detalhe", r#"{"atual":5,"total":12}"#),
        decoded("enriquecendo_detalhe", r#"{"atual":4,"total":20}"#),
    ]);
    assert_eq!(
        snapshot.enrichment,
        Some(Counter {
            current: 5,
            total: 12
        })
    );
    assert_eq!(snapshot.stage_label, "enriching detail 5/12");
}

#[test]
fn current_is_non_decreasing_and_total_fixed_over_a_run() {
    let events = full_run();
    let mut snapshot: Option<ProgressSnapshot> = None;
    for event in &events {
        let next = reduce(snapshot.as_ref(), event);
        if let Some(prev) = &snapshot {
            if prev.stage_kind == next.stage_kind && !next.terminal {
                for (before, after) in [
                    (prev.enrichment, next.enrichment),
                    (prev.persistence, next.persistence),
                ] {
                    if let (Some(before), Some(after)) = (before, after) {
                        assert!(after.current >= before.current);
                        assert_eq!(after.total, before.total);
                    }
                }
            }
        }
        snapshot = Some(next);
    }
}

#[test]
fn phase_change_clears_counters_of_the_previous_phase() {
    let snapshot = fold(&[
        decoded("enriquecendo_detalhe", r#"{"atual":12,"total":12}"#),
        decoded("anuncio_salvo", r#"{"salvos":2,"total":12}"#),
    ]);
    assert_eq!(snapshot.stage_kind, Some(StageKind::Persist));
    assert_eq!(snapshot.enrichment, None);
    assert_eq!(
        snapshot.persistence,
        Some(Counter {
            current: 2,
            total: 12
        })
    );
}

#[test]
fn new_search_clears_counters_and_card_total() {
    let snapshot = fold(&[
        decoded("busca_iniciada", r#"{"robo":"zap"}"#),
        decoded("cards_encontrados", r#"{"total":12}"#),
        decoded("enriquecendo_detalhe", r#"{"atual":12,"total":12}"#),
        decoded("robo_concluido", r#"{"anuncios":12}"#),
        decoded("busca_iniciada", r#"{"robo":"viva"}"#),
    ]);
    assert_eq!(snapshot.stage_kind, Some(StageKind::Search));
    assert_eq!(snapshot.cards_found, None);
    assert_eq!(snapshot.enrichment, None);
    assert_eq!(snapshot.site.as_deref(), Some("viva"));
    assert_eq!(snapshot.stage_label, "searching viva");
}

#[test]
fn repeated_card_count_keeps_the_first_total() {
    let snapshot = fold(&[
        decoded("busca_iniciada", r#"{"robo":"zap"}"#),
        decoded("cards_encontrados", r#"{"total":12}"#),
        decoded("cards_encontrados", r#"{"total":30}"#),
    ]);
    assert_eq!(snapshot.cards_found, Some(12));
    assert_eq!(snapshot.stage_label, "12 cards found");

    // A later search phase starts counting afresh.
    let snapshot = fold(&[
        decoded("busca_iniciada", r#"{"robo":"zap"}"#),
        decoded("cards_encontrados", r#"{"total":12}"#),
        decoded("enriquecendo_detalhe", r#"{"atual":1,"total":12}"#),
        decoded("cards_encontrados", r#"{"total":5}"#),
    ]);
    assert_eq!(snapshot.cards_found, Some(5));
    assert_eq!(snapshot.stage_label, "5 cards found");
}

#[test]
fn site_finished_names_the_current_site() {
    let snapshot = fold(&[
        decoded("busca_iniciada", r#"{"robo":"zap"}"#),
        decoded("robo_concluido", r#"{"anuncios":7}"#),
    ]);
    assert_eq!(snapshot.stage_label, "zap finished: 7 listings");
}

#[test]
fn source_label_is_sticky() {
    let snapshot = fold(&[
        decoded("consultando_viacep", r#"{"worker":"w-7"}"#),
        decoded("endereco_obtido", r#"{"endereco":"Rua A"}"#),
        decoded("busca_iniciada", r#"{"robo":"zap"}"#),
    ]);
    assert_eq!(snapshot.source_label.as_deref(), Some("w-7"));

    let snapshot = reduce(
        Some(&snapshot),
        &decoded("cards_encontrados", r#"{"total":3,"worker":"w-8"}"#),
    );
    assert_eq!(snapshot.source_label.as_deref(), Some("w-8"));
}

#[test]
fn completion_freezes_the_snapshot() {
    let frozen = fold(&full_run());
    assert!(frozen.terminal);
    assert_eq!(frozen.stage_label, "completed: 9 listings saved");
    assert_eq!(frozen.saved_total, Some(9));

    for late in [
        decoded("anuncio_salvo", r#"{"salvos":12,"total":12,"worker":"late"}"#),
        decoded("busca_iniciada", r#"{"robo":"other"}"#),
        decoded("concluido", r#"{"total_salvos":1}"#),
    ] {
        assert_eq!(reduce(Some(&frozen), &late), frozen);
    }
}

#[test]
fn lookup_labels_follow_the_address_phase() {
    let snapshot = fold(&[decoded("consultando_viacep", "{}")]);
    assert_eq!(snapshot.stage_kind, Some(StageKind::Lookup));
    assert_eq!(snapshot.stage_label, "looking up address");

    let snapshot = reduce(
        Some(&snapshot),
        &decoded("endereco_obtido", r#"{"endereco":"Rua A, 10"}"#),
    );
    assert_eq!(snapshot.stage_label, "address resolved: Rua A, 10");
}
