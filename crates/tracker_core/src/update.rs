use crate::{
    format_region_code, normalize_region_code, AppState, CoarseStatus, CommandKind, Effect, Msg,
    NoticeLevel,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let mut effects = Vec::new();

    match msg {
        Msg::Mounted => {
            state.set_polling(true);
            effects.push(Effect::StartPolling);
        }
        Msg::Unmounted => {
            state.registry_mut().close_all(&mut effects);
            state.set_polling(false);
            effects.push(Effect::StopPolling);
            state.mark_dirty();
        }
        Msg::PollSucceeded(records) => {
            if state.registry_mut().merge_poll(records, &mut effects) {
                state.mark_dirty();
            }
            if state.policy().stop_when_idle
                && state.is_polling()
                && !state.registry().has_in_flight()
            {
                state.set_polling(false);
                effects.push(Effect::StopPolling);
            }
        }
        Msg::PollFailed(_) => {}
        Msg::StreamSnapshot {
            key,
            stream_id,
            snapshot,
        } => {
            if state
                .registry_mut()
                .apply_snapshot(&key, stream_id, snapshot, &mut effects)
            {
                state.mark_dirty();
            }
        }
        Msg::StreamClosed { key, stream_id, .. } => {
            if state
                .registry_mut()
                .stream_closed(&key, stream_id, &mut effects)
            {
                state.mark_dirty();
            }
        }
        Msg::RegisterRequested { input, kind } => match normalize_region_code(&input) {
            Some(code) => effects.push(Effect::Register { code, kind }),
            None => effects.push(notice(
                NoticeLevel::Error,
                format!("not a postal code: {:?}", input.trim()),
            )),
        },
        Msg::Registered(record) => {
            let label = format_region_code(&record.code);
            if state.registry_mut().upsert_front(record, &mut effects) {
                state.mark_dirty();
            }
            ensure_polling(&mut state, &mut effects);
            effects.push(notice(
                NoticeLevel::Success,
                format!("{label} registered and queued"),
            ));
        }
        Msg::RetryRequested { key } => match state.registry().get(&key) {
            Some(job) if job.status == CoarseStatus::Failed => effects.push(Effect::Retry {
                key: job.key.clone(),
                id: job.id,
            }),
            Some(_) => effects.push(notice(
                NoticeLevel::Info,
                format!("{} has not failed; nothing to retry", format_region_code(&key)),
            )),
            None => effects.push(unknown_job(&key)),
        },
        Msg::Retried(record) => {
            let label = format_region_code(&record.code);
            if state.registry_mut().replace_record(record, &mut effects) {
                state.mark_dirty();
            }
            ensure_polling(&mut state, &mut effects);
            effects.push(notice(NoticeLevel::Success, format!("{label} requeued")));
        }
        Msg::RemoveRequested { key } => match state.registry().get(&key) {
            Some(job) => effects.push(Effect::Remove {
                key: job.key.clone(),
                id: job.id,
            }),
            None => effects.push(unknown_job(&key)),
        },
        Msg::Removed { key } => {
            if state.registry_mut().remove(&key, &mut effects).is_some() {
                state.mark_dirty();
            }
            effects.push(notice(
                NoticeLevel::Info,
                format!("{} removed", format_region_code(&key)),
            ));
        }
        Msg::CommandFailed { command, reason } => {
            let text = match command {
                CommandKind::Register { code } => {
                    format!("could not register {}: {reason}", format_region_code(&code))
                }
                CommandKind::Retry { key } => {
                    format!("could not requeue {}: {reason}", format_region_code(&key))
                }
                CommandKind::Remove { key } => {
                    format!("could not remove {}: {reason}", format_region_code(&key))
                }
            };
            effects.push(notice(NoticeLevel::Error, text));
        }
        Msg::NoOp => {}
    }

    (state, effects)
}

fn ensure_polling(state: &mut AppState, effects: &mut Vec<Effect>) {
    if !state.is_polling() {
        state.set_polling(true);
        effects.push(Effect::StartPolling);
    }
}

fn notice(level: NoticeLevel, text: String) -> Effect {
    Effect::Notify { level, text }
}

fn unknown_job(key: &str) -> Effect {
    notice(
        NoticeLevel::Error,
        format!("{} is not registered", format_region_code(key)),
    )
}
