use crate::{CoarseStatus, Effect, Job, JobRecord, LiveStream, ProgressSnapshot, StreamId};

/// In-memory set of known jobs, in display order.
///
/// Coarse fields are owned by the polling results; `live` is owned by the
/// stream reductions. Every mutation pushes the stream effects it implies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
    next_stream_id: StreamId,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.key == key)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// True while any job is pending or active.
    pub fn has_in_flight(&self) -> bool {
        self.jobs.iter().any(|job| job.status.is_in_flight())
    }

    /// Merges a full job list from a poll.
    ///
    /// The poll's order becomes the display order and jobs it no longer
    /// lists are dropped. Live snapshots survive for jobs that stay active.
    pub fn merge_poll(&mut self, records: Vec<JobRecord>, effects: &mut Vec<Effect>) -> bool {
        let before = self.jobs.clone();
        let mut previous = std::mem::take(&mut self.jobs);
        let mut merged: Vec<Job> = Vec::with_capacity(records.len());

        for record in records {
            if merged.iter().any(|job| job.key == record.code) {
                continue;
            }
            match previous.iter().position(|job| job.key == record.code) {
                Some(index) => {
                    let mut job = previous.swap_remove(index);
                    job.apply_coarse(record);
                    merged.push(job);
                }
                None => merged.push(Job::from_record(record)),
            }
        }

        for gone in previous {
            if let Some(live) = gone.live {
                effects.push(Effect::CloseStream {
                    key: gone.key,
                    stream_id: live.stream_id,
                });
            }
        }

        self.jobs = merged;
        self.reconcile_streams(effects);
        self.jobs != before
    }

    /// Stores a snapshot reduced by the stream `stream_id`.
    ///
    /// Snapshots from a stream that is no longer the open one are ignored.
    /// A terminal snapshot marks the job done with its saved count and is kept
    /// for display. It also closes the stream and asks for an immediate poll.
    pub fn apply_snapshot(
        &mut self,
        key: &str,
        stream_id: StreamId,
        snapshot: ProgressSnapshot,
        effects: &mut Vec<Effect>,
    ) -> bool {
        let Some(job) = self.jobs.iter_mut().find(|job| job.key == key) else {
            return false;
        };
        let Some(live) = job.live.as_mut() else {
            return false;
        };
        if live.stream_id != stream_id {
            return false;
        }

        if snapshot.terminal {
            job.live = None;
            job.status = CoarseStatus::Done;
            job.last_error = None;
            if let Some(saved) = snapshot.saved_total {
                job.result_count = saved;
            }
            job.completed = Some(snapshot);
            effects.push(Effect::CloseStream {
                key: job.key.clone(),
                stream_id,
            });
            effects.push(Effect::PollNow);
            return true;
        }

        if live.snapshot == snapshot {
            return false;
        }
        live.snapshot = snapshot;
        true
    }

    /// Forgets the live snapshot of a stream that ended on its own.
    ///
    /// The coarse status is not touched; the next poll reopens the stream
    /// if the job is still active.
    pub fn stream_closed(&mut self, key: &str, stream_id: StreamId, effects: &mut Vec<Effect>) -> bool {
        let Some(job) = self.jobs.iter_mut().find(|job| job.key == key) else {
            return false;
        };
        match &job.live {
            Some(live) if live.stream_id == stream_id => {
                job.live = None;
                effects.push(Effect::CloseStream {
                    key: job.key.clone(),
                    stream_id,
                });
                true
            }
            _ => false,
        }
    }

    /// Inserts a freshly registered job at the top of the list.
    pub fn upsert_front(&mut self, record: JobRecord, effects: &mut Vec<Effect>) -> bool {
        let before = self.jobs.clone();
        let job = match self.jobs.iter().position(|job| job.key == record.code) {
            Some(index) => {
                let mut job = self.jobs.remove(index);
                job.apply_coarse(record);
                job
            }
            None => Job::from_record(record),
        };
        self.jobs.insert(0, job);
        self.reconcile_streams(effects);
        self.jobs != before
    }

    /// Replaces the coarse fields of one job in place (e.g. after a retry).
    pub fn replace_record(&mut self, record: JobRecord, effects: &mut Vec<Effect>) -> bool {
        let before = self.jobs.clone();
        match self.jobs.iter_mut().find(|job| job.key == record.code) {
            Some(job) => job.apply_coarse(record),
            None => self.jobs.insert(0, Job::from_record(record)),
        }
        self.reconcile_streams(effects);
        self.jobs != before
    }

    pub fn remove(&mut self, key: &str, effects: &mut Vec<Effect>) -> Option<Job> {
        let index = self.jobs.iter().position(|job| job.key == key)?;
        let job = self.jobs.remove(index);
        if let Some(live) = &job.live {
            effects.push(Effect::CloseStream {
                key: job.key.clone(),
                stream_id: live.stream_id,
            });
        }
        Some(job)
    }

    /// Closes every open stream and empties the registry.
    pub fn close_all(&mut self, effects: &mut Vec<Effect>) {
        for job in self.jobs.drain(..) {
            if let Some(live) = job.live {
                effects.push(Effect::CloseStream {
                    key: job.key,
                    stream_id: live.stream_id,
                });
            }
        }
    }

    fn reconcile_streams(&mut self, effects: &mut Vec<Effect>) {
        for job in &mut self.jobs {
            let active = job.status == CoarseStatus::Active;
            match (&job.live, active) {
                (None, true) => {
                    self.next_stream_id += 1;
                    let stream_id = self.next_stream_id;
                    job.live = Some(LiveStream {
                        stream_id,
                        snapshot: ProgressSnapshot::default(),
                    });
                    effects.push(Effect::OpenStream {
                        key: job.key.clone(),
                        stream_id,
                    });
                }
                (Some(live), false) => {
                    effects.push(Effect::CloseStream {
                        key: job.key.clone(),
                        stream_id: live.stream_id,
                    });
                    job.live = None;
                }
                _ => {}
            }
        }
    }
}
