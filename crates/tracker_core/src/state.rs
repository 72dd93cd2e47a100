use crate::view_model::AppViewModel;
use crate::{JobRegistry, PollPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    registry: JobRegistry,
    policy: PollPolicy,
    polling: bool,
    dirty: bool,
}

impl AppState {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::project(&self.registry, self.polling)
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Whether the state last asked for polling to run.
    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Returns and clears the re-render flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn registry_mut(&mut self) -> &mut JobRegistry {
        &mut self.registry
    }

    pub(crate) fn set_polling(&mut self, polling: bool) {
        if self.polling != polling {
            self.polling = polling;
            self.dirty = true;
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
