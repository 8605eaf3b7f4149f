//! Local mirror of backend-owned state and the single reducer that mutates it.
//!
//! Command results, push events and reconciliation queries all go through
//! [`Mirror::apply`]. Command results are hints: they change the mirror right
//! away but stay unconfirmed until a push event or a query agrees.

use std::time::{Duration, Instant};

use crate::{
    profile::{FormDraft, ServerProfile},
    state::{ProcessState, ProxyState},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Update {
    Process(ProcessState),
    Proxy(ProxyState),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Command,
    Push,
    Query,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Unconfirmed {
    expected: ProcessState,
    since: Instant,
}

#[derive(Clone, Debug, Default)]
pub struct Mirror {
    pub ready: bool,
    pub version: Option<String>,
    pub process: ProcessState,
    pub proxy: ProxyState,
    pub profiles: Vec<ServerProfile>,
    pub current_id: Option<String>,
    /// What the profile selector shows; differs from `current_id` only while a switch is in flight.
    pub selection: Option<String>,
    pub draft: Option<FormDraft>,
    unconfirmed: Option<Unconfirmed>,
    process_epoch: u64,
    saved_at: Option<Instant>,
}

impl Mirror {
    /// Applies one state update. Returns whether anything changed.
    pub fn apply(&mut self, update: Update, source: Source, now: Instant) -> bool {
        match update {
            Update::Process(state) => self.apply_process(state, source, now),
            Update::Proxy(state) => self.apply_proxy(state),
        }
    }

    fn apply_process(&mut self, state: ProcessState, source: Source, now: Instant) -> bool {
        let changed = self.process != state;
        if source != Source::Query {
            self.process_epoch = self.process_epoch.wrapping_add(1);
        }

        match source {
            Source::Command if !changed => {}
            Source::Command => {
                self.unconfirmed = Some(Unconfirmed {
                    expected: state,
                    since: now,
                });
            }
            Source::Push | Source::Query => {
                if self.unconfirmed.take().is_some() {
                    log::debug!("[mirror] process state confirmed as {state:?} by {source:?}");
                }
            }
        }

        self.process = state;
        let proxy_cleared = if state == ProcessState::Stopped {
            self.apply_proxy(ProxyState::Disabled)
        } else {
            false
        };

        if changed {
            log::info!("[mirror] process {:?} ({source:?})", state);
        }
        changed || proxy_cleared
    }

    fn apply_proxy(&mut self, state: ProxyState) -> bool {
        if state == ProxyState::Enabled && !self.process.is_running() {
            log::warn!("[mirror] ignoring proxy enable while the process is stopped");
            return false;
        }
        let changed = self.proxy != state;
        self.proxy = state;
        changed
    }

    /// Counts push and command updates of the process state. A query answer
    /// requested under an older epoch is stale and must not be applied.
    pub fn process_epoch(&self) -> u64 {
        self.process_epoch
    }

    pub fn awaiting_confirmation(&self) -> bool {
        self.unconfirmed.is_some()
    }

    pub fn confirmation_overdue(&self, now: Instant, timeout: Duration) -> bool {
        self.unconfirmed
            .is_some_and(|pending| now.saturating_duration_since(pending.since) >= timeout)
    }

    /// Restarts the confirmation window after a failed query.
    pub fn postpone_confirmation(&mut self, now: Instant) {
        if let Some(pending) = self.unconfirmed.as_mut() {
            pending.since = now;
        }
    }

    pub fn mark_saved(&mut self, now: Instant) {
        self.saved_at = Some(now);
    }

    pub fn save_acknowledged(&self, now: Instant, delay: Duration) -> bool {
        self.saved_at
            .is_some_and(|saved_at| now.saturating_duration_since(saved_at) < delay)
    }

    pub fn current_profile(&self) -> Option<&ServerProfile> {
        let id = self.current_id.as_deref()?;
        self.profiles.iter().find(|profile| profile.id == id)
    }

    pub fn replace_profile(&mut self, profile: ServerProfile) {
        match self
            .profiles
            .iter_mut()
            .find(|existing| existing.id == profile.id)
        {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    pub fn revert_selection(&mut self) {
        self.selection = self.current_id.clone();
    }

    pub fn controls(&self) -> Controls {
        if !self.ready {
            return Controls::default();
        }

        let running = self.process.is_running();
        let stopped = !running;
        let has_profile = self.draft.is_some();

        Controls {
            start: stopped && has_profile,
            stop: running,
            proxy_toggle: running,
            selector: stopped,
            add: stopped,
            rename: stopped && has_profile,
            delete: stopped && has_profile && self.profiles.len() > 1,
            editing: stopped && has_profile,
            save: stopped && has_profile,
        }
    }
}

/// Which controls accept input. Derived from the mirror on every read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub stop: bool,
    pub proxy_toggle: bool,
    pub selector: bool,
    pub add: bool,
    pub rename: bool,
    pub delete: bool,
    pub editing: bool,
    pub save: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_mirror() -> Mirror {
        let profile = ServerProfile::new("a", "A");
        Mirror {
            ready: true,
            profiles: vec![profile.clone(), ServerProfile::new("b", "B")],
            current_id: Some("a".into()),
            selection: Some("a".into()),
            draft: Some(FormDraft::from_profile(&profile)),
            ..Mirror::default()
        }
    }

    #[test]
    fn stopping_forces_proxy_off() {
        let now = Instant::now();
        let mut mirror = ready_mirror();
        mirror.apply(Update::Process(ProcessState::Running), Source::Push, now);
        mirror.apply(Update::Proxy(ProxyState::Enabled), Source::Command, now);
        assert_eq!(mirror.proxy, ProxyState::Enabled);

        mirror.apply(Update::Process(ProcessState::Stopped), Source::Push, now);
        assert_eq!(mirror.process, ProcessState::Stopped);
        assert_eq!(mirror.proxy, ProxyState::Disabled);
    }

    #[test]
    fn proxy_enable_is_discarded_while_stopped() {
        let mut mirror = ready_mirror();
        let changed = mirror.apply(
            Update::Proxy(ProxyState::Enabled),
            Source::Command,
            Instant::now(),
        );
        assert!(!changed);
        assert_eq!(mirror.proxy, ProxyState::Disabled);
    }

    #[test]
    fn push_confirms_command_hint() {
        let now = Instant::now();
        let mut mirror = ready_mirror();
        mirror.apply(Update::Process(ProcessState::Running), Source::Command, now);
        assert!(mirror.awaiting_confirmation());

        let changed = mirror.apply(Update::Process(ProcessState::Running), Source::Push, now);
        assert!(!changed);
        assert!(!mirror.awaiting_confirmation());
    }

    #[test]
    fn command_after_push_does_not_reopen_confirmation() {
        let now = Instant::now();
        let mut mirror = ready_mirror();
        mirror.apply(Update::Process(ProcessState::Running), Source::Push, now);
        mirror.apply(Update::Process(ProcessState::Running), Source::Command, now);
        assert!(!mirror.awaiting_confirmation());
        assert_eq!(mirror.process, ProcessState::Running);
    }

    #[test]
    fn push_overrides_stale_hint() {
        let now = Instant::now();
        let mut mirror = ready_mirror();
        mirror.apply(Update::Process(ProcessState::Running), Source::Command, now);
        mirror.apply(Update::Process(ProcessState::Stopped), Source::Push, now);
        assert_eq!(mirror.process, ProcessState::Stopped);
        assert!(!mirror.awaiting_confirmation());
    }

    #[test]
    fn confirmation_becomes_overdue_after_timeout() {
        let now = Instant::now();
        let timeout = Duration::from_secs(3);
        let mut mirror = ready_mirror();
        mirror.apply(Update::Process(ProcessState::Running), Source::Command, now);
        assert!(!mirror.confirmation_overdue(now + Duration::from_secs(1), timeout));
        assert!(mirror.confirmation_overdue(now + Duration::from_secs(3), timeout));
    }

    #[test]
    fn save_acknowledgement_expires() {
        let now = Instant::now();
        let delay = Duration::from_secs(1);
        let mut mirror = ready_mirror();
        assert!(!mirror.save_acknowledged(now, delay));
        mirror.mark_saved(now);
        assert!(mirror.save_acknowledged(now + Duration::from_millis(999), delay));
        assert!(!mirror.save_acknowledged(now + delay, delay));
    }

    #[test]
    fn start_and_stop_controls_are_exclusive() {
        let now = Instant::now();
        let mut mirror = ready_mirror();
        for state in [ProcessState::Stopped, ProcessState::Running] {
            mirror.apply(Update::Process(state), Source::Push, now);
            let controls = mirror.controls();
            assert!(controls.start ^ controls.stop);
        }
    }

    #[test]
    fn running_locks_everything_but_stop_and_proxy() {
        let mut mirror = ready_mirror();
        mirror.apply(
            Update::Process(ProcessState::Running),
            Source::Push,
            Instant::now(),
        );
        assert_eq!(
            mirror.controls(),
            Controls {
                stop: true,
                proxy_toggle: true,
                ..Controls::default()
            }
        );
    }

    #[test]
    fn not_ready_disables_everything() {
        let mut mirror = ready_mirror();
        mirror.ready = false;
        assert_eq!(mirror.controls(), Controls::default());
    }

    #[test]
    fn delete_needs_a_second_profile() {
        let mut mirror = ready_mirror();
        assert!(mirror.controls().delete);
        mirror.profiles.truncate(1);
        assert!(!mirror.controls().delete);
        assert!(mirror.controls().rename);
    }
}
