//! The view model: mirrors backend state, issues commands and applies push events.
//!
//! All operations run on the UI thread and may interleave at their await
//! points. State lives in `RefCell`s that are never borrowed across an await.

use std::{
    cell::{Ref, RefCell},
    collections::HashSet,
    time::{Duration, Instant},
};

use futures::lock::Mutex;

use crate::{
    backend::{Backend, BackendResult, PushEvent},
    log_buffer::{LogBuffer, LogLevel},
    mirror::{Controls, Mirror, Source, Update},
    modal::Modal,
    profile::{FormDraft, Field, RoutingMode, ServerProfile},
    settings::Settings,
    state::{ProcessState, ProxyState},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    Save,
    Start,
    Stop,
    ToggleProxy,
    SwitchProfile,
    AddProfile,
    RenameProfile,
    DeleteProfile,
    Reconcile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    NotReady,
    Busy,
    ProcessRunning,
    ProcessStopped,
    NoProfile,
    LastProfile,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Rejected(Rejection),
    Cancelled,
    Failed(String),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

struct Snapshot {
    version: String,
    profiles: Vec<ServerProfile>,
    current_id: Option<String>,
    running: bool,
    proxy: bool,
    current: Option<ServerProfile>,
}

struct BusyGuard<'a> {
    busy: &'a RefCell<HashSet<Operation>>,
    operation: Operation,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.borrow_mut().remove(&self.operation);
    }
}

pub struct Synchronizer<B> {
    backend: B,
    mirror: RefCell<Mirror>,
    log: RefCell<LogBuffer>,
    modal: Modal,
    busy: RefCell<HashSet<Operation>>,
    save_lock: Mutex<()>,
    save_ack: Duration,
    confirmation_timeout: Duration,
}

impl<B: Backend> Synchronizer<B> {
    pub fn new(backend: B, settings: &Settings) -> Self {
        Self {
            backend,
            mirror: RefCell::new(Mirror::default()),
            log: RefCell::new(LogBuffer::new()),
            modal: Modal::new(),
            busy: RefCell::new(HashSet::new()),
            save_lock: Mutex::new(()),
            save_ack: settings.save_ack(),
            confirmation_timeout: settings.confirmation_timeout(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn mirror(&self) -> Ref<'_, Mirror> {
        self.mirror.borrow()
    }

    pub fn log(&self) -> Ref<'_, LogBuffer> {
        self.log.borrow()
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn controls(&self) -> Controls {
        self.mirror.borrow().controls()
    }

    pub fn is_busy(&self, operation: Operation) -> bool {
        self.busy.borrow().contains(&operation)
    }

    pub fn save_acknowledged(&self) -> bool {
        self.save_acknowledged_at(Instant::now())
    }

    pub fn save_acknowledged_at(&self, now: Instant) -> bool {
        self.mirror.borrow().save_acknowledged(now, self.save_ack)
    }

    fn begin(&self, operation: Operation) -> Result<BusyGuard<'_>, Outcome> {
        if !self.busy.borrow_mut().insert(operation) {
            log::debug!("[sync] {operation:?} already in flight");
            return Err(Outcome::Rejected(Rejection::Busy));
        }
        Ok(BusyGuard {
            busy: &self.busy,
            operation,
        })
    }

    /// Like `begin`, but also refuses while any of `conflicts` is in flight.
    fn begin_exclusive(
        &self,
        operation: Operation,
        conflicts: &[Operation],
    ) -> Result<BusyGuard<'_>, Outcome> {
        if let Some(conflict) = conflicts.iter().find(|conflict| self.is_busy(**conflict)) {
            log::debug!("[sync] {operation:?} refused while {conflict:?} is in flight");
            return Err(Outcome::Rejected(Rejection::Busy));
        }
        self.begin(operation)
    }

    fn info(&self, text: impl Into<String>) {
        self.log.borrow_mut().push(LogLevel::Info, text);
    }

    fn error(&self, text: impl Into<String>) {
        self.log.borrow_mut().push(LogLevel::Error, text);
    }

    fn fail(&self, context: &str, error: String) -> Outcome {
        self.error(format!("{context}: {error}"));
        Outcome::Failed(error)
    }

    fn require_ready(&self) -> Result<(), Outcome> {
        if self.mirror.borrow().ready {
            Ok(())
        } else {
            Err(Outcome::Rejected(Rejection::NotReady))
        }
    }

    /// Profile edits need a stopped client with no start or stop in flight.
    fn require_stopped(&self) -> Result<(), Outcome> {
        self.require_ready()?;
        if self.mirror.borrow().process.is_running()
            || self.is_busy(Operation::Start)
            || self.is_busy(Operation::Stop)
        {
            return Err(Outcome::Rejected(Rejection::ProcessRunning));
        }
        Ok(())
    }

    fn replace_draft(&self, mirror: &mut Mirror, profile: Option<&ServerProfile>) {
        if let Some(previous) = mirror.draft.as_ref()
            && previous.is_dirty()
            && profile.is_none_or(|profile| profile.id != previous.id())
        {
            self.info(format!(
                "Unsaved changes to {} were discarded",
                previous.name()
            ));
        }
        mirror.draft = profile.map(FormDraft::from_profile);
    }

    pub async fn initialize(&self) -> Outcome {
        let _guard = match self.begin(Operation::Initialize) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        let epoch = self.mirror.borrow().process_epoch();
        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot, epoch);
                Outcome::Applied
            }
            Err(error) => {
                self.mirror.borrow_mut().ready = false;
                self.fail("Backend unavailable", error)
            }
        }
    }

    async fn fetch_snapshot(&self) -> BackendResult<Snapshot> {
        let version = self.backend.app_version().await?;
        let profiles = self.backend.list_profiles().await?;
        let current_id = self.backend.current_profile_id().await?;
        let running = self.backend.is_process_running().await?;
        let proxy = self.backend.proxy_enabled().await?;
        let current = self.backend.current_profile().await?;
        Ok(Snapshot {
            version,
            profiles,
            current_id,
            running,
            proxy,
            current,
        })
    }

    fn apply_snapshot(&self, snapshot: Snapshot, epoch: u64) {
        let now = Instant::now();
        let mut guard = self.mirror.borrow_mut();
        let mirror = &mut *guard;

        let overtaken = mirror.process_epoch() != epoch;
        if overtaken {
            log::debug!("[sync] process state changed during initialization, keeping it");
        } else {
            mirror.apply(
                Update::Process(ProcessState::from_running(snapshot.running)),
                Source::Query,
                now,
            );
            mirror.apply(
                Update::Proxy(ProxyState::from_enabled(snapshot.proxy)),
                Source::Query,
                now,
            );
        }

        mirror.profiles = snapshot.profiles;
        mirror.current_id = snapshot
            .current_id
            .or_else(|| snapshot.current.as_ref().map(|profile| profile.id.clone()))
            .or_else(|| mirror.profiles.first().map(|profile| profile.id.clone()));
        mirror.selection = mirror.current_id.clone();

        let current = snapshot.current.or_else(|| mirror.current_profile().cloned());
        if let Some(profile) = current.as_ref() {
            mirror.replace_profile(profile.clone());
        }
        self.replace_draft(mirror, current.as_ref());
        mirror.version = Some(snapshot.version.clone());
        mirror.ready = true;
        drop(guard);

        self.info(format!("Connected to backend v{}", snapshot.version));
        if !overtaken && snapshot.proxy && !snapshot.running {
            self.info("System proxy is enabled but the client is not running");
        }
    }

    pub async fn select_profile(&self, id: &str) -> Outcome {
        if let Err(outcome) = self.require_ready() {
            return outcome;
        }
        if self.mirror.borrow().current_id.as_deref() == Some(id) {
            self.mirror.borrow_mut().revert_selection();
            return Outcome::Applied;
        }
        if let Err(outcome) = self.require_stopped() {
            self.mirror.borrow_mut().revert_selection();
            self.info("Stop the client before switching servers");
            return outcome;
        }
        let _guard = match self.begin(Operation::SwitchProfile) {
            Ok(guard) => guard,
            Err(outcome) => {
                self.mirror.borrow_mut().revert_selection();
                return outcome;
            }
        };

        self.mirror.borrow_mut().selection = Some(id.to_string());
        if let Err(error) = self.backend.set_current_profile(id).await {
            self.mirror.borrow_mut().revert_selection();
            return self.fail("Failed to switch server", error);
        }

        let (loaded, outcome) = match self.backend.current_profile().await {
            Ok(profile) => (profile, Outcome::Applied),
            Err(error) => (None, self.fail("Failed to load server", error)),
        };

        let mut guard = self.mirror.borrow_mut();
        let mirror = &mut *guard;
        let profile = loaded
            .filter(|profile| profile.id == id)
            .or_else(|| mirror.profiles.iter().find(|profile| profile.id == id).cloned());
        if let Some(profile) = profile.as_ref() {
            mirror.replace_profile(profile.clone());
        }
        mirror.current_id = Some(id.to_string());
        mirror.selection = mirror.current_id.clone();
        self.replace_draft(mirror, profile.as_ref());
        drop(guard);

        if let Some(profile) = profile {
            self.info(format!("Switched to {}", profile.display_name()));
        }
        outcome
    }

    pub fn edit(&self, field: Field, value: &str) -> bool {
        let mut mirror = self.mirror.borrow_mut();
        if !mirror.controls().editing {
            return false;
        }
        match mirror.draft.as_mut() {
            Some(draft) => {
                draft.set(field, value);
                true
            }
            None => false,
        }
    }

    pub fn set_routing_mode(&self, mode: RoutingMode) -> bool {
        let mut mirror = self.mirror.borrow_mut();
        if !mirror.controls().editing {
            return false;
        }
        match mirror.draft.as_mut() {
            Some(draft) => {
                draft.set_routing_mode(mode);
                true
            }
            None => false,
        }
    }

    pub async fn save(&self) -> Outcome {
        if let Err(outcome) = self.require_ready() {
            return outcome;
        }
        let _guard = match self.begin(Operation::Save) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };
        self.save_draft().await
    }

    /// Sends the merged draft. Waits for any save already in flight.
    async fn save_draft(&self) -> Outcome {
        let _lock = self.save_lock.lock().await;

        let profile = {
            let mirror = self.mirror.borrow();
            let Some(draft) = mirror.draft.as_ref() else {
                return Outcome::Rejected(Rejection::NoProfile);
            };
            let latest = mirror
                .profiles
                .iter()
                .find(|profile| profile.id == draft.id())
                .unwrap_or(draft.base());
            draft.merged_onto(latest)
        };

        match self.backend.update_profile(&profile).await {
            Ok(()) => {
                let mut mirror = self.mirror.borrow_mut();
                if let Some(draft) = mirror.draft.as_mut()
                    && draft.id() == profile.id
                {
                    draft.mark_saved(&profile);
                }
                mirror.replace_profile(profile.clone());
                mirror.mark_saved(Instant::now());
                drop(mirror);
                self.info(format!("Saved {}", profile.display_name()));
                Outcome::Applied
            }
            Err(error) => self.fail("Failed to save server", error),
        }
    }

    pub async fn start(&self) -> Outcome {
        if let Err(outcome) = self.require_ready() {
            return outcome;
        }
        if self.mirror.borrow().process.is_running() {
            return Outcome::Rejected(Rejection::ProcessRunning);
        }
        let _guard = match self.begin(Operation::Start) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        match self.save_draft().await {
            Outcome::Applied => {}
            Outcome::Failed(error) => {
                self.error("Start aborted because the configuration was not saved");
                return Outcome::Failed(error);
            }
            outcome => return outcome,
        }

        match self.backend.start_process().await {
            Ok(message) => {
                self.mirror.borrow_mut().apply(
                    Update::Process(ProcessState::Running),
                    Source::Command,
                    Instant::now(),
                );
                self.info(message);
                Outcome::Applied
            }
            Err(error) => self.fail("Failed to start", error),
        }
    }

    /// Tears the system proxy down before stopping the client. A failed teardown
    /// aborts the stop; a failed stop re-enables the proxy it just disabled.
    pub async fn stop(&self) -> Outcome {
        if let Err(outcome) = self.require_ready() {
            return outcome;
        }
        if !self.mirror.borrow().process.is_running() {
            return Outcome::Rejected(Rejection::ProcessStopped);
        }
        let _guard = match self.begin_exclusive(Operation::Stop, &[Operation::ToggleProxy]) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        let proxy_was_enabled = self.mirror.borrow().proxy.is_enabled();
        if proxy_was_enabled {
            match self.backend.set_system_proxy(false).await {
                Ok(message) => {
                    self.mirror.borrow_mut().apply(
                        Update::Proxy(ProxyState::Disabled),
                        Source::Command,
                        Instant::now(),
                    );
                    self.info(message);
                }
                Err(error) => {
                    return self.fail(
                        "Stop aborted because the system proxy could not be disabled",
                        error,
                    );
                }
            }
        }

        match self.backend.stop_process().await {
            Ok(message) => {
                self.mirror.borrow_mut().apply(
                    Update::Process(ProcessState::Stopped),
                    Source::Command,
                    Instant::now(),
                );
                self.info(message);
                Outcome::Applied
            }
            Err(error) => {
                let outcome = self.fail("Failed to stop", error);
                if proxy_was_enabled {
                    self.restore_proxy().await;
                }
                outcome
            }
        }
    }

    async fn restore_proxy(&self) {
        match self.backend.set_system_proxy(true).await {
            Ok(message) => {
                self.mirror.borrow_mut().apply(
                    Update::Proxy(ProxyState::Enabled),
                    Source::Command,
                    Instant::now(),
                );
                self.info(message);
            }
            Err(error) => self.error(format!("System proxy was left disabled: {error}")),
        }
    }

    pub async fn toggle_proxy(&self) -> Outcome {
        if let Err(outcome) = self.require_ready() {
            return outcome;
        }
        if !self.mirror.borrow().process.is_running() {
            return Outcome::Rejected(Rejection::ProcessStopped);
        }
        let _guard = match self.begin_exclusive(Operation::ToggleProxy, &[Operation::Stop]) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        let target = !self.mirror.borrow().proxy.is_enabled();
        match self.backend.set_system_proxy(target).await {
            Ok(message) => {
                self.mirror.borrow_mut().apply(
                    Update::Proxy(ProxyState::from_enabled(target)),
                    Source::Command,
                    Instant::now(),
                );
                self.info(message);
                if target && !self.mirror.borrow().process.is_running() {
                    return self.withdraw_proxy().await;
                }
                Outcome::Applied
            }
            Err(error) => self.fail("Failed to change system proxy", error),
        }
    }

    /// The client stopped while the proxy was being enabled; turn it back off.
    async fn withdraw_proxy(&self) -> Outcome {
        self.info("Client stopped while the system proxy was being enabled");
        match self.backend.set_system_proxy(false).await {
            Ok(message) => {
                self.info(message);
                Outcome::Rejected(Rejection::ProcessStopped)
            }
            Err(error) => self.fail("System proxy is still enabled", error),
        }
    }

    pub async fn add_profile(&self) -> Outcome {
        if let Err(outcome) = self.require_stopped() {
            return outcome;
        }
        let _guard = match self.begin(Operation::AddProfile) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        let Some(name) = self
            .modal
            .ask_text("New server", "Name of the new server", "")
            .await
        else {
            return Outcome::Cancelled;
        };
        let name = name.trim();
        if name.is_empty() {
            return Outcome::Cancelled;
        }
        if let Err(outcome) = self.require_stopped() {
            return outcome;
        }

        match self.backend.add_profile(name).await {
            Ok(profile) => {
                self.info(format!("Added {}", profile.display_name()));
                self.refresh_profiles().await
            }
            Err(error) => self.fail("Failed to add server", error),
        }
    }

    pub async fn rename_profile(&self) -> Outcome {
        if let Err(outcome) = self.require_stopped() {
            return outcome;
        }
        let _guard = match self.begin(Operation::RenameProfile) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        let Some((id, name)) = self.current_identity() else {
            return Outcome::Rejected(Rejection::NoProfile);
        };
        let Some(new_name) = self
            .modal
            .ask_text("Rename server", "New name", &name)
            .await
        else {
            return Outcome::Cancelled;
        };
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == name {
            return Outcome::Cancelled;
        }
        if let Err(outcome) = self.require_stopped() {
            return outcome;
        }

        match self.backend.rename_profile(&id, new_name).await {
            Ok(()) => {
                let mut mirror = self.mirror.borrow_mut();
                if let Some(profile) = mirror.profiles.iter_mut().find(|profile| profile.id == id) {
                    profile.name = new_name.to_string();
                }
                if let Some(draft) = mirror.draft.as_mut()
                    && draft.id() == id
                {
                    draft.rename(new_name);
                }
                drop(mirror);
                self.info(format!("Renamed {name} to {new_name}"));
                Outcome::Applied
            }
            Err(error) => self.fail("Failed to rename server", error),
        }
    }

    pub async fn delete_profile(&self) -> Outcome {
        if let Err(outcome) = self.require_stopped() {
            return outcome;
        }
        let _guard = match self.begin(Operation::DeleteProfile) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        let Some((id, name)) = self.current_identity() else {
            return Outcome::Rejected(Rejection::NoProfile);
        };
        if self.mirror.borrow().profiles.len() <= 1 {
            return Outcome::Rejected(Rejection::LastProfile);
        }
        let confirmed = self
            .modal
            .confirm("Delete server", &format!("Delete \"{name}\"?"))
            .await;
        if !confirmed {
            return Outcome::Cancelled;
        }
        if let Err(outcome) = self.require_stopped() {
            return outcome;
        }

        match self.backend.delete_profile(&id).await {
            Ok(()) => {
                self.info(format!("Deleted {name}"));
                self.refresh_profiles().await
            }
            Err(error) => self.fail("Failed to delete server", error),
        }
    }

    fn current_identity(&self) -> Option<(String, String)> {
        let mirror = self.mirror.borrow();
        if let Some(profile) = mirror.current_profile() {
            return Some((profile.id.clone(), profile.display_name().to_string()));
        }
        mirror
            .draft
            .as_ref()
            .map(|draft| (draft.id().to_string(), draft.name().to_string()))
    }

    /// Reloads the list and the current profile. Keeps the draft if the current profile is unchanged.
    async fn refresh_profiles(&self) -> Outcome {
        let profiles = match self.backend.list_profiles().await {
            Ok(profiles) => profiles,
            Err(error) => return self.fail("Failed to load servers", error),
        };
        let current = match self.backend.current_profile().await {
            Ok(current) => current,
            Err(error) => return self.fail("Failed to load current server", error),
        };

        let mut guard = self.mirror.borrow_mut();
        let mirror = &mut *guard;
        mirror.profiles = profiles;
        mirror.current_id = current
            .as_ref()
            .map(|profile| profile.id.clone())
            .or_else(|| mirror.profiles.first().map(|profile| profile.id.clone()));
        mirror.selection = mirror.current_id.clone();

        let keep_draft = mirror
            .draft
            .as_ref()
            .is_some_and(|draft| mirror.current_id.as_deref() == Some(draft.id()));
        if !keep_draft {
            let profile = current.or_else(|| mirror.current_profile().cloned());
            self.replace_draft(mirror, profile.as_ref());
        }
        Outcome::Applied
    }

    /// Applies one backend push event. Always wins over local hints.
    pub fn apply_event(&self, event: PushEvent) {
        let now = Instant::now();
        match event {
            PushEvent::LogOutput(line) => self.log.borrow_mut().push(LogLevel::Output, line),
            PushEvent::ProcessStarted => {
                let changed = self.mirror.borrow_mut().apply(
                    Update::Process(ProcessState::Running),
                    Source::Push,
                    now,
                );
                if changed {
                    self.info("Client process started");
                }
            }
            PushEvent::ProcessStopped => {
                let changed = self.mirror.borrow_mut().apply(
                    Update::Process(ProcessState::Stopped),
                    Source::Push,
                    now,
                );
                if changed {
                    self.info("Client process stopped");
                }
            }
        }
    }

    pub async fn reconcile(&self) -> Outcome {
        self.reconcile_at(Instant::now()).await
    }

    /// Queries the backend when a command-sourced state has gone unconfirmed for too long.
    pub async fn reconcile_at(&self, now: Instant) -> Outcome {
        if !self
            .mirror
            .borrow()
            .confirmation_overdue(now, self.confirmation_timeout)
        {
            return Outcome::Applied;
        }
        let _guard = match self.begin(Operation::Reconcile) {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };

        let epoch = self.mirror.borrow().process_epoch();
        let queried = async {
            let running = self.backend.is_process_running().await?;
            let proxy = self.backend.proxy_enabled().await?;
            Ok::<_, String>((running, proxy))
        };
        let (running, proxy) = match queried.await {
            Ok(answer) => answer,
            Err(error) => {
                self.mirror.borrow_mut().postpone_confirmation(now);
                return self.fail("Failed to query client state", error);
            }
        };

        let mut mirror = self.mirror.borrow_mut();
        if mirror.process_epoch() != epoch {
            log::debug!("[sync] discarding a state query overtaken by newer updates");
            return Outcome::Applied;
        }
        let assumed = mirror.process;
        mirror.apply(
            Update::Process(ProcessState::from_running(running)),
            Source::Query,
            now,
        );
        mirror.apply(
            Update::Proxy(ProxyState::from_enabled(proxy)),
            Source::Query,
            now,
        );
        let actual = mirror.process;
        drop(mirror);

        if actual != assumed {
            self.info(format!("Client is {}", actual.label().to_lowercase()));
        }
        Outcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use std::{future::Future, rc::Rc};

    use futures::{
        executor::{LocalPool, block_on},
        task::LocalSpawnExt,
    };

    use super::*;
    use crate::{backend::fake::FakeBackend, log_buffer::MAX_LOG_LINES, modal::Answer};

    fn tokyo() -> ServerProfile {
        let mut profile = ServerProfile::new("tokyo", "Tokyo");
        profile.server = "tokyo.example.com:443".into();
        profile.listen = "127.0.0.1:30000".into();
        profile.token = "t0k3n".into();
        profile.ip = "saas.sin.fan".into();
        profile.dns = "dns.alidns.com/dns-query".into();
        profile.ech = "cloudflare-ech.com".into();
        profile.routing_mode = "global".into();
        profile
            .extra
            .insert("note".into(), serde_json::json!("keep me"));
        profile
    }

    fn osaka() -> ServerProfile {
        let mut profile = ServerProfile::new("osaka", "Osaka");
        profile.server = "osaka.example.com:443".into();
        profile.listen = "127.0.0.1:30001".into();
        profile
    }

    fn synchronizer() -> Synchronizer<FakeBackend> {
        Synchronizer::new(FakeBackend::new(vec![tokyo(), osaka()]), &Settings::default())
    }

    fn ready() -> Synchronizer<FakeBackend> {
        let sync = synchronizer();
        assert_eq!(block_on(sync.initialize()), Outcome::Applied);
        sync.backend().clear_calls();
        sync
    }

    fn running() -> Synchronizer<FakeBackend> {
        let sync = ready();
        assert_eq!(block_on(sync.start()), Outcome::Applied);
        sync.apply_event(PushEvent::ProcessStarted);
        sync.backend().clear_calls();
        sync
    }

    fn spawn<F>(pool: &LocalPool, future: F) -> Rc<RefCell<Option<Outcome>>>
    where
        F: Future<Output = Outcome> + 'static,
    {
        let slot = Rc::new(RefCell::new(None));
        let result = slot.clone();
        pool.spawner()
            .spawn_local(async move {
                *result.borrow_mut() = Some(future.await);
            })
            .unwrap();
        slot
    }

    fn last_log(sync: &Synchronizer<FakeBackend>) -> (LogLevel, String) {
        let log = sync.log();
        let line = log.last().unwrap();
        (line.level, line.text.clone())
    }

    #[test]
    fn initialize_loads_backend_state() {
        let sync = synchronizer();
        assert_eq!(sync.controls(), Controls::default());
        assert_eq!(block_on(sync.initialize()), Outcome::Applied);

        let mirror = sync.mirror();
        assert!(mirror.ready);
        assert_eq!(mirror.version.as_deref(), Some("1.0.0"));
        assert_eq!(mirror.profiles.len(), 2);
        assert_eq!(mirror.current_id.as_deref(), Some("tokyo"));
        assert_eq!(mirror.selection.as_deref(), Some("tokyo"));
        assert_eq!(mirror.draft.as_ref().unwrap().id(), "tokyo");
        assert_eq!(mirror.process, ProcessState::Stopped);
        drop(mirror);

        let controls = sync.controls();
        assert!(controls.start && controls.editing && controls.selector);
        assert!(!controls.stop && !controls.proxy_toggle);
    }

    #[test]
    fn initialize_failure_keeps_controls_disabled() {
        let sync = synchronizer();
        sync.backend().fail("list_profiles", "backend offline");

        assert_eq!(
            block_on(sync.initialize()),
            Outcome::Failed("backend offline".into())
        );
        assert!(!sync.mirror().ready);
        assert_eq!(sync.controls(), Controls::default());
        let (level, text) = last_log(&sync);
        assert_eq!(level, LogLevel::Error);
        assert!(text.contains("backend offline"));

        sync.backend().heal("list_profiles");
        assert_eq!(block_on(sync.initialize()), Outcome::Applied);
        assert!(sync.controls().start);
    }

    #[test]
    fn initialize_mirrors_a_running_backend() {
        let sync = synchronizer();
        sync.backend().running.set(true);
        sync.backend().proxy.set(true);
        block_on(sync.initialize());

        let mirror = sync.mirror();
        assert_eq!(mirror.process, ProcessState::Running);
        assert_eq!(mirror.proxy, ProxyState::Enabled);
        assert!(!mirror.awaiting_confirmation());
        drop(mirror);
        assert_eq!(
            sync.controls(),
            Controls {
                stop: true,
                proxy_toggle: true,
                ..Controls::default()
            }
        );
    }

    #[test]
    fn stale_system_proxy_is_not_mirrored_while_stopped() {
        let sync = synchronizer();
        sync.backend().proxy.set(true);
        block_on(sync.initialize());
        assert_eq!(sync.mirror().proxy, ProxyState::Disabled);
        assert!(last_log(&sync).1.contains("not running"));
    }

    #[test]
    fn switching_while_running_is_rejected_without_a_call() {
        let sync = running();
        sync.mirror.borrow_mut().selection = Some("osaka".into());

        assert_eq!(
            block_on(sync.select_profile("osaka")),
            Outcome::Rejected(Rejection::ProcessRunning)
        );
        assert_eq!(sync.backend().count("set_current_profile"), 0);
        assert!(sync.backend().calls().is_empty());
        let mirror = sync.mirror();
        assert_eq!(mirror.selection.as_deref(), Some("tokyo"));
        assert_eq!(mirror.current_id.as_deref(), Some("tokyo"));
    }

    #[test]
    fn switching_reloads_draft_and_discards_edits() {
        let sync = ready();
        assert!(sync.edit(Field::Listen, "127.0.0.1:45000"));

        assert_eq!(block_on(sync.select_profile("osaka")), Outcome::Applied);
        let mirror = sync.mirror();
        let draft = mirror.draft.as_ref().unwrap();
        assert_eq!(draft.id(), "osaka");
        assert_eq!(draft.value(Field::Listen), "127.0.0.1:30001");
        assert!(!draft.is_dirty());
        assert_eq!(mirror.current_id.as_deref(), Some("osaka"));
        drop(mirror);

        assert_eq!(
            sync.backend().profile("tokyo").unwrap().listen,
            "127.0.0.1:30000"
        );
        assert!(
            sync.log()
                .lines()
                .any(|line| line.text.contains("Unsaved changes to Tokyo were discarded"))
        );
    }

    #[test]
    fn switching_away_from_unknown_routing_mode_discards_nothing() {
        let sync = synchronizer();
        sync.backend().profiles.borrow_mut()[0].routing_mode = "split".into();
        block_on(sync.initialize());
        assert!(!sync.mirror().draft.as_ref().unwrap().is_dirty());

        assert_eq!(block_on(sync.select_profile("osaka")), Outcome::Applied);
        assert!(
            !sync
                .log()
                .lines()
                .any(|line| line.text.starts_with("Unsaved changes"))
        );
    }

    #[test]
    fn failed_switch_reverts_selection() {
        let sync = ready();
        sync.backend().fail("set_current_profile", "store locked");

        assert_eq!(
            block_on(sync.select_profile("osaka")),
            Outcome::Failed("store locked".into())
        );
        let mirror = sync.mirror();
        assert_eq!(mirror.selection.as_deref(), Some("tokyo"));
        assert_eq!(mirror.draft.as_ref().unwrap().id(), "tokyo");
    }

    #[test]
    fn save_round_trip_changes_only_the_edited_field() {
        let sync = ready();
        let original = tokyo();
        sync.edit(Field::Listen, "127.0.0.1:40000");

        assert_eq!(block_on(sync.save()), Outcome::Applied);
        assert_eq!(sync.backend().calls(), vec!["update_profile tokyo"]);

        let stored = sync.backend().profile("tokyo").unwrap();
        assert_eq!(stored.listen, "127.0.0.1:40000");
        assert_eq!(
            ServerProfile {
                listen: original.listen.clone(),
                ..stored.clone()
            },
            original
        );

        block_on(sync.initialize());
        let mirror = sync.mirror();
        let draft = mirror.draft.as_ref().unwrap();
        assert_eq!(draft.value(Field::Listen), "127.0.0.1:40000");
        assert_eq!(draft.value(Field::Token), original.token);
        assert_eq!(draft.base().extra, original.extra);
    }

    #[test]
    fn save_sends_selected_routing_mode() {
        let sync = ready();
        assert!(sync.set_routing_mode(RoutingMode::None));
        block_on(sync.save());
        assert_eq!(sync.backend().profile("tokyo").unwrap().routing_mode, "none");
    }

    #[test]
    fn profile_without_routing_mode_defaults_to_bypass_cn() {
        let sync = ready();
        block_on(sync.select_profile("osaka"));
        assert_eq!(
            sync.mirror().draft.as_ref().unwrap().routing_mode(),
            RoutingMode::BypassCn
        );
    }

    #[test]
    fn save_acknowledgement_reverts() {
        let sync = ready();
        assert!(!sync.save_acknowledged());
        block_on(sync.save());
        assert!(sync.save_acknowledged_at(Instant::now()));
        assert!(!sync.save_acknowledged_at(Instant::now() + Duration::from_secs(2)));
    }

    #[test]
    fn failed_save_is_logged_and_not_acknowledged() {
        let sync = ready();
        sync.edit(Field::Server, "new.example.com:443");
        sync.backend().fail("update_profile", "disk full");

        assert_eq!(block_on(sync.save()), Outcome::Failed("disk full".into()));
        assert!(!sync.save_acknowledged());
        assert!(sync.mirror().draft.as_ref().unwrap().is_dirty());
        assert_eq!(last_log(&sync).0, LogLevel::Error);
    }

    #[test]
    fn start_waits_for_pending_save_then_saves_again() {
        let sync = Rc::new(ready());
        let mut pool = LocalPool::new();
        let release = sync.backend().hold("update_profile");

        let saved = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.save().await })
        };
        pool.run_until_stalled();
        assert!(sync.edit(Field::Listen, "127.0.0.1:41000"));

        let started = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.start().await })
        };
        pool.run_until_stalled();
        assert_eq!(sync.backend().count("update_profile"), 1);
        assert_eq!(sync.backend().count("start_process"), 0);

        release.send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(*saved.borrow(), Some(Outcome::Applied));
        assert_eq!(*started.borrow(), Some(Outcome::Applied));
        assert_eq!(
            sync.backend().calls(),
            vec!["update_profile tokyo", "update_profile tokyo", "start_process"]
        );
        assert_eq!(
            sync.backend().profile("tokyo").unwrap().listen,
            "127.0.0.1:41000"
        );
        assert_eq!(sync.mirror().process, ProcessState::Running);
    }

    #[test]
    fn start_is_aborted_when_implicit_save_fails() {
        let sync = ready();
        sync.backend().fail("update_profile", "read-only store");

        assert_eq!(
            block_on(sync.start()),
            Outcome::Failed("read-only store".into())
        );
        assert_eq!(sync.backend().count("start_process"), 0);
        assert_eq!(sync.mirror().process, ProcessState::Stopped);
    }

    #[test]
    fn failed_start_leaves_process_stopped() {
        let sync = ready();
        sync.backend().fail("start_process", "executable not found");

        assert_eq!(
            block_on(sync.start()),
            Outcome::Failed("executable not found".into())
        );
        assert_eq!(sync.mirror().process, ProcessState::Stopped);
        assert!(!sync.mirror().awaiting_confirmation());
        let (level, text) = last_log(&sync);
        assert_eq!(level, LogLevel::Error);
        assert_eq!(text, "Failed to start: executable not found");
    }

    #[test]
    fn optimistic_start_is_confirmed_by_push() {
        let sync = ready();
        block_on(sync.start());
        assert_eq!(sync.mirror().process, ProcessState::Running);
        assert!(sync.mirror().awaiting_confirmation());

        sync.apply_event(PushEvent::ProcessStarted);
        assert!(!sync.mirror().awaiting_confirmation());
        assert_eq!(sync.mirror().process, ProcessState::Running);
    }

    #[test]
    fn push_before_command_response_settles_on_running() {
        let sync = Rc::new(ready());
        let mut pool = LocalPool::new();
        let release = sync.backend().hold("start_process");

        let started = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.start().await })
        };
        pool.run_until_stalled();
        sync.apply_event(PushEvent::ProcessStarted);
        release.send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(*started.borrow(), Some(Outcome::Applied));
        assert_eq!(sync.mirror().process, ProcessState::Running);
        assert!(!sync.mirror().awaiting_confirmation());
    }

    #[test]
    fn reconcile_corrects_an_unconfirmed_hint() {
        let sync = ready();
        block_on(sync.start());
        sync.backend().running.set(false);
        sync.backend().clear_calls();

        assert_eq!(block_on(sync.reconcile_at(Instant::now())), Outcome::Applied);
        assert_eq!(sync.backend().count("is_process_running"), 0);
        assert_eq!(sync.mirror().process, ProcessState::Running);

        let later = Instant::now() + Duration::from_secs(5);
        assert_eq!(block_on(sync.reconcile_at(later)), Outcome::Applied);
        assert_eq!(sync.backend().count("is_process_running"), 1);
        assert_eq!(sync.mirror().process, ProcessState::Stopped);
        assert!(!sync.mirror().awaiting_confirmation());
        assert!(sync.controls().start);
    }

    #[test]
    fn failed_reconcile_postpones_next_query() {
        let sync = ready();
        block_on(sync.start());
        sync.backend().fail("is_process_running", "timeout");

        let later = Instant::now() + Duration::from_secs(5);
        assert_eq!(
            block_on(sync.reconcile_at(later)),
            Outcome::Failed("timeout".into())
        );
        assert!(sync.mirror().awaiting_confirmation());
        sync.backend().clear_calls();

        block_on(sync.reconcile_at(later + Duration::from_secs(1)));
        assert_eq!(sync.backend().count("is_process_running"), 0);
    }

    #[test]
    fn stop_disables_proxy_before_stopping() {
        let sync = running();
        assert_eq!(block_on(sync.toggle_proxy()), Outcome::Applied);
        assert_eq!(sync.mirror().proxy, ProxyState::Enabled);
        sync.backend().clear_calls();

        assert_eq!(block_on(sync.stop()), Outcome::Applied);
        assert_eq!(
            sync.backend().calls(),
            vec!["set_system_proxy off", "stop_process"]
        );
        let mirror = sync.mirror();
        assert_eq!(mirror.process, ProcessState::Stopped);
        assert_eq!(mirror.proxy, ProxyState::Disabled);
    }

    #[test]
    fn stop_without_proxy_only_stops() {
        let sync = running();
        assert_eq!(block_on(sync.stop()), Outcome::Applied);
        assert_eq!(sync.backend().calls(), vec!["stop_process"]);
    }

    #[test]
    fn failed_proxy_teardown_aborts_stop() {
        let sync = running();
        block_on(sync.toggle_proxy());
        sync.backend().fail("set_system_proxy", "permission denied");
        sync.backend().clear_calls();

        assert_eq!(
            block_on(sync.stop()),
            Outcome::Failed("permission denied".into())
        );
        assert_eq!(sync.backend().count("stop_process"), 0);
        let mirror = sync.mirror();
        assert_eq!(mirror.process, ProcessState::Running);
        assert_eq!(mirror.proxy, ProxyState::Enabled);
    }

    #[test]
    fn failed_stop_restores_proxy() {
        let sync = running();
        block_on(sync.toggle_proxy());
        sync.backend().fail("stop_process", "process not responding");
        sync.backend().clear_calls();

        assert_eq!(
            block_on(sync.stop()),
            Outcome::Failed("process not responding".into())
        );
        assert_eq!(
            sync.backend().calls(),
            vec!["set_system_proxy off", "stop_process", "set_system_proxy on"]
        );
        let mirror = sync.mirror();
        assert_eq!(mirror.process, ProcessState::Running);
        assert_eq!(mirror.proxy, ProxyState::Enabled);
    }

    #[test]
    fn proxy_toggle_requires_running_process() {
        let sync = ready();
        assert_eq!(
            block_on(sync.toggle_proxy()),
            Outcome::Rejected(Rejection::ProcessStopped)
        );
        assert!(sync.backend().calls().is_empty());
    }

    #[test]
    fn proxy_toggle_flips_state_both_ways() {
        let sync = running();
        block_on(sync.toggle_proxy());
        block_on(sync.toggle_proxy());
        assert_eq!(
            sync.backend().calls(),
            vec!["set_system_proxy on", "set_system_proxy off"]
        );
        assert_eq!(sync.mirror().proxy, ProxyState::Disabled);
    }

    #[test]
    fn second_toggle_while_first_in_flight_is_rejected() {
        let sync = Rc::new(running());
        let mut pool = LocalPool::new();
        let release = sync.backend().hold("set_system_proxy");

        let first = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.toggle_proxy().await })
        };
        pool.run_until_stalled();
        assert!(sync.is_busy(Operation::ToggleProxy));

        assert_eq!(
            block_on(sync.toggle_proxy()),
            Outcome::Rejected(Rejection::Busy)
        );
        release.send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(*first.borrow(), Some(Outcome::Applied));
        assert_eq!(sync.backend().count("set_system_proxy"), 1);
        assert!(!sync.is_busy(Operation::ToggleProxy));
    }

    #[test]
    fn proxy_enable_racing_a_crash_never_sticks() {
        let sync = Rc::new(running());
        let mut pool = LocalPool::new();
        let release = sync.backend().hold("set_system_proxy");

        let toggled = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.toggle_proxy().await })
        };
        pool.run_until_stalled();
        sync.backend().running.set(false);
        sync.apply_event(PushEvent::ProcessStopped);
        release.send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(
            *toggled.borrow(),
            Some(Outcome::Rejected(Rejection::ProcessStopped))
        );
        assert_eq!(
            sync.backend().calls(),
            vec!["set_system_proxy on", "set_system_proxy off"]
        );
        assert!(!sync.backend().proxy.get());
        let mirror = sync.mirror();
        assert_eq!(mirror.process, ProcessState::Stopped);
        assert_eq!(mirror.proxy, ProxyState::Disabled);
    }

    #[test]
    fn proxy_toggle_waits_out_a_pending_stop() {
        let sync = Rc::new(running());
        let mut pool = LocalPool::new();
        let release = sync.backend().hold("stop_process");

        let stopped = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.stop().await })
        };
        pool.run_until_stalled();
        assert_eq!(
            block_on(sync.toggle_proxy()),
            Outcome::Rejected(Rejection::Busy)
        );
        release.send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(*stopped.borrow(), Some(Outcome::Applied));
        assert_eq!(sync.backend().calls(), vec!["stop_process"]);
        assert!(!sync.backend().running.get());
        assert!(!sync.backend().proxy.get());
        assert_eq!(sync.mirror().proxy, ProxyState::Disabled);
    }

    #[test]
    fn stop_waits_out_a_pending_proxy_toggle() {
        let sync = Rc::new(running());
        let mut pool = LocalPool::new();
        let release = sync.backend().hold("set_system_proxy");

        let toggled = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.toggle_proxy().await })
        };
        pool.run_until_stalled();
        assert_eq!(block_on(sync.stop()), Outcome::Rejected(Rejection::Busy));
        release.send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(*toggled.borrow(), Some(Outcome::Applied));
        assert!(sync.backend().running.get());
        assert_eq!(sync.mirror().proxy, ProxyState::Enabled);

        assert_eq!(block_on(sync.stop()), Outcome::Applied);
        assert_eq!(
            sync.backend().calls(),
            vec!["set_system_proxy on", "set_system_proxy off", "stop_process"]
        );
        assert!(!sync.backend().running.get());
        assert!(!sync.backend().proxy.get());
    }

    #[test]
    fn stale_query_answer_loses_to_newer_push() {
        let sync = Rc::new(ready());
        block_on(sync.start());
        assert!(sync.mirror().awaiting_confirmation());
        sync.backend().clear_calls();
        let mut pool = LocalPool::new();
        let release = sync.backend().hold("proxy_enabled");

        let later = Instant::now() + Duration::from_secs(5);
        let reconciled = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.reconcile_at(later).await })
        };
        pool.run_until_stalled();
        assert_eq!(sync.backend().count("is_process_running"), 1);

        sync.backend().running.set(false);
        sync.apply_event(PushEvent::ProcessStopped);
        release.send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(*reconciled.borrow(), Some(Outcome::Applied));
        let mirror = sync.mirror();
        assert_eq!(mirror.process, ProcessState::Stopped);
        assert!(!mirror.awaiting_confirmation());
        drop(mirror);
        assert!(sync.controls().start);
    }

    #[test]
    fn push_during_initialization_wins_over_snapshot() {
        let sync = Rc::new(synchronizer());
        sync.backend().running.set(true);
        let mut pool = LocalPool::new();
        let release = sync.backend().hold("current_profile");

        let initialized = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.initialize().await })
        };
        pool.run_until_stalled();
        assert_eq!(sync.backend().count("is_process_running"), 1);

        sync.backend().running.set(false);
        sync.apply_event(PushEvent::ProcessStopped);
        release.send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(*initialized.borrow(), Some(Outcome::Applied));
        let mirror = sync.mirror();
        assert!(mirror.ready);
        assert_eq!(mirror.process, ProcessState::Stopped);
        assert_eq!(mirror.proxy, ProxyState::Disabled);
    }

    #[test]
    fn external_stop_reenables_editing() {
        let sync = running();
        assert!(!sync.controls().editing);
        assert!(!sync.edit(Field::Server, "blocked"));

        sync.apply_event(PushEvent::ProcessStopped);
        sync.apply_event(PushEvent::ProcessStopped);
        let controls = sync.controls();
        assert!(controls.editing && controls.start && controls.selector);
        assert!(!controls.stop);
        assert!(sync.edit(Field::Server, "allowed"));
    }

    #[test]
    fn log_output_is_bounded() {
        let sync = ready();
        for index in 0..=MAX_LOG_LINES {
            sync.apply_event(PushEvent::LogOutput(format!("line {index}")));
        }
        let log = sync.log();
        assert_eq!(log.len(), MAX_LOG_LINES);
        assert_eq!(log.lines().next().unwrap().text, "line 1");
        assert_eq!(log.last().unwrap().level, LogLevel::Output);
    }

    #[test]
    fn add_profile_prompts_and_loads_new_profile() {
        let sync = Rc::new(ready());
        let mut pool = LocalPool::new();

        let added = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.add_profile().await })
        };
        pool.run_until_stalled();
        assert_eq!(sync.modal().current().unwrap().title, "New server");
        assert!(sync.modal().answer(Answer::Text("  Seoul ".into())));
        pool.run_until_stalled();

        assert_eq!(*added.borrow(), Some(Outcome::Applied));
        assert_eq!(sync.backend().position("add_profile Seoul"), Some(0));
        let mirror = sync.mirror();
        assert_eq!(mirror.profiles.len(), 3);
        assert_eq!(mirror.current_id.as_deref(), Some("srv-100"));
        assert_eq!(mirror.draft.as_ref().unwrap().name(), "Seoul");
    }

    #[test]
    fn cancelled_add_makes_no_call() {
        let sync = Rc::new(ready());
        let mut pool = LocalPool::new();

        let added = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.add_profile().await })
        };
        pool.run_until_stalled();
        sync.modal().dismiss();
        pool.run_until_stalled();

        assert_eq!(*added.borrow(), Some(Outcome::Cancelled));
        assert!(sync.backend().calls().is_empty());
    }

    #[test]
    fn rename_keeps_unsaved_edits() {
        let sync = Rc::new(ready());
        let mut pool = LocalPool::new();
        sync.edit(Field::Dns, "1.1.1.1/dns-query");

        let renamed = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.rename_profile().await })
        };
        pool.run_until_stalled();
        assert_eq!(
            sync.modal().current().unwrap().kind,
            crate::modal::PromptKind::Text {
                initial: "Tokyo".into()
            }
        );
        sync.modal().answer(Answer::Text("Tokyo East".into()));
        pool.run_until_stalled();
        assert_eq!(*renamed.borrow(), Some(Outcome::Applied));

        {
            let mirror = sync.mirror();
            let draft = mirror.draft.as_ref().unwrap();
            assert_eq!(draft.name(), "Tokyo East");
            assert_eq!(draft.value(Field::Dns), "1.1.1.1/dns-query");
            assert!(draft.is_dirty());
        }

        block_on(sync.save());
        let stored = sync.backend().profile("tokyo").unwrap();
        assert_eq!(stored.name, "Tokyo East");
        assert_eq!(stored.dns, "1.1.1.1/dns-query");
    }

    #[test]
    fn delete_confirms_and_reloads() {
        let sync = Rc::new(ready());
        let mut pool = LocalPool::new();

        let deleted = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.delete_profile().await })
        };
        pool.run_until_stalled();
        assert_eq!(
            sync.modal().current().unwrap().kind,
            crate::modal::PromptKind::Confirm
        );
        sync.modal().answer(Answer::Confirm);
        pool.run_until_stalled();

        assert_eq!(*deleted.borrow(), Some(Outcome::Applied));
        let mirror = sync.mirror();
        assert_eq!(mirror.profiles.len(), 1);
        assert_eq!(mirror.current_id.as_deref(), Some("osaka"));
        assert_eq!(mirror.draft.as_ref().unwrap().id(), "osaka");
        drop(mirror);
        assert!(!sync.controls().delete);

        assert_eq!(
            block_on(sync.delete_profile()),
            Outcome::Rejected(Rejection::LastProfile)
        );
    }

    #[test]
    fn profile_operations_are_rejected_while_running() {
        let sync = running();
        assert_eq!(
            block_on(sync.add_profile()),
            Outcome::Rejected(Rejection::ProcessRunning)
        );
        assert_eq!(
            block_on(sync.delete_profile()),
            Outcome::Rejected(Rejection::ProcessRunning)
        );
        assert!(!sync.modal().is_open());
        assert!(sync.backend().calls().is_empty());
    }

    #[test]
    fn switching_during_pending_start_is_rejected() {
        let sync = Rc::new(ready());
        let mut pool = LocalPool::new();
        let release = sync.backend().hold("start_process");

        let started = {
            let sync = sync.clone();
            spawn(&pool, async move { sync.start().await })
        };
        pool.run_until_stalled();

        assert_eq!(
            block_on(sync.select_profile("osaka")),
            Outcome::Rejected(Rejection::ProcessRunning)
        );
        assert_eq!(sync.backend().count("set_current_profile"), 0);

        drop(release);
        pool.run_until_stalled();
        assert_eq!(*started.borrow(), Some(Outcome::Applied));
    }

    #[test]
    fn operations_before_initialization_are_rejected() {
        let sync = synchronizer();
        assert_eq!(
            block_on(sync.start()),
            Outcome::Rejected(Rejection::NotReady)
        );
        assert_eq!(
            block_on(sync.save()),
            Outcome::Rejected(Rejection::NotReady)
        );
        assert!(sync.backend().calls().is_empty());
    }
}
