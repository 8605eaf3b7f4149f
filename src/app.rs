use std::{future::Future, pin::pin, rc::Rc, task::Poll, time::Duration};

use futures::{StreamExt, channel::mpsc::UnboundedReceiver};
use gpui::{
    App, AsyncApp, Context, CursorStyle, Entity, FocusHandle, Focusable, MouseButton,
    ScrollHandle, Subscription, WeakEntity, Window, actions, div, prelude::*, px, rgb,
};

use ech_workers_ui::{
    IpcBackend, Operation, Outcome, PushEvent, Synchronizer,
    log_buffer::LogLine,
    mirror::Controls,
    modal::{Answer, Prompt, PromptKind},
    profile::{Field, RoutingMode},
};

use crate::{
    components::*,
    text_input::{Edited, TextInput},
    theme::*,
};

actions!(
    ech_workers,
    [
        ToggleProcess,
        Save,
        AddProfile,
        RenameProfile,
        DeleteProfile,
        FocusNext,
        FocusPrevious,
        ConfirmPrompt,
        CancelPrompt,
        Quit
    ]
);

type SharedSynchronizer = Rc<Synchronizer<IpcBackend>>;

pub struct EchWorkersApp {
    synchronizer: SharedSynchronizer,
    inputs: Vec<(Field, Entity<TextInput>)>,
    prompt_input: Entity<TextInput>,
    prompt_seeded: bool,
    shown_draft: Option<String>,
    focus_handle: FocusHandle,
    profile_focus_handles: Vec<FocusHandle>,
    add_focus_handle: FocusHandle,
    rename_focus_handle: FocusHandle,
    delete_focus_handle: FocusHandle,
    routing_focus_handles: [FocusHandle; 3],
    save_focus_handle: FocusHandle,
    process_focus_handle: FocusHandle,
    proxy_focus_handle: FocusHandle,
    retry_focus_handle: FocusHandle,
    prompt_confirm_focus_handle: FocusHandle,
    prompt_cancel_focus_handle: FocusHandle,
    log_scroll_handle: ScrollHandle,
    log_tail: Option<(usize, LogLine)>,
    _subscriptions: Vec<Subscription>,
}

impl EchWorkersApp {
    pub fn new(
        synchronizer: SharedSynchronizer,
        events: Option<UnboundedReceiver<PushEvent>>,
        poll_interval: Duration,
        context: &mut Context<Self>,
    ) -> Self {
        let mut inputs = Vec::with_capacity(Field::ALL.len());
        let mut subscriptions = Vec::with_capacity(Field::ALL.len());
        for field in Field::ALL {
            let input = TextInput::new(context, field.placeholder(), field.is_secret());
            subscriptions.push(context.subscribe(
                &input,
                move |this: &mut Self, input, _: &Edited, context| {
                    let text = input.read(context).text().to_string();
                    if !this.synchronizer.edit(field, &text) {
                        log::debug!("[view] edit of {field:?} ignored");
                    }
                    context.notify();
                },
            ));
            inputs.push((field, input));
        }
        let prompt_input = TextInput::new(context, "Name", false);

        if let Some(events) = events {
            Self::pump_events(events, context);
        } else {
            log::warn!("[view] push events are already consumed elsewhere");
        }
        Self::poll_backend(poll_interval, context);

        let mut app = Self {
            synchronizer,
            inputs,
            prompt_input,
            prompt_seeded: false,
            shown_draft: None,
            focus_handle: context.focus_handle(),
            profile_focus_handles: Vec::new(),
            add_focus_handle: context.focus_handle(),
            rename_focus_handle: context.focus_handle(),
            delete_focus_handle: context.focus_handle(),
            routing_focus_handles: std::array::from_fn(|_| context.focus_handle()),
            save_focus_handle: context.focus_handle(),
            process_focus_handle: context.focus_handle(),
            proxy_focus_handle: context.focus_handle(),
            retry_focus_handle: context.focus_handle(),
            prompt_confirm_focus_handle: context.focus_handle(),
            prompt_cancel_focus_handle: context.focus_handle(),
            log_scroll_handle: ScrollHandle::new(),
            log_tail: None,
            _subscriptions: subscriptions,
        };
        app.initialize(context);
        app
    }

    fn pump_events(mut events: UnboundedReceiver<PushEvent>, context: &mut Context<Self>) {
        context
            .spawn(async move |this: WeakEntity<Self>, context: &mut AsyncApp| {
                while let Some(event) = events.next().await {
                    log::debug!("[view] push event {}", event.name());
                    let applied = this.update(context, |this, context| {
                        this.synchronizer.apply_event(event);
                        context.notify();
                    });
                    if applied.is_err() {
                        break;
                    }
                }
                log::info!("[view] push event stream ended");
            })
            .detach();
    }

    /// Ticks reconciliation and redraws so time-based state expires on screen.
    fn poll_backend(interval: Duration, context: &mut Context<Self>) {
        context
            .spawn(async move |this: WeakEntity<Self>, context: &mut AsyncApp| {
                loop {
                    context.background_executor().timer(interval).await;
                    let Ok(synchronizer) = this.update(context, |this, _| this.synchronizer.clone())
                    else {
                        break;
                    };
                    if let Outcome::Failed(error) = synchronizer.reconcile().await {
                        log::debug!("[view] reconciliation failed: {error}");
                    }
                    if this.update(context, |_, context| context.notify()).is_err() {
                        break;
                    }
                }
            })
            .detach();
    }

    /// Runs one synchronizer operation and redraws once it suspends and again when it ends.
    fn run<F, Fut>(&mut self, name: &'static str, operation: F, context: &mut Context<Self>)
    where
        F: FnOnce(SharedSynchronizer) -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        let synchronizer = self.synchronizer.clone();
        context
            .spawn(async move |this: WeakEntity<Self>, context: &mut AsyncApp| {
                let mut operation = pin!(operation(synchronizer));
                let outcome = match futures::poll!(operation.as_mut()) {
                    Poll::Ready(outcome) => outcome,
                    Poll::Pending => {
                        if let Err(error) = this.update(context, |_, context| context.notify()) {
                            log::warn!("[view] {name} started after the window closed: {error}");
                        }
                        operation.await
                    }
                };
                log::debug!("[view] {name}: {outcome:?}");

                if let Err(error) = this.update(context, |this, context| {
                    if name == "initialize" {
                        this.shown_draft = None;
                    }
                    context.notify();
                }) {
                    log::warn!("[view] {name} finished after the window closed: {error}");
                }
            })
            .detach();
    }

    fn initialize(&mut self, context: &mut Context<Self>) {
        self.run(
            "initialize",
            |synchronizer| async move { synchronizer.initialize().await },
            context,
        );
    }

    fn toggle_process(&mut self, _: &ToggleProcess, _: &mut Window, context: &mut Context<Self>) {
        let controls = self.synchronizer.controls();
        if controls.stop {
            self.run(
                "stop",
                |synchronizer| async move { synchronizer.stop().await },
                context,
            );
        } else if controls.start {
            self.run(
                "start",
                |synchronizer| async move { synchronizer.start().await },
                context,
            );
        }
    }

    fn save(&mut self, _: &Save, _: &mut Window, context: &mut Context<Self>) {
        if !self.synchronizer.controls().save {
            return;
        }
        self.run(
            "save",
            |synchronizer| async move { synchronizer.save().await },
            context,
        );
    }

    fn toggle_proxy(&mut self, context: &mut Context<Self>) {
        self.run(
            "toggle_proxy",
            |synchronizer| async move { synchronizer.toggle_proxy().await },
            context,
        );
    }

    fn select_profile(&mut self, id: String, context: &mut Context<Self>) {
        self.run(
            "select_profile",
            move |synchronizer| async move { synchronizer.select_profile(&id).await },
            context,
        );
    }

    fn set_routing_mode(&mut self, mode: RoutingMode, context: &mut Context<Self>) {
        if self.synchronizer.set_routing_mode(mode) {
            context.notify();
        }
    }

    fn add_profile(&mut self, _: &AddProfile, _: &mut Window, context: &mut Context<Self>) {
        self.run(
            "add_profile",
            |synchronizer| async move { synchronizer.add_profile().await },
            context,
        );
    }

    fn rename_profile(&mut self, _: &RenameProfile, _: &mut Window, context: &mut Context<Self>) {
        self.run(
            "rename_profile",
            |synchronizer| async move { synchronizer.rename_profile().await },
            context,
        );
    }

    fn delete_profile(&mut self, _: &DeleteProfile, _: &mut Window, context: &mut Context<Self>) {
        self.run(
            "delete_profile",
            |synchronizer| async move { synchronizer.delete_profile().await },
            context,
        );
    }

    fn confirm_prompt(&mut self, _: &ConfirmPrompt, _: &mut Window, context: &mut Context<Self>) {
        let Some(prompt) = self.synchronizer.modal().current() else {
            return;
        };
        let answer = match prompt.kind {
            PromptKind::Text { .. } => {
                Answer::Text(self.prompt_input.read(context).text().to_string())
            }
            PromptKind::Confirm => Answer::Confirm,
        };
        self.synchronizer.modal().answer(answer);
        context.notify();
    }

    fn cancel_prompt(&mut self, _: &CancelPrompt, _: &mut Window, context: &mut Context<Self>) {
        self.synchronizer.modal().dismiss();
        context.notify();
    }

    /// Loads the form from the draft whenever a different draft takes its place.
    fn sync_inputs(&mut self, context: &mut Context<Self>) {
        let (id, values) = {
            let mirror = self.synchronizer.mirror();
            let Some(draft) = mirror.draft.as_ref() else {
                self.shown_draft = None;
                return;
            };
            let values: Vec<String> = self
                .inputs
                .iter()
                .map(|(field, _)| draft.value(*field).to_string())
                .collect();
            (draft.id().to_string(), values)
        };
        if self.shown_draft.as_deref() == Some(id.as_str()) {
            return;
        }

        for ((_, input), value) in self.inputs.iter().zip(values) {
            input.update(context, |input, context| input.set_text(&value, context));
        }
        log::debug!("[view] form loaded from {id}");
        self.shown_draft = Some(id);
    }

    fn sync_prompt(&mut self, window: &mut Window, context: &mut Context<Self>) -> Option<Prompt> {
        let prompt = self.synchronizer.modal().current();
        match prompt.as_ref() {
            Some(prompt) if !self.prompt_seeded => {
                self.prompt_seeded = true;
                match &prompt.kind {
                    PromptKind::Text { initial } => {
                        self.prompt_input
                            .update(context, |input, context| input.set_text(initial, context));
                        let handle = self.prompt_input.read(context).focus_handle(context);
                        window.focus(&handle, context);
                    }
                    PromptKind::Confirm => {
                        window.focus(&self.prompt_confirm_focus_handle, context);
                    }
                }
            }
            Some(_) => {}
            None => {
                if self.prompt_seeded {
                    window.focus(&self.focus_handle, context);
                }
                self.prompt_seeded = false;
            }
        }
        prompt
    }

    fn sync_log_scroll(&mut self) {
        let log = self.synchronizer.log();
        let tail = log.last().map(|line| (log.len(), line.clone()));
        drop(log);
        if tail != self.log_tail {
            self.log_tail = tail;
            self.log_scroll_handle.scroll_to_bottom();
        }
    }

    fn focus_order(&self, context: &App) -> Vec<FocusHandle> {
        let mut order = self.profile_focus_handles.clone();
        order.extend([
            self.add_focus_handle.clone(),
            self.rename_focus_handle.clone(),
            self.delete_focus_handle.clone(),
        ]);
        order.extend(
            self.inputs
                .iter()
                .map(|(_, input)| input.read(context).focus_handle(context)),
        );
        order.extend(self.routing_focus_handles.iter().cloned());
        order.extend([
            self.save_focus_handle.clone(),
            self.process_focus_handle.clone(),
            self.proxy_focus_handle.clone(),
        ]);
        order
    }

    fn focus_step(&mut self, forward: bool, window: &mut Window, context: &mut Context<Self>) {
        let order = self.focus_order(context);
        if order.is_empty() {
            return;
        }
        let current = order.iter().position(|handle| handle.is_focused(window));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => order.len() - 1,
            (Some(index), true) => (index + 1) % order.len(),
            (Some(index), false) => (index + order.len() - 1) % order.len(),
        };
        window.focus(&order[next], context);
    }

    fn focus_next(&mut self, _: &FocusNext, window: &mut Window, context: &mut Context<Self>) {
        self.focus_step(true, window, context);
    }

    fn focus_previous(
        &mut self,
        _: &FocusPrevious,
        window: &mut Window,
        context: &mut Context<Self>,
    ) {
        self.focus_step(false, window, context);
    }

    fn quit(&mut self, _: &Quit, _: &mut Window, context: &mut Context<Self>) {
        log::info!("[quit] shutting down");
        context.quit();
    }
}

impl Focusable for EchWorkersApp {
    fn focus_handle(&self, _: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

/// Everything a frame shows, read from the synchronizer in one pass.
struct Frame {
    ready: bool,
    connecting: bool,
    version: Option<String>,
    running: bool,
    confirming: bool,
    proxy_enabled: bool,
    proxy_label: &'static str,
    profiles: Vec<(String, String)>,
    selection: Option<String>,
    routing: Option<RoutingMode>,
    controls: Controls,
    saving: bool,
    saved: bool,
    starting: bool,
    stopping: bool,
    toggling_proxy: bool,
    profile_busy: bool,
    lines: Vec<LogLine>,
}

impl Frame {
    fn read(synchronizer: &Synchronizer<IpcBackend>) -> Self {
        let mirror = synchronizer.mirror();
        Self {
            ready: mirror.ready,
            connecting: synchronizer.is_busy(Operation::Initialize),
            version: mirror.version.clone(),
            running: mirror.process.is_running(),
            confirming: mirror.awaiting_confirmation(),
            proxy_enabled: mirror.proxy.is_enabled(),
            proxy_label: mirror.proxy.label(),
            profiles: mirror
                .profiles
                .iter()
                .map(|profile| (profile.id.clone(), profile.display_name().to_string()))
                .collect(),
            selection: mirror.selection.clone(),
            routing: mirror.draft.as_ref().map(|draft| draft.routing_mode()),
            controls: mirror.controls(),
            saving: synchronizer.is_busy(Operation::Save),
            saved: synchronizer.save_acknowledged(),
            starting: synchronizer.is_busy(Operation::Start),
            stopping: synchronizer.is_busy(Operation::Stop),
            toggling_proxy: synchronizer.is_busy(Operation::ToggleProxy),
            profile_busy: [
                Operation::SwitchProfile,
                Operation::AddProfile,
                Operation::RenameProfile,
                Operation::DeleteProfile,
            ]
            .into_iter()
            .any(|operation| synchronizer.is_busy(operation)),
            lines: synchronizer.log().lines().cloned().collect(),
        }
    }
}

impl Render for EchWorkersApp {
    fn render(&mut self, window: &mut Window, context: &mut Context<Self>) -> impl IntoElement {
        self.sync_inputs(context);
        self.sync_log_scroll();
        let prompt = self.sync_prompt(window, context);
        let frame = Frame::read(&self.synchronizer);

        let editing = frame.controls.editing;
        for (_, input) in &self.inputs {
            input.update(context, |input, _| input.disabled = !editing);
        }
        while self.profile_focus_handles.len() < frame.profiles.len() {
            self.profile_focus_handles.push(context.focus_handle());
        }

        div()
            .key_context("EchWorkersApp")
            .track_focus(&self.focus_handle(context))
            .on_action(context.listener(Self::toggle_process))
            .on_action(context.listener(Self::save))
            .on_action(context.listener(Self::add_profile))
            .on_action(context.listener(Self::rename_profile))
            .on_action(context.listener(Self::delete_profile))
            .on_action(context.listener(Self::focus_next))
            .on_action(context.listener(Self::focus_previous))
            .on_action(context.listener(Self::quit))
            .relative()
            .flex()
            .flex_col()
            .size_full()
            .bg(rgb(SURFACE))
            .child(self.render_titlebar(context))
            .child(
                div()
                    .flex()
                    .flex_row()
                    .flex_1()
                    .overflow_hidden()
                    .child(
                        div()
                            .id("profile-column")
                            .flex()
                            .flex_col()
                            .w(px(LEFT_COLUMN_WIDTH))
                            .flex_shrink_0()
                            .overflow_y_scroll()
                            .border_r_1()
                            .border_color(rgb(BORDER))
                            .px(px(PADDING_COLUMN))
                            .pb(px(PADDING_COLUMN))
                            .pt(px(PADDING_COLUMN_TOP))
                            .gap(px(GAP_MEDIUM))
                            .child(self.render_profile_list(&frame, context))
                            .child(self.render_fields())
                            .child(self.render_routing_selector(&frame, context)),
                    )
                    .child(
                        div()
                            .flex()
                            .flex_col()
                            .flex_1()
                            .overflow_hidden()
                            .px(px(PADDING_COLUMN))
                            .pb(px(PADDING_COLUMN))
                            .pt(px(PADDING_COLUMN_TOP))
                            .gap(px(GAP_MEDIUM))
                            .child(self.render_actions(&frame, context))
                            .child(self.render_status(&frame, context))
                            .child(self.render_log(&frame)),
                    ),
            )
            .when_some(prompt, |element, prompt| {
                element.child(self.render_prompt(&prompt, context))
            })
    }
}

impl EchWorkersApp {
    fn render_titlebar(&self, context: &mut Context<Self>) -> impl IntoElement {
        div()
            .flex()
            .flex_row()
            .items_center()
            .w_full()
            .h(px(TITLEBAR_HEIGHT))
            .bg(rgb(TITLEBAR_BACKGROUND))
            .child(
                titlebar_title("ECH Workers")
                    .cursor(CursorStyle::default())
                    .on_mouse_down(
                        MouseButton::Left,
                        context.listener(|_, _, window, _| window.start_window_move()),
                    ),
            )
            .child(titlebar_close().on_mouse_up(
                MouseButton::Left,
                context.listener(|this, _, window, context| this.quit(&Quit, window, context)),
            ))
    }

    fn render_profile_list(&self, frame: &Frame, context: &mut Context<Self>) -> impl IntoElement {
        let locked = !frame.controls.selector || frame.profile_busy;
        let mut list = div()
            .flex()
            .flex_col()
            .flex_1()
            .gap(px(GAP_EXTRA_SMALL))
            .overflow_hidden();
        for ((id, name), focus_handle) in frame.profiles.iter().zip(&self.profile_focus_handles) {
            let active = frame.selection.as_deref() == Some(id.as_str());
            let id = id.clone();
            list = list.child(profile_item(name, active, locked, focus_handle).when(
                !locked && !active,
                |element| {
                    element.on_mouse_up(
                        MouseButton::Left,
                        context.listener(move |this, _, _, context| {
                            this.select_profile(id.clone(), context);
                        }),
                    )
                },
            ));
        }

        let add_disabled = !frame.controls.add || frame.profile_busy;
        let rename_disabled = !frame.controls.rename || frame.profile_busy;
        let delete_disabled = !frame.controls.delete || frame.profile_busy;

        div()
            .flex()
            .flex_col()
            .gap(px(GAP_EXTRA_SMALL))
            .w_full()
            .child(label("Servers"))
            .child(
                div()
                    .flex()
                    .flex_row()
                    .gap(px(GAP_SMALL))
                    .w_full()
                    .child(list)
                    .child(
                        div()
                            .flex()
                            .flex_col()
                            .flex_shrink_0()
                            .w(px(PROFILE_BUTTON_WIDTH))
                            .gap(px(GAP_EXTRA_SMALL))
                            .child(
                                button_ghost("Add", add_disabled, &self.add_focus_handle).when(
                                    !add_disabled,
                                    |element| {
                                        element.on_mouse_up(
                                            MouseButton::Left,
                                            context.listener(|this, _, window, context| {
                                                this.add_profile(&AddProfile, window, context);
                                            }),
                                        )
                                    },
                                ),
                            )
                            .child(
                                button_ghost("Rename", rename_disabled, &self.rename_focus_handle)
                                    .when(!rename_disabled, |element| {
                                        element.on_mouse_up(
                                            MouseButton::Left,
                                            context.listener(|this, _, window, context| {
                                                this.rename_profile(
                                                    &RenameProfile,
                                                    window,
                                                    context,
                                                );
                                            }),
                                        )
                                    }),
                            )
                            .child(
                                button_ghost("Delete", delete_disabled, &self.delete_focus_handle)
                                    .when(!delete_disabled, |element| {
                                        element.on_mouse_up(
                                            MouseButton::Left,
                                            context.listener(|this, _, window, context| {
                                                this.delete_profile(
                                                    &DeleteProfile,
                                                    window,
                                                    context,
                                                );
                                            }),
                                        )
                                    }),
                            ),
                    ),
            )
    }

    fn render_fields(&self) -> impl IntoElement {
        self.inputs.iter().fold(
            div().flex().flex_col().gap(px(GAP_SMALL)),
            |column, (kind, input)| column.child(field(kind.label(), input)),
        )
    }

    fn render_routing_selector(
        &self,
        frame: &Frame,
        context: &mut Context<Self>,
    ) -> impl IntoElement {
        let locked = !frame.controls.editing;
        let row = RoutingMode::ALL
            .into_iter()
            .zip(&self.routing_focus_handles)
            .fold(selector_row(), |row, (mode, focus_handle)| {
                row.child(
                    selector_option(mode.label(), frame.routing == Some(mode), locked, focus_handle)
                        .when(!locked, |element| {
                            element.on_mouse_up(
                                MouseButton::Left,
                                context.listener(move |this, _, _, context| {
                                    this.set_routing_mode(mode, context);
                                }),
                            )
                        }),
                )
            });
        selector("Routing", row)
    }

    fn render_actions(&self, frame: &Frame, context: &mut Context<Self>) -> impl IntoElement {
        let save_disabled = !frame.controls.save || frame.saving;
        let save_label = if frame.saved {
            "Saved"
        } else if frame.saving {
            "Saving…"
        } else {
            "Save"
        };

        let process_busy = frame.starting || frame.stopping;
        let (process_label, background, hover) = match (frame.running, process_busy) {
            (_, true) if frame.stopping => ("Stopping…", BUTTON_DANGER, BUTTON_DANGER_HOVER),
            (_, true) => ("Starting…", BUTTON_PRIMARY, BUTTON_HOVER),
            (true, false) => ("Stop", BUTTON_DANGER, BUTTON_DANGER_HOVER),
            (false, false) => ("Start", BUTTON_PRIMARY, BUTTON_HOVER),
        };
        let process_disabled = process_busy
            || frame.toggling_proxy
            || !(frame.controls.start || frame.controls.stop);
        let proxy_locked =
            !frame.controls.proxy_toggle || frame.toggling_proxy || frame.stopping;

        div()
            .flex()
            .flex_col()
            .gap(px(GAP_SMALL))
            .child(
                button_ghost(save_label, save_disabled, &self.save_focus_handle).when(
                    !save_disabled,
                    |element| {
                        element.on_mouse_up(
                            MouseButton::Left,
                            context.listener(|this, _, window, context| {
                                this.save(&Save, window, context);
                            }),
                        )
                    },
                ),
            )
            .child(
                button_action(
                    process_label,
                    background,
                    hover,
                    process_disabled,
                    &self.process_focus_handle,
                )
                .when(!process_disabled, |element| {
                    element.on_mouse_up(
                        MouseButton::Left,
                        context.listener(|this, _, window, context| {
                            this.toggle_process(&ToggleProcess, window, context);
                        }),
                    )
                }),
            )
            .child(toggle(
                "System proxy",
                frame.proxy_enabled,
                proxy_locked,
                &self.proxy_focus_handle,
                context.listener(|this, _, _, context| this.toggle_proxy(context)),
            ))
    }

    fn render_status(&self, frame: &Frame, context: &mut Context<Self>) -> impl IntoElement {
        let (text, color, detail) = if !frame.ready {
            if frame.connecting {
                ("Connecting to backend".to_string(), COLOR_YELLOW, String::new())
            } else {
                (
                    "Backend unavailable".to_string(),
                    COLOR_RED,
                    "See the log below, then retry".to_string(),
                )
            }
        } else {
            let (text, color) = match (frame.running, frame.confirming) {
                (true, false) => ("Running", COLOR_GREEN),
                (false, false) => ("Stopped", COLOR_GRAY),
                (true, true) => ("Running (confirming)", COLOR_YELLOW),
                (false, true) => ("Stopped (confirming)", COLOR_YELLOW),
            };
            let version = frame
                .version
                .as_deref()
                .map(|version| format!(" · backend v{version}"))
                .unwrap_or_default();
            (
                text.to_string(),
                color,
                format!("{}{version}", frame.proxy_label),
            )
        };
        let offer_retry = !frame.ready && !frame.connecting;

        div()
            .flex()
            .flex_col()
            .gap(px(GAP_EXTRA_SMALL))
            .px(px(PADDING_INPUT_HORIZONTAL))
            .child(
                div()
                    .flex()
                    .flex_row()
                    .items_center()
                    .gap(px(GAP_SMALL))
                    .child(status_dot(color))
                    .child(status_label(text, color)),
            )
            .when(!detail.is_empty(), |element| {
                element.child(status_detail(detail))
            })
            .when(offer_retry, |element| {
                element.child(
                    button_ghost("Retry", false, &self.retry_focus_handle).on_mouse_up(
                        MouseButton::Left,
                        context.listener(|this, _, _, context| this.initialize(context)),
                    ),
                )
            })
    }

    fn render_log(&self, frame: &Frame) -> impl IntoElement {
        let mut container = log_container().track_scroll(&self.log_scroll_handle);
        if frame.lines.is_empty() {
            container = container.child(log_placeholder("No output yet"));
        }
        for line in &frame.lines {
            container = container.child(log_line(line));
        }

        div()
            .flex()
            .flex_col()
            .flex_1()
            .overflow_hidden()
            .gap(px(GAP_EXTRA_SMALL))
            .child(label("Log"))
            .child(container)
    }

    fn render_prompt(&self, prompt: &Prompt, context: &mut Context<Self>) -> impl IntoElement {
        let body = match prompt.kind {
            PromptKind::Text { .. } => Some(div().child(self.prompt_input.clone())),
            PromptKind::Confirm => None,
        };
        let confirm_label = match prompt.kind {
            PromptKind::Text { .. } => "OK",
            PromptKind::Confirm => "Delete",
        };

        let buttons = selector_row()
            .child(
                button_ghost("Cancel", false, &self.prompt_cancel_focus_handle).on_mouse_up(
                    MouseButton::Left,
                    context.listener(|this, _, window, context| {
                        this.cancel_prompt(&CancelPrompt, window, context);
                    }),
                ),
            )
            .child(
                button_action(
                    confirm_label,
                    BUTTON_PRIMARY,
                    BUTTON_HOVER,
                    false,
                    &self.prompt_confirm_focus_handle,
                )
                .on_mouse_up(
                    MouseButton::Left,
                    context.listener(|this, _, window, context| {
                        this.confirm_prompt(&ConfirmPrompt, window, context);
                    }),
                ),
            );

        prompt_overlay(&prompt.title, &prompt.message, body, buttons)
            .key_context("Prompt")
            .on_action(context.listener(Self::confirm_prompt))
            .on_action(context.listener(Self::cancel_prompt))
            .occlude()
    }
}
