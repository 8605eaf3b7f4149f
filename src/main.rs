mod app;
mod components;
mod text_input;
mod theme;

use std::rc::Rc;

use gpui::{
    Application, Bounds, Focusable, KeyBinding, WindowBackgroundAppearance, WindowBounds,
    WindowOptions, prelude::*, px, size,
};

use ech_workers_ui::{IpcBackend, Settings, Synchronizer};

use crate::{
    app::{
        AddProfile, CancelPrompt, ConfirmPrompt, DeleteProfile, EchWorkersApp, FocusNext,
        FocusPrevious, Quit, RenameProfile, Save, ToggleProcess,
    },
    text_input::{
        Backspace, Copy, Cut, Delete, End, Home, Left, Paste, Right, SelectAll, SelectLeft,
        SelectRight,
    },
    theme::{WINDOW_HEIGHT, WINDOW_WIDTH},
};

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("ech_workers_ui=info"),
    )
    .init();

    log::info!(
        "ech-workers-ui v{} starting (RUST_LOG={})",
        env!("CARGO_PKG_VERSION"),
        std::env::var("RUST_LOG").unwrap_or_else(|_| "<default: info>".into()),
    );

    let settings = Settings::load();
    log::info!(
        "[startup] backend={}, connect timeout={:?}, confirmation timeout={:?}, poll interval={:?}",
        settings.backend_address,
        settings.connect_timeout(),
        settings.confirmation_timeout(),
        settings.poll_interval(),
    );

    Application::new().run(move |context| {
        let bounds = Bounds::centered(None, size(px(WINDOW_WIDTH), px(WINDOW_HEIGHT)), context);

        bind_keys(context);

        let backend = IpcBackend::new(settings.backend_address.clone())
            .with_timeout(settings.connect_timeout());
        let events = backend.take_events();
        let synchronizer = Rc::new(Synchronizer::new(backend, &settings));
        let poll_interval = settings.poll_interval();

        let window = context.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                titlebar: None,
                window_background: WindowBackgroundAppearance::Opaque,
                ..Default::default()
            },
            |_, context| {
                context.new(|context| {
                    EchWorkersApp::new(synchronizer, events, poll_interval, context)
                })
            },
        );

        match window {
            Ok(window) => {
                if let Err(error) = window.update(context, |view, window, context| {
                    let handle = view.focus_handle(context);
                    window.focus(&handle, context);
                    context.activate(true);
                }) {
                    log::error!("[startup] failed to initialize application window: {error}");
                    context.quit();
                    return;
                }

                context.on_action(|_: &Quit, context| context.quit());
            }
            Err(error) => {
                log::error!("[startup] failed to open application window: {error}");
                context.quit();
            }
        }
    });
}

fn bind_keys(context: &mut gpui::App) {
    context.bind_keys([
        KeyBinding::new("backspace", Backspace, Some("TextInput")),
        KeyBinding::new("delete", Delete, Some("TextInput")),
        KeyBinding::new("left", Left, Some("TextInput")),
        KeyBinding::new("right", Right, Some("TextInput")),
        KeyBinding::new("shift-left", SelectLeft, Some("TextInput")),
        KeyBinding::new("shift-right", SelectRight, Some("TextInput")),
        KeyBinding::new("home", Home, Some("TextInput")),
        KeyBinding::new("end", End, Some("TextInput")),
        KeyBinding::new("cmd-a", SelectAll, Some("TextInput")),
        KeyBinding::new("cmd-v", Paste, Some("TextInput")),
        KeyBinding::new("cmd-c", Copy, Some("TextInput")),
        KeyBinding::new("cmd-x", Cut, Some("TextInput")),
        KeyBinding::new("ctrl-a", SelectAll, Some("TextInput")),
        KeyBinding::new("ctrl-v", Paste, Some("TextInput")),
        KeyBinding::new("ctrl-c", Copy, Some("TextInput")),
        KeyBinding::new("ctrl-x", Cut, Some("TextInput")),
    ]);

    context.bind_keys([
        KeyBinding::new("enter", ConfirmPrompt, Some("Prompt")),
        KeyBinding::new("escape", CancelPrompt, Some("Prompt")),
    ]);

    context.bind_keys([
        KeyBinding::new("tab", FocusNext, Some("EchWorkersApp")),
        KeyBinding::new("shift-tab", FocusPrevious, Some("EchWorkersApp")),
        KeyBinding::new("enter", ToggleProcess, Some("EchWorkersApp")),
        KeyBinding::new("cmd-s", Save, Some("EchWorkersApp")),
        KeyBinding::new("ctrl-s", Save, Some("EchWorkersApp")),
        KeyBinding::new("cmd-n", AddProfile, Some("EchWorkersApp")),
        KeyBinding::new("ctrl-n", AddProfile, Some("EchWorkersApp")),
        KeyBinding::new("f2", RenameProfile, Some("EchWorkersApp")),
        KeyBinding::new("cmd-backspace", DeleteProfile, Some("EchWorkersApp")),
        KeyBinding::new("ctrl-delete", DeleteProfile, Some("EchWorkersApp")),
        KeyBinding::new("cmd-q", Quit, Some("EchWorkersApp")),
        KeyBinding::new("ctrl-q", Quit, Some("EchWorkersApp")),
    ]);
}
