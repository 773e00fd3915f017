use anyhow::Context;
use tauri::{AppHandle, Manager, RunEvent, Window, WindowEvent};
use tauri_plugin_updater::UpdaterExt;

use crate::config::ShellConfig;
use crate::host::TauriWindowFactory;
use crate::preferences::{Preferences, YamlFileBackend};
use crate::shortcuts::register_shortcuts;
use crate::state::ShellState;
use crate::tray;
use crate::window::WindowController;
use crate::window_state::WindowStateKeeper;

/// Whether closing the last window should end the process on `os`.
pub fn quits_when_windows_closed(os: &str) -> bool {
    os != "macos"
}

/// Preferences, then tray, then shortcuts, then the main window. Each step
/// reads state the previous one set up.
pub fn startup(app: &AppHandle, config: ShellConfig) -> anyhow::Result<()> {
    let backend = YamlFileBackend::open(&config.config_dir).with_context(|| {
        format!("unable to open preferences in {}", config.config_dir.display())
    })?;
    log::info!("Preferences loaded from {}", backend.path().display());

    let mut preferences = Preferences::new(backend);
    preferences
        .init_defaults()
        .context("unable to write default preferences")?;

    let window_state = WindowStateKeeper::load(&config.config_dir);
    let factory = TauriWindowFactory::new(app.clone(), &config);
    let controller = WindowController::new(preferences, factory, window_state);
    let snapshot = controller.preferences().snapshot();
    let checks_for_updates = config.checks_for_updates();
    app.manage(ShellState::new(controller));

    tray::init_tray(app, &snapshot).context("unable to create tray icon")?;

    let report = register_shortcuts(app);
    log::info!(
        "Registered {} of {} global shortcuts",
        report.registered.len(),
        report.registered.len() + report.failed.len()
    );

    let state = app.state::<ShellState>();
    if let Err(error) = state.controller.lock().create_or_replace_window() {
        log::error!("Failed to create main window: {error}");
    }

    if checks_for_updates {
        spawn_update_check(app.clone());
    }

    Ok(())
}

/// The single-instance callback may arrive off the main thread, where window
/// calls wait on the event loop. Hop over before taking the controller lock.
pub fn on_second_instance(app: &AppHandle) {
    log::info!("Second instance launched, focusing the main window");
    let handle = app.clone();
    if let Err(error) = app.run_on_main_thread(move || focus_main_window(&handle)) {
        log::warn!("Failed to schedule main window focus: {error}");
    }
}

fn focus_main_window(app: &AppHandle) {
    if let Some(state) = app.try_state::<ShellState>() {
        if let Err(error) = state.controller.lock().focus_existing() {
            log::warn!("Failed to focus main window: {error}");
        }
    }
}

/// Destroy events may fire while a controller action holds the lock (the
/// replaced window during a frame toggle), hence `try_lock`.
pub fn handle_window_event(window: &Window, event: &WindowEvent) {
    let Some(state) = window.app_handle().try_state::<ShellState>() else {
        return;
    };

    match event {
        WindowEvent::CloseRequested { .. } => {
            if let Some(mut controller) = state.controller.try_lock() {
                if controller.current_label() == Some(window.label()) {
                    if let Err(error) = controller.save_geometry() {
                        log::warn!("Unable to save window state: {error}");
                    }
                }
            }
        }
        WindowEvent::Destroyed => {
            if let Some(mut controller) = state.controller.try_lock() {
                controller.window_destroyed(window.label());
            }
        }
        _ => {}
    }
}

pub fn handle_run_event(app: &AppHandle, event: RunEvent) {
    match event {
        RunEvent::ExitRequested { code, api, .. } => {
            if code.is_none() && !quits_when_windows_closed(std::env::consts::OS) {
                log::debug!("All windows closed, staying resident");
                api.prevent_exit();
            }
        }
        RunEvent::Exit => {
            if let Some(state) = app.try_state::<ShellState>() {
                if let Some(mut controller) = state.controller.try_lock() {
                    if let Err(error) = controller.save_geometry() {
                        log::warn!("Unable to save window state: {error}");
                    }
                }
            }
            log::info!("Plex Viewer exiting");
        }
        _ => {}
    }
}

fn spawn_update_check(app: AppHandle) {
    tauri::async_runtime::spawn(async move {
        let updater = match app.updater() {
            Ok(updater) => updater,
            Err(error) => {
                log::warn!("Failed check updates: {error}");
                return;
            }
        };
        match updater.check().await {
            Ok(Some(update)) => log::info!("Update {} is available", update.version),
            Ok(None) => log::debug!("No updates available"),
            Err(error) => log::warn!("Failed check updates: {error}"),
        }
    });
}
