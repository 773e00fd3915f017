use tauri::{AppHandle, Manager};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, ShortcutState};

use crate::error::Result;
use crate::preferences::PreferenceBackend;
use crate::state::ShellState;
use crate::window::{PageMessage, WindowController, WindowFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    ToggleWindow,
    ToggleFrame,
    Page(PageMessage),
}

/// Global combinations, registered once at startup.
pub const BINDINGS: &[(&str, ShortcutAction)] = &[
    ("Shift+Control+X", ShortcutAction::ToggleWindow),
    ("Shift+Control+Z", ShortcutAction::ToggleFrame),
    ("MediaTrackNext", ShortcutAction::Page(PageMessage::Next)),
    ("MediaPlayPause", ShortcutAction::Page(PageMessage::PlayPause)),
    ("MediaTrackPrevious", ShortcutAction::Page(PageMessage::Previous)),
    ("Shift+Control+ArrowLeft", ShortcutAction::Page(PageMessage::Back)),
    ("Shift+Control+ArrowRight", ShortcutAction::Page(PageMessage::Forward)),
    // `>` and `<` on US layouts
    ("Shift+Control+Period", ShortcutAction::Page(PageMessage::Next)),
    ("Shift+Control+Comma", ShortcutAction::Page(PageMessage::Previous)),
    ("Shift+Control+M", ShortcutAction::Page(PageMessage::SimplePlayerMode)),
];

#[derive(Debug, Default)]
pub struct RegistrationReport {
    pub registered: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
}

pub fn dispatch<F, B>(controller: &mut WindowController<F, B>, action: ShortcutAction) -> Result<()>
where
    F: WindowFactory,
    B: PreferenceBackend,
{
    match action {
        ShortcutAction::ToggleWindow => controller.toggle_visibility(),
        ShortcutAction::ToggleFrame => controller.toggle_frame(),
        ShortcutAction::Page(message) => controller.send(message),
    }
}

/// Binds every entry of [`BINDINGS`]. A combination owned by another process
/// is logged and skipped.
pub fn register_shortcuts(app: &AppHandle) -> RegistrationReport {
    let manager = app.global_shortcut();
    let mut report = RegistrationReport::default();

    for &(combo, action) in BINDINGS {
        let result = manager.on_shortcut(combo, move |app, _shortcut, event| {
            if event.state() != ShortcutState::Pressed {
                return;
            }
            let Some(state) = app.try_state::<ShellState>() else {
                return;
            };
            let mut controller = state.controller.lock();
            if let Err(error) = dispatch(&mut controller, action) {
                log::warn!("Shortcut {combo} failed: {error}");
            }
        });

        match result {
            Ok(()) => report.registered.push(combo),
            Err(error) => {
                log::warn!("Unable to register shortcut {combo}: {error}");
                report.failed.push((combo, error.to_string()));
            }
        }
    }

    report
}
