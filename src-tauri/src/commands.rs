//! IPC commands for the page.
//!
//! Everything that locks the controller is a synchronous command, which Tauri
//! runs on the main thread. Window getters and setters called from any other
//! thread block on a main-thread round trip, so holding the controller lock
//! there would deadlock against the tray and shortcut handlers.

use parking_lot::Mutex;
use tauri::{AppHandle, State};

use crate::preferences::{PreferenceBackend, PreferenceSnapshot};
use crate::state::ShellState;
use crate::window::{WindowController, WindowFactory};

fn preferences_snapshot<F, B>(controller: &Mutex<WindowController<F, B>>) -> PreferenceSnapshot
where
    F: WindowFactory,
    B: PreferenceBackend,
{
    controller.lock().preferences().snapshot()
}

fn set_left_panel_hidden<F, B>(controller: &Mutex<WindowController<F, B>>, hidden: bool) -> Result<(), String>
where
    F: WindowFactory,
    B: PreferenceBackend,
{
    controller
        .lock()
        .preferences_mut()
        .set_left_panel_hidden(hidden)
        .map_err(|error| error.to_string())
}

fn set_simple_player_mode<F, B>(controller: &Mutex<WindowController<F, B>>, enabled: bool) -> Result<(), String>
where
    F: WindowFactory,
    B: PreferenceBackend,
{
    controller
        .lock()
        .preferences_mut()
        .set_simple_player_mode(enabled)
        .map_err(|error| error.to_string())
}

fn set_aspect_ratio<F, B>(controller: &Mutex<WindowController<F, B>>, ratio: &str, direction: &str) -> Result<(), String>
where
    F: WindowFactory,
    B: PreferenceBackend,
{
    controller
        .lock()
        .set_aspect_ratio(ratio, direction)
        .map_err(|error| error.to_string())
}

#[tauri::command]
pub fn shell_preferences(state: State<'_, ShellState>) -> PreferenceSnapshot {
    preferences_snapshot(&state.controller)
}

#[tauri::command]
pub fn shell_set_left_panel_hidden(state: State<'_, ShellState>, hidden: bool) -> Result<(), String> {
    set_left_panel_hidden(&state.controller, hidden)
}

#[tauri::command]
pub fn shell_set_simple_player_mode(state: State<'_, ShellState>, enabled: bool) -> Result<(), String> {
    set_simple_player_mode(&state.controller, enabled)
}

/// Unknown ratio or direction values are ignored.
#[tauri::command]
pub fn shell_set_aspect_ratio(state: State<'_, ShellState>, ratio: String, direction: String) -> Result<(), String> {
    set_aspect_ratio(&state.controller, &ratio, &direction)
}

#[tauri::command]
pub async fn shell_version(app: AppHandle) -> Result<String, String> {
    Ok(app.package_info().version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::controller;

    #[test]
    fn aspect_ratio_resizes_window_and_releases_lock() {
        let (controller, factory) = controller();
        let controller = Mutex::new(controller);
        controller.lock().create_or_replace_window().unwrap();
        factory.last().load_page();

        set_aspect_ratio(&controller, "16:9", "vertical").unwrap();

        let state = factory.last().state();
        assert_eq!((state.width, state.height), (600, 338));
        assert!(controller.try_lock().is_some());
    }

    #[test]
    fn unknown_aspect_ratio_is_ignored() {
        let (controller, factory) = controller();
        let controller = Mutex::new(controller);
        controller.lock().create_or_replace_window().unwrap();

        set_aspect_ratio(&controller, "21:9", "vertical").unwrap();
        set_aspect_ratio(&controller, "4:3", "diagonal").unwrap();

        let state = factory.last().state();
        assert_eq!((state.width, state.height), (600, 500));
    }

    #[test]
    fn page_owned_settings_show_up_in_snapshot() {
        let (controller, _) = controller();
        let controller = Mutex::new(controller);

        set_left_panel_hidden(&controller, true).unwrap();
        set_simple_player_mode(&controller, true).unwrap();

        let snapshot = preferences_snapshot(&controller);
        assert!(snapshot.left_panel_hidden);
        assert!(snapshot.simple_player_mode);
        assert!(controller.try_lock().is_some());
    }
}
