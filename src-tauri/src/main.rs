#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod commands;
mod config;
mod error;
mod host;
mod lifecycle;
mod preferences;
mod shortcuts;
mod state;
#[cfg(test)]
mod testing;
mod tray;
mod window;
mod window_state;

use tauri_plugin_log::{Target, TargetKind};

use commands::{
    shell_preferences, shell_set_aspect_ratio, shell_set_left_panel_hidden,
    shell_set_simple_player_mode, shell_version,
};
use config::ShellConfig;

fn main() {
    let config = ShellConfig::from_env();
    let log_level = config.log_level;

    tauri::Builder::default()
        // Must come first so a second launch exits before anything else runs.
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            lifecycle::on_second_instance(app);
        }))
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(log_level)
                .clear_targets()
                .targets([
                    Target::new(TargetKind::Stdout),
                    Target::new(TargetKind::LogDir {
                        file_name: Some("plex-viewer".into()),
                    }),
                ])
                .build(),
        )
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_updater::Builder::new().build())
        .on_window_event(lifecycle::handle_window_event)
        .setup(move |app| {
            lifecycle::startup(app.handle(), config)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            shell_preferences,
            shell_set_aspect_ratio,
            shell_set_left_panel_hidden,
            shell_set_simple_player_mode,
            shell_version
        ])
        .build(tauri::generate_context!())
        .expect("error while building Plex Viewer")
        .run(lifecycle::handle_run_event);
}
