use std::collections::HashMap;

use tauri::{
    menu::{CheckMenuItem, CheckMenuItemBuilder, Menu, MenuBuilder, MenuItemBuilder, MenuItemKind, SubmenuBuilder},
    tray::{TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager, Wry,
};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tauri_plugin_opener::OpenerExt;

use crate::config::{BUG_REPORT_URL, PRODUCT_DESCRIPTION, PRODUCT_LICENSE, PRODUCT_NAME};
use crate::error::Result;
use crate::preferences::{PreferenceBackend, PreferenceSnapshot};
use crate::state::ShellState;
use crate::window::{AspectRatio, ResizeDirection, WindowController, WindowFactory};

const TRAY_ICON_ID: &str = "plex-viewer-tray";
const TRAY_ID_TOGGLE: &str = "tray-toggle";
const TRAY_ID_ABOUT: &str = "tray-about";
const TRAY_ID_QUIT: &str = "tray-quit";
const ASPECT_PREFIX: &str = "aspect-";
const OPACITY_PREFIX: &str = "opacity-";
const AUTO_PAUSE_PREFIX: &str = "auto-pause-";
const LOCK_PREFIX: &str = "lock-";
const WORKSPACES_PREFIX: &str = "workspaces-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    AspectRatio(AspectRatio, ResizeDirection),
    /// Opacity in tenths, 1..=10.
    Opacity(u8),
    AutoPause(bool),
    LockWindow(bool),
    AllWorkspaces(bool),
    ToggleWindow,
    About,
    Quit,
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn parse_on_off(raw: &str) -> Option<bool> {
    match raw {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

impl TrayCommand {
    pub fn id(&self) -> String {
        match self {
            TrayCommand::AspectRatio(ratio, direction) => {
                format!("{ASPECT_PREFIX}{}-{}", ratio.as_str(), direction.as_str())
            }
            TrayCommand::Opacity(tenths) => format!("{OPACITY_PREFIX}{tenths}"),
            TrayCommand::AutoPause(value) => format!("{AUTO_PAUSE_PREFIX}{}", on_off(*value)),
            TrayCommand::LockWindow(value) => format!("{LOCK_PREFIX}{}", on_off(*value)),
            TrayCommand::AllWorkspaces(value) => format!("{WORKSPACES_PREFIX}{}", on_off(*value)),
            TrayCommand::ToggleWindow => TRAY_ID_TOGGLE.into(),
            TrayCommand::About => TRAY_ID_ABOUT.into(),
            TrayCommand::Quit => TRAY_ID_QUIT.into(),
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        match id {
            TRAY_ID_TOGGLE => return Some(TrayCommand::ToggleWindow),
            TRAY_ID_ABOUT => return Some(TrayCommand::About),
            TRAY_ID_QUIT => return Some(TrayCommand::Quit),
            _ => {}
        }

        if let Some(rest) = id.strip_prefix(ASPECT_PREFIX) {
            let (ratio, direction) = rest.split_once('-')?;
            return Some(TrayCommand::AspectRatio(
                AspectRatio::parse(ratio)?,
                ResizeDirection::parse(direction)?,
            ));
        }
        if let Some(rest) = id.strip_prefix(OPACITY_PREFIX) {
            let tenths = rest.parse::<u8>().ok().filter(|tenths| (1..=10).contains(tenths))?;
            return Some(TrayCommand::Opacity(tenths));
        }
        if let Some(rest) = id.strip_prefix(AUTO_PAUSE_PREFIX) {
            return parse_on_off(rest).map(TrayCommand::AutoPause);
        }
        if let Some(rest) = id.strip_prefix(LOCK_PREFIX) {
            return parse_on_off(rest).map(TrayCommand::LockWindow);
        }
        if let Some(rest) = id.strip_prefix(WORKSPACES_PREFIX) {
            return parse_on_off(rest).map(TrayCommand::AllWorkspaces);
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrayItem {
    pub command: TrayCommand,
    pub label: String,
    /// `Some` for single-select choices.
    pub checked: Option<bool>,
}

impl TrayItem {
    fn action(command: TrayCommand, label: impl Into<String>) -> Self {
        Self {
            command,
            label: label.into(),
            checked: None,
        }
    }

    fn choice(command: TrayCommand, label: impl Into<String>, checked: bool) -> Self {
        Self {
            command,
            label: label.into(),
            checked: Some(checked),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrayNode {
    Submenu { label: &'static str, items: Vec<TrayItem> },
    Item(TrayItem),
    Separator,
}

fn on_off_choices(make: fn(bool) -> TrayCommand, current: bool) -> Vec<TrayItem> {
    vec![
        TrayItem::choice(make(true), "On", current),
        TrayItem::choice(make(false), "Off", !current),
    ]
}

/// Describes the tray menu for the given preference values. Checked state is
/// captured here and not refreshed afterwards.
pub fn menu_model(preferences: &PreferenceSnapshot) -> Vec<TrayNode> {
    let aspect = [
        (AspectRatio::FourThree, ResizeDirection::Horizontal, "4:3 (Horizontal)"),
        (AspectRatio::FourThree, ResizeDirection::Vertical, "4:3 (Vertical)"),
        (AspectRatio::SixteenNine, ResizeDirection::Horizontal, "16:9 (Horizontal)"),
        (AspectRatio::SixteenNine, ResizeDirection::Vertical, "16:9 (Vertical)"),
    ]
    .into_iter()
    .map(|(ratio, direction, label)| TrayItem::action(TrayCommand::AspectRatio(ratio, direction), label))
    .collect();

    let opacity = (1..=10u8)
        .map(|tenths| {
            let value = f64::from(tenths) / 10.0;
            TrayItem::choice(
                TrayCommand::Opacity(tenths),
                format!("{value:.1}"),
                (preferences.window_opacity - value).abs() < 1e-9,
            )
        })
        .collect();

    vec![
        TrayNode::Submenu {
            label: "Aspect Ratio",
            items: aspect,
        },
        TrayNode::Submenu {
            label: "Window Opacity",
            items: opacity,
        },
        TrayNode::Submenu {
            label: "Pause on Minimize",
            items: on_off_choices(TrayCommand::AutoPause, preferences.auto_pause),
        },
        TrayNode::Submenu {
            label: "Lock Window",
            items: on_off_choices(TrayCommand::LockWindow, preferences.position_locked),
        },
        TrayNode::Submenu {
            label: "Show on All Workspaces",
            items: on_off_choices(TrayCommand::AllWorkspaces, preferences.show_on_all_workspaces),
        },
        TrayNode::Item(TrayItem::action(TrayCommand::ToggleWindow, "Toggle Window")),
        TrayNode::Item(TrayItem::action(TrayCommand::About, "About")),
        TrayNode::Separator,
        TrayNode::Item(TrayItem::action(TrayCommand::Quit, "Quit")),
    ]
}

/// Every member of the single-select group `command` belongs to, paired with
/// whether it is checked once `command` has been chosen. Empty for plain
/// actions.
pub fn group_selection(command: TrayCommand) -> Vec<(TrayCommand, bool)> {
    let members: Vec<TrayCommand> = match command {
        TrayCommand::Opacity(_) => (1..=10u8).map(TrayCommand::Opacity).collect(),
        TrayCommand::AutoPause(_) => vec![TrayCommand::AutoPause(true), TrayCommand::AutoPause(false)],
        TrayCommand::LockWindow(_) => vec![TrayCommand::LockWindow(true), TrayCommand::LockWindow(false)],
        TrayCommand::AllWorkspaces(_) => {
            vec![TrayCommand::AllWorkspaces(true), TrayCommand::AllWorkspaces(false)]
        }
        TrayCommand::AspectRatio(..) | TrayCommand::ToggleWindow | TrayCommand::About | TrayCommand::Quit => {
            Vec::new()
        }
    };
    members.into_iter().map(|member| (member, member == command)).collect()
}

/// Check item handles by id. Native check items toggle themselves on click
/// and know nothing of their siblings.
struct TrayChecks(HashMap<String, CheckMenuItem<Wry>>);

impl TrayChecks {
    fn select(&self, command: TrayCommand) {
        for (member, checked) in group_selection(command) {
            let id = member.id();
            let Some(item) = self.0.get(&id) else {
                continue;
            };
            if let Err(error) = item.set_checked(checked) {
                log::warn!("Failed to update tray item {id}: {error}");
            }
        }
    }
}

/// Runs a command that only touches the window and preferences. Returns
/// `false` for commands that need the application (about, quit).
pub fn apply_command<F, B>(controller: &mut WindowController<F, B>, command: TrayCommand) -> Result<bool>
where
    F: WindowFactory,
    B: PreferenceBackend,
{
    match command {
        TrayCommand::AspectRatio(ratio, direction) => controller.apply_aspect_ratio(ratio, direction)?,
        TrayCommand::Opacity(tenths) => controller.set_opacity(f64::from(tenths) / 10.0)?,
        TrayCommand::AutoPause(enabled) => controller.set_auto_pause(enabled)?,
        TrayCommand::LockWindow(locked) => controller.set_position_locked(locked)?,
        TrayCommand::AllWorkspaces(show) => controller.set_workspace_pinning(show)?,
        TrayCommand::ToggleWindow => controller.toggle_visibility()?,
        TrayCommand::About | TrayCommand::Quit => return Ok(false),
    }
    Ok(true)
}

pub fn init_tray(app: &AppHandle, preferences: &PreferenceSnapshot) -> tauri::Result<()> {
    let mut checks = HashMap::new();
    let menu = build_menu(app, &menu_model(preferences), &mut checks)?;
    app.manage(TrayChecks(checks));

    let mut builder = TrayIconBuilder::with_id(TRAY_ICON_ID)
        .tooltip(PRODUCT_NAME)
        .menu(&menu)
        .on_menu_event(|app_handle, event| handle_menu_selection(app_handle, event.id().as_ref()))
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::DoubleClick { .. } = event {
                toggle_window(tray.app_handle());
            }
        });

    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone());
    }

    builder.build(app)?;
    Ok(())
}

fn build_item(
    app: &AppHandle,
    item: &TrayItem,
    checks: &mut HashMap<String, CheckMenuItem<Wry>>,
) -> tauri::Result<MenuItemKind<Wry>> {
    let id = item.command.id();
    Ok(match item.checked {
        Some(checked) => {
            let check = CheckMenuItemBuilder::with_id(id.clone(), &item.label)
                .checked(checked)
                .build(app)?;
            checks.insert(id, check.clone());
            MenuItemKind::Check(check)
        }
        None => MenuItemKind::MenuItem(MenuItemBuilder::with_id(id, &item.label).build(app)?),
    })
}

fn build_menu(
    app: &AppHandle,
    nodes: &[TrayNode],
    checks: &mut HashMap<String, CheckMenuItem<Wry>>,
) -> tauri::Result<Menu<Wry>> {
    let mut builder = MenuBuilder::new(app);

    for node in nodes {
        builder = match node {
            TrayNode::Submenu { label, items } => {
                let mut submenu = SubmenuBuilder::new(app, *label);
                for item in items {
                    submenu = submenu.item(&build_item(app, item, checks)?);
                }
                builder.item(&submenu.build()?)
            }
            TrayNode::Item(item) => builder.item(&build_item(app, item, checks)?),
            TrayNode::Separator => builder.separator(),
        };
    }

    builder.build()
}

fn toggle_window(app: &AppHandle) {
    if let Some(state) = app.try_state::<ShellState>() {
        if let Err(error) = state.controller.lock().toggle_visibility() {
            log::warn!("Failed to toggle window: {error}");
        }
    }
}

fn handle_menu_selection(app: &AppHandle, id: &str) {
    let Some(command) = TrayCommand::parse(id) else {
        log::debug!("Unknown tray item {id}");
        return;
    };
    let Some(state) = app.try_state::<ShellState>() else {
        return;
    };

    let handled = {
        let mut controller = state.controller.lock();
        apply_command(&mut controller, command)
    };

    match handled {
        Ok(true) => {
            if let Some(checks) = app.try_state::<TrayChecks>() {
                checks.select(command);
            }
        }
        Ok(false) => match command {
            TrayCommand::About => show_about(app),
            TrayCommand::Quit => {
                if let Err(error) = state.controller.lock().save_geometry() {
                    log::warn!("Unable to save window state: {error}");
                }
                app.exit(0);
            }
            _ => {}
        },
        Err(error) => log::warn!("Tray action {id} failed: {error}"),
    }
}

pub fn about_text(version: &str) -> String {
    format!("{PRODUCT_NAME} {version}\n\n{PRODUCT_DESCRIPTION}\n\nLicense: {PRODUCT_LICENSE}")
}

fn show_about(app: &AppHandle) {
    let version = app.package_info().version.to_string();
    let opener = app.clone();
    app.dialog()
        .message(about_text(&version))
        .title(format!("About {PRODUCT_NAME}"))
        .kind(MessageDialogKind::Info)
        .buttons(MessageDialogButtons::OkCancelCustom("Report a Bug".into(), "Close".into()))
        .show(move |report| {
            if report {
                if let Err(error) = opener.opener().open_url(BUG_REPORT_URL, None::<&str>) {
                    log::warn!("Failed to open bug report page: {error}");
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::controller;

    fn snapshot() -> PreferenceSnapshot {
        let (controller, _) = controller();
        controller.preferences().snapshot()
    }

    fn submenu<'a>(model: &'a [TrayNode], title: &str) -> &'a [TrayItem] {
        model
            .iter()
            .find_map(|node| match node {
                TrayNode::Submenu { label, items } if *label == title => Some(items.as_slice()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("missing submenu {title}"))
    }

    #[test]
    fn sections_appear_in_order() {
        let model = menu_model(&snapshot());
        let labels: Vec<_> = model
            .iter()
            .map(|node| match node {
                TrayNode::Submenu { label, .. } => label.to_string(),
                TrayNode::Item(item) => item.label.clone(),
                TrayNode::Separator => "-".into(),
            })
            .collect();
        assert_eq!(
            labels,
            [
                "Aspect Ratio",
                "Window Opacity",
                "Pause on Minimize",
                "Lock Window",
                "Show on All Workspaces",
                "Toggle Window",
                "About",
                "-",
                "Quit"
            ]
        );
    }

    #[test]
    fn exactly_one_opacity_is_checked() {
        let mut preferences = snapshot();
        for tenths in 1..=10u8 {
            preferences.window_opacity = f64::from(tenths) / 10.0;
            let model = menu_model(&preferences);
            let checked: Vec<_> = submenu(&model, "Window Opacity")
                .iter()
                .filter(|item| item.checked == Some(true))
                .map(|item| item.command)
                .collect();
            assert_eq!(checked, vec![TrayCommand::Opacity(tenths)]);
        }
    }

    #[test]
    fn off_grid_opacity_checks_nothing() {
        let mut preferences = snapshot();
        preferences.window_opacity = 0.55;
        let model = menu_model(&preferences);
        assert!(submenu(&model, "Window Opacity")
            .iter()
            .all(|item| item.checked == Some(false)));
    }

    #[test]
    fn toggles_mirror_preferences() {
        let mut preferences = snapshot();
        preferences.auto_pause = false;
        preferences.show_on_all_workspaces = true;
        let model = menu_model(&preferences);

        let pause = submenu(&model, "Pause on Minimize");
        assert_eq!(pause[0].checked, Some(false));
        assert_eq!(pause[1].checked, Some(true));

        let lock = submenu(&model, "Lock Window");
        assert_eq!(lock[0].checked, Some(true));

        let workspaces = submenu(&model, "Show on All Workspaces");
        assert_eq!(workspaces[0].checked, Some(true));
        assert_eq!(workspaces[1].checked, Some(false));
    }

    #[test]
    fn ids_round_trip() {
        let model = menu_model(&snapshot());
        for node in &model {
            let items: Vec<&TrayItem> = match node {
                TrayNode::Submenu { items, .. } => items.iter().collect(),
                TrayNode::Item(item) => vec![item],
                TrayNode::Separator => continue,
            };
            for item in items {
                assert_eq!(TrayCommand::parse(&item.command.id()), Some(item.command));
            }
        }
        assert_eq!(TrayCommand::parse("opacity-11"), None);
        assert_eq!(TrayCommand::parse("aspect-21:9-vertical"), None);
        assert_eq!(TrayCommand::parse("lock-maybe"), None);
    }

    #[test]
    fn commands_route_through_controller() {
        let (mut controller, factory) = controller();
        controller.create_or_replace_window().unwrap();
        factory.last().load_page();

        assert!(apply_command(&mut controller, TrayCommand::Opacity(3)).unwrap());
        assert!(apply_command(&mut controller, TrayCommand::LockWindow(false)).unwrap());
        assert!(apply_command(&mut controller, TrayCommand::AutoPause(false)).unwrap());
        assert!(apply_command(&mut controller, TrayCommand::ToggleWindow).unwrap());

        let state = factory.last().state();
        assert_eq!(state.opacity, 0.3);
        assert!(state.movable);
        assert!(!state.visible);
        assert!(state.sent.is_empty());
        assert_eq!(controller.preferences().window_opacity(), 0.3);
    }

    #[test]
    fn app_level_commands_are_left_to_caller() {
        let (mut controller, _) = controller();
        assert!(!apply_command(&mut controller, TrayCommand::About).unwrap());
        assert!(!apply_command(&mut controller, TrayCommand::Quit).unwrap());
    }

    #[test]
    fn choosing_opacity_unchecks_the_rest_of_the_group() {
        let selection = group_selection(TrayCommand::Opacity(5));
        assert_eq!(selection.len(), 10);
        let checked: Vec<_> = selection
            .iter()
            .filter(|(_, checked)| *checked)
            .map(|(member, _)| *member)
            .collect();
        assert_eq!(checked, vec![TrayCommand::Opacity(5)]);
    }

    #[test]
    fn choosing_a_checked_toggle_keeps_it_checked() {
        assert_eq!(
            group_selection(TrayCommand::LockWindow(true)),
            vec![
                (TrayCommand::LockWindow(true), true),
                (TrayCommand::LockWindow(false), false)
            ]
        );
        assert_eq!(
            group_selection(TrayCommand::AllWorkspaces(false)),
            vec![
                (TrayCommand::AllWorkspaces(true), false),
                (TrayCommand::AllWorkspaces(false), true)
            ]
        );
        assert_eq!(
            group_selection(TrayCommand::AutoPause(true))[0],
            (TrayCommand::AutoPause(true), true)
        );
    }

    #[test]
    fn groups_match_the_menu_choices() {
        let model = menu_model(&snapshot());
        for node in &model {
            let TrayNode::Submenu { items, .. } = node else {
                continue;
            };
            for item in items {
                let members: Vec<_> = group_selection(item.command)
                    .into_iter()
                    .map(|(member, _)| member)
                    .collect();
                let siblings: Vec<_> = items
                    .iter()
                    .filter(|_| item.checked.is_some())
                    .map(|sibling| sibling.command)
                    .collect();
                assert_eq!(members, siblings);
            }
        }
        assert!(group_selection(TrayCommand::Quit).is_empty());
    }

    #[test]
    fn about_text_names_product() {
        let text = about_text("1.2.3");
        assert!(text.starts_with("Plex Viewer 1.2.3"));
        assert!(text.contains("MIT"));
    }
}
