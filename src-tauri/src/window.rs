//! Main window ownership and the actions the tray and shortcuts route through.
//!
//! The controller never talks to Tauri directly: it drives a [`WindowFactory`]
//! and the [`ShellWindow`] handles it produces, so the whole state machine can
//! be exercised with in-memory fakes.

use crate::error::Result;
use crate::preferences::{PreferenceBackend, Preferences};
use crate::window_state::{WindowGeometry, WindowStateKeeper};

/// One-way notifications delivered to the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMessage {
    Pause,
    Next,
    Previous,
    Back,
    Forward,
    PlayPause,
    SimplePlayerMode,
}

impl PageMessage {
    pub fn event_name(self) -> &'static str {
        match self {
            PageMessage::Pause => "pause",
            PageMessage::Next => "next",
            PageMessage::Previous => "previous",
            PageMessage::Back => "back",
            PageMessage::Forward => "forward",
            PageMessage::PlayPause => "play-pause",
            PageMessage::SimplePlayerMode => "simple-player-mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    FourThree,
    SixteenNine,
}

impl AspectRatio {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "4:3" => Some(AspectRatio::FourThree),
            "16:9" => Some(AspectRatio::SixteenNine),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::FourThree => "4:3",
            AspectRatio::SixteenNine => "16:9",
        }
    }

    /// Width and height terms of the ratio.
    fn terms(self) -> (f64, f64) {
        match self {
            AspectRatio::FourThree => (4.0, 3.0),
            AspectRatio::SixteenNine => (16.0, 9.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDirection {
    /// Keep the width, derive the height.
    Vertical,
    /// Keep the height, derive the width.
    Horizontal,
}

impl ResizeDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "vertical" => Some(ResizeDirection::Vertical),
            "horizontal" => Some(ResizeDirection::Horizontal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResizeDirection::Vertical => "vertical",
            ResizeDirection::Horizontal => "horizontal",
        }
    }
}

pub fn aspect_size(ratio: AspectRatio, direction: ResizeDirection, width: u32, height: u32) -> (u32, u32) {
    let (ratio_width, ratio_height) = ratio.terms();
    match direction {
        ResizeDirection::Vertical => (width, (width as f64 * ratio_height / ratio_width).round() as u32),
        ResizeDirection::Horizontal => ((height as f64 * ratio_width / ratio_height).round() as u32, height),
    }
}

/// Everything needed to build a main window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    pub geometry: WindowGeometry,
    pub frame: bool,
    pub resizable: bool,
    pub movable: bool,
    pub fullscreenable: bool,
    pub visible_on_all_workspaces: bool,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
    pub opacity: f64,
}

/// A live main-window handle.
pub trait ShellWindow {
    fn label(&self) -> &str;
    fn is_visible(&self) -> Result<bool>;
    fn is_minimized(&self) -> Result<bool>;
    fn show(&self) -> Result<()>;
    fn hide(&self) -> Result<()>;
    fn focus(&self) -> Result<()>;
    fn unminimize(&self) -> Result<()>;
    /// Logical inner size.
    fn size(&self) -> Result<(u32, u32)>;
    fn set_size(&self, width: u32, height: u32) -> Result<()>;
    fn geometry(&self) -> Result<WindowGeometry>;
    fn set_resizable(&self, resizable: bool) -> Result<()>;
    fn set_movable(&self, movable: bool) -> Result<()>;
    fn set_fullscreenable(&self, fullscreenable: bool) -> Result<()>;
    fn set_visible_on_all_workspaces(&self, visible: bool) -> Result<()>;
    fn set_opacity(&self, opacity: f64) -> Result<()>;
    fn send(&self, message: PageMessage) -> Result<()>;
    fn close(&self) -> Result<()>;
}

/// Builds main windows. Windows come back hidden and show themselves once
/// their page has loaded.
pub trait WindowFactory {
    type Window: ShellWindow;

    fn create(&mut self, spec: &WindowSpec) -> Result<Self::Window>;
}

fn best_effort(action: &str, result: Result<()>) {
    if let Err(error) = result {
        log::warn!("Failed to {action}: {error}");
    }
}

pub struct WindowController<F: WindowFactory, B> {
    preferences: Preferences<B>,
    factory: F,
    window_state: WindowStateKeeper,
    window: Option<F::Window>,
}

impl<F, B> WindowController<F, B>
where
    F: WindowFactory,
    B: PreferenceBackend,
{
    pub fn new(preferences: Preferences<B>, factory: F, window_state: WindowStateKeeper) -> Self {
        Self {
            preferences,
            factory,
            window_state,
            window: None,
        }
    }

    pub fn preferences(&self) -> &Preferences<B> {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences<B> {
        &mut self.preferences
    }

    pub fn current_label(&self) -> Option<&str> {
        self.window.as_ref().map(|window| window.label())
    }

    pub fn window_spec(&self) -> WindowSpec {
        let locked = self.preferences.position_locked();
        let all_workspaces = self.preferences.show_on_all_workspaces();
        WindowSpec {
            geometry: self.window_state.geometry(),
            frame: !self.preferences.window_chrome_hidden(),
            resizable: !locked,
            movable: !locked,
            fullscreenable: !all_workspaces,
            visible_on_all_workspaces: all_workspaces,
            always_on_top: true,
            skip_taskbar: true,
            opacity: self.preferences.window_opacity(),
        }
    }

    /// Builds a fresh main window from the current preferences and the last
    /// known geometry, then closes the window it replaces.
    pub fn create_or_replace_window(&mut self) -> Result<()> {
        self.capture_geometry();
        let spec = self.window_spec();
        let window = self.factory.create(&spec)?;
        log::info!("Created main window {}", window.label());

        if let Some(previous) = self.window.replace(window) {
            log::debug!("Closing replaced window {}", previous.label());
            best_effort("close replaced window", previous.close());
        }
        Ok(())
    }

    pub fn toggle_visibility(&mut self) -> Result<()> {
        let Some(window) = &self.window else {
            return self.create_or_replace_window();
        };

        if window.is_visible()? {
            window.hide()?;
            if self.preferences.auto_pause() {
                window.send(PageMessage::Pause)?;
            }
        } else {
            window.show()?;
            window.focus()?;
        }
        Ok(())
    }

    /// Unknown ratio or direction strings leave the window untouched.
    pub fn set_aspect_ratio(&mut self, ratio: &str, direction: &str) -> Result<()> {
        match (AspectRatio::parse(ratio), ResizeDirection::parse(direction)) {
            (Some(ratio), Some(direction)) => self.apply_aspect_ratio(ratio, direction),
            _ => {
                log::debug!("Ignoring aspect ratio {ratio} ({direction})");
                Ok(())
            }
        }
    }

    pub fn apply_aspect_ratio(&mut self, ratio: AspectRatio, direction: ResizeDirection) -> Result<()> {
        let Some(window) = &self.window else {
            return Ok(());
        };
        let (width, height) = window.size()?;
        let (width, height) = aspect_size(ratio, direction, width, height);
        window.set_size(width, height)
    }

    pub fn toggle_frame(&mut self) -> Result<()> {
        let hidden = !self.preferences.window_chrome_hidden();
        self.preferences.set_window_chrome_hidden(hidden)?;

        if self.window.is_some() {
            self.create_or_replace_window()?;
        }
        Ok(())
    }

    pub fn set_position_locked(&mut self, locked: bool) -> Result<()> {
        if let Some(window) = &self.window {
            best_effort("update resizable flag", window.set_resizable(!locked));
            best_effort("update movable flag", window.set_movable(!locked));
        }
        self.preferences.set_position_locked(locked)
    }

    pub fn set_workspace_pinning(&mut self, show: bool) -> Result<()> {
        if let Some(window) = &self.window {
            best_effort("update workspace visibility", window.set_visible_on_all_workspaces(show));
            best_effort("update fullscreen flag", window.set_fullscreenable(!show));
        }
        self.preferences.set_show_on_all_workspaces(show)
    }

    pub fn set_opacity(&mut self, opacity: f64) -> Result<()> {
        self.preferences.set_window_opacity(opacity)?;
        let opacity = self.preferences.window_opacity();
        if let Some(window) = &self.window {
            best_effort("update opacity", window.set_opacity(opacity));
        }
        Ok(())
    }

    pub fn set_auto_pause(&mut self, enabled: bool) -> Result<()> {
        self.preferences.set_auto_pause(enabled)
    }

    /// Brings the existing window forward. Never creates one.
    pub fn focus_existing(&mut self) -> Result<()> {
        let Some(window) = &self.window else {
            log::debug!("No main window to focus");
            return Ok(());
        };
        if window.is_minimized()? {
            window.unminimize()?;
        }
        window.show()?;
        window.focus()
    }

    pub fn send(&self, message: PageMessage) -> Result<()> {
        match &self.window {
            Some(window) => window.send(message),
            None => Ok(()),
        }
    }

    pub fn window_destroyed(&mut self, label: &str) {
        if self.current_label() == Some(label) {
            log::info!("Main window {label} destroyed");
            self.window = None;
        }
    }

    pub fn save_geometry(&mut self) -> Result<()> {
        self.capture_geometry();
        self.window_state.persist()
    }

    fn capture_geometry(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        if window.is_minimized().unwrap_or(false) {
            return;
        }
        match window.geometry() {
            Ok(geometry) => self.window_state.update(geometry),
            Err(error) => log::warn!("Unable to read window geometry: {error}"),
        }
    }
}
