//! In-memory window host used by the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, ShellError};
use crate::preferences::{MemoryBackend, Preferences};
use crate::window::{PageMessage, ShellWindow, WindowController, WindowFactory, WindowSpec};
use crate::window_state::{WindowGeometry, WindowStateKeeper};

#[derive(Debug, Clone)]
pub struct FakeWindowState {
    pub spec: WindowSpec,
    pub visible: bool,
    pub minimized: bool,
    pub closed: bool,
    pub focus_count: usize,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub movable: bool,
    pub fullscreenable: bool,
    pub all_workspaces: bool,
    pub opacity: f64,
    pub sent: Vec<PageMessage>,
}

impl FakeWindowState {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct FakeWindow {
    label: String,
    state: Arc<Mutex<FakeWindowState>>,
}

impl FakeWindow {
    fn new(label: String, spec: &WindowSpec) -> Self {
        let state = FakeWindowState {
            spec: *spec,
            visible: false,
            minimized: false,
            closed: false,
            focus_count: 0,
            x: spec.geometry.x,
            y: spec.geometry.y,
            width: spec.geometry.width,
            height: spec.geometry.height,
            resizable: spec.resizable,
            movable: spec.movable,
            fullscreenable: spec.fullscreenable,
            all_workspaces: spec.visible_on_all_workspaces,
            opacity: spec.opacity,
            sent: Vec::new(),
        };
        Self {
            label,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> FakeWindowState {
        self.state.lock().clone()
    }

    pub fn spec(&self) -> WindowSpec {
        self.state.lock().spec
    }

    /// Simulates the page finishing its first load.
    pub fn load_page(&self) {
        self.state.lock().visible = true;
    }

    pub fn set_inner_size(&self, width: u32, height: u32) {
        let mut state = self.state.lock();
        state.width = width;
        state.height = height;
    }

    pub fn minimize(&self) {
        self.state.lock().minimized = true;
    }

    fn live(&self) -> Result<parking_lot::MutexGuard<'_, FakeWindowState>> {
        let state = self.state.lock();
        if state.closed {
            return Err(ShellError::Window(format!("window {} is closed", self.label)));
        }
        Ok(state)
    }
}

impl ShellWindow for FakeWindow {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_visible(&self) -> Result<bool> {
        Ok(self.live()?.visible)
    }

    fn is_minimized(&self) -> Result<bool> {
        Ok(self.live()?.minimized)
    }

    fn show(&self) -> Result<()> {
        self.live()?.visible = true;
        Ok(())
    }

    fn hide(&self) -> Result<()> {
        self.live()?.visible = false;
        Ok(())
    }

    fn focus(&self) -> Result<()> {
        self.live()?.focus_count += 1;
        Ok(())
    }

    fn unminimize(&self) -> Result<()> {
        self.live()?.minimized = false;
        Ok(())
    }

    fn size(&self) -> Result<(u32, u32)> {
        Ok(self.live()?.size())
    }

    fn set_size(&self, width: u32, height: u32) -> Result<()> {
        let mut state = self.live()?;
        state.width = width;
        state.height = height;
        Ok(())
    }

    fn geometry(&self) -> Result<WindowGeometry> {
        let state = self.live()?;
        Ok(WindowGeometry {
            x: state.x,
            y: state.y,
            width: state.width,
            height: state.height,
        })
    }

    fn set_resizable(&self, resizable: bool) -> Result<()> {
        self.live()?.resizable = resizable;
        Ok(())
    }

    fn set_movable(&self, movable: bool) -> Result<()> {
        self.live()?.movable = movable;
        Ok(())
    }

    fn set_fullscreenable(&self, fullscreenable: bool) -> Result<()> {
        self.live()?.fullscreenable = fullscreenable;
        Ok(())
    }

    fn set_visible_on_all_workspaces(&self, visible: bool) -> Result<()> {
        self.live()?.all_workspaces = visible;
        Ok(())
    }

    fn set_opacity(&self, opacity: f64) -> Result<()> {
        self.live()?.opacity = opacity;
        Ok(())
    }

    fn send(&self, message: PageMessage) -> Result<()> {
        self.live()?.sent.push(message);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.live()?;
        state.closed = true;
        state.visible = false;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
    windows: Arc<Mutex<Vec<FakeWindow>>>,
}

impl FakeFactory {
    pub fn created(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn live(&self) -> usize {
        self.windows
            .lock()
            .iter()
            .filter(|window| !window.state.lock().closed)
            .count()
    }

    pub fn last(&self) -> FakeWindow {
        self.windows
            .lock()
            .last()
            .cloned()
            .expect("no window has been created")
    }
}

impl WindowFactory for FakeFactory {
    type Window = FakeWindow;

    fn create(&mut self, spec: &WindowSpec) -> Result<FakeWindow> {
        let mut windows = self.windows.lock();
        let window = FakeWindow::new(format!("main-{}", windows.len()), spec);
        windows.push(window.clone());
        Ok(window)
    }
}

/// Controller over defaulted in-memory preferences and a fake window host.
pub fn controller() -> (WindowController<FakeFactory, MemoryBackend>, FakeFactory) {
    let mut preferences = Preferences::new(MemoryBackend::new());
    preferences
        .init_defaults()
        .expect("memory preferences never fail");
    let factory = FakeFactory::default();
    let controller = WindowController::new(
        preferences,
        factory.clone(),
        WindowStateKeeper::in_memory(WindowGeometry::default()),
    );
    (controller, factory)
}
