//! Tauri implementation of the main-window seams.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tauri::{
    webview::PageLoadEvent, AppHandle, Emitter, LogicalSize, PhysicalPosition, WebviewUrl,
    WebviewWindow, WebviewWindowBuilder, WindowEvent,
};

use crate::config::{PageSource, ShellConfig, PRODUCT_NAME};
use crate::error::{Result, ShellError};
use crate::window::{PageMessage, ShellWindow, WindowFactory, WindowSpec};
use crate::window_state::WindowGeometry;

pub const MAIN_WINDOW_LABEL: &str = "main";

/// Labels must be unique per window, so every recreation gets a new one.
pub fn window_label(generation: u32) -> String {
    if generation == 0 {
        MAIN_WINDOW_LABEL.to_string()
    } else {
        format!("{MAIN_WINDOW_LABEL}-{generation}")
    }
}

pub fn opacity_script(opacity: f64) -> String {
    format!("document.documentElement.style.opacity = '{opacity:.2}';")
}

/// State shared between a window handle and its event callbacks.
#[derive(Debug)]
struct WindowShared {
    shown: AtomicBool,
    movable: AtomicBool,
    anchor: Mutex<Option<PhysicalPosition<i32>>>,
    opacity: Mutex<f64>,
}

impl WindowShared {
    fn page_loaded(&self, window: &WebviewWindow, open_devtools: bool) {
        let opacity = *self.opacity.lock();
        if let Err(error) = window.eval(&opacity_script(opacity)) {
            log::warn!("Failed to apply window opacity: {error}");
        }

        if self.shown.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(error) = window.show() {
            log::error!("Failed to show main window: {error}");
        }
        if open_devtools {
            #[cfg(debug_assertions)]
            window.open_devtools();
        }
    }

    fn moved(&self, window: &WebviewWindow, position: PhysicalPosition<i32>) {
        if self.movable.load(Ordering::SeqCst) {
            return;
        }
        let anchor = *self.anchor.lock();
        if let Some(anchor) = anchor {
            if anchor != position {
                let _ = window.set_position(anchor);
            }
        }
    }
}

pub struct TauriWindow {
    window: WebviewWindow,
    shared: Arc<WindowShared>,
}

impl TauriWindow {
    fn scale_factor(&self) -> Result<f64> {
        Ok(self.window.scale_factor()?)
    }
}

impl ShellWindow for TauriWindow {
    fn label(&self) -> &str {
        self.window.label()
    }

    fn is_visible(&self) -> Result<bool> {
        Ok(self.window.is_visible()?)
    }

    fn is_minimized(&self) -> Result<bool> {
        Ok(self.window.is_minimized()?)
    }

    fn show(&self) -> Result<()> {
        Ok(self.window.show()?)
    }

    fn hide(&self) -> Result<()> {
        Ok(self.window.hide()?)
    }

    fn focus(&self) -> Result<()> {
        Ok(self.window.set_focus()?)
    }

    fn unminimize(&self) -> Result<()> {
        Ok(self.window.unminimize()?)
    }

    fn size(&self) -> Result<(u32, u32)> {
        let size = self.window.inner_size()?.to_logical::<f64>(self.scale_factor()?);
        Ok((size.width.round() as u32, size.height.round() as u32))
    }

    fn set_size(&self, width: u32, height: u32) -> Result<()> {
        Ok(self.window.set_size(LogicalSize::new(width as f64, height as f64))?)
    }

    fn geometry(&self) -> Result<WindowGeometry> {
        let scale = self.scale_factor()?;
        let position = self.window.outer_position()?.to_logical::<f64>(scale);
        let (width, height) = self.size()?;
        Ok(WindowGeometry {
            x: Some(position.x.round() as i32),
            y: Some(position.y.round() as i32),
            width,
            height,
        })
    }

    fn set_resizable(&self, resizable: bool) -> Result<()> {
        Ok(self.window.set_resizable(resizable)?)
    }

    fn set_movable(&self, movable: bool) -> Result<()> {
        if !movable {
            *self.shared.anchor.lock() = Some(self.window.outer_position()?);
        }
        self.shared.movable.store(movable, Ordering::SeqCst);
        Ok(())
    }

    fn set_fullscreenable(&self, fullscreenable: bool) -> Result<()> {
        Ok(self.window.set_maximizable(fullscreenable)?)
    }

    fn set_visible_on_all_workspaces(&self, visible: bool) -> Result<()> {
        Ok(self.window.set_visible_on_all_workspaces(visible)?)
    }

    fn set_opacity(&self, opacity: f64) -> Result<()> {
        *self.shared.opacity.lock() = opacity;
        Ok(self.window.eval(&opacity_script(opacity))?)
    }

    fn send(&self, message: PageMessage) -> Result<()> {
        Ok(self.window.emit(message.event_name(), ())?)
    }

    fn close(&self) -> Result<()> {
        Ok(self.window.destroy()?)
    }
}

pub struct TauriWindowFactory {
    app: AppHandle,
    page: PageSource,
    open_devtools: bool,
    generation: u32,
}

impl TauriWindowFactory {
    pub fn new(app: AppHandle, config: &ShellConfig) -> Self {
        Self {
            app,
            page: config.page_source(),
            open_devtools: config.is_development(),
            generation: 0,
        }
    }

    fn page_url(&self) -> Result<WebviewUrl> {
        match &self.page {
            PageSource::DevServer(url) => url
                .parse()
                .map(WebviewUrl::External)
                .map_err(|error| ShellError::Window(format!("invalid dev server url {url}: {error}"))),
            PageSource::Packaged(path) => Ok(WebviewUrl::App(path.clone())),
        }
    }
}

impl WindowFactory for TauriWindowFactory {
    type Window = TauriWindow;

    fn create(&mut self, spec: &WindowSpec) -> Result<TauriWindow> {
        let label = window_label(self.generation);
        self.generation += 1;

        let shared = Arc::new(WindowShared {
            shown: AtomicBool::new(false),
            movable: AtomicBool::new(spec.movable),
            anchor: Mutex::new(None),
            opacity: Mutex::new(spec.opacity),
        });

        let on_load = shared.clone();
        let open_devtools = self.open_devtools;
        let mut builder = WebviewWindowBuilder::new(&self.app, &label, self.page_url()?)
            .title(PRODUCT_NAME)
            .inner_size(spec.geometry.width as f64, spec.geometry.height as f64)
            .decorations(spec.frame)
            .resizable(spec.resizable)
            .maximizable(spec.fullscreenable)
            .visible_on_all_workspaces(spec.visible_on_all_workspaces)
            .always_on_top(spec.always_on_top)
            .skip_taskbar(spec.skip_taskbar)
            .visible(false)
            .on_page_load(move |window, payload| {
                if matches!(payload.event(), PageLoadEvent::Finished) {
                    on_load.page_loaded(&window, open_devtools);
                }
            });

        if let (Some(x), Some(y)) = (spec.geometry.x, spec.geometry.y) {
            builder = builder.position(x as f64, y as f64);
        }

        #[cfg(not(target_os = "macos"))]
        {
            builder = builder.transparent(true);
        }

        let window = builder.build()?;

        if !spec.movable {
            *shared.anchor.lock() = window.outer_position().ok();
        }

        let on_move = shared.clone();
        let moved_window = window.clone();
        window.on_window_event(move |event| {
            if let WindowEvent::Moved(position) = event {
                on_move.moved(&moved_window, *position);
            }
        });

        Ok(TauriWindow { window, shared })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_window_keeps_the_main_label() {
        assert_eq!(window_label(0), "main");
        assert_eq!(window_label(1), "main-1");
        assert_eq!(window_label(7), "main-7");
    }

    #[test]
    fn opacity_script_sets_root_style() {
        assert_eq!(
            opacity_script(0.5),
            "document.documentElement.style.opacity = '0.50';"
        );
    }
}
