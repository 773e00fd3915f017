use parking_lot::Mutex;

use crate::host::TauriWindowFactory;
use crate::preferences::YamlFileBackend;
use crate::window::WindowController;

pub type DesktopController = WindowController<TauriWindowFactory, YamlFileBackend>;

pub struct ShellState {
    pub controller: Mutex<DesktopController>,
}

impl ShellState {
    pub fn new(controller: DesktopController) -> Self {
        Self {
            controller: Mutex::new(controller),
        }
    }
}
