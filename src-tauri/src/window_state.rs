use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const WINDOW_STATE_FILE: &str = "window-state.yaml";

const DEFAULT_WIDTH: u32 = 600;
const DEFAULT_HEIGHT: u32 = 500;

/// Logical position and size of the main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowGeometry {
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl WindowGeometry {
    fn normalized(mut self) -> Self {
        if self.width == 0 || self.height == 0 {
            self.width = DEFAULT_WIDTH;
            self.height = DEFAULT_HEIGHT;
        }
        self
    }
}

/// Remembers the last geometry of the main window across restarts.
#[derive(Debug)]
pub struct WindowStateKeeper {
    path: Option<PathBuf>,
    geometry: WindowGeometry,
}

impl WindowStateKeeper {
    pub fn load(config_dir: &Path) -> Self {
        let path = config_dir.join(WINDOW_STATE_FILE);
        let geometry = match fs::read_to_string(&path) {
            Ok(raw) => match serde_yaml::from_str::<WindowGeometry>(&raw) {
                Ok(geometry) => geometry.normalized(),
                Err(error) => {
                    log::warn!("Failed to parse window state: {error}");
                    WindowGeometry::default()
                }
            },
            Err(error) => {
                if error.kind() != io::ErrorKind::NotFound {
                    log::warn!("Unable to read window state: {error}");
                }
                WindowGeometry::default()
            }
        };

        Self {
            path: Some(path),
            geometry,
        }
    }

    /// Keeper that never touches the filesystem.
    pub fn in_memory(geometry: WindowGeometry) -> Self {
        Self {
            path: None,
            geometry,
        }
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    pub fn update(&mut self, geometry: WindowGeometry) {
        self.geometry = geometry.normalized();
    }

    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_yaml::to_string(&self.geometry)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_framework_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = WindowStateKeeper::load(dir.path());
        assert_eq!(keeper.geometry(), WindowGeometry::default());
        assert_eq!(keeper.geometry().width, 600);
        assert_eq!(keeper.geometry().height, 500);
    }

    #[test]
    fn persisted_geometry_is_restored() {
        let dir = tempfile::tempdir().unwrap();
        let saved = WindowGeometry {
            x: Some(40),
            y: Some(-20),
            width: 1024,
            height: 576,
        };

        let mut keeper = WindowStateKeeper::load(dir.path());
        keeper.update(saved);
        keeper.persist().unwrap();

        assert_eq!(WindowStateKeeper::load(dir.path()).geometry(), saved);
    }

    #[test]
    fn zero_sized_geometry_is_rejected() {
        let mut keeper = WindowStateKeeper::in_memory(WindowGeometry::default());
        keeper.update(WindowGeometry {
            x: Some(1),
            y: Some(2),
            width: 0,
            height: 300,
        });
        assert_eq!(keeper.geometry().width, 600);
        assert_eq!(keeper.geometry().x, Some(1));
    }

    #[test]
    fn in_memory_keeper_persists_nothing() {
        let keeper = WindowStateKeeper::in_memory(WindowGeometry::default());
        keeper.persist().unwrap();
    }
}
