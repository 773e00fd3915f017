use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const PREFERENCES_FILE: &str = "preferences.yaml";

pub const MIN_OPACITY: f64 = 0.1;
pub const MAX_OPACITY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrefKey {
    LeftPanelHidden,
    SimplePlayerMode,
    WindowChromeHidden,
    ShowOnAllWorkspaces,
    AutoPause,
    PositionLocked,
    WindowOpacity,
}

impl PrefKey {
    pub const ALL: [PrefKey; 7] = [
        PrefKey::LeftPanelHidden,
        PrefKey::SimplePlayerMode,
        PrefKey::WindowChromeHidden,
        PrefKey::ShowOnAllWorkspaces,
        PrefKey::AutoPause,
        PrefKey::PositionLocked,
        PrefKey::WindowOpacity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrefKey::LeftPanelHidden => "leftPanelHidden",
            PrefKey::SimplePlayerMode => "simplePlayerMode",
            PrefKey::WindowChromeHidden => "windowChromeHidden",
            PrefKey::ShowOnAllWorkspaces => "showOnAllWorkspaces",
            PrefKey::AutoPause => "autoPause",
            PrefKey::PositionLocked => "positionLocked",
            PrefKey::WindowOpacity => "windowOpacity",
        }
    }

    pub fn default_value(self) -> PrefValue {
        match self {
            PrefKey::LeftPanelHidden => PrefValue::Bool(true),
            PrefKey::SimplePlayerMode => PrefValue::Bool(false),
            PrefKey::WindowChromeHidden => PrefValue::Bool(false),
            PrefKey::ShowOnAllWorkspaces => PrefValue::Bool(false),
            PrefKey::AutoPause => PrefValue::Bool(true),
            PrefKey::PositionLocked => PrefValue::Bool(true),
            PrefKey::WindowOpacity => PrefValue::Float(MAX_OPACITY),
        }
    }

    fn accepts(self, value: &PrefValue) -> bool {
        matches!(
            (self, value),
            (PrefKey::WindowOpacity, PrefValue::Float(_))
                | (PrefKey::LeftPanelHidden, PrefValue::Bool(_))
                | (PrefKey::SimplePlayerMode, PrefValue::Bool(_))
                | (PrefKey::WindowChromeHidden, PrefValue::Bool(_))
                | (PrefKey::ShowOnAllWorkspaces, PrefValue::Bool(_))
                | (PrefKey::AutoPause, PrefValue::Bool(_))
                | (PrefKey::PositionLocked, PrefValue::Bool(_))
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Float(f64),
}

impl PrefValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(value) => Some(*value),
            PrefValue::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PrefValue::Float(value) => Some(*value),
            PrefValue::Bool(_) => None,
        }
    }
}

/// Raw key-value storage behind [`Preferences`].
pub trait PreferenceBackend {
    fn has(&self, key: &str) -> bool;
    fn get(&self, key: &str) -> Option<PrefValue>;
    fn set(&mut self, key: &str, value: PrefValue) -> Result<()>;
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: BTreeMap<String, PrefValue>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl PreferenceBackend for MemoryBackend {
    fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// YAML file rewritten in full on every `set`.
#[derive(Debug)]
pub struct YamlFileBackend {
    path: PathBuf,
    values: BTreeMap<String, PrefValue>,
}

impl YamlFileBackend {
    pub fn open(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(PREFERENCES_FILE);
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_yaml::from_str::<Option<BTreeMap<String, PrefValue>>>(&raw) {
                Ok(values) => values.unwrap_or_default(),
                Err(error) => {
                    log::warn!("Failed to parse preferences at {}: {error}", path.display());
                    BTreeMap::new()
                }
            },
            Err(error) if error.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(error.into()),
        };

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let serialized = serde_yaml::to_string(&self.values)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }
}

impl PreferenceBackend for YamlFileBackend {
    fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.persist()
    }
}

/// Every preference value at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSnapshot {
    pub left_panel_hidden: bool,
    pub simple_player_mode: bool,
    pub window_chrome_hidden: bool,
    pub show_on_all_workspaces: bool,
    pub auto_pause: bool,
    pub position_locked: bool,
    pub window_opacity: f64,
}

/// Typed access to the persisted settings.
#[derive(Debug)]
pub struct Preferences<B> {
    backend: B,
}

impl<B: PreferenceBackend> Preferences<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Writes the default for every key that is missing or holds a value of
    /// the wrong type. Running it again changes nothing.
    pub fn init_defaults(&mut self) -> Result<()> {
        for key in PrefKey::ALL {
            let valid = self
                .backend
                .get(key.as_str())
                .map(|value| key.accepts(&value))
                .unwrap_or(false);
            if !valid {
                self.backend.set(key.as_str(), key.default_value())?;
            }
        }
        Ok(())
    }

    pub fn has(&self, key: PrefKey) -> bool {
        self.backend.has(key.as_str())
    }

    pub fn get(&self, key: PrefKey) -> PrefValue {
        self.backend
            .get(key.as_str())
            .filter(|value| key.accepts(value))
            .unwrap_or_else(|| key.default_value())
    }

    pub fn set(&mut self, key: PrefKey, value: PrefValue) -> Result<()> {
        self.backend.set(key.as_str(), value)
    }

    fn flag(&self, key: PrefKey) -> bool {
        self.get(key).as_bool().unwrap_or_default()
    }

    fn set_flag(&mut self, key: PrefKey, value: bool) -> Result<()> {
        self.set(key, PrefValue::Bool(value))
    }

    pub fn left_panel_hidden(&self) -> bool {
        self.flag(PrefKey::LeftPanelHidden)
    }

    pub fn set_left_panel_hidden(&mut self, hidden: bool) -> Result<()> {
        self.set_flag(PrefKey::LeftPanelHidden, hidden)
    }

    pub fn simple_player_mode(&self) -> bool {
        self.flag(PrefKey::SimplePlayerMode)
    }

    pub fn set_simple_player_mode(&mut self, enabled: bool) -> Result<()> {
        self.set_flag(PrefKey::SimplePlayerMode, enabled)
    }

    pub fn window_chrome_hidden(&self) -> bool {
        self.flag(PrefKey::WindowChromeHidden)
    }

    pub fn set_window_chrome_hidden(&mut self, hidden: bool) -> Result<()> {
        self.set_flag(PrefKey::WindowChromeHidden, hidden)
    }

    pub fn show_on_all_workspaces(&self) -> bool {
        self.flag(PrefKey::ShowOnAllWorkspaces)
    }

    pub fn set_show_on_all_workspaces(&mut self, show: bool) -> Result<()> {
        self.set_flag(PrefKey::ShowOnAllWorkspaces, show)
    }

    pub fn auto_pause(&self) -> bool {
        self.flag(PrefKey::AutoPause)
    }

    pub fn set_auto_pause(&mut self, enabled: bool) -> Result<()> {
        self.set_flag(PrefKey::AutoPause, enabled)
    }

    pub fn position_locked(&self) -> bool {
        self.flag(PrefKey::PositionLocked)
    }

    pub fn set_position_locked(&mut self, locked: bool) -> Result<()> {
        self.set_flag(PrefKey::PositionLocked, locked)
    }

    pub fn window_opacity(&self) -> f64 {
        self.get(PrefKey::WindowOpacity)
            .as_f64()
            .map(clamp_opacity)
            .unwrap_or(MAX_OPACITY)
    }

    pub fn set_window_opacity(&mut self, opacity: f64) -> Result<()> {
        self.set(PrefKey::WindowOpacity, PrefValue::Float(clamp_opacity(opacity)))
    }

    pub fn snapshot(&self) -> PreferenceSnapshot {
        PreferenceSnapshot {
            left_panel_hidden: self.left_panel_hidden(),
            simple_player_mode: self.simple_player_mode(),
            window_chrome_hidden: self.window_chrome_hidden(),
            show_on_all_workspaces: self.show_on_all_workspaces(),
            auto_pause: self.auto_pause(),
            position_locked: self.position_locked(),
            window_opacity: self.window_opacity(),
        }
    }
}

pub fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        return MAX_OPACITY;
    }
    opacity.clamp(MIN_OPACITY, MAX_OPACITY)
}
