use crate::animation::SpinnerSpec;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    #[serde(default)]
    pub fullscreen: bool,
}

/// Initial orbit placement and lens of the viewport camera.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_radius")]
    pub radius: f32,
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default = "CameraConfig::default_pitch_degrees")]
    pub pitch_degrees: f32,
    #[serde(default = "CameraConfig::default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    /// glTF asset to display; the built-in aircraft is used when absent.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// JSON anchor catalog; the built-in aircraft anchors are used when absent.
    #[serde(default)]
    pub anchors_path: Option<PathBuf>,
    /// Preference file; the platform config directory is used when absent.
    #[serde(default)]
    pub prefs_path: Option<PathBuf>,
    /// Keep preferences in memory only for this run.
    #[serde(default)]
    pub ephemeral_prefs: bool,
    #[serde(default = "SpinnerSpec::aircraft_default")]
    pub spinners: Vec<SpinnerSpec>,
    #[serde(default)]
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    pub window: WindowConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub vsync: Option<bool>,
    pub model_path: Option<PathBuf>,
    pub anchors_path: Option<PathBuf>,
    pub prefs_path: Option<PathBuf>,
    pub ephemeral_prefs: Option<bool>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "Hotspot Viewer".to_string(), width: 1280, height: 720, vsync: true, fullscreen: false }
    }
}

impl CameraConfig {
    fn default_radius() -> f32 {
        9.0
    }

    fn default_pitch_degrees() -> f32 {
        -0.4_f32.to_degrees()
    }

    fn default_fov_degrees() -> f32 {
        45.0
    }

    fn default_near() -> f32 {
        0.1
    }

    fn default_far() -> f32 {
        100.0
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            yaw_degrees: 0.0,
            pitch_degrees: Self::default_pitch_degrees(),
            fov_degrees: Self::default_fov_degrees(),
            near: Self::default_near(),
            far: Self::default_far(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            anchors_path: None,
            prefs_path: None,
            ephemeral_prefs: false,
            spinners: SpinnerSpec::aircraft_default(),
            camera: CameraConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("[config] Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(vsync) = overrides.vsync {
            self.window.vsync = vsync;
        }
        if let Some(path) = &overrides.model_path {
            self.viewer.model_path = Some(path.clone());
        }
        if let Some(path) = &overrides.anchors_path {
            self.viewer.anchors_path = Some(path.clone());
        }
        if let Some(path) = &overrides.prefs_path {
            self.viewer.prefs_path = Some(path.clone());
        }
        if let Some(ephemeral) = overrides.ephemeral_prefs {
            self.viewer.ephemeral_prefs = ephemeral;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.applied_fields().is_empty()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.vsync.is_some() {
            fields.push("vsync");
        }
        if self.model_path.is_some() {
            fields.push("model");
        }
        if self.anchors_path.is_some() {
            fields.push("anchors");
        }
        if self.prefs_path.is_some() {
            fields.push("prefs");
        }
        if self.ephemeral_prefs.is_some() {
            fields.push("ephemeral");
        }
        fields
    }
}
