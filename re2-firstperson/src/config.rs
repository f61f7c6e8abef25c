use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const CONFIG_FILE_NAME: &str = "re2_firstperson_config.toml";

fn default_attach_bone() -> String {
    "head".to_string()
}

fn default_camera_scale() -> f32 {
    40.0
}

fn default_bone_scale() -> f32 {
    15.0
}

fn default_fov_offset() -> f32 {
    10.0
}

fn default_fov_multiplier() -> f32 {
    1.0
}

/// Per-model head offsets, in the engine's 0.1 unit scale.
pub fn default_attach_offsets() -> BTreeMap<String, [f32; 3]> {
    let mut offsets = BTreeMap::new();
    offsets.insert("pl0000".to_string(), [-0.26, 0.435, 1.0]); // Leon
    offsets.insert("pl1000".to_string(), [-0.23, 0.4, 1.0]); // Claire
    offsets.insert("pl3000".to_string(), [-0.278, 0.435, 0.945]); // Sherry
    offsets.insert("pl4000".to_string(), [-0.26, 0.435, 1.0]); // Hunk
    offsets
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    pub enabled: bool,
    pub hide_mesh: bool,
    pub disable_vignette: bool,

    // Joint the camera is glued to
    #[serde(default = "default_attach_bone")]
    pub attach_bone: String,

    // "CameraSpeed" slider, 0-250
    #[serde(default = "default_camera_scale")]
    pub camera_scale: f32,
    // "CameraShake" slider, 0-250
    #[serde(default = "default_bone_scale")]
    pub bone_scale: f32,

    #[serde(default = "default_fov_offset")]
    pub fov_offset: f32,
    #[serde(default = "default_fov_multiplier")]
    pub fov_multiplier: f32,

    #[serde(default = "default_attach_offsets")]
    pub attach_offsets: BTreeMap<String, [f32; 3]>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            enabled: false,
            hide_mesh: true,
            disable_vignette: false,
            attach_bone: default_attach_bone(),
            camera_scale: default_camera_scale(),
            bone_scale: default_bone_scale(),
            fov_offset: default_fov_offset(),
            fov_multiplier: default_fov_multiplier(),
            attach_offsets: default_attach_offsets(),
        }
    }
}

impl Config {
    pub fn load_or_create(config_path: &Path) -> Self {
        if config_path.exists() {
            match Self::load(config_path) {
                Ok(config) => {
                    info!("[CONFIG] Loaded configuration from {:?}", config_path);
                    return config;
                }
                Err(e) => {
                    info!("[CONFIG] Failed to load config, using defaults: {}", e);
                    return Config::default();
                }
            }
        }

        let config = Config::default();
        if let Err(e) = config.save(config_path) {
            info!("[CONFIG] Failed to save default config: {}", e);
        } else {
            info!("[CONFIG] Created default configuration at {:?}", config_path);
        }
        config
    }

    pub fn load(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(config_path, toml_string)?;
        Ok(())
    }
}
