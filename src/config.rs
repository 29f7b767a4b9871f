//! Runtime configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml`
//! 2. `config/user.toml` (user overrides)
//! 3. Environment variables (`GALLERY_SECTION__KEY`)
//!
//! Every key has a default, so an empty directory yields [`GalleryConfig::default`].

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hover::HoverStyle;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub interaction: InteractionConfig,
    pub panel: PanelConfig,
    pub narration: NarrationConfig,
    pub camera: CameraConfig,
    pub viewport: ViewportConfig,
    pub intro: IntroConfig,
}

impl GalleryConfig {
    /// Load configuration from the `config` directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::from(Serialized::defaults(GalleryConfig::default()));
        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // GALLERY_PANEL__MAX_ZOOM=4 -> panel.max_zoom = 4
        figment = figment.merge(Env::prefixed("GALLERY_").split("__"));

        Ok(figment.extract()?)
    }
}

/// Pointer and hover tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Maximum pointer travel, in pixels, between press and release of a click
    pub click_radius: f32,
    /// Multiplier applied to a hovered artwork's spotlight
    pub highlight_factor: f32,
    /// HSL lightness added to a hovered button
    pub lighten: f32,
    /// Height of the teleport marker above the floor hit
    pub marker_lift: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_radius: 10.0,
            highlight_factor: 2.5,
            lighten: 0.2,
            marker_lift: 0.02,
        }
    }
}

impl InteractionConfig {
    pub fn hover_style(&self) -> HoverStyle {
        HoverStyle {
            highlight_factor: self.highlight_factor,
            lighten: self.lighten,
        }
    }
}

/// Detail panel layout and zoom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Distance in front of the visitor
    pub distance: f32,
    /// Absolute height of the panel centre
    pub eye_height: f32,
    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    pub max_zoom: f32,
    pub min_zoom: f32,
    /// Width of the image plane; the height follows the artwork aspect ratio
    pub image_width: f32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            distance: 1.5,
            eye_height: 1.6,
            zoom_in_factor: 1.2,
            zoom_out_factor: 0.8,
            max_zoom: 3.0,
            min_zoom: 0.5,
            image_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// BCP 47 language tag passed to the speech engine
    pub language: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            language: "es-ES".to_string(),
        }
    }
}

/// Visitor camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Camera height above the rig origin
    pub eye_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 70.0,
            near: 0.1,
            far: 100.0,
            eye_height: 1.6,
        }
    }
}

/// Initial viewport size in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Entrance sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub start: Vec3,
    pub target: Vec3,
    /// Progress added per frame; the tween ends once progress exceeds 1
    pub step: f32,
    /// Entrance the doors belong to
    pub entrance: Vec3,
    /// The doors open while the rig is closer than this to the entrance
    pub door_threshold: f32,
    pub door_speed: f32,
    pub door_open_x: f32,
    pub door_closed_x: f32,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            start: Vec3::new(0.0, 0.0, 50.0),
            target: Vec3::new(0.0, 0.0, 20.0),
            step: 0.0025,
            entrance: Vec3::new(0.0, 0.0, 25.0),
            door_threshold: 15.0,
            door_speed: 0.05,
            door_open_x: 4.5,
            door_closed_x: 4.5 / 4.0,
        }
    }
}
