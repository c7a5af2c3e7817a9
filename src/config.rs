//! Engine settings stored as RON.
//!
//! ```ron
//! (
//!     title: "Cave",
//!     width: 1280,
//!     height: 720,
//!     texture_filter: Linear,
//! )
//! ```
//! Missing fields keep their defaults.

use crate::error::{EngineError, Result};
use macroquad::texture::FilterMode;
use macroquad::window::Conf;
use serde::Deserialize;
use std::path::Path;

/// Texture sampling mode, as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TextureFilter {
    /// Crisp pixels.
    #[default]
    Nearest,
    /// Smoothed pixels.
    Linear,
}

impl From<TextureFilter> for FilterMode {
    fn from(filter: TextureFilter) -> Self {
        match filter {
            TextureFilter::Nearest => FilterMode::Nearest,
            TextureFilter::Linear => FilterMode::Linear,
        }
    }
}

/// How tileset and font textures are sampled once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureSettings {
    /// Sampling used for magnification and minification.
    pub filter: TextureFilter,
}

/// Window and rendering settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title.
    pub title: String,
    /// Window width in logical pixels.
    pub width: i32,
    /// Window height in logical pixels.
    pub height: i32,
    /// Requests a high-DPI framebuffer.
    pub high_dpi: bool,
    /// Starts in fullscreen.
    pub fullscreen: bool,
    /// Filter applied to every loaded texture.
    pub texture_filter: TextureFilter,
    /// Frames a camera takes to catch up with its target; 1 follows exactly.
    pub camera_frames_delay: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            title: "macroquad_tiled_engine".to_owned(),
            width: 960,
            height: 540,
            high_dpi: false,
            fullscreen: false,
            texture_filter: TextureFilter::Nearest,
            camera_frames_delay: 1,
        }
    }
}

impl EngineConfig {
    /// Parses a RON config; absent fields keep their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Reads and parses a RON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        log::debug!("engine config loaded from {}", path.display());
        Ok(config)
    }

    /// Window settings for `#[macroquad::main(..)]`.
    pub fn window_conf(&self) -> Conf {
        Conf {
            window_title: self.title.clone(),
            window_width: self.width,
            window_height: self.height,
            high_dpi: self.high_dpi,
            fullscreen: self.fullscreen,
            ..Default::default()
        }
    }

    /// Texture settings derived from `texture_filter`.
    pub fn texture_settings(&self) -> TextureSettings {
        TextureSettings {
            filter: self.texture_filter,
        }
    }
}
