use crate::{Error, Result};
use egui::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// How [`crate::AutoLayout`] lays nodes out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Gap between nodes sharing a rank
    pub node_spacing: f32,

    /// Gap between consecutive ranks
    pub rank_spacing: f32,

    /// Size used for nodes that haven't been measured yet
    pub default_dimensions: Vec2,

    pub animation_duration_ms: u64,

    pub break_cycles: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            node_spacing: 50.0,
            rank_spacing: 50.0,
            default_dimensions: Vec2::new(150.0, 50.0),
            animation_duration_ms: 1000,
            break_cycles: true,
        }
    }
}

impl LayoutOptions {
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    /// Screen size of the viewport
    pub size: Vec2,

    /// Extra room around fitted content, as a fraction of its size
    pub padding: f32,

    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            size: Vec2::new(1024.0, 768.0),
            padding: 0.1,
            min_zoom: 0.5,
            max_zoom: 2.0,
        }
    }
}

impl ViewportOptions {
    /// Allowed zoom levels, falling back to the defaults for bounds that are
    /// not positive numbers and swapping inverted bounds
    pub fn zoom_range(&self) -> RangeInclusive<f32> {
        let defaults = Self::default();
        let valid = |zoom: f32, fallback: f32| {
            if zoom.is_finite() && zoom > 0.0 {
                zoom
            } else {
                warn!("Ignoring invalid zoom bound {zoom}");
                fallback
            }
        };
        let min = valid(self.min_zoom, defaults.min_zoom);
        let max = valid(self.max_zoom, defaults.max_zoom);

        if min > max {
            warn!("Zoom range {min}..={max} is inverted");
            max..=min
        } else {
            min..=max
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub layout: LayoutOptions,
    pub viewport: ViewportOptions,
}

impl FlowConfig {
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from {path:?}");

        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
