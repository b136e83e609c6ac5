//! Editor configuration.
//!
//! Every field has a default, so hosts can pass a partial object (or nothing)
//! and get the stock editor: a 900x900 container with 100px padding, quarter-turn
//! rotation, a gaussian blur preview and grey selection rectangles.

use serde::{Deserialize, Serialize};

use crate::geometry::Size;
use crate::selection::RegionKind;

/// Default container edge in CSS pixels.
pub const DEFAULT_CONTAINER_EDGE: u32 = 900;

/// Default padding between the container edge and the canvas.
pub const DEFAULT_PADDING: u32 = 100;

/// Default rotation increment in degrees.
pub const DEFAULT_ROTATION_STEP: i32 = 90;

/// Which blur the preview layer uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlurConfig {
    /// Gaussian blur with the given standard deviation.
    Gaussian { sigma: f32 },
    /// Repeated box blurs approximating a gaussian of the given deviation.
    Box { sigma: f32 },
}

impl Default for BlurConfig {
    fn default() -> Self {
        BlurConfig::Gaussian { sigma: 8.0 }
    }
}

/// How one kind of selection is drawn on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Fill colour (RGBA, straight alpha).
    pub fill: [u8; 4],
    /// Border colour (RGBA, straight alpha).
    pub stroke: [u8; 4],
    /// Border width in image pixels, drawn inside the rectangle.
    pub stroke_width: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            fill: [200, 200, 200, 128],
            stroke: [0, 0, 0, 255],
            stroke_width: 2,
        }
    }
}

/// Overlay styles per region kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyles {
    pub crop: OverlayStyle,
    pub blur: OverlayStyle,
}

impl Default for OverlayStyles {
    fn default() -> Self {
        Self {
            crop: OverlayStyle::default(),
            blur: OverlayStyle {
                fill: [120, 160, 220, 96],
                ..OverlayStyle::default()
            },
        }
    }
}

impl OverlayStyles {
    pub fn for_kind(&self, kind: RegionKind) -> &OverlayStyle {
        match kind {
            RegionKind::Crop => &self.crop,
            RegionKind::Blur => &self.blur,
        }
    }
}

/// Top-level editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Size of the element the canvas is centred in.
    pub container: Size,
    /// Gap kept between the container edge and the canvas on every side.
    pub padding: u32,
    /// Degrees turned by one rotate-left / rotate-right press.
    pub rotation_step: i32,
    pub blur: BlurConfig,
    pub overlay: OverlayStyles,
    /// Exported files are named `<stem>.png`, `<stem>-1.png`, ...
    pub export_file_stem: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            container: Size::new(DEFAULT_CONTAINER_EDGE, DEFAULT_CONTAINER_EDGE),
            padding: DEFAULT_PADDING,
            rotation_step: DEFAULT_ROTATION_STEP,
            blur: BlurConfig::default(),
            overlay: OverlayStyles::default(),
            export_file_stem: "image".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotation step actually applied: the configured step snapped to the
    /// nearest quarter turn and reduced to less than a full turn, never zero.
    pub fn effective_rotation_step(&self) -> i32 {
        // Whole turns are dropped; the sign (direction) is kept.
        let turns = ((self.rotation_step as f64) / 90.0).round() as i64 % 4;
        if turns == 0 {
            DEFAULT_ROTATION_STEP
        } else {
            turns as i32 * 90
        }
    }

    /// File name of the `index`-th exported crop.
    pub fn export_file_name(&self, index: usize) -> String {
        if index == 0 {
            format!("{}.png", self.export_file_stem)
        } else {
            format!("{}-{}.png", self.export_file_stem, index)
        }
    }
}
