//! Redactor Core - Layered image editing engine
//!
//! This crate provides the platform-independent core of the Redactor editor:
//! coordinate mapping between the screen and the image, the stacked image /
//! blur / overlay surfaces, rectangle selection for crop and blur regions,
//! quarter-turn rotation and PNG export of the redacted crops.
//!
//! # Module Structure
//!
//! - `geometry` - Display layout, coordinate spaces and rectangle normalization
//! - `layers` - The three stacked RGBA surfaces
//! - `selection` - Drag tracking and committed regions per region kind
//! - `compositor` - Blur preview, overlay drawing and export compositing
//! - `transform` - Pixel-level crop, paste and rotation
//! - `editor` - The controller tying host events to the modules above
//! - `decode` / `encode` - JPEG and PNG input, PNG output
//! - `config` - Editor settings

pub mod compositor;
pub mod config;
pub mod decode;
pub mod editor;
pub mod encode;
pub mod geometry;
pub mod layers;
pub mod selection;
pub mod transform;

pub use compositor::{BlurBackend, BoxBlur, GaussianBlur};
pub use config::{BlurConfig, EditorConfig, OverlayStyle, OverlayStyles};
pub use editor::{ControlStates, Editor, EditorError, ExportedImage, LoadTicket, Mode};
pub use geometry::{
    DisplayLayout, DisplayPoint, DisplayRect, DisplaySize, ImagePoint, ImageRect, PixelRect,
    Rotation, Size,
};
pub use layers::{LayerKind, LayerRegistry, Surface};
pub use selection::{EndOutcome, Region, RegionKind, SelectionError, SelectionTracker};
