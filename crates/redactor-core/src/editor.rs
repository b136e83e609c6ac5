//! The editor controller.
//!
//! [`Editor`] owns all editing state (source image, layout, mode, layers and
//! both selection trackers) and turns host events into calls on the geometry,
//! layer, selection and compositor modules.
//!
//! # Events
//!
//! | Host event                 | Method                                    |
//! |----------------------------|-------------------------------------------|
//! | file selected              | [`Editor::load_file`] or `begin_load` + `finish_load` |
//! | container resized          | [`Editor::set_container`]                 |
//! | blur / crop / rotate button| [`Editor::toggle_mode`]                   |
//! | rotate left / right        | [`Editor::rotate_left`] / [`Editor::rotate_right`] |
//! | pointer down / move        | [`Editor::pointer_down`] / [`Editor::pointer_move`] |
//! | pointer up / leave         | [`Editor::pointer_up`] / [`Editor::pointer_leave`] |
//! | undo                       | [`Editor::undo_last`]                     |
//! | save                       | [`Editor::export`]                        |
//!
//! Events that make no sense in the current state (a drag outside crop or blur
//! mode, a rotate outside rotate mode, anything before an image is loaded) are
//! ignored and reported as `false` / `None`.

use std::borrow::Cow;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compositor::{
    blur_backend, draw_blur_preview, draw_overlay, export_blurred, export_crops,
    regions_in_commit_order, BlurBackend,
};
use crate::config::EditorConfig;
use crate::decode::{decode_image, is_supported_mime, DecodeError, DecodedImage};
use crate::encode::{encode_rgba_image, EncodeError};
use crate::geometry::{
    compute_display_layout, to_image_space, DisplayLayout, DisplayPoint, DisplayRect, ImagePoint,
    ImageRect, Rotation, Size,
};
use crate::layers::{LayerKind, LayerRegistry, Surface};
use crate::selection::{EndOutcome, Region, RegionKind, SelectionTracker, TrackerState};
use crate::transform::{apply_rotation, crop_region, rotate_rect};

/// What pointer drags currently do. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    None,
    Crop,
    Blur,
    Rotate,
}

impl Mode {
    /// The region kind drawn in this mode, if any.
    pub fn region_kind(self) -> Option<RegionKind> {
        match self {
            Mode::Crop => Some(RegionKind::Crop),
            Mode::Blur => Some(RegionKind::Blur),
            Mode::None | Mode::Rotate => None,
        }
    }
}

impl FromStr for Mode {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Mode::None),
            "crop" => Ok(Mode::Crop),
            "blur" => Ok(Mode::Blur),
            "rotate" => Ok(Mode::Rotate),
            other => Err(EditorError::UnknownMode(other.to_string())),
        }
    }
}

/// Errors surfaced to the host.
///
/// Invalid input, degenerate selections and missing surfaces never reach the
/// host as errors; they are logged and ignored.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("No image is loaded")]
    NoImage,

    #[error("Export is unavailable in {0:?} mode")]
    ExportDisabled(Mode),

    #[error("There are no crop regions to export")]
    NothingToExport,

    #[error("Unknown editor mode: {0}")]
    UnknownMode(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Identifies one image load request. Only the newest ticket may install an
/// image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl From<u64> for LoadTicket {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Which UI controls should be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlStates {
    pub toggle_blur: bool,
    pub toggle_crop: bool,
    pub toggle_rotate: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub undo: bool,
    pub export: bool,
}

/// One PNG produced by [`Editor::export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Editing state for one image.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    blur_backend: Box<dyn BlurBackend>,
    source: Option<RgbaImage>,
    rotation: Rotation,
    layout: DisplayLayout,
    mode: Mode,
    layers: LayerRegistry,
    crop: SelectionTracker,
    blur: SelectionTracker,
    next_sequence: u64,
    latest_ticket: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor using the blur backend named in `config`.
    pub fn new(config: EditorConfig) -> Self {
        let backend = blur_backend(&config.blur);
        Self::with_blur_backend(config, backend)
    }

    /// Create an editor with a caller-supplied blur backend.
    pub fn with_blur_backend(config: EditorConfig, blur_backend: Box<dyn BlurBackend>) -> Self {
        Self {
            config,
            blur_backend,
            source: None,
            rotation: Rotation::NONE,
            layout: DisplayLayout::default(),
            mode: Mode::None,
            layers: LayerRegistry::new(),
            crop: SelectionTracker::new(RegionKind::Crop),
            blur: SelectionTracker::new(RegionKind::Blur),
            next_sequence: 0,
            latest_ticket: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Rotation previewed in rotate mode (always zero outside it).
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn layout(&self) -> &DisplayLayout {
        &self.layout
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    /// The current source image (rotation already baked in).
    pub fn source(&self) -> Option<&RgbaImage> {
        self.source.as_ref()
    }

    pub fn source_size(&self) -> Option<Size> {
        self.source
            .as_ref()
            .map(|img| Size::new(img.width(), img.height()))
    }

    /// Committed regions of one kind, oldest first.
    pub fn regions(&self, kind: RegionKind) -> &[Region] {
        self.tracker(kind).regions()
    }

    /// The rectangle being dragged, if any.
    pub fn active_selection(&self) -> Option<(RegionKind, &ImageRect)> {
        self.crop
            .active()
            .map(|r| (RegionKind::Crop, r))
            .or_else(|| self.blur.active().map(|r| (RegionKind::Blur, r)))
    }

    fn tracker(&self, kind: RegionKind) -> &SelectionTracker {
        match kind {
            RegionKind::Crop => &self.crop,
            RegionKind::Blur => &self.blur,
        }
    }

    fn tracker_mut(&mut self, kind: RegionKind) -> &mut SelectionTracker {
        match kind {
            RegionKind::Crop => &mut self.crop,
            RegionKind::Blur => &mut self.blur,
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Start a load request. Any earlier request still in flight is superseded.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_ticket += 1;
        LoadTicket(self.latest_ticket)
    }

    /// Start a load request for a file of type `mime`.
    ///
    /// Returns `None` for anything but JPEG or PNG, leaving a load already in
    /// flight current.
    pub fn begin_load_for(&mut self, mime: &str) -> Option<LoadTicket> {
        if !is_supported_mime(mime) {
            log::warn!("ignoring file of type {:?}", mime);
            return None;
        }
        Some(self.begin_load())
    }

    /// True if `ticket` is the newest load request.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest_ticket
    }

    /// Complete a load request.
    ///
    /// The image is installed only if `ticket` is still current and decoding
    /// succeeded; otherwise the editor is left exactly as it was. Returns
    /// whether the image was installed.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<DecodedImage, DecodeError>,
    ) -> bool {
        if !self.is_current(ticket) {
            log::debug!(
                "dropping stale load {} (latest is {})",
                ticket.0,
                self.latest_ticket
            );
            return false;
        }

        let decoded = match result {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("image load failed: {}", e);
                return false;
            }
        };
        if decoded.is_empty() {
            log::warn!("ignoring empty image");
            return false;
        }
        let Some(image) = decoded.into_rgba_image() else {
            log::warn!("decoded pixel buffer does not match its dimensions");
            return false;
        };

        self.install_source(image);
        true
    }

    /// Complete a load request with pixels the host decoded itself.
    pub fn finish_load_rgba(
        &mut self,
        ticket: LoadTicket,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> bool {
        let result = DecodedImage::from_rgba(width, height, pixels);
        self.finish_load(ticket, result)
    }

    /// Decode and install a user-selected file in one step.
    ///
    /// Files that are not JPEG or PNG are ignored without superseding a load
    /// already in flight.
    pub fn load_file(&mut self, bytes: &[u8], mime: &str) -> bool {
        let Some(ticket) = self.begin_load_for(mime) else {
            return false;
        };
        let result = decode_image(bytes, mime);
        self.finish_load(ticket, result)
    }

    fn install_source(&mut self, image: RgbaImage) {
        log::info!("loaded {}x{} image", image.width(), image.height());
        self.source = Some(image);
        self.crop = SelectionTracker::new(RegionKind::Crop);
        self.blur = SelectionTracker::new(RegionKind::Blur);
        self.next_sequence = 0;
        self.rotation = Rotation::NONE;
        self.mode = Mode::None;
        self.rebuild_layers();
    }

    // ------------------------------------------------------------------
    // Layout and layers
    // ------------------------------------------------------------------

    /// Change the container size. Regions and pixels are kept.
    pub fn set_container(&mut self, container: Size) {
        self.config.container = container;
        if let Some(size) = self.source_size() {
            self.layout = compute_display_layout(
                size,
                self.config.container,
                self.config.padding,
                self.rotation,
            );
            self.layers.relayout(&self.layout);
        }
    }

    /// Resize every layer to the (rotated) source and redraw all of them.
    fn rebuild_layers(&mut self) {
        let Some(native) = self.source_size() else {
            self.layers.unmount();
            return;
        };

        self.layout = compute_display_layout(
            native,
            self.config.container,
            self.config.padding,
            self.rotation,
        );
        self.layers
            .resize(self.rotation.apply_to(native), &self.layout);

        if let (Some(source), Some(surface)) =
            (self.source.as_ref(), self.layers.get_mut(LayerKind::Image))
        {
            let shown: Cow<'_, RgbaImage> = if self.rotation.is_none() {
                Cow::Borrowed(source)
            } else {
                Cow::Owned(apply_rotation(source, self.rotation))
            };
            surface.draw_image(&shown);
        }

        if self.mode == Mode::Blur {
            self.refresh_blur_preview();
        }
        self.redraw_overlay();
    }

    fn refresh_blur_preview(&mut self) {
        let (Some(source), Some(blur)) =
            (self.source.as_ref(), self.layers.get_mut(LayerKind::Blur))
        else {
            return;
        };
        draw_blur_preview(source, blur, self.blur_backend.as_ref());
    }

    fn redraw_overlay(&mut self) {
        let Some(overlay) = self.layers.get_mut(LayerKind::Overlay) else {
            return;
        };

        if self.rotation.is_none() {
            let regions = regions_in_commit_order(self.crop.regions(), self.blur.regions());
            let active = self
                .crop
                .active()
                .map(|r| (RegionKind::Crop, r))
                .or_else(|| self.blur.active().map(|r| (RegionKind::Blur, r)));
            draw_overlay(overlay, &regions, active, &self.config.overlay);
            return;
        }

        // Previewing a rotation: show regions where they will land.
        let Some(source) = self.source.as_ref() else {
            return;
        };
        let size = Size::new(source.width(), source.height());
        let rotated: Vec<Region> = regions_in_commit_order(self.crop.regions(), self.blur.regions())
            .into_iter()
            .map(|r| Region {
                kind: r.kind,
                rect: rotate_rect(&r.rect, size, self.rotation),
                sequence: r.sequence,
                snapshot: None,
            })
            .collect();
        let refs: Vec<&Region> = rotated.iter().collect();
        draw_overlay(overlay, &refs, None, &self.config.overlay);
    }

    // ------------------------------------------------------------------
    // Modes and rotation
    // ------------------------------------------------------------------

    /// Press a mode button: enter `target`, or return to `Mode::None` if it is
    /// already active. Returns whether the mode changed.
    pub fn toggle_mode(&mut self, target: Mode) -> bool {
        if !self.has_image() {
            log::debug!("ignoring {:?} toggle without an image", target);
            return false;
        }
        let next = if self.mode == target {
            Mode::None
        } else {
            target
        };
        self.set_mode(next)
    }

    /// Switch to `next`, discarding any drag in progress.
    ///
    /// Leaving rotate mode bakes the previewed rotation into the source image.
    pub fn set_mode(&mut self, next: Mode) -> bool {
        if next == self.mode || !self.has_image() {
            return false;
        }

        let cancelled_crop = self.crop.cancel();
        let cancelled_blur = self.blur.cancel();
        if cancelled_crop || cancelled_blur {
            log::debug!("mode switch discarded an unfinished selection");
        }

        if self.mode == Mode::Rotate {
            self.bake_rotation();
        }

        log::debug!("mode {:?} -> {:?}", self.mode, next);
        self.mode = next;
        if next == Mode::Blur {
            self.refresh_blur_preview();
        }
        self.redraw_overlay();
        true
    }

    /// Turn counter-clockwise by one rotation step (rotate mode only).
    pub fn rotate_left(&mut self) -> bool {
        self.rotate_by(-self.config.effective_rotation_step())
    }

    /// Turn clockwise by one rotation step (rotate mode only).
    pub fn rotate_right(&mut self) -> bool {
        self.rotate_by(self.config.effective_rotation_step())
    }

    fn rotate_by(&mut self, delta: i32) -> bool {
        if self.mode != Mode::Rotate {
            return false;
        }
        self.rotation = self.rotation.step(delta);
        self.rebuild_layers();
        true
    }

    /// Re-rasterize the source at the previewed rotation and reset it to zero.
    ///
    /// Committed regions and their snapshots are rotated along with the image.
    fn bake_rotation(&mut self) {
        let rotation = self.rotation;
        if rotation.is_none() {
            return;
        }
        let Some(source) = self.source.as_ref() else {
            return;
        };

        let size = Size::new(source.width(), source.height());
        let rotated = apply_rotation(source, rotation);
        let rotate_region = |region: &mut Region| {
            region.rect = rotate_rect(&region.rect, size, rotation);
            if let Some(snapshot) = region.snapshot.as_mut() {
                *snapshot = apply_rotation(snapshot, rotation);
            }
        };
        self.crop.transform_regions(rotate_region);
        self.blur.transform_regions(rotate_region);

        log::info!(
            "baked {} degree rotation ({}x{} -> {}x{})",
            rotation.degrees(),
            size.width,
            size.height,
            rotated.width(),
            rotated.height()
        );
        self.source = Some(rotated);
        self.rotation = Rotation::NONE;
        self.rebuild_layers();
    }

    // ------------------------------------------------------------------
    // Pointer events
    // ------------------------------------------------------------------

    /// Start a selection at `point`.
    ///
    /// `display_rect` is the overlay's on-screen box at the moment of the
    /// event, in the same coordinates as `point`.
    pub fn pointer_down(&mut self, point: DisplayPoint, display_rect: &DisplayRect) -> bool {
        let mode = self.mode;
        let Some(kind) = mode.region_kind() else {
            return false;
        };
        let Some(image_point) = self.map_pointer(point, display_rect) else {
            return false;
        };

        match self.tracker_mut(kind).begin(mode, image_point) {
            Ok(()) => {
                self.redraw_overlay();
                true
            }
            Err(e) => {
                log::debug!("pointer down ignored: {}", e);
                false
            }
        }
    }

    /// Stretch the active selection to `point`.
    pub fn pointer_move(&mut self, point: DisplayPoint, display_rect: &DisplayRect) -> bool {
        let Some(kind) = self.mode.region_kind() else {
            return false;
        };
        if self.tracker(kind).state() != TrackerState::Dragging {
            return false;
        }
        let Some(image_point) = self.map_pointer(point, display_rect) else {
            return false;
        };

        if self.tracker_mut(kind).update(image_point).is_err() {
            return false;
        }
        self.redraw_overlay();
        true
    }

    /// Finish the active selection, committing it unless it is degenerate.
    pub fn pointer_up(&mut self) -> Option<EndOutcome> {
        let kind = self.mode.region_kind()?;
        let Some(bounds) = self.layers.size() else {
            self.tracker_mut(kind).cancel();
            return None;
        };

        let sequence = self.next_sequence;
        let layers = &self.layers;
        let tracker = match kind {
            RegionKind::Crop => &mut self.crop,
            RegionKind::Blur => &mut self.blur,
        };
        let outcome = tracker.end(bounds, sequence, |rect| {
            layers
                .get(LayerKind::Blur)
                .and_then(|blur| crop_region(blur.pixels(), rect))
        });

        match outcome {
            Ok(outcome) => {
                if let EndOutcome::Committed(_) = outcome {
                    self.next_sequence += 1;
                }
                self.redraw_overlay();
                Some(outcome)
            }
            Err(e) => {
                log::debug!("pointer up ignored: {}", e);
                None
            }
        }
    }

    /// The pointer left the overlay: same as releasing it.
    pub fn pointer_leave(&mut self) -> Option<EndOutcome> {
        self.pointer_up()
    }

    fn map_pointer(
        &self,
        point: DisplayPoint,
        display_rect: &DisplayRect,
    ) -> Option<ImagePoint> {
        let size = self.layers.size()?;
        to_image_space(point, display_rect, size)
    }

    // ------------------------------------------------------------------
    // Region editing
    // ------------------------------------------------------------------

    /// Remove the newest region of the current mode's kind; in `Mode::None`,
    /// the newest region of either kind. Returns whether one was removed.
    pub fn undo_last(&mut self) -> bool {
        let Some(kind) = self.undo_target() else {
            return false;
        };
        match self.tracker_mut(kind).undo_last() {
            Ok(Some(region)) => {
                log::debug!("undid {:?} region {:?}", region.kind, region.rect);
                self.redraw_overlay();
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::debug!("undo ignored: {}", e);
                false
            }
        }
    }

    fn undo_target(&self) -> Option<RegionKind> {
        match self.mode {
            Mode::Crop => Some(RegionKind::Crop),
            Mode::Blur => Some(RegionKind::Blur),
            Mode::Rotate => None,
            Mode::None => match (self.crop.last_sequence(), self.blur.last_sequence()) {
                (Some(c), Some(b)) => Some(if c > b {
                    RegionKind::Crop
                } else {
                    RegionKind::Blur
                }),
                (Some(_), None) => Some(RegionKind::Crop),
                (None, Some(_)) => Some(RegionKind::Blur),
                (None, None) => None,
            },
        }
    }

    /// Remove every region of the current mode's kind (both kinds in
    /// `Mode::None`).
    pub fn clear_regions(&mut self) {
        match self.mode.region_kind() {
            Some(kind) => self.tracker_mut(kind).clear_all(),
            None if self.mode == Mode::None => {
                self.crop.clear_all();
                self.blur.clear_all();
            }
            None => return,
        }
        self.redraw_overlay();
    }

    /// Which controls the host should enable.
    pub fn controls(&self) -> ControlStates {
        let loaded = self.has_image();
        let rotating = loaded && self.mode == Mode::Rotate;
        let can_undo = loaded
            && self
                .undo_target()
                .is_some_and(|kind| !self.tracker(kind).regions().is_empty());

        ControlStates {
            toggle_blur: loaded,
            toggle_crop: loaded,
            toggle_rotate: loaded,
            rotate_left: rotating,
            rotate_right: rotating,
            undo: can_undo,
            export: loaded && self.mode == Mode::None && !self.crop.regions().is_empty(),
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Composite blur regions onto the source and cut out every crop region.
    ///
    /// Returns one image per crop region, in commit order. Editor state is
    /// not modified.
    pub fn export_images(&self) -> Result<Vec<RgbaImage>, EditorError> {
        let source = self.source.as_ref().ok_or(EditorError::NoImage)?;
        if self.mode != Mode::None {
            return Err(EditorError::ExportDisabled(self.mode));
        }
        if self.crop.regions().is_empty() {
            return Err(EditorError::NothingToExport);
        }

        let blur_layer = self.layers.get(LayerKind::Blur).map(Surface::pixels);
        let composite = export_blurred(source, blur_layer, self.blur.regions());
        Ok(export_crops(&composite, self.crop.regions()))
    }

    /// Export every crop region as a named PNG.
    pub fn export(&self) -> Result<Vec<ExportedImage>, EditorError> {
        let images = self.export_images()?;
        let exported = images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                Ok(ExportedImage {
                    file_name: self.config.export_file_name(index),
                    width: image.width(),
                    height: image.height(),
                    png: encode_rgba_image(image)?,
                })
            })
            .collect::<Result<Vec<_>, EditorError>>()?;

        log::info!("exported {} image(s)", exported.len());
        Ok(exported)
    }
}
