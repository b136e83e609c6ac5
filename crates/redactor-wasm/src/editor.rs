//! WASM bindings for the editor controller.
//!
//! [`JsEditor`] owns a core `Editor` and exposes its event handlers with flat
//! numeric arguments. Pointer events take the pointer's client coordinates
//! together with the overlay canvas bounding rect, both straight from the DOM.
//!
//! # Example
//!
//! ```typescript
//! import { JsEditor } from '@redactor/wasm';
//!
//! const editor = new JsEditor({ container: { width: 900, height: 900 }, padding: 100 });
//!
//! input.onchange = async () => {
//!   const file = input.files[0];
//!   const ticket = editor.begin_load_for(file.type);
//!   if (!ticket) return; // not a JPEG or PNG
//!   const bytes = new Uint8Array(await file.arrayBuffer());
//!   if (editor.finish_load_bytes(ticket, bytes, file.type)) redraw();
//! };
//!
//! overlay.onmousedown = (e) => {
//!   const r = overlay.getBoundingClientRect();
//!   editor.pointer_down(e.clientX, e.clientY, r.left, r.top, r.width, r.height);
//!   redrawOverlay();
//! };
//! ```

use js_sys::Array;
use redactor_core::decode::{decode_image, DecodeError};
use redactor_core::editor::{Editor, LoadTicket, Mode};
use redactor_core::geometry::{DisplayPoint, DisplayRect, Size};
use redactor_core::layers::LayerKind;
use redactor_core::selection::{EndOutcome, RegionKind};
use redactor_core::EditorConfig;
use wasm_bindgen::prelude::*;

use crate::types::{JsDecodedImage, JsExportedImage};

/// Identifies one load request; pass it back to `finish_load_*`.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct JsLoadTicket {
    ticket: LoadTicket,
}

/// The image editor.
#[wasm_bindgen]
pub struct JsEditor {
    inner: Editor,
}

#[wasm_bindgen]
impl JsEditor {
    /// Create an editor. `config` may be `undefined` or any subset of the
    /// editor settings; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsEditor, JsValue> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid editor config: {}", e)))?
        };
        Ok(Self::with_config(config))
    }

    // ---- loading ----

    /// Start a load. Any earlier load still in flight is superseded.
    pub fn begin_load(&mut self) -> JsLoadTicket {
        JsLoadTicket {
            ticket: self.inner.begin_load(),
        }
    }

    /// Start a load for a file of type `mime`.
    ///
    /// Returns `undefined` for anything but JPEG or PNG; a load already in
    /// flight stays current.
    pub fn begin_load_for(&mut self, mime: &str) -> Option<JsLoadTicket> {
        self.inner
            .begin_load_for(mime)
            .map(|ticket| JsLoadTicket { ticket })
    }

    /// Decode file bytes and install them if `ticket` is still the newest load.
    pub fn finish_load_bytes(&mut self, ticket: &JsLoadTicket, bytes: &[u8], mime: &str) -> bool {
        if !self.inner.is_current(ticket.ticket) {
            return false;
        }
        let result = decode_image(bytes, mime);
        self.inner.finish_load(ticket.ticket, result)
    }

    /// Install pixels the host decoded itself (e.g. via `createImageBitmap`).
    pub fn finish_load_image(&mut self, ticket: &JsLoadTicket, image: &JsDecodedImage) -> bool {
        self.inner.finish_load(ticket.ticket, image.to_decoded())
    }

    /// Report that reading the file failed. The editor keeps its state.
    pub fn abort_load(&mut self, ticket: &JsLoadTicket, reason: &str) {
        self.inner.finish_load(
            ticket.ticket,
            Err(DecodeError::CorruptedFile(reason.to_string())),
        );
    }

    /// Decode and install a file in one call. Non-image files are ignored.
    pub fn load_file(&mut self, bytes: &[u8], mime: &str) -> bool {
        self.inner.load_file(bytes, mime)
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.inner.has_image()
    }

    // ---- layout ----

    /// The container element was resized.
    pub fn set_container(&mut self, width: u32, height: u32) {
        self.inner.set_container(Size::new(width, height));
    }

    /// Pixel width shared by all layers (0 before an image loads).
    #[wasm_bindgen(getter)]
    pub fn layer_width(&self) -> u32 {
        self.inner.layers().size().map_or(0, |s| s.width)
    }

    /// Pixel height shared by all layers (0 before an image loads).
    #[wasm_bindgen(getter)]
    pub fn layer_height(&self) -> u32 {
        self.inner.layers().size().map_or(0, |s| s.height)
    }

    /// CSS width the layers should be shown at.
    #[wasm_bindgen(getter)]
    pub fn display_width(&self) -> f64 {
        self.inner.layers().display_size().map_or(0.0, |s| s.width)
    }

    /// CSS height the layers should be shown at.
    #[wasm_bindgen(getter)]
    pub fn display_height(&self) -> f64 {
        self.inner.layers().display_size().map_or(0.0, |s| s.height)
    }

    /// RGBA pixels of one layer: `"image"`, `"blur"` or `"overlay"`.
    ///
    /// Returns an empty buffer before an image is loaded.
    pub fn layer_pixels(&self, layer: &str) -> Result<Vec<u8>, JsValue> {
        let kind = parse_layer(layer).ok_or_else(|| {
            JsValue::from_str(&format!("Unknown layer: {}", layer))
        })?;
        Ok(self.layer_bytes(kind))
    }

    // ---- modes ----

    /// Press a mode button (`"crop"`, `"blur"` or `"rotate"`).
    pub fn toggle_mode(&mut self, mode: &str) -> Result<bool, JsValue> {
        let mode: Mode = mode.parse().map_err(|e| JsValue::from_str(&format!("{}", e)))?;
        Ok(self.inner.toggle_mode(mode))
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        mode_name(self.inner.mode()).to_string()
    }

    pub fn rotate_left(&mut self) -> bool {
        self.inner.rotate_left()
    }

    pub fn rotate_right(&mut self) -> bool {
        self.inner.rotate_right()
    }

    /// Rotation being previewed, in degrees clockwise.
    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> i32 {
        self.inner.rotation().degrees()
    }

    // ---- pointer ----

    pub fn pointer_down(
        &mut self,
        client_x: f64,
        client_y: f64,
        rect_x: f64,
        rect_y: f64,
        rect_width: f64,
        rect_height: f64,
    ) -> bool {
        let rect = DisplayRect::new(rect_x, rect_y, rect_width, rect_height);
        self.inner
            .pointer_down(DisplayPoint::new(client_x, client_y), &rect)
    }

    pub fn pointer_move(
        &mut self,
        client_x: f64,
        client_y: f64,
        rect_x: f64,
        rect_y: f64,
        rect_width: f64,
        rect_height: f64,
    ) -> bool {
        let rect = DisplayRect::new(rect_x, rect_y, rect_width, rect_height);
        self.inner
            .pointer_move(DisplayPoint::new(client_x, client_y), &rect)
    }

    /// Finish the drag. Returns true if a region was committed.
    pub fn pointer_up(&mut self) -> bool {
        matches!(self.inner.pointer_up(), Some(EndOutcome::Committed(_)))
    }

    /// The pointer left the overlay. Behaves like `pointer_up`.
    pub fn pointer_leave(&mut self) -> bool {
        matches!(self.inner.pointer_leave(), Some(EndOutcome::Committed(_)))
    }

    // ---- regions ----

    pub fn undo(&mut self) -> bool {
        self.inner.undo_last()
    }

    pub fn clear_regions(&mut self) {
        self.inner.clear_regions();
    }

    /// Number of committed regions of a kind (`"crop"` or `"blur"`).
    pub fn region_count(&self, kind: &str) -> u32 {
        parse_region_kind(kind).map_or(0, |k| self.inner.regions(k).len() as u32)
    }

    /// Committed regions of a kind as `[{ x, y, width, height }]`, oldest first.
    pub fn regions(&self, kind: &str) -> Result<JsValue, JsValue> {
        let kind = parse_region_kind(kind)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown region kind: {}", kind)))?;
        let rects: Vec<_> = self.inner.regions(kind).iter().map(|r| r.rect).collect();
        serde_wasm_bindgen::to_value(&rects).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Enabled state of every control, e.g. `{ export: true, undo: false, ... }`.
    pub fn controls(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.controls())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // ---- export ----

    /// Export every crop region as a PNG. Returns an array of `JsExportedImage`.
    pub fn export(&self) -> Result<Array, JsValue> {
        let exported = self
            .inner
            .export()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(exported
            .into_iter()
            .map(|image| JsValue::from(JsExportedImage::from(image)))
            .collect())
    }
}

impl JsEditor {
    pub(crate) fn with_config(config: EditorConfig) -> Self {
        Self {
            inner: Editor::new(config),
        }
    }

    fn layer_bytes(&self, kind: LayerKind) -> Vec<u8> {
        self.inner
            .layers()
            .get(kind)
            .map(|surface| surface.pixels().as_raw().clone())
            .unwrap_or_default()
    }
}

fn parse_layer(name: &str) -> Option<LayerKind> {
    LayerKind::ALL
        .into_iter()
        .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
}

fn parse_region_kind(name: &str) -> Option<RegionKind> {
    name.parse::<Mode>().ok().and_then(Mode::region_kind)
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::None => "none",
        Mode::Crop => "crop",
        Mode::Blur => "blur",
        Mode::Rotate => "rotate",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Editor showing layers 1:1, so client coordinates equal image pixels.
    fn editor_with_image(width: u32, height: u32) -> JsEditor {
        let mut config = EditorConfig::default();
        config.container = Size::new(width, height);
        config.padding = 0;
        let mut editor = JsEditor::with_config(config);
        let ticket = editor.begin_load();
        let image = JsDecodedImage::new(width, height, vec![200u8; (width * height * 4) as usize]);
        assert!(editor.finish_load_image(&ticket, &image));
        editor
    }

    fn drag(editor: &mut JsEditor, from: (f64, f64), to: (f64, f64)) -> bool {
        let (w, h) = (editor.display_width(), editor.display_height());
        editor.pointer_down(from.0, from.1, 0.0, 0.0, w, h);
        editor.pointer_move(to.0, to.1, 0.0, 0.0, w, h);
        editor.pointer_up()
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_layer("overlay"), Some(LayerKind::Overlay));
        assert_eq!(parse_layer("Blur"), Some(LayerKind::Blur));
        assert_eq!(parse_layer("shadow"), None);
        assert_eq!(parse_region_kind("crop"), Some(RegionKind::Crop));
        assert_eq!(parse_region_kind("rotate"), None);
    }

    #[test]
    fn test_load_sets_layer_sizes() {
        let editor = editor_with_image(30, 20);
        assert!(editor.has_image());
        assert_eq!((editor.layer_width(), editor.layer_height()), (30, 20));
        assert_eq!(editor.layer_bytes(LayerKind::Image).len(), 30 * 20 * 4);
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let mut editor = JsEditor::with_config(EditorConfig::default());
        let first = editor.begin_load();
        let _second = editor.begin_load();
        let image = JsDecodedImage::new(2, 2, vec![0u8; 16]);
        assert!(!editor.finish_load_image(&first, &image));
        assert!(!editor.has_image());
    }

    #[test]
    fn test_text_file_pick_keeps_png_load() {
        let png = redactor_core::encode::encode_png(&[10u8, 20, 30, 255].repeat(4 * 3), 4, 3)
            .unwrap();
        let mut editor = JsEditor::with_config(EditorConfig::default());

        let first = editor.begin_load_for("image/png").unwrap();
        assert!(editor.begin_load_for("text/plain").is_none());
        assert!(editor.finish_load_bytes(&first, &png, "image/png"));
        assert_eq!((editor.layer_width(), editor.layer_height()), (4, 3));
    }

    #[test]
    fn test_abort_load_keeps_image() {
        let mut editor = editor_with_image(10, 10);
        let ticket = editor.begin_load();
        editor.abort_load(&ticket, "read error");
        assert!(editor.has_image());
        assert_eq!(editor.layer_width(), 10);
    }

    #[test]
    fn test_crop_flow() {
        let mut editor = editor_with_image(100, 100);
        assert!(matches!(editor.toggle_mode("crop"), Ok(true)));
        assert_eq!(editor.mode(), "crop");

        assert!(drag(&mut editor, (50.0, 50.0), (10.0, 10.0)));
        assert!(!drag(&mut editor, (5.0, 5.0), (5.0, 5.0)));
        assert_eq!(editor.region_count("crop"), 1);

        assert!(editor.undo());
        assert_eq!(editor.region_count("crop"), 0);
    }

    #[test]
    fn test_rotate_flow() {
        let mut editor = editor_with_image(40, 20);
        assert!(!editor.rotate_right());
        assert!(matches!(editor.toggle_mode("rotate"), Ok(true)));
        assert!(editor.rotate_right());
        assert_eq!(editor.rotation(), 90);
        assert_eq!((editor.layer_width(), editor.layer_height()), (20, 40));

        assert!(matches!(editor.toggle_mode("rotate"), Ok(true)));
        assert_eq!(editor.mode(), "none");
        assert_eq!(editor.rotation(), 0);
        assert_eq!((editor.layer_width(), editor.layer_height()), (20, 40));
    }

    #[test]
    fn test_overlay_pixels_follow_selection() {
        let mut editor = editor_with_image(20, 20);
        let _ = editor.toggle_mode("blur");
        drag(&mut editor, (2.0, 2.0), (12.0, 12.0));

        let overlay = editor.layer_bytes(LayerKind::Overlay);
        let idx = (7 * 20 + 7) * 4;
        assert!(overlay[idx + 3] > 0);
        assert_eq!(overlay[3], 0);
    }
}
