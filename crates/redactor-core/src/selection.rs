//! Rectangle selection state machines.
//!
//! The editor owns one [`SelectionTracker`] per region kind. Each goes
//! `Idle -> Dragging -> Idle`, and on the way back to idle either commits the
//! dragged rectangle or discards it:
//!
//! ```text
//! begin(point)   Idle      -> Dragging   active = {point, 0x0}
//! update(point)  Dragging  -> Dragging   extent = point - origin (signed)
//! end(..)        Dragging  -> Idle       commit if non-degenerate, else discard
//! cancel()       Dragging  -> Idle       always discard
//! ```
//!
//! Committed rectangles are normalized and snapped to whole pixels inside the
//! image, so a region never has zero width or height.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::Mode;
use crate::geometry::{ImagePoint, ImageRect, PixelRect, Size};

/// What a region is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Crop,
    Blur,
}

impl RegionKind {
    /// The editor mode in which regions of this kind are drawn.
    pub fn mode(self) -> Mode {
        match self {
            RegionKind::Crop => Mode::Crop,
            RegionKind::Blur => Mode::Blur,
        }
    }
}

/// A committed selection.
#[derive(Debug, Clone)]
pub struct Region {
    pub kind: RegionKind,
    pub rect: PixelRect,
    /// Position in the editor-wide commit order (both kinds share one counter).
    pub sequence: u64,
    /// Blurred pixels under `rect`, captured at commit time (blur regions only).
    pub snapshot: Option<RgbaImage>,
}

/// Errors for calls made in the wrong tracker state.
///
/// The editor treats these as no-ops; they exist so callers and tests can tell
/// an ignored event from an applied one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The editor mode does not draw this tracker's region kind.
    #[error("{kind:?} selection cannot start in {mode:?} mode")]
    ModeMismatch { kind: RegionKind, mode: Mode },

    /// A drag is already in progress.
    #[error("selection is already being dragged")]
    NotIdle,

    /// No drag is in progress.
    #[error("no selection is being dragged")]
    NotDragging,
}

/// Tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Dragging,
}

/// How a drag finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    Committed(PixelRect),
    Discarded,
}

/// In-progress and committed rectangles for one region kind.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    kind: RegionKind,
    active: Option<ImageRect>,
    committed: Vec<Region>,
}

impl SelectionTracker {
    pub fn new(kind: RegionKind) -> Self {
        Self {
            kind,
            active: None,
            committed: Vec::new(),
        }
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn state(&self) -> TrackerState {
        if self.active.is_some() {
            TrackerState::Dragging
        } else {
            TrackerState::Idle
        }
    }

    /// The rectangle being dragged, un-normalized.
    pub fn active(&self) -> Option<&ImageRect> {
        self.active.as_ref()
    }

    pub fn regions(&self) -> &[Region] {
        &self.committed
    }

    /// Start dragging at `point`.
    pub fn begin(&mut self, mode: Mode, point: ImagePoint) -> Result<(), SelectionError> {
        if mode != self.kind.mode() {
            return Err(SelectionError::ModeMismatch {
                kind: self.kind,
                mode,
            });
        }
        if self.active.is_some() {
            return Err(SelectionError::NotIdle);
        }
        self.active = Some(ImageRect::at(point));
        Ok(())
    }

    /// Stretch the active rectangle so its far corner sits at `point`.
    pub fn update(&mut self, point: ImagePoint) -> Result<(), SelectionError> {
        let active = self.active.as_mut().ok_or(SelectionError::NotDragging)?;
        active.width = point.x - active.x;
        active.height = point.y - active.y;
        Ok(())
    }

    /// Finish the drag.
    ///
    /// The rectangle is normalized and snapped to whole pixels inside `bounds`.
    /// If anything remains it is committed with `sequence`; blur regions call
    /// `capture` to snapshot the blurred pixels under the rectangle.
    pub fn end<F>(
        &mut self,
        bounds: Size,
        sequence: u64,
        capture: F,
    ) -> Result<EndOutcome, SelectionError>
    where
        F: FnOnce(&PixelRect) -> Option<RgbaImage>,
    {
        let active = self.active.take().ok_or(SelectionError::NotDragging)?;

        let Some(rect) = PixelRect::from_image_rect(&active, bounds) else {
            log::debug!("discarding degenerate {:?} selection {:?}", self.kind, active);
            return Ok(EndOutcome::Discarded);
        };

        let snapshot = match self.kind {
            RegionKind::Blur => capture(&rect),
            RegionKind::Crop => None,
        };
        self.committed.push(Region {
            kind: self.kind,
            rect,
            sequence,
            snapshot,
        });
        log::debug!("committed {:?} region {:?}", self.kind, rect);
        Ok(EndOutcome::Committed(rect))
    }

    /// Drop the active rectangle without committing it.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Remove the most recently committed region.
    pub fn undo_last(&mut self) -> Result<Option<Region>, SelectionError> {
        if self.active.is_some() {
            return Err(SelectionError::NotIdle);
        }
        Ok(self.committed.pop())
    }

    /// Remove every committed region.
    pub fn clear_all(&mut self) {
        self.committed.clear();
    }

    /// Rewrite every committed region in place (used when the image is rotated).
    pub fn transform_regions<F>(&mut self, f: F)
    where
        F: FnMut(&mut Region),
    {
        self.committed.iter_mut().for_each(f);
    }

    /// Sequence number of the newest committed region.
    pub fn last_sequence(&self) -> Option<u64> {
        self.committed.last().map(|r| r.sequence)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
