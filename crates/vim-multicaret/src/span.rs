//! Caret plus optional selection.
//!
//! A [`SelectedSpan`] stores three points:
//!
//! - `caret`: where the caret is drawn,
//! - `anchor`: the fixed end of the selection,
//! - `active`: the moving end of the selection.
//!
//! A bare caret has all three equal. Spans exist in two forms:
//!
//! - **Engine form** (exclusive): the selection covers `start()..end()` half-open and the caret
//!   sits on `active`. The execution engine always works with this form.
//! - **Host form**: what the host surface shows. Under `selection=exclusive` it is identical to the
//!   engine form. Under `selection=inclusive`, character-wise Visual mode grows the end of the
//!   selection by one column ([`SelectedSpan::adjust_end_for_inclusive`]) and character-wise
//!   Select mode moves the caret back onto the last selected character
//!   ([`SelectedSpan::adjust_caret_for_inclusive`]).

use crate::mode::{Mode, VisualKind};
use crate::point::VirtualPoint;
use crate::settings::Settings;

/// A caret with an optional selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SelectedSpan {
    /// Caret position.
    pub caret: VirtualPoint,
    /// Fixed end of the selection.
    pub anchor: VirtualPoint,
    /// Moving end of the selection.
    pub active: VirtualPoint,
}

impl SelectedSpan {
    /// A bare caret.
    pub fn caret(point: VirtualPoint) -> Self {
        Self {
            caret: point,
            anchor: point,
            active: point,
        }
    }

    /// A span from explicit points.
    pub fn new(caret: VirtualPoint, anchor: VirtualPoint, active: VirtualPoint) -> Self {
        Self {
            caret,
            anchor,
            active,
        }
    }

    /// A selection from `anchor` to `active` with the caret on the active end.
    pub fn selection(anchor: VirtualPoint, active: VirtualPoint) -> Self {
        Self {
            caret: active,
            anchor,
            active,
        }
    }

    /// Build a span around `caret` from two column deltas.
    ///
    /// The selection runs from `caret + start_delta` to `caret + end_delta`. When `reversed` is
    /// `false` the anchor is the start and the selection grows forward; when `true` the anchor is
    /// the end. The caret stays at `caret`.
    pub fn from_offsets(
        caret: VirtualPoint,
        start_delta: isize,
        end_delta: isize,
        reversed: bool,
    ) -> Self {
        let start = caret.offset_columns(start_delta);
        let end = caret.offset_columns(end_delta);
        let (anchor, active) = if reversed { (end, start) } else { (start, end) };
        Self {
            caret,
            anchor,
            active,
        }
    }

    /// The anchor, or `None` for a span without a selection.
    pub fn anchor_point(&self) -> Option<VirtualPoint> {
        (self.anchor != self.active).then_some(self.anchor)
    }

    /// Returns `true` if no text is selected.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    /// Returns `true` if the active end lies before the anchor.
    pub fn is_reversed(&self) -> bool {
        self.active < self.anchor
    }

    /// The earlier end of the selection.
    pub fn start(&self) -> VirtualPoint {
        self.anchor.min(self.active)
    }

    /// The later end of the selection.
    pub fn end(&self) -> VirtualPoint {
        self.anchor.max(self.active)
    }

    /// Drop the selection, keeping the caret.
    pub fn collapse(&self) -> Self {
        Self::caret(self.caret)
    }

    /// Apply `f` to all three points.
    pub fn map_points(&self, mut f: impl FnMut(VirtualPoint) -> VirtualPoint) -> Self {
        Self {
            caret: f(self.caret),
            anchor: f(self.anchor),
            active: f(self.active),
        }
    }

    /// Move the caret back onto the last selected character.
    ///
    /// Applies to a forward, non-empty span whose caret sits on the active end; any other span is
    /// returned unchanged.
    pub fn adjust_caret_for_inclusive(&self) -> Self {
        if !self.is_empty() && !self.is_reversed() && self.caret == self.active {
            Self {
                caret: self.caret.offset_columns(-1),
                ..*self
            }
        } else {
            *self
        }
    }

    /// Inverse of [`SelectedSpan::adjust_caret_for_inclusive`].
    pub fn unadjust_caret_for_inclusive(&self) -> Self {
        if !self.is_empty()
            && !self.is_reversed()
            && self.active.column > 0
            && self.caret == self.active.offset_columns(-1)
        {
            Self {
                caret: self.active,
                ..*self
            }
        } else {
            *self
        }
    }

    /// Grow the end of the selection by one column so it covers the character under it.
    ///
    /// A forward span extends `active`, a reversed span extends `anchor`. A bare caret is treated
    /// as forward: Visual mode always covers the character under the caret.
    pub fn adjust_end_for_inclusive(&self) -> Self {
        if self.is_reversed() {
            Self {
                anchor: self.anchor.offset_columns(1),
                ..*self
            }
        } else {
            Self {
                active: self.active.offset_columns(1),
                ..*self
            }
        }
    }

    /// Inverse of [`SelectedSpan::adjust_end_for_inclusive`].
    pub fn unadjust_end_for_inclusive(&self) -> Self {
        if self.is_reversed() {
            Self {
                anchor: self.anchor.offset_columns(-1),
                ..*self
            }
        } else if !self.is_empty() {
            Self {
                active: self.active.offset_columns(-1),
                ..*self
            }
        } else {
            *self
        }
    }

    /// Convert an engine-form span to what the host shows in `mode`.
    pub fn to_host_form(&self, mode: Mode, settings: &Settings) -> Self {
        if !settings.is_inclusive() {
            return *self;
        }
        match mode {
            Mode::Visual(VisualKind::Character) => self.adjust_end_for_inclusive(),
            Mode::Select(VisualKind::Character) => self.adjust_caret_for_inclusive(),
            _ => *self,
        }
    }

    /// Convert a host-form span in `mode` back to engine form.
    pub fn to_engine_form(&self, mode: Mode, settings: &Settings) -> Self {
        if !settings.is_inclusive() {
            return *self;
        }
        match mode {
            Mode::Visual(VisualKind::Character) => self.unadjust_end_for_inclusive(),
            Mode::Select(VisualKind::Character) => self.unadjust_caret_for_inclusive(),
            _ => *self,
        }
    }
}

impl From<VirtualPoint> for SelectedSpan {
    fn from(point: VirtualPoint) -> Self {
        Self::caret(point)
    }
}
