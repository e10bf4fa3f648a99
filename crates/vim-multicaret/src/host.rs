//! Host selection surfaces.
//!
//! The host owns the native caret and selection the user sees. A [`SelectionHost`] of
//! [`HostCapability::SingleSelection`] can show only one of them natively; secondary spans live in
//! an overlay the renderer draws. A host with [`HostCapability::NativeMultiSelection`] maps every
//! span onto its own primitives. The tracker drives both the same way.

use crate::span::SelectedSpan;

/// What the host can show natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCapability {
    /// One native caret and selection; secondaries are drawn as an overlay.
    SingleSelection,
    /// Every span is a native selection.
    NativeMultiSelection,
}

/// The host editor surface, as driven by [`crate::MultiSelectionTracker`].
pub trait SelectionHost {
    /// What the host can show natively.
    fn capability(&self) -> HostCapability;

    /// The native caret and selection.
    fn native_selection(&self) -> SelectedSpan;

    /// Move the native caret and selection.
    fn set_native_selection(&mut self, span: SelectedSpan);

    /// Secondary spans as currently shown.
    fn secondary_spans(&self) -> Vec<SelectedSpan>;

    /// Replace the secondary spans.
    fn set_secondary_spans(&mut self, spans: &[SelectedSpan]);

    /// Alert the user that an operation could not proceed.
    fn beep(&mut self);
}

/// A single-selection host with a secondary overlay.
#[derive(Debug, Clone, Default)]
pub struct OverlayHost {
    native: SelectedSpan,
    overlay: Vec<SelectedSpan>,
    overlay_generation: u64,
    beep_count: usize,
}

impl OverlayHost {
    /// Create a host with the native caret at `native`.
    pub fn new(native: SelectedSpan) -> Self {
        Self {
            native,
            ..Self::default()
        }
    }

    /// Bumped every time the overlay changes; renderers redraw when it moves.
    pub fn overlay_generation(&self) -> u64 {
        self.overlay_generation
    }

    /// Number of beeps so far.
    pub fn beep_count(&self) -> usize {
        self.beep_count
    }

    /// Move the native selection as the user would, without notifying anyone.
    ///
    /// Callers route the change to the tracker with
    /// [`crate::MultiSelectionTracker::on_host_selection_changed`].
    pub fn move_native(&mut self, span: SelectedSpan) {
        self.native = span;
    }
}

impl SelectionHost for OverlayHost {
    fn capability(&self) -> HostCapability {
        HostCapability::SingleSelection
    }

    fn native_selection(&self) -> SelectedSpan {
        self.native
    }

    fn set_native_selection(&mut self, span: SelectedSpan) {
        self.native = span;
    }

    fn secondary_spans(&self) -> Vec<SelectedSpan> {
        self.overlay.clone()
    }

    fn set_secondary_spans(&mut self, spans: &[SelectedSpan]) {
        if self.overlay != spans {
            self.overlay = spans.to_vec();
            self.overlay_generation += 1;
        }
    }

    fn beep(&mut self) {
        self.beep_count += 1;
    }
}

/// A host that shows every span natively. Index 0 is the primary.
#[derive(Debug, Clone)]
pub struct NativeMultiSelectionHost {
    spans: Vec<SelectedSpan>,
    beep_count: usize,
}

impl NativeMultiSelectionHost {
    /// Create a host with one caret at `native`.
    pub fn new(native: SelectedSpan) -> Self {
        Self {
            spans: vec![native],
            beep_count: 0,
        }
    }

    /// All native spans, primary first.
    pub fn spans(&self) -> &[SelectedSpan] {
        &self.spans
    }

    /// Number of beeps so far.
    pub fn beep_count(&self) -> usize {
        self.beep_count
    }

    /// Move the primary selection as the user would, without notifying anyone.
    pub fn move_native(&mut self, span: SelectedSpan) {
        self.set_native_selection(span);
    }
}

impl Default for NativeMultiSelectionHost {
    fn default() -> Self {
        Self::new(SelectedSpan::default())
    }
}

impl SelectionHost for NativeMultiSelectionHost {
    fn capability(&self) -> HostCapability {
        HostCapability::NativeMultiSelection
    }

    fn native_selection(&self) -> SelectedSpan {
        self.spans.first().copied().unwrap_or_default()
    }

    fn set_native_selection(&mut self, span: SelectedSpan) {
        match self.spans.first_mut() {
            Some(primary) => *primary = span,
            None => self.spans.push(span),
        }
    }

    fn secondary_spans(&self) -> Vec<SelectedSpan> {
        self.spans.iter().skip(1).copied().collect()
    }

    fn set_secondary_spans(&mut self, spans: &[SelectedSpan]) {
        self.spans.truncate(1);
        self.spans.extend_from_slice(spans);
    }

    fn beep(&mut self) {
        self.beep_count += 1;
    }
}
