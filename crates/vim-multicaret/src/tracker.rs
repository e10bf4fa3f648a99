//! The multi-selection set and its synchronization with the host.
//!
//! [`MultiSelectionTracker`] is the single source of truth for the caret/selection set of one
//! buffer. Index 0 is the primary span, which always equals the host's native selection once an
//! operation returns; the remaining spans are secondaries, pushed to the host's secondary
//! collection.
//!
//! Spans are stored in host form (see [`crate::span`]). Every entry also carries its sticky
//! display column so that vertical caret additions keep targeting the column they started from
//! across short lines.
//!
//! # Example
//!
//! ```rust
//! use vim_multicaret::{
//!     CaretDirection, Mode, MultiSelectionTracker, OverlayHost, RopeBuffer, SelectedSpan,
//!     Settings, TextBuffer, VirtualPoint,
//! };
//!
//! let buffer = RopeBuffer::from_lines(&["abc def", "ghi jkl", "mno pqr"]);
//! let host = OverlayHost::new(SelectedSpan::caret(VirtualPoint::new(1, 4)));
//! let mut tracker = MultiSelectionTracker::attach(host, buffer.version());
//!
//! let added = tracker
//!     .add_caret_on_line(CaretDirection::Below, &buffer, &Settings::default(), Mode::Normal)
//!     .unwrap();
//! assert_eq!(added, VirtualPoint::new(2, 4));
//! assert_eq!(tracker.span_count(), 2);
//! ```

use crate::buffer::TextBuffer;
use crate::error::TrackerError;
use crate::host::SelectionHost;
use crate::mode::Mode;
use crate::point::{SnapshotVersion, VirtualPoint};
use crate::settings::Settings;
use crate::span::SelectedSpan;
use crate::text::{column_for_display, display_column};
use crate::translate::{OffsetTranslator, TextChange};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace, warn};

/// Direction of a vertical caret addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaretDirection {
    /// One line above the topmost caret.
    Above,
    /// One line below the bottommost caret.
    Below,
}

impl fmt::Display for CaretDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaretDirection::Above => f.write_str("above"),
            CaretDirection::Below => f.write_str("below"),
        }
    }
}

/// A span plus its sticky display column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackedSpan {
    /// The span, in host form.
    pub span: SelectedSpan,
    /// Display column vertical motions aim for, if one is remembered.
    pub desired_column: Option<usize>,
}

impl TrackedSpan {
    /// A span without a sticky column.
    pub fn new(span: SelectedSpan) -> Self {
        Self {
            span,
            desired_column: None,
        }
    }
}

impl From<SelectedSpan> for TrackedSpan {
    fn from(span: SelectedSpan) -> Self {
        Self::new(span)
    }
}

/// Read-only view of the set, for renderers and assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    /// Snapshot the spans refer to.
    pub version: SnapshotVersion,
    /// The primary span.
    pub primary: SelectedSpan,
    /// Secondary spans, in order.
    pub secondaries: Vec<SelectedSpan>,
}

impl SelectionSnapshot {
    /// All spans, primary first.
    pub fn spans(&self) -> impl Iterator<Item = &SelectedSpan> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }

    /// Caret of every span, primary first.
    pub fn carets(&self) -> Vec<VirtualPoint> {
        self.spans().map(|span| span.caret).collect()
    }
}

/// Owns the multi-selection set of one buffer and mirrors it to a [`SelectionHost`].
#[derive(Debug)]
pub struct MultiSelectionTracker<H: SelectionHost> {
    host: H,
    entries: Vec<TrackedSpan>,
    version: SnapshotVersion,
}

impl<H: SelectionHost> MultiSelectionTracker<H> {
    /// Attach to `host`. The host's native selection becomes the primary span.
    pub fn attach(mut host: H, version: SnapshotVersion) -> Self {
        let primary = host.native_selection();
        host.set_secondary_spans(&[]);
        debug!(target: "selection", caret = %primary.caret, %version, "attach");
        Self {
            host,
            entries: vec![TrackedSpan::new(primary)],
            version,
        }
    }

    /// Detach, clearing the host's secondary spans and returning the host.
    pub fn detach(mut self) -> H {
        self.host.set_secondary_spans(&[]);
        debug!(target: "selection", spans = self.entries.len(), "detach");
        self.host
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably. Native selection changes made here must be reported back through
    /// [`MultiSelectionTracker::on_host_selection_changed`].
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Snapshot the spans refer to.
    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    /// Number of spans, primary included.
    pub fn span_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there is more than the primary span.
    pub fn has_secondaries(&self) -> bool {
        self.entries.len() > 1
    }

    /// The primary span.
    pub fn primary(&self) -> SelectedSpan {
        self.entries[0].span
    }

    /// Secondary spans, in order.
    pub fn secondaries(&self) -> Vec<SelectedSpan> {
        self.entries[1..].iter().map(|entry| entry.span).collect()
    }

    /// All spans, primary first, secondaries in the order they were last assigned.
    pub fn selected_spans(&self) -> Vec<SelectedSpan> {
        self.entries.iter().map(|entry| entry.span).collect()
    }

    /// All spans with their sticky columns.
    pub fn tracked_spans(&self) -> &[TrackedSpan] {
        &self.entries
    }

    /// Read-only view of the set.
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            version: self.version,
            primary: self.primary(),
            secondaries: self.secondaries(),
        }
    }

    /// Add a bare caret at `point` as a secondary span.
    ///
    /// The caret takes its place in buffer order among the secondaries. A caret already at
    /// `point` makes the host beep and leaves the set unchanged.
    pub fn add_caret(&mut self, point: VirtualPoint) -> Result<(), TrackerError> {
        self.add_span(SelectedSpan::caret(point))
    }

    /// Add a secondary span, such as a word selected with the mouse.
    ///
    /// Placement and duplicate handling follow [`MultiSelectionTracker::add_caret`], keyed on the
    /// span's caret.
    pub fn add_span(&mut self, span: SelectedSpan) -> Result<(), TrackerError> {
        self.insert_secondary(TrackedSpan::new(span))?;
        self.push_to_host();
        Ok(())
    }

    /// Add a caret one line above the topmost or below the bottommost caret.
    ///
    /// The new caret aims for the source caret's sticky display column, clamped to the target
    /// line (onto the last character in Normal and Visual mode, up to the end of the line in
    /// Insert and Select mode), and inherits that sticky column.
    pub fn add_caret_on_line<B: TextBuffer + ?Sized>(
        &mut self,
        direction: CaretDirection,
        buffer: &B,
        settings: &Settings,
        mode: Mode,
    ) -> Result<VirtualPoint, TrackerError> {
        let source = match direction {
            CaretDirection::Above => self.entries.iter().min_by_key(|entry| entry.span.caret),
            CaretDirection::Below => self.entries.iter().max_by_key(|entry| entry.span.caret),
        }
        .copied()
        .unwrap_or_default();

        let line = source.span.caret.line;
        let target = match direction {
            CaretDirection::Above => line.checked_sub(1),
            CaretDirection::Below => Some(line + 1).filter(|&next| next <= buffer.last_line()),
        };
        let Some(target) = target else {
            debug!(target: "selection", line, %direction, "no line for new caret");
            self.host.beep();
            return Err(TrackerError::NoSuchLine { line, direction });
        };

        let desired = source.desired_column.unwrap_or_else(|| {
            display_column(
                &buffer.line_text(line),
                source.span.caret.column,
                settings.tab_stop,
            ) + source.span.caret.virtual_spaces
        });
        let target_text = buffer.line_text(target);
        let len = buffer.line_len(target);
        let max_column = if mode.allows_end_of_line() {
            len
        } else {
            len.saturating_sub(1)
        };
        let column = column_for_display(&target_text, desired, settings.tab_stop).min(max_column);
        let point = VirtualPoint::new(target, column);

        self.insert_secondary(TrackedSpan {
            span: SelectedSpan::caret(point),
            desired_column: Some(desired),
        })?;
        self.push_to_host();
        Ok(point)
    }

    /// Remove a secondary span.
    pub fn remove_caret(&mut self, span: SelectedSpan) -> Result<(), TrackerError> {
        match self.entries.iter().position(|entry| entry.span == span) {
            None => Err(TrackerError::NotFound),
            Some(0) => Err(TrackerError::PrimaryRemoval),
            Some(index) => {
                self.entries.remove(index);
                debug!(target: "selection", caret = %span.caret, "remove caret");
                self.push_to_host();
                Ok(())
            }
        }
    }

    /// Replace the whole set. The first span becomes primary; duplicates are dropped.
    ///
    /// An empty `spans` is ignored.
    pub fn set_selected_spans(&mut self, spans: &[SelectedSpan]) {
        let entries = spans.iter().copied().map(TrackedSpan::new).collect();
        self.set_tracked_spans(entries);
    }

    /// Replace the whole set, keeping sticky columns. Duplicates are dropped, first one wins.
    pub fn set_tracked_spans(&mut self, entries: Vec<TrackedSpan>) {
        let mut seen = HashSet::with_capacity(entries.len());
        let deduped: Vec<TrackedSpan> = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.span))
            .collect();

        if deduped.is_empty() {
            warn!(target: "selection", "ignoring empty span set");
            return;
        }
        trace!(target: "selection", spans = deduped.len(), "set spans");
        self.entries = deduped;
        self.push_to_host();
    }

    /// Drop every secondary span.
    pub fn collapse_to_primary(&mut self) {
        if self.has_secondaries() {
            debug!(target: "selection", dropped = self.entries.len() - 1, "collapse to primary");
            self.entries.truncate(1);
            self.push_to_host();
        }
    }

    /// The host moved its native selection on its own; adopt it as the primary span.
    ///
    /// Secondaries whose caret coincides with the new primary are dropped.
    pub fn on_host_selection_changed(&mut self, primary: SelectedSpan) {
        trace!(target: "selection", caret = %primary.caret, "host selection changed");
        self.entries[0] = TrackedSpan::new(primary);
        let before = self.entries.len();
        let secondaries: Vec<TrackedSpan> = self
            .entries
            .drain(1..)
            .filter(|entry| entry.span.caret != primary.caret)
            .collect();
        self.entries.extend(secondaries);
        if self.entries.len() != before {
            debug!(
                target: "selection",
                dropped = before - self.entries.len(),
                "coalesced secondaries with new primary"
            );
        }
        self.push_to_host();
    }

    /// Check the host's native selection against the primary span.
    ///
    /// On disagreement the host is trusted: its selection becomes the primary span and
    /// [`TrackerError::HostDesync`] reports what was replaced.
    pub fn reconcile_with_host(&mut self) -> Result<(), TrackerError> {
        let host = self.host.native_selection();
        let recorded = self.primary();
        if host == recorded {
            return Ok(());
        }
        warn!(
            target: "selection",
            recorded = %recorded.caret,
            host = %host.caret,
            "host selection out of sync"
        );
        self.on_host_selection_changed(host);
        Err(TrackerError::HostDesync { recorded, host })
    }

    /// Translate every span across a change made outside a broadcast.
    pub fn rebase(&mut self, change: &TextChange) {
        if change.before != self.version {
            warn!(
                target: "selection",
                expected = %self.version,
                found = %change.before,
                "rebasing across change from another snapshot"
            );
        }
        let translator = OffsetTranslator::new(*change);
        let entries = self
            .entries
            .iter()
            .map(|entry| TrackedSpan {
                span: translator.translate_span(entry.span),
                desired_column: entry.desired_column,
            })
            .collect();
        self.version = change.after;
        self.set_tracked_spans(entries);
    }

    pub(crate) fn set_version(&mut self, version: SnapshotVersion) {
        self.version = version;
    }

    fn insert_secondary(&mut self, entry: TrackedSpan) -> Result<(), TrackerError> {
        let point = entry.span.caret;
        if self.entries.iter().any(|existing| existing.span.caret == point) {
            debug!(target: "selection", caret = %point, "duplicate caret");
            self.host.beep();
            return Err(TrackerError::DuplicateCaret(point));
        }
        let index = self.entries[1..]
            .iter()
            .position(|existing| existing.span.caret > point)
            .map_or(self.entries.len(), |offset| offset + 1);
        self.entries.insert(index, entry);
        debug!(target: "selection", caret = %point, index, "add caret");
        Ok(())
    }

    fn push_to_host(&mut self) {
        let primary = self.entries[0].span;
        if self.host.native_selection() != primary {
            self.host.set_native_selection(primary);
        }
        let secondaries = self.secondaries();
        self.host.set_secondary_spans(&secondaries);
    }
}
