// Text Run Model
// An article body as an ordered arena of plain/highlighted runs.
// Mutations only ever change segmentation and flags, never characters.

use std::fmt;
use std::ops::Range;

use crate::error::{HighlightError, Result};
use crate::span::{BoundaryPoint, Span};

/// Identifies one article body inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u32);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies a run. Serials are never reused within a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId {
    pub container: ContainerId,
    pub serial: u32,
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.container, self.serial)
    }
}

/// A contiguous, non-empty piece of text with a uniform highlight state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    id: RunId,
    text: String,
    highlighted: bool,
}

impl TextRun {
    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub(crate) fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Where a run overlaps a range, in run-local character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Intersection {
    pub id: RunId,
    pub local: Range<usize>,
    pub len: usize,
    pub highlighted: bool,
}

impl Intersection {
    pub fn covers_run(&self) -> bool {
        self.local.start == 0 && self.local.end == self.len
    }
}

/// Byte index of the character at `offset` (or the end of the string).
fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// The ordered run sequence for one article body.
#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerId,
    original: String,
    runs: Vec<TextRun>,
    next_serial: u32,
}

impl Container {
    /// Create a container holding `text` as a single plain run
    pub fn new(id: ContainerId, text: impl Into<String>) -> Self {
        let original = text.into();
        let mut container = Container {
            id,
            original: String::new(),
            runs: Vec::new(),
            next_serial: 0,
        };
        if !original.is_empty() {
            let run = container.wrap(original.clone(), false);
            container.runs.push(run);
        }
        container.original = original;
        container
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn run(&self, id: RunId) -> Option<&TextRun> {
        self.runs.iter().find(|run| run.id == id)
    }

    pub(crate) fn run_mut(&mut self, id: RunId) -> Result<&mut TextRun> {
        self.runs
            .iter_mut()
            .find(|run| run.id == id)
            .ok_or(HighlightError::UnknownRun(id))
    }

    /// Index of the run in the ordered sequence
    pub fn position_of(&self, id: RunId) -> Option<usize> {
        self.runs.iter().position(|run| run.id == id)
    }

    fn index_of(&self, id: RunId) -> Result<usize> {
        self.position_of(id).ok_or(HighlightError::UnknownRun(id))
    }

    /// Character offset at which the run starts
    pub fn run_start(&self, id: RunId) -> Option<usize> {
        let index = self.position_of(id)?;
        Some(self.runs[..index].iter().map(TextRun::char_len).sum())
    }

    /// Total length in characters
    pub fn char_len(&self) -> usize {
        self.original.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// The text the container was created with
    pub fn original_text(&self) -> &str {
        &self.original
    }

    /// Text of the character range `range` (clamped to the container).
    pub fn text_in(&self, range: Range<usize>) -> String {
        self.original
            .chars()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect()
    }

    /// Create a run owned by this container. The run is not inserted.
    pub fn wrap(&mut self, text: impl Into<String>, highlighted: bool) -> TextRun {
        let id = RunId {
            container: self.id,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        TextRun {
            id,
            text: text.into(),
            highlighted,
        }
    }

    /// Split a run in two at a character offset strictly inside it.
    ///
    /// Both halves keep the run's flag and take its place in the sequence.
    /// Offsets at either end would produce an empty run and are rejected.
    pub fn split(&mut self, run: RunId, offset: usize) -> Result<(RunId, RunId)> {
        let index = self.index_of(run)?;
        let len = self.runs[index].char_len();
        if offset == 0 || offset >= len {
            return Err(HighlightError::InvalidOffset { offset, len });
        }

        let original = &self.runs[index];
        let at = byte_index(&original.text, offset);
        let (left_text, right_text) = original.text.split_at(at);
        let (left_text, right_text) = (left_text.to_string(), right_text.to_string());
        let highlighted = original.highlighted;

        let left = self.wrap(left_text, highlighted);
        let right = self.wrap(right_text, highlighted);
        let ids = (left.id, right.id);
        self.runs.splice(index..=index, [left, right]);
        Ok(ids)
    }

    /// Substitute one run by `new_runs` at the same position.
    ///
    /// Passing no runs removes the run. Empty runs are dropped.
    pub fn replace(&mut self, run: RunId, new_runs: Vec<TextRun>) -> Result<()> {
        let index = self.index_of(run)?;
        if let Some(foreign) = new_runs.iter().find(|r| r.id.container != self.id) {
            return Err(HighlightError::UnknownRun(foreign.id));
        }
        let kept = new_runs.into_iter().filter(|r| !r.is_empty());
        self.runs.splice(index..=index, kept);
        Ok(())
    }

    /// Merge neighbouring runs that share the same flag.
    ///
    /// The first run of each merged group keeps its id.
    pub fn coalesce(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            match merged.last_mut() {
                Some(last) if last.highlighted == run.highlighted => {
                    last.text.push_str(&run.text);
                }
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    /// Boundary point inside the run that holds the character at `offset`.
    ///
    /// `offset == char_len()` maps to the end of the last run.
    pub fn point_at(&self, offset: usize) -> Option<BoundaryPoint> {
        let mut start = 0;
        for run in &self.runs {
            let len = run.char_len();
            if offset < start + len {
                return Some(BoundaryPoint::new(run.id, offset - start));
            }
            start += len;
        }
        if offset == start {
            return self
                .runs
                .last()
                .map(|run| BoundaryPoint::new(run.id, run.char_len()));
        }
        None
    }

    /// Boundary point inside the run that holds the character before
    /// `offset`, which is how a selection end is usually reported.
    pub fn point_before(&self, offset: usize) -> Option<BoundaryPoint> {
        if offset == 0 {
            return self.point_at(0);
        }
        let mut start = 0;
        for run in &self.runs {
            let len = run.char_len();
            if offset <= start + len {
                return Some(BoundaryPoint::new(run.id, offset - start));
            }
            start += len;
        }
        None
    }

    /// Container-absolute character offset of a boundary point
    pub fn absolute_offset(&self, point: BoundaryPoint) -> Result<usize> {
        let run = self.run(point.run).ok_or(HighlightError::UnknownRun(point.run))?;
        let len = run.char_len();
        if point.offset > len {
            return Err(HighlightError::OffsetOutOfRange {
                run: point.run,
                offset: point.offset,
                len,
            });
        }
        let start = self
            .run_start(point.run)
            .ok_or(HighlightError::UnknownRun(point.run))?;
        Ok(start + point.offset)
    }

    /// Whether the run enclosing `point` is highlighted
    pub fn is_highlighted_at(&self, point: BoundaryPoint) -> bool {
        self.run(point.run).is_some_and(TextRun::is_highlighted)
    }

    /// Resolve a span to an absolute, non-empty character range.
    pub fn span_range(&self, span: &Span) -> Result<Range<usize>> {
        if !span.is_single_container() {
            return Err(HighlightError::CrossContainerSelection {
                start: span.start.container(),
                end: span.end.container(),
            });
        }
        if span.start.container() != self.id {
            return Err(HighlightError::UnknownContainer(span.start.container()));
        }
        let a = self.absolute_offset(span.start)?;
        let b = self.absolute_offset(span.end)?;
        if a == b {
            return Err(HighlightError::EmptySelection);
        }
        Ok(a.min(b)..a.max(b))
    }

    /// Span covering the absolute character range `range`.
    ///
    /// The start lands in the run holding the first selected character and
    /// the end in the run holding the last one.
    pub fn span_between(&self, range: Range<usize>) -> Result<Span> {
        let len = self.char_len();
        if range.end > len || range.start > range.end {
            return Err(HighlightError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        if range.start == range.end {
            return Err(HighlightError::EmptySelection);
        }
        let start = self.point_at(range.start);
        let end = self.point_before(range.end);
        match (start, end) {
            (Some(start), Some(end)) => Ok(Span::new(start, end)),
            _ => Err(HighlightError::EmptySelection),
        }
    }

    /// Runs overlapping `range` with non-zero length, in order.
    pub(crate) fn intersecting(&self, range: &Range<usize>) -> Vec<Intersection> {
        let mut hits = Vec::new();
        let mut run_start = 0;
        for run in &self.runs {
            let len = run.char_len();
            let run_end = run_start + len;
            if run_start < range.end && run_end > range.start {
                let local_start = range.start.saturating_sub(run_start);
                let local_end = range.end.min(run_end) - run_start;
                hits.push(Intersection {
                    id: run.id,
                    local: local_start..local_end,
                    len,
                    highlighted: run.highlighted,
                });
            }
            run_start = run_end;
        }
        hits
    }

    /// Absolute ranges of highlighted text, neighbouring runs joined.
    pub fn highlighted_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        let mut start = 0;
        for run in &self.runs {
            let end = start + run.char_len();
            if run.highlighted {
                match ranges.last_mut() {
                    Some(last) if last.end == start => last.end = end,
                    _ => ranges.push(start..end),
                }
            }
            start = end;
        }
        ranges
    }

    /// Highlight state of every character
    pub fn highlight_flags(&self) -> Vec<bool> {
        self.runs
            .iter()
            .flat_map(|run| std::iter::repeat_n(run.highlighted, run.char_len()))
            .collect()
    }

    /// Text is conserved and no run is empty
    pub fn check_invariants(&self) -> bool {
        self.runs.iter().all(|run| !run.is_empty()) && self.text() == self.original
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, run) in self.runs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            let state = if run.highlighted { "highlighted" } else { "plain" };
            write!(f, "{:?} {}", run.text, state)?;
        }
        Ok(())
    }
}
