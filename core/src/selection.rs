// Selection Resolver
// Turns the raw selection reported by a display surface into a span and
// decides whether it touches an existing highlight. Never mutates.

use log::debug;

use crate::error::{HighlightError, Result};
use crate::law::LawDocument;
use crate::span::{BoundaryPoint, Span};

/// Bounding box of a selection in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

/// A selection as reported by the surface. Anchor and focus are in the
/// order the user dragged, not document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSelection {
    pub anchor: BoundaryPoint,
    pub focus: BoundaryPoint,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub span: Span,
    pub overlaps_highlight: bool,
    pub anchor_rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    NoSelection,
    Resolved(ResolvedSelection),
}

/// Where user selections come from.
pub trait SelectionSurface {
    /// The current selection, if any
    fn selection(&self) -> Option<NativeSelection>;

    fn clear_selection(&mut self);
}

/// A surface whose selection is set programmatically.
#[derive(Debug, Default, Clone)]
pub struct SelectionBuffer {
    current: Option<NativeSelection>,
}

impl SelectionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, selection: NativeSelection) {
        self.current = Some(selection);
    }
}

impl SelectionSurface for SelectionBuffer {
    fn selection(&self) -> Option<NativeSelection> {
        self.current
    }

    fn clear_selection(&mut self) {
        self.current = None;
    }
}

/// Resolve a native selection against the document.
///
/// Empty, collapsed and whitespace-only selections resolve to
/// `NoSelection`. A selection whose ends lie in two articles is rejected.
/// The selection overlaps a highlight when the run at either boundary is
/// highlighted, however little of the selection that run covers.
pub fn resolve(document: &LawDocument, native: Option<&NativeSelection>) -> Result<Resolution> {
    let Some(native) = native else {
        return Ok(Resolution::NoSelection);
    };

    let (anchor, focus) = (native.anchor, native.focus);
    if anchor.container() != focus.container() {
        return Err(HighlightError::CrossContainerSelection {
            start: anchor.container(),
            end: focus.container(),
        });
    }

    let container = document
        .container(anchor.container())
        .ok_or(HighlightError::UnknownContainer(anchor.container()))?;
    let a = container.absolute_offset(anchor)?;
    let b = container.absolute_offset(focus)?;
    let (start, end, range) = if a <= b {
        (anchor, focus, a..b)
    } else {
        (focus, anchor, b..a)
    };

    if container.text_in(range.clone()).trim().is_empty() {
        return Ok(Resolution::NoSelection);
    }

    let overlaps_highlight = container.is_highlighted_at(start) || container.is_highlighted_at(end);
    debug!(
        "selection {}..{} in {} (overlaps highlight: {})",
        range.start,
        range.end,
        container.id(),
        overlaps_highlight
    );

    Ok(Resolution::Resolved(ResolvedSelection {
        span: Span::new(start, end),
        overlaps_highlight,
        anchor_rect: native.rect,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_run::ContainerId;

    fn document() -> LawDocument {
        LawDocument::from_texts("test", ["ABCDEFGH", "  \t  ", "VWXYZ"])
    }

    fn select(doc: &LawDocument, container: u32, start: usize, end: usize) -> NativeSelection {
        let span = doc
            .container(ContainerId(container))
            .unwrap()
            .span_between(start..end)
            .unwrap();
        NativeSelection {
            anchor: span.start,
            focus: span.end,
            rect: Rect::new(10, 20, 30, 40),
        }
    }

    fn resolved(resolution: Resolution) -> ResolvedSelection {
        match resolution {
            Resolution::Resolved(selection) => selection,
            Resolution::NoSelection => panic!("expected a resolved selection"),
        }
    }

    #[test]
    fn test_no_native_selection() {
        assert_eq!(resolve(&document(), None), Ok(Resolution::NoSelection));
    }

    #[test]
    fn test_collapsed_selection() {
        let doc = document();
        let run = doc.container(ContainerId(0)).unwrap().runs()[0].id();
        let native = NativeSelection {
            anchor: BoundaryPoint::new(run, 3),
            focus: BoundaryPoint::new(run, 3),
            rect: Rect::default(),
        };
        assert_eq!(resolve(&doc, Some(&native)), Ok(Resolution::NoSelection));
    }

    #[test]
    fn test_whitespace_selection() {
        let doc = document();
        let native = select(&doc, 1, 0, 5);
        assert_eq!(resolve(&doc, Some(&native)), Ok(Resolution::NoSelection));
    }

    #[test]
    fn test_backwards_selection_is_normalized() {
        let doc = document();
        let forward = select(&doc, 0, 2, 5);
        let backward = NativeSelection {
            anchor: forward.focus,
            focus: forward.anchor,
            rect: forward.rect,
        };

        let selection = resolved(resolve(&doc, Some(&backward)).unwrap());
        assert_eq!(selection.span, Span::new(forward.anchor, forward.focus));
        assert!(!selection.overlaps_highlight);
        assert_eq!(selection.anchor_rect, Rect::new(10, 20, 30, 40));
    }

    #[test]
    fn test_start_at_first_character_of_highlight_overlaps() {
        let mut doc = document();
        let mark = doc.container(ContainerId(0)).unwrap().span_between(2..4).unwrap();
        doc.apply_highlight(&mark).unwrap();

        // C..H: starts on the highlighted "CD", the rest is plain
        let native = select(&doc, 0, 2, 8);
        let selection = resolved(resolve(&doc, Some(&native)).unwrap());
        assert!(selection.overlaps_highlight);
    }

    #[test]
    fn test_end_inside_highlight_overlaps() {
        let mut doc = document();
        let mark = doc.container(ContainerId(0)).unwrap().span_between(5..7).unwrap();
        doc.apply_highlight(&mark).unwrap();

        let native = select(&doc, 0, 0, 6);
        let selection = resolved(resolve(&doc, Some(&native)).unwrap());
        assert!(selection.overlaps_highlight);
    }

    #[test]
    fn test_highlight_strictly_inside_selection_does_not_overlap() {
        let mut doc = document();
        let mark = doc.container(ContainerId(0)).unwrap().span_between(3..5).unwrap();
        doc.apply_highlight(&mark).unwrap();

        let native = select(&doc, 0, 1, 7);
        let selection = resolved(resolve(&doc, Some(&native)).unwrap());
        assert!(!selection.overlaps_highlight);
    }

    #[test]
    fn test_cross_container_selection_is_rejected() {
        let doc = document();
        let first = select(&doc, 0, 1, 3);
        let last = select(&doc, 2, 1, 3);
        let native = NativeSelection {
            anchor: first.anchor,
            focus: last.focus,
            rect: Rect::default(),
        };
        assert_eq!(
            resolve(&doc, Some(&native)),
            Err(HighlightError::CrossContainerSelection {
                start: ContainerId(0),
                end: ContainerId(2)
            })
        );
    }

    #[test]
    fn test_selection_buffer() {
        let doc = document();
        let mut surface = SelectionBuffer::new();
        assert!(surface.selection().is_none());

        surface.select(select(&doc, 0, 0, 2));
        assert!(surface.selection().is_some());
        surface.clear_selection();
        assert!(surface.selection().is_none());
    }
}
