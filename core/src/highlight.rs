// Highlight Applicator and Remover
// Both walk the runs that openly intersect a span, flip whole runs in place
// and split partially covered runs at their strictly interior boundaries.

use log::debug;

use crate::error::Result;
use crate::span::Span;
use crate::text_run::{Container, Intersection};

/// Mark every character of `span` as highlighted.
///
/// Adjacent runs with the same state are not merged afterwards.
pub fn apply_highlight(container: &mut Container, span: &Span) -> Result<()> {
    let range = container.span_range(span)?;
    let hits = container.intersecting(&range);
    debug!(
        "apply {}..{} in {}: {} intersecting run(s)",
        range.start,
        range.end,
        container.id(),
        hits.len()
    );

    for hit in &hits {
        set_flag(container, hit, true)?;
    }

    debug_assert!(container.check_invariants());
    Ok(())
}

/// Un-mark the part of every highlighted run that lies inside `span`.
///
/// Plain runs are never touched; highlighted text outside the span keeps
/// its state.
pub fn remove_highlight(container: &mut Container, span: &Span) -> Result<()> {
    let range = container.span_range(span)?;
    let hits: Vec<Intersection> = container
        .intersecting(&range)
        .into_iter()
        .filter(|hit| hit.highlighted)
        .collect();
    debug!(
        "remove {}..{} in {}: {} highlighted run(s)",
        range.start,
        range.end,
        container.id(),
        hits.len()
    );

    for hit in &hits {
        set_flag(container, hit, false)?;
    }

    debug_assert!(container.check_invariants());
    Ok(())
}

/// Give exactly the intersected part of one run the state `highlighted`.
fn set_flag(container: &mut Container, hit: &Intersection, highlighted: bool) -> Result<()> {
    if hit.covers_run() {
        container.run_mut(hit.id)?.set_highlighted(highlighted);
        return Ok(());
    }

    let mut target = hit.id;
    if hit.local.start > 0 {
        let (_, right) = container.split(target, hit.local.start)?;
        target = right;
    }
    if hit.local.end < hit.len {
        let (left, _) = container.split(target, hit.local.end - hit.local.start)?;
        target = left;
    }
    container.run_mut(target)?.set_highlighted(highlighted);
    Ok(())
}
