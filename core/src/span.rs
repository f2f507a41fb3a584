// Selection boundaries expressed against the run arena

use crate::text_run::{ContainerId, RunId};

/// One end of a selection: a run and a character offset inside it.
///
/// `offset` may equal the run's length, which is how a selection ending at
/// the last character of a run is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    pub run: RunId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(run: RunId, offset: usize) -> Self {
        BoundaryPoint { run, offset }
    }

    pub fn container(&self) -> ContainerId {
        self.run.container
    }
}

/// A selected interval between two boundary points, start first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Span {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Span { start, end }
    }

    /// Whether both ends live in the same container.
    pub fn is_single_container(&self) -> bool {
        self.start.container() == self.end.container()
    }
}
