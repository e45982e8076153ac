// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary line selection.
//
// A photographed page has two families of roughly parallel sides. Candidate
// lines are clustered into two pairs by orientation, and each pair keeps only
// its minimum- and maximum-distance member: the outer edges of the page,
// whatever interior clutter (text lines, folds) produced the rest.

use docrect_core::config::LineConfig;
use tracing::{debug, trace};

use crate::geometry::{HoughLine, Line};

/// Four boundary slots forming two pairs.
///
/// Slots 0/1 hold the min/max-distance lines of pair A, slots 2/3 those of
/// pair B. Within a pair the even slot never has a larger distance than the
/// odd slot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundaryLineSet {
    slots: [Option<Line>; 4],
}

impl BoundaryLineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a line to the pairs.
    ///
    /// The line goes to the first empty pair, or to the first pair whose
    /// even-slot line lies within `angular_cluster_tolerance` of it. It is
    /// assigned to at most one pair.
    pub fn insert(&mut self, line: Line, angular_cluster_tolerance: f64) {
        for even in [0, 2] {
            let odd = even + 1;
            let Some(first) = self.slots[even] else {
                self.slots[even] = Some(line);
                return;
            };
            if first.angular_separation(&line) > angular_cluster_tolerance {
                continue;
            }
            match self.slots[odd] {
                None => {
                    self.slots[odd] = Some(line);
                    if first.distance() > line.distance() {
                        self.slots.swap(even, odd);
                    }
                }
                Some(last) => {
                    if line.distance() < first.distance() {
                        self.slots[even] = Some(line);
                    } else if line.distance() > last.distance() {
                        self.slots[odd] = Some(line);
                    }
                }
            }
            return;
        }
    }

    /// Both pairs have their max-distance member.
    pub fn document_found(&self) -> bool {
        self.slots[1].is_some() && self.slots[3].is_some()
    }

    /// The raw slots, in pair order.
    pub fn slots(&self) -> &[Option<Line>; 4] {
        &self.slots
    }

    /// All four lines, once the document is found.
    pub fn lines(&self) -> Option<[Line; 4]> {
        match self.slots {
            [Some(a0), Some(a1), Some(b0), Some(b1)] => Some([a0, a1, b0, b1]),
            _ => None,
        }
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Incremental selector: deduplicates candidates, then feeds the survivors
/// into a [`BoundaryLineSet`].
#[derive(Debug, Clone)]
pub struct LineSelector {
    config: LineConfig,
    considered: Vec<Line>,
    boundary: BoundaryLineSet,
}

impl LineSelector {
    pub fn new(config: LineConfig) -> Self {
        Self {
            config,
            considered: Vec::new(),
            boundary: BoundaryLineSet::new(),
        }
    }

    /// Offer one raw candidate. Returns `false` if it was dropped as a
    /// near-duplicate of an earlier candidate.
    pub fn offer(&mut self, candidate: HoughLine) -> bool {
        let line = Line::from(candidate);
        let duplicate = self.considered.iter().any(|seen| {
            seen.is_near(
                &line,
                self.config.distance_dedup_tolerance,
                self.config.angular_dedup_tolerance,
            )
        });
        if duplicate {
            trace!(distance = line.distance(), angle = line.angle(), "Duplicate line skipped");
            return false;
        }
        self.considered.push(line);
        self.boundary
            .insert(line, self.config.angular_cluster_tolerance);
        true
    }

    /// Offer candidates in order, stopping early once the document is found
    /// if the configuration asks for it.
    pub fn extend<I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = HoughLine>,
    {
        for candidate in candidates {
            self.offer(candidate);
            if self.config.stop_when_found && self.boundary.document_found() {
                break;
            }
        }
    }

    /// Distinct candidates seen so far.
    pub fn distinct(&self) -> usize {
        self.considered.len()
    }

    pub fn boundary(&self) -> &BoundaryLineSet {
        &self.boundary
    }

    pub fn into_boundary(self) -> BoundaryLineSet {
        self.boundary
    }
}

/// Pick the four boundary lines from an ordered candidate list.
///
/// Candidates should come strongest first: with `stop_when_found` the
/// selection ends as soon as both pairs are complete.
pub fn select_boundary_lines(candidates: &[HoughLine], config: &LineConfig) -> BoundaryLineSet {
    let mut selector = LineSelector::new(*config);
    selector.extend(candidates.iter().copied());
    debug!(
        candidates = candidates.len(),
        distinct = selector.distinct(),
        kept = selector.boundary().len(),
        found = selector.boundary().document_found(),
        "Boundary lines selected"
    );
    selector.into_boundary()
}
