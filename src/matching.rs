use std::cmp::Reverse;

use log::{debug, trace};
use rayon::prelude::*;

use crate::graph::instance::GraphHandle;
use crate::graph::model::InternalGraph;

/// Which structural relation the search enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphismKind {
    /// Bijections preserving vertex labels, edge labels, adjacency, and
    /// non-adjacency. Requires equal vertex counts.
    Isomorphism,
    /// Injections preserving vertex/edge labels and adjacency in the forward
    /// direction only.
    Monomorphism,
}

/// Count isomorphisms from `pattern` to `host`, stopping at `max_matches`.
pub fn count_isomorphisms(pattern: &GraphHandle, host: &GraphHandle, max_matches: usize) -> usize {
    count_morphisms(MorphismKind::Isomorphism, pattern, host, max_matches)
}

/// Count monomorphisms from `pattern` to `host`, stopping at `max_matches`.
pub fn count_monomorphisms(pattern: &GraphHandle, host: &GraphHandle, max_matches: usize) -> usize {
    count_morphisms(MorphismKind::Monomorphism, pattern, host, max_matches)
}

pub fn count_morphisms(
    kind: MorphismKind,
    pattern: &GraphHandle,
    host: &GraphHandle,
    max_matches: usize,
) -> usize {
    MorphismSearch::new(kind, pattern.graph(), host.graph(), max_matches).run()
}

/// Count matches for independent (pattern, host) pairs in parallel. The
/// search is pure over published immutable structures, so pairs never
/// contend with each other.
pub fn count_batch(
    kind: MorphismKind,
    pairs: &[(GraphHandle, GraphHandle)],
    max_matches: usize,
) -> Vec<usize> {
    pairs
        .par_iter()
        .map(|(pattern, host)| count_morphisms(kind, pattern, host, max_matches))
        .collect()
}

struct Frame {
    /// Position in the fixed pattern ordering being assigned at this depth.
    depth: usize,
    /// Next host vertex to try as the image.
    cursor: usize,
}

/// Depth-first backtracking over partial-mapping states. The pattern side is
/// walked in a fixed order (descending degree, then ascending index) so the
/// resulting count is reproducible for a fixed input triple.
struct MorphismSearch<'a> {
    kind: MorphismKind,
    pattern: &'a InternalGraph,
    host: &'a InternalGraph,
    max_matches: usize,
    order: Vec<usize>,
    /// mapping[pattern vertex] = host vertex, or `usize::MAX` when unassigned.
    mapping: Vec<usize>,
    used: Vec<bool>,
}

const UNMAPPED: usize = usize::MAX;

impl<'a> MorphismSearch<'a> {
    fn new(
        kind: MorphismKind,
        pattern: &'a InternalGraph,
        host: &'a InternalGraph,
        max_matches: usize,
    ) -> Self {
        let mut order: Vec<usize> = (0..pattern.vertex_count()).collect();
        order.sort_by_key(|&v| (Reverse(pattern.degree(v)), v));
        Self {
            kind,
            pattern,
            host,
            max_matches,
            order,
            mapping: vec![UNMAPPED; pattern.vertex_count()],
            used: vec![false; host.vertex_count()],
        }
    }

    fn run(mut self) -> usize {
        if self.max_matches == 0 {
            return 0;
        }
        if !self.prescreen() {
            debug!("morphism prescreen rejected the pair");
            return 0;
        }

        let pattern_size = self.pattern.vertex_count();
        if pattern_size == 0 {
            // The empty mapping is the single match from the empty pattern.
            return 1;
        }

        let host_size = self.host.vertex_count();
        let mut count = 0usize;
        let mut stack = vec![Frame {
            depth: 0,
            cursor: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let depth = frame.depth;
            let vertex = self.order[depth];

            // Undo the assignment from the previous visit at this depth.
            if self.mapping[vertex] != UNMAPPED {
                self.used[self.mapping[vertex]] = false;
                self.mapping[vertex] = UNMAPPED;
            }

            let mut extended = false;
            while frame.cursor < host_size {
                let candidate = frame.cursor;
                frame.cursor += 1;
                if self.used[candidate] || !self.consistent(vertex, candidate) {
                    continue;
                }

                self.mapping[vertex] = candidate;
                self.used[candidate] = true;

                if depth + 1 == pattern_size {
                    count += 1;
                    trace!("match {count} completed at depth {depth}");
                    if count >= self.max_matches {
                        return count;
                    }
                    self.used[candidate] = false;
                    self.mapping[vertex] = UNMAPPED;
                } else {
                    extended = true;
                    break;
                }
            }

            if extended {
                stack.push(Frame {
                    depth: depth + 1,
                    cursor: 0,
                });
            } else {
                stack.pop();
            }
        }

        count
    }

    /// Cheap structural rejection before any search: the per-label vertex and
    /// edge counts of the pattern must not exceed the host's, and an
    /// isomorphism additionally needs equal vertex and edge totals.
    fn prescreen(&self) -> bool {
        if self.kind == MorphismKind::Isomorphism
            && (self.pattern.vertex_count() != self.host.vertex_count()
                || self.pattern.edge_count() != self.host.edge_count())
        {
            return false;
        }
        if self.pattern.vertex_count() > self.host.vertex_count()
            || self.pattern.edge_count() > self.host.edge_count()
        {
            return false;
        }

        for (label, count) in self.pattern.vertex_label_histogram() {
            if count > self.host.vertex_label_count(label) {
                return false;
            }
        }
        for (label, count) in self.pattern.edge_label_histogram() {
            if count > self.host.edge_label_count(label) {
                return false;
            }
        }
        true
    }

    /// Whether mapping `vertex -> candidate` is locally consistent with every
    /// already-assigned pattern vertex.
    fn consistent(&self, vertex: usize, candidate: usize) -> bool {
        if self.pattern.vertex_label(vertex) != self.host.vertex_label(candidate) {
            return false;
        }

        match self.kind {
            MorphismKind::Isomorphism => {
                if self.pattern.degree(vertex) != self.host.degree(candidate) {
                    return false;
                }
                // Adjacency and non-adjacency must both transfer.
                for (mapped, &image) in self.mapping.iter().enumerate() {
                    if image == UNMAPPED {
                        continue;
                    }
                    let pattern_edge = self.pattern.edge_label_between(vertex, mapped);
                    let host_edge = self.host.edge_label_between(candidate, image);
                    if pattern_edge != host_edge {
                        return false;
                    }
                }
            }
            MorphismKind::Monomorphism => {
                if self.pattern.degree(vertex) > self.host.degree(candidate) {
                    return false;
                }
                // Only mapped neighbors constrain the image.
                for mapped in self.pattern.neighbors(vertex) {
                    let image = self.mapping[mapped];
                    if image == UNMAPPED {
                        continue;
                    }
                    let pattern_edge = self.pattern.edge_label_between(vertex, mapped);
                    if self.host.edge_label_between(candidate, image) != pattern_edge {
                        return false;
                    }
                }
            }
        }
        true
    }
}
