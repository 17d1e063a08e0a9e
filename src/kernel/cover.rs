//! Disc-to-interval decomposition.
//!
//! A spherical cap is decomposed into pixel-id ranges by descending the
//! per-face quadtree: cells entirely inside the cap land in the full zone,
//! boundary cells in the partial zone, and cells provably outside are
//! dropped. The classification uses the cell circumradius as a conservative
//! bound, so the emitted union can never miss a pixel intersecting the cap.

use super::cube::{CubeKernel, angular_separation, morton, normalize_ang};
use super::{DiscCover, GeometryKernel};
use log::trace;
use smallvec::SmallVec;
use std::ops::Range;

// Stop subdividing once splitting the frontier could overflow the per-zone
// range budget after merging.
const NODE_BUDGET: usize = 4 * DiscCover::MAX_RANGES_PER_ZONE;

#[derive(Debug, Clone, Copy)]
struct Node {
    face: u8,
    depth: u32,
    i: u64,
    j: u64,
}

enum Class {
    Outside,
    Inside,
    Partial,
}

impl Node {
    fn children(self) -> [Node; 4] {
        let Node { face, depth, i, j } = self;
        let (i, j) = (i << 1, j << 1);
        let d = depth + 1;
        [
            Node { face, depth: d, i, j },
            Node { face, depth: d, i: i + 1, j },
            Node { face, depth: d, i, j: j + 1 },
            Node { face, depth: d, i: i + 1, j: j + 1 },
        ]
    }

    /// Half-open ipix range covered by this quadtree cell.
    fn ipix_range(&self, kernel: &CubeKernel) -> Range<u64> {
        let shift = 2 * (kernel.bin_level() - self.depth);
        let base = self.face as u64 * kernel.nside() * kernel.nside();
        let lo = base + (morton(self.i, self.j) << shift);
        lo..lo + (1u64 << shift)
    }
}

pub(super) fn disc_cover(
    kernel: &CubeKernel,
    center_ra: f64,
    center_dec: f64,
    radius_deg: f64,
) -> DiscCover {
    let (center_ra, center_dec) = normalize_ang(center_ra, center_dec);
    let radius = radius_deg.min(180.0);

    let mut full_ranges: Vec<Range<u64>> = Vec::new();
    let mut frontier: Vec<Node> = (0..6u8)
        .map(|face| Node {
            face,
            depth: 0,
            i: 0,
            j: 0,
        })
        .collect();

    let mut depth = 0;
    let partial = loop {
        let mut partial: Vec<Node> = Vec::new();
        for node in frontier.drain(..) {
            match classify(kernel, &node, center_ra, center_dec, radius) {
                Class::Outside => {}
                Class::Inside => full_ranges.push(node.ipix_range(kernel)),
                Class::Partial => partial.push(node),
            }
        }

        if depth >= kernel.bin_level() || partial.is_empty() || partial.len() * 4 > NODE_BUDGET {
            break partial;
        }
        frontier = partial.iter().flat_map(|n| n.children()).collect();
        depth += 1;
    };

    let mut full = merge_ranges(full_ranges);
    let mut boundary = merge_ranges(partial.iter().map(|n| n.ipix_range(kernel)).collect());

    // Overflowing full ranges are demoted to the partial zone: they still
    // cover the same pixels, they just lose the fully-inside guarantee.
    while full.len() > DiscCover::MAX_RANGES_PER_ZONE {
        let idx = shortest_range(&full);
        boundary.push(full.remove(idx));
    }
    boundary.sort_by_key(|r| r.start);
    let mut boundary = merge_ranges(boundary);

    // Bridging the narrowest gaps keeps the cover a superset while bounding
    // the range count.
    while boundary.len() > DiscCover::MAX_RANGES_PER_ZONE {
        bridge_smallest_gap(&mut boundary);
    }

    trace!(
        "disc_cover center=({center_ra:.4},{center_dec:.4}) radius={radius:.4}: \
         {} full + {} partial ranges at depth {depth}",
        full.len(),
        boundary.len(),
    );

    DiscCover {
        full: SmallVec::from_vec(full),
        partial: SmallVec::from_vec(boundary),
    }
}

fn classify(kernel: &CubeKernel, node: &Node, ra: f64, dec: f64, radius: f64) -> Class {
    let side = 2.0 / (1u64 << node.depth) as f64;
    let x0 = node.i as f64 * side - 1.0;
    let y0 = node.j as f64 * side - 1.0;

    let (cra, cdec) = kernel.xy2ang(node.face, x0 + side / 2.0, y0 + side / 2.0);

    // Angular radius of the cell's circumscribed cap.
    let mut circ: f64 = 0.0;
    for (cx, cy) in [(x0, y0), (x0 + side, y0), (x0, y0 + side), (x0 + side, y0 + side)] {
        let (kra, kdec) = kernel.xy2ang(node.face, cx, cy);
        circ = circ.max(angular_separation(cra, cdec, kra, kdec));
    }

    let dist = angular_separation(ra, dec, cra, cdec);
    if dist > radius + circ {
        Class::Outside
    } else if dist + circ <= radius {
        Class::Inside
    } else {
        Class::Partial
    }
}

/// Merge overlapping or adjacent ranges; input need not be sorted.
fn merge_ranges(mut ranges: Vec<Range<u64>>) -> Vec<Range<u64>> {
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<Range<u64>> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => merged.push(r),
        }
    }
    merged
}

fn shortest_range(ranges: &[Range<u64>]) -> usize {
    let mut idx = 0;
    let mut best = u64::MAX;
    for (k, r) in ranges.iter().enumerate() {
        let len = r.end - r.start;
        if len < best {
            best = len;
            idx = k;
        }
    }
    idx
}

/// Merge the adjacent pair separated by the smallest gap, absorbing the gap.
fn bridge_smallest_gap(ranges: &mut Vec<Range<u64>>) {
    debug_assert!(ranges.len() >= 2);
    let mut idx = 0;
    let mut best = u64::MAX;
    for k in 0..ranges.len() - 1 {
        let gap = ranges[k + 1].start - ranges[k].end;
        if gap < best {
            best = gap;
            idx = k;
        }
    }
    let next = ranges.remove(idx + 1);
    ranges[idx].end = next.end;
}
