//! Pixel space tracing of one pixel wide skeletons into ordered chains.
//!
//! The order is fixed so that the same mask always yields the same chains:
//!
//! 1. The mask is scanned in raster order (top to bottom, left to right) and a chain is started
//!    at every unvisited tip, i.e. a pixel whose 1 to 3 neighbours form one contiguous run.
//! 2. A second raster scan starts a chain at every pixel that is still unvisited: closed loops,
//!    isolated pixels and runs between two junctions. Such a start may lie inside a run, so
//!    unless the chain closed into a loop the run is also walked backwards from the start and
//!    that part is prepended.
//! 3. A chain steps to the first unvisited neighbour in the order E, S, W, N, SE, SW, NE, NW.
//! 4. When a chain cannot advance it is attached to a visited neighbour that is not one of its
//!    last three vertices, preferring its own start (closing a loop). This joins branches onto
//!    the junction that an earlier chain passed through.
//!
//! Every visited pixel becomes a vertex; nothing is simplified.

use crate::mask::BinaryMask;
use crate::skeleton::{ring, transitions};

/// Pixel coordinates `(col, row)` in traversal order.
pub type PixelChain = Vec<(u32, u32)>;

static STEPS: [(i64, i64); 8] = [
    (1, 0),   // east
    (0, 1),   // south
    (-1, 0),  // west
    (0, -1),  // north
    (1, 1),   // south east
    (-1, 1),  // south west
    (1, -1),  // north east
    (-1, -1), // north west
];

fn is_tip(mask: &BinaryMask, x: u32, y: u32) -> bool {
    let p = ring(mask, x, y);
    let neighbours = p.iter().filter(|&&v| v).count();
    (1..=3).contains(&neighbours) && transitions(&p) == 1
}

fn neighbours(x: u32, y: u32) -> impl Iterator<Item = (i64, i64)> {
    STEPS.iter().map(move |(dx, dy)| (x as i64 + dx, y as i64 + dy))
}

/// Traces every foreground pixel of `mask` into chains.
pub fn trace(mask: &BinaryMask) -> Vec<PixelChain> {
    let (width, height) = mask.dimensions();
    let mut visited = BinaryMask::new(width, height);
    let mut chains = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if mask.get(x, y) && !visited.get(x, y) && is_tip(mask, x, y) {
                chains.push(follow(mask, &mut visited, x, y));
            }
        }
    }
    for y in 0..height {
        for x in 0..width {
            if mask.get(x, y) && !visited.get(x, y) {
                chains.push(follow_both_ways(mask, &mut visited, x, y));
            }
        }
    }
    chains
}

fn follow(mask: &BinaryMask, visited: &mut BinaryMask, x: u32, y: u32) -> PixelChain {
    visited.set(x, y, true);
    walk(mask, visited, vec![(x, y)], Some((x, y)))
}

/// Like `follow`, for a start that may lie inside a run: the part behind the start is walked
/// as well and prepended, unless the chain closed into a loop.
fn follow_both_ways(mask: &BinaryMask, visited: &mut BinaryMask, x: u32, y: u32) -> PixelChain {
    let forward = follow(mask, visited, x, y);
    if forward.len() > 2 && forward.last() == Some(&(x, y)) {
        return forward;
    }
    let backward = walk(mask, visited, vec![(x, y)], None);
    if backward.len() < 2 {
        return forward;
    }
    backward.into_iter().rev().chain(forward.into_iter().skip(1)).collect()
}

/// Extends `chain` from its last vertex until it cannot advance, then attaches its end.
fn walk(
    mask: &BinaryMask,
    visited: &mut BinaryMask,
    mut chain: PixelChain,
    prefer: Option<(u32, u32)>,
) -> PixelChain {
    let (mut cx, mut cy) = match chain.last() {
        Some(&end) => end,
        None => return chain,
    };
    loop {
        let next = neighbours(cx, cy)
            .find(|&(nx, ny)| mask.get_signed(nx, ny) && !visited.get_signed(nx, ny));
        match next {
            Some((nx, ny)) => {
                let (nx, ny) = (nx as u32, ny as u32);
                visited.set(nx, ny, true);
                chain.push((nx, ny));
                cx = nx;
                cy = ny;
            }
            None => {
                let recent = &chain[chain.len().saturating_sub(3)..];
                if let Some(end) = attachment(mask, recent, prefer, cx, cy) {
                    chain.push(end);
                }
                return chain;
            }
        }
    }
}

/// Where a stuck chain ending at `(x, y)` connects to already traced pixels, if anywhere.
fn attachment(
    mask: &BinaryMask,
    recent: &[(u32, u32)],
    prefer: Option<(u32, u32)>,
    x: u32,
    y: u32,
) -> Option<(u32, u32)> {
    let mut first = None;
    for (nx, ny) in neighbours(x, y) {
        if !mask.get_signed(nx, ny) {
            continue;
        }
        let nb = (nx as u32, ny as u32);
        if recent.contains(&nb) {
            continue;
        }
        if Some(nb) == prefer {
            return Some(nb);
        }
        first = first.or(Some(nb));
    }
    first
}
