//! Topology preserving thinning of binary masks (Zhang-Suen).

use rayon::prelude::*;

use crate::mask::BinaryMask;

/// Clockwise ring around a pixel starting north: P2, P3, ..., P9 in Zhang-Suen notation.
const RING: [(i64, i64); 8] = [
    (0, -1),  // north
    (1, -1),  // north east
    (1, 0),   // east
    (1, 1),   // south east
    (0, 1),   // south
    (-1, 1),  // south west
    (-1, 0),  // west
    (-1, -1), // north west
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pass {
    SouthEast,
    NorthWest,
}

pub(crate) fn ring(mask: &BinaryMask, x: u32, y: u32) -> [bool; 8] {
    let mut ring = [false; 8];
    for (i, (dx, dy)) in RING.iter().enumerate() {
        ring[i] = mask.get_signed(x as i64 + dx, y as i64 + dy);
    }
    ring
}

/// Number of separate runs of foreground pixels around the ring.
pub(crate) fn transitions(ring: &[bool; 8]) -> usize {
    (0..8).filter(|&i| !ring[i] && ring[(i + 1) % 8]).count()
}

fn is_removable(mask: &BinaryMask, x: u32, y: u32, pass: Pass) -> bool {
    if !mask.get(x, y) {
        return false;
    }
    let p = ring(mask, x, y);
    let neighbours = p.iter().filter(|&&v| v).count();
    if !(2..=6).contains(&neighbours) || transitions(&p) != 1 {
        return false;
    }
    let (north, east, south, west) = (p[0], p[2], p[4], p[6]);
    match pass {
        Pass::SouthEast => !(north && east && south) && !(east && south && west),
        Pass::NorthWest => !(north && east && west) && !(north && south && west),
    }
}

/// Thins the foreground of `mask` to one pixel wide curves.
///
/// Each sub-iteration first collects every removable pixel in parallel and then deletes them in
/// raster order, re-checking each against the mask as it stands. The re-check keeps blocks that
/// plain parallel deletion would erase completely, such as 2x2 squares.
pub fn thin(mask: &BinaryMask) -> BinaryMask {
    let mut skeleton = mask.clone();
    let (width, height) = skeleton.dimensions();
    loop {
        let mut removed = 0;
        for pass in [Pass::SouthEast, Pass::NorthWest] {
            let candidates: Vec<(u32, u32)> = (0..height).into_par_iter()
                .flat_map_iter(|y| {
                    let skeleton = &skeleton;
                    (0..width).filter(move |&x| is_removable(skeleton, x, y, pass))
                        .map(move |x| (x, y))
                })
                .collect();
            for (x, y) in candidates {
                if is_removable(&skeleton, x, y, pass) {
                    skeleton.set(x, y, false);
                    removed += 1;
                }
            }
        }
        if removed == 0 {
            return skeleton;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(width: u32, height: u32, x0: u32, x1: u32) -> BinaryMask {
        BinaryMask::from_fn(width, height, |x, _| x0 <= x && x <= x1)
    }

    /// 8-connected components of the foreground.
    fn components(mask: &BinaryMask) -> usize {
        let mut seen = BinaryMask::new(mask.width(), mask.height());
        let mut count = 0;
        for y in 0..mask.height() {
            for x in 0..mask.width() {
                if !mask.get(x, y) || seen.get(x, y) {
                    continue;
                }
                count += 1;
                seen.set(x, y, true);
                let mut stack = vec![(x as i64, y as i64)];
                while let Some((cx, cy)) = stack.pop() {
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            let (nx, ny) = (cx + dx, cy + dy);
                            if mask.get_signed(nx, ny) && !seen.get(nx as u32, ny as u32) {
                                seen.set(nx as u32, ny as u32, true);
                                stack.push((nx, ny));
                            }
                        }
                    }
                }
            }
        }
        count
    }

    #[test]
    fn transitions_count_runs() {
        assert_eq!(transitions(&[false; 8]), 0);
        assert_eq!(transitions(&[true; 8]), 0);
        assert_eq!(transitions(&[true, false, false, false, true, false, false, false]), 2);
        assert_eq!(transitions(&[true, true, false, false, false, false, false, true]), 1);
    }

    #[test]
    fn empty_mask_stays_empty() {
        let skeleton = thin(&BinaryMask::new(10, 10));
        assert_eq!(skeleton.count(), 0);
    }

    #[test]
    fn thin_line_is_unchanged() {
        let line = bar(9, 30, 4, 4);
        assert_eq!(thin(&line), line);

        let diagonal = BinaryMask::from_fn(12, 12, |x, y| x == y);
        assert_eq!(thin(&diagonal), diagonal);
    }

    #[test]
    fn thick_bar_collapses_to_its_centre_column() {
        let skeleton = thin(&bar(100, 100, 49, 51));
        for y in 0..100 {
            for x in 0..100 {
                if skeleton.get(x, y) {
                    assert!((49..=51).contains(&x), "pixel ({}, {}) is off centre", x, y);
                }
            }
        }
        let centre = (10..90).filter(|&y| skeleton.get(50, y)).count();
        assert_eq!(centre, 80);
        for y in 10..90 {
            let row = (0..100).filter(|&x| skeleton.get(x, y)).count();
            assert_eq!(row, 1, "row {} is not one pixel wide", y);
        }
        assert_eq!(components(&skeleton), 1);
    }

    #[test]
    fn small_square_is_not_erased() {
        let square = BinaryMask::from_fn(6, 6, |x, y| (2..=3).contains(&x) && (2..=3).contains(&y));
        let skeleton = thin(&square);
        assert!(skeleton.count() >= 1);
        assert_eq!(components(&skeleton), 1);
    }

    #[test]
    fn rectangle_keeps_one_component() {
        let rect = BinaryMask::from_fn(40, 30, |x, y| (5..35).contains(&x) && (8..22).contains(&y));
        let skeleton = thin(&rect);
        assert!(skeleton.count() > 0);
        assert!(skeleton.count() < 14 * 30);
        assert_eq!(components(&skeleton), 1);
    }

    #[test]
    fn ring_keeps_its_hole() {
        let ring = BinaryMask::from_fn(30, 30, |x, y| {
            let d = ((x as f64 - 15.0).powi(2) + (y as f64 - 15.0).powi(2)).sqrt();
            (7.0..11.0).contains(&d)
        });
        let skeleton = thin(&ring);
        assert_eq!(components(&skeleton), 1);
        assert!(!skeleton.get(15, 15));
        // The centre is still enclosed: a flood fill from it never reaches the border.
        let background = BinaryMask::from_fn(30, 30, |x, y| !skeleton.get(x, y));
        let mut inside = BinaryMask::new(30, 30);
        inside.set(15, 15, true);
        let mut stack = vec![(15i64, 15i64)];
        while let Some((cx, cy)) = stack.pop() {
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let (nx, ny) = (cx + dx, cy + dy);
                if background.get_signed(nx, ny) && !inside.get(nx as u32, ny as u32) {
                    inside.set(nx as u32, ny as u32, true);
                    stack.push((nx, ny));
                }
            }
        }
        assert!(!inside.get(0, 0));
    }
}
