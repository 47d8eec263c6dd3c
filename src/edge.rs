//! Canny edge detection on an intensity channel.
//!
//! Rasters are stored column-major (`channel[x][y]`) so that every rayon task owns one column.

use std::f32::consts::*;

use rayon::prelude::*;

use crate::mask::BinaryMask;

/// Intensity values in column-major order, `channel[x][y]`.
pub type Channel = Vec<Vec<f32>>;

/// Sobel response at a single pixel.
#[derive(Copy, Clone, Debug)]
pub struct Gradient {
    /// Horizontal derivative, positive where intensity grows to the right.
    pub dx: f32,
    /// Vertical derivative, positive where intensity grows downward.
    pub dy: f32,
    /// L1 norm of the gradient, in intensity units.
    pub magnitude: f32,
}

impl Gradient {
    fn new(dx: f32, dy: f32) -> Gradient {
        Gradient {
            dx,
            dy,
            magnitude: dx.abs() + dy.abs(),
        }
    }

    fn theta(&self) -> f32 {
        self.dy.atan2(self.dx)
    }
}

/// Runs the Canny detector and returns a 0/255 edge mask.
///
/// The channel is smoothed with a `kernel_size` Gaussian before the gradients are taken.
/// Gradient magnitudes above `high_threshold` seed edges, magnitudes above `low_threshold`
/// extend them when 8-connected to a seed. The thresholds are swapped if given in the wrong
/// order.
pub fn canny(channel: &Channel, low_threshold: f32, high_threshold: f32, kernel_size: usize) -> BinaryMask {
    let (low, high) = if low_threshold > high_threshold {
        (high_threshold, low_threshold)
    } else {
        (low_threshold, high_threshold)
    };
    let low = low.max(0.0);
    let blurred = gaussian_blur(channel, kernel_size);
    let gradients = sobel(&blurred);
    let magnitudes = minmax_suppression(&gradients, low);
    hysteresis(&magnitudes, low, high)
}

fn dimensions<T>(columns: &[Vec<T>]) -> (usize, usize) {
    (columns.len(), columns.first().map_or(0, Vec::len))
}

/// Mirrors an out of range index without repeating the border pixel: `-1 -> 1`, `n -> n - 2`.
fn reflect_101(i: i32, size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    let period = 2 * (size as i32 - 1);
    let i = i.rem_euclid(period);
    if i < size as i32 {
        i as usize
    } else {
        (period - i) as usize
    }
}

/// 1D Gaussian weights for a square smoothing window of the given size.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    match size.max(1) {
        1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
        size => {
            let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
            let center = (size as f32 - 1.0) / 2.0;
            let weights: Vec<f32> = (0..size)
                .map(|i| {
                    let x = i as f32 - center;
                    (-x.powi(2) / (2.0 * sigma.powi(2))).exp()
                })
                .collect();
            let sum: f32 = weights.iter().sum();
            weights.into_iter().map(|w| w / sum).collect()
        }
    }
}

fn gaussian_blur(channel: &Channel, kernel_size: usize) -> Channel {
    let (width, height) = dimensions(channel);
    let kernel = gaussian_kernel(kernel_size);
    let anchor = (kernel.len() / 2) as i32;
    let horizontal: Channel = (0..width).into_par_iter().map(|x| {
        (0..height).map(|y| {
            kernel.iter()
                .enumerate()
                .map(|(k, w)| channel[reflect_101(x as i32 + k as i32 - anchor, width)][y] * w)
                .sum::<f32>()
        })
        .collect()
    })
    .collect();
    horizontal.par_iter().map(|column| {
        (0..height).map(|y| {
            kernel.iter()
                .enumerate()
                .map(|(k, w)| column[reflect_101(y as i32 + k as i32 - anchor, height)] * w)
                .sum::<f32>()
        })
        .collect()
    })
    .collect()
}

/// 3x3 Sobel derivatives.
fn sobel(channel: &Channel) -> Vec<Vec<Gradient>> {
    let (width, height) = dimensions(channel);
    (0..width).into_par_iter().map(|x| {
        (0..height).map(|y| {
            let px = |dx: i32, dy: i32| {
                channel[reflect_101(x as i32 + dx, width)][reflect_101(y as i32 + dy, height)]
            };
            let gx = (px(1, -1) + 2.0 * px(1, 0) + px(1, 1)) - (px(-1, -1) + 2.0 * px(-1, 0) + px(-1, 1));
            let gy = (px(-1, 1) + 2.0 * px(0, 1) + px(1, 1)) - (px(-1, -1) + 2.0 * px(0, -1) + px(1, -1));
            Gradient::new(gx, gy)
        })
        .collect()
    })
    .collect()
}

const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),   // middle right
    (1, 1),   // bottom right
    (0, 1),   // center bottom
    (-1, 1),  // bottom left
    (-1, 0),  // middle left
    (-1, -1), // top left
    (0, -1),  // center top
    (1, -1),  // top right
];

/// Maps an angle to the neighbour whose 45 degree sector starts at it.
fn neighbour_pos_delta(theta: f32) -> (i32, i32) {
    let n = ((theta + PI * 2.0) % (2.0 * PI)) / (2.0 * PI);
    let i = (n * 8.0 + 0.001).floor().min(7.0);
    debug_assert!(0.0 <= i && i < 8.0);
    NEIGHBOURS[i as usize]
}

/// The gradient direction rounded to the nearest of the four axes, pointing right or down.
fn gradient_axis(theta: f32) -> (i32, i32) {
    let (dx, dy) = neighbour_pos_delta(theta + FRAC_PI_8);
    if dy < 0 || (dy == 0 && dx < 0) {
        (-dx, -dy)
    } else {
        (dx, dy)
    }
}

/// Narrows the width of detected edges down to a single pixel.
///
/// Returns the magnitudes of the surviving apex pixels, zero elsewhere. Plateaus along the
/// horizontal and vertical axes keep their first pixel.
fn minmax_suppression(gradients: &[Vec<Gradient>], low: f32) -> Channel {
    let (width, height) = dimensions(gradients);
    let magnitude_at = |x: i32, y: i32| {
        if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
            0.0
        } else {
            gradients[x as usize][y as usize].magnitude
        }
    };
    (0..width).into_par_iter().map(|x| {
        (0..height).map(|y| {
            let edge = gradients[x][y];
            if edge.magnitude <= low {
                // Skip neighbour lookups for pixels that can never become edges.
                return 0.0;
            }
            let (dx, dy) = gradient_axis(edge.theta());
            let (x, y) = (x as i32, y as i32);
            let behind = magnitude_at(x - dx, y - dy);
            let ahead = magnitude_at(x + dx, y + dy);
            let is_apex = if dx != 0 && dy != 0 {
                edge.magnitude > behind && edge.magnitude > ahead
            } else {
                edge.magnitude > behind && edge.magnitude >= ahead
            };
            if is_apex {
                edge.magnitude
            } else {
                0.0
            }
        })
        .collect()
    })
    .collect()
}

fn hysteresis(magnitudes: &Channel, low: f32, high: f32) -> BinaryMask {
    let (width, height) = dimensions(magnitudes);
    let mut edges_out = BinaryMask::new(width as u32, height as u32);
    for x in 0..width {
        for y in 0..height {
            if magnitudes[x][y] > high && !edges_out.get(x as u32, y as u32) {
                // Start following in all directions.
                edges_out.set(x as u32, y as u32, true);
                let mut stack = vec![(x, y)];
                while let Some(top) = stack.pop() {
                    for (nb_dx, nb_dy) in NEIGHBOURS.iter() {
                        let nb_x = top.0 as i32 + nb_dx;
                        let nb_y = top.1 as i32 + nb_dy;
                        if nb_x < 0 || nb_x >= width as i32 || nb_y < 0 || nb_y >= height as i32 {
                            continue;
                        }
                        let nb = (nb_x as usize, nb_y as usize);
                        if magnitudes[nb.0][nb.1] > low && !edges_out.get(nb.0 as u32, nb.1 as u32) {
                            edges_out.set(nb.0 as u32, nb.1 as u32, true);
                            stack.push(nb);
                        }
                    }
                }
            }
        }
    }
    edges_out
}
