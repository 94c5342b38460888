//! Square-diamond midpoint displacement on a `2^n + 1` sided grid.
//!
//! Only cells whose truncated integer value is zero are written, so callers
//! may pre-seed the buffer and let the fractal fill the gaps. The top row is
//! copied into the bottom row and each row's first value into its last, which
//! keeps the field consistent across the toroidal wrap.

use super::HeightSource;
use crate::coords::Dimension;
use crate::rng::Lcg;

/// Default displacement roughness used by the terrain sources.
pub const ROUGHNESS: f32 = 0.35;

/// Rescale a buffer linearly into [0, 1]; a constant buffer is left alone.
pub fn normalize(values: &mut [f32]) {
    let Some(&first) = values.first() else {
        return;
    };
    let mut min = first;
    let mut max = first;
    for &v in values.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    let diff = max - min;
    if diff > 0.0 {
        for v in values.iter_mut() {
            *v = (*v - min) / diff;
        }
    }
}

/// Run the fractal in place over a `size × size` buffer.
///
/// Panics if `size` is not `2^n + 1` with `n >= 2`, or if the buffer length
/// does not match.
pub fn sqrdmd(seed: u32, map: &mut [f32], size: usize, roughness: f32) {
    assert_eq!(
        map.len(),
        size * size,
        "buffer length {} does not match side {size}",
        map.len()
    );
    let side = size - 1;
    assert!(
        side & (side - 1) == 0 && side & 3 == 0,
        "square-diamond side must be 2^n + 1, got {size}"
    );

    let mut rng = Lcg::new(seed);
    let size = size as isize;
    let full_size = size * size;
    let mut slope = roughness;
    let mut step = size & !1;

    let avg = |map: &[f32], a: isize, b: isize, c: isize, d: isize| {
        (map[a as usize] + map[b as usize] + map[c as usize] + map[d as usize]) * 0.25
    };
    // Write-if-zero: a cell is untouched once its truncated value is nonzero.
    let put = |map: &mut [f32], i: isize, sum: f32| {
        if map[i as usize] as i32 == 0 {
            map[i as usize] = sum;
        }
    };

    // Seed the first diamond and its flanking square points.
    let dy = step * size;
    let sum = avg(map, 0, step, dy, dy + step) + slope * rng.next_float_signed();
    put(map, 0, sum);
    let center_sum = sum;

    let p0 = step >> 1;
    let sum = (map[0] + map[p0 as usize * 2] + center_sum + center_sum) * 0.25
        + slope * rng.next_float_signed();
    put(map, p0, sum);
    let p1 = p0 * size;
    let sum = (map[0] + map[dy as usize] + center_sum + center_sum) * 0.25
        + slope * rng.next_float_signed();
    put(map, p1, sum);
    map[(full_size + p0 - size) as usize] = map[p0 as usize];
    map[(p1 + size - 1) as usize] = map[p1 as usize];
    slope *= roughness;
    step >>= 1;

    while step > 1 {
        // Diamond step: midpoints of every sub-square.
        let dx = step;
        let dy = step * size;
        let mut i = (step >> 1) * (size + 1);
        let line_jump = step * size + 1 + step - size;
        let mut y0 = 0;
        let mut y1 = dy;
        while y1 < full_size {
            let mut x0 = 0;
            let mut x1 = dx;
            while x1 < size {
                let sum = avg(map, y0 + x0, y0 + x1, y1 + x0, y1 + x1)
                    + slope * rng.next_float_signed();
                if map[i as usize] as i32 == 0 {
                    map[i as usize] = sum;
                }
                x0 += dx;
                x1 += dx;
                i += step;
            }
            i += line_jump - step;
            y0 += dy;
            y1 += dy;
        }

        // Square step, top row: the top vertex wraps over the map edge.
        let mut i = step >> 1;
        let mut p0 = step;
        let mut p1 = i * size + i;
        let mut p2 = 0;
        let mut p3 = full_size + i - (i + 1) * size;
        while p0 < size {
            let sum = avg(map, p0, p1, p2, p3) + slope * rng.next_float_signed();
            put(map, i, sum);
            map[(full_size + i - size) as usize] = map[i as usize];
            p0 += step;
            p1 += step;
            p2 += step;
            p3 += step;
            i += step;
        }

        // Square step, remaining rows. Starting at y = step/2 keeps reads
        // inside the map on both the top and bottom.
        let half = step >> 1;
        let mut y = half;
        let mut odd = false;
        while y < size - half {
            let mut x = if odd { half } else { 0 };
            let mut i = x + y * size;
            let mut p0 = half + i;
            let mut p1 = half * size + i;
            // Even rows start at the left edge: their left vertex wraps
            // around to the end of the previous row until the first step.
            let mut p2 = -half + i + if odd { 0 } else { size - 1 };
            let mut p3 = -half * size + i;
            while x < size - half {
                let sum = avg(map, p0, p1, p2, p3) + slope * rng.next_float_signed();
                put(map, i, sum);
                p0 += step;
                p1 += step;
                p2 += step;
                p3 += step;
                i += step;
                if x == 0 {
                    p2 -= size - 1;
                }
                x += step;
            }
            // Copy the row's first element into its last.
            let row = y * size;
            map[(row + size - 1) as usize] = map[row as usize];
            y += half;
            odd = !odd;
        }

        slope *= roughness;
        step >>= 1;
    }
}

/// `HeightSource` wrapper around the fractal: zero-fills the buffer, runs
/// the displacement, then normalizes to [0, 1]. Requires a square buffer
/// with a `2^n + 1` side.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquareDiamond;

impl HeightSource for SquareDiamond {
    fn fill(&self, out: &mut [f32], dim: Dimension, rng: &mut Lcg) {
        assert_eq!(
            dim.width(),
            dim.height(),
            "square-diamond needs a square grid, got {}x{}",
            dim.width(),
            dim.height()
        );
        out.fill(0.0);
        sqrdmd(rng.next_u32(), out, dim.width() as usize, ROUGHNESS);
        normalize(out);
    }
}
