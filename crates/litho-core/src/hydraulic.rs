//! Plate-local hydraulic erosion: river sources, downhill flow and the
//! crust redistribution pass. Free functions over a plate's height grid;
//! the plate itself only orchestrates them and owns the PRNG noise step.

use crate::coords::{Dimension, UVec2};
use crate::grid::HeightMap;
use crate::plates::mass::MassBuilder;

/// Fraction of the excess over the erosion floor removed per river visit.
const FLOW_EROSION: f32 = 0.2;

/// Heights of the four lower neighbours of a cell, with the indices to
/// write spread crust to. A zero height means "invalid or not lower":
/// out-of-plate, not strictly below the cell, or genuinely empty.
#[derive(Debug, Clone, Copy)]
pub struct LowerNeighbours {
    pub west: f32,
    pub east: f32,
    pub north: f32,
    pub south: f32,
    pub west_index: usize,
    pub east_index: usize,
    pub north_index: usize,
    pub south_index: usize,
}

impl LowerNeighbours {
    fn sum(&self) -> f32 {
        self.west + self.east + self.north + self.south
    }

    fn product(&self) -> f32 {
        self.west * self.east * self.north * self.south
    }
}

/// Probe the 4-neighbourhood of a local cell. Edges wrap only on an axis
/// where the plate spans the whole world.
pub fn lower_neighbours(
    p: UVec2,
    index: usize,
    heights: &HeightMap,
    world: Dimension,
) -> LowerNeighbours {
    let width = heights.width();
    let height = heights.height();
    let wrap_x = width == world.width();
    let wrap_y = height == world.height();

    let w_valid = p.x > 0 || wrap_x;
    let e_valid = p.x < width - 1 || wrap_x;
    let n_valid = p.y > 0 || wrap_y;
    let s_valid = p.y < height - 1 || wrap_y;

    let wx = if w_valid {
        if p.x == 0 { width - 1 } else { p.x - 1 }
    } else {
        0
    };
    let ex = if e_valid {
        if p.x + 1 == width { 0 } else { p.x + 1 }
    } else {
        0
    };
    let ny = if n_valid {
        if p.y == 0 { height - 1 } else { p.y - 1 }
    } else {
        0
    };
    let sy = if s_valid {
        if p.y + 1 == height { 0 } else { p.y + 1 }
    } else {
        0
    };

    let row = p.y as usize * width as usize;
    let west_index = row + wx as usize;
    let east_index = row + ex as usize;
    let north_index = ny as usize * width as usize + p.x as usize;
    let south_index = sy as usize * width as usize + p.x as usize;

    let here = heights[index];
    let pick = |valid: bool, i: usize| {
        if valid && heights[i] < here {
            heights[i]
        } else {
            0.0
        }
    };

    LowerNeighbours {
        west: pick(w_valid, west_index),
        east: pick(e_valid, east_index),
        north: pick(n_valid, north_index),
        south: pick(s_valid, south_index),
        west_index,
        east_index,
        north_index,
        south_index,
    }
}

/// Collect all strict local maxima at or above `lower_bound`: cells whose
/// four neighbours all exist, carry crust, and sit strictly lower.
pub fn find_river_sources(
    heights: &HeightMap,
    world: Dimension,
    lower_bound: f32,
    sources: &mut Vec<usize>,
) {
    let width = heights.width();
    let height = heights.height();
    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) as usize;
            if heights[index] < lower_bound {
                continue;
            }
            let nb = lower_neighbours(UVec2::new(x, y), index, heights, world);
            if nb.product() == 0.0 {
                continue; // Edge cell or not the tallest around.
            }
            sources.push(index);
        }
    }
}

/// Flow water from each source downhill, eroding `tmp` as it goes. Each
/// cell joins the wavefront at most once; the reference heights stay fixed
/// for the duration of the call.
pub fn flow_rivers(
    heights: &HeightMap,
    tmp: &mut HeightMap,
    world: Dimension,
    lower_bound: f32,
    mut sources: Vec<usize>,
) {
    let width = heights.width() as usize;
    let area = heights.len();
    let mut sinks: Vec<usize> = Vec::new();
    let mut visited = vec![false; area];

    while !sources.is_empty() {
        while let Some(index) = sources.pop() {
            if heights[index] < lower_bound {
                continue;
            }
            let y = index / width;
            let x = index - y * width;
            let nb = lower_neighbours(
                UVec2::new(x as u32, y as u32),
                index,
                heights,
                world,
            );
            if nb.sum() == 0.0 {
                continue; // Local minimum: the river ends here.
            }

            // Blocked directions count as walls at the cell's own height.
            let here = heights[index];
            let west = if nb.west == 0.0 { here } else { nb.west };
            let east = if nb.east == 0.0 { here } else { nb.east };
            let north = if nb.north == 0.0 { here } else { nb.north };
            let south = if nb.south == 0.0 { here } else { nb.south };

            let mut lowest = west;
            let mut dest = index.wrapping_sub(1);
            if east < lowest {
                lowest = east;
                dest = index + 1;
            }
            if north < lowest {
                lowest = north;
                dest = index.wrapping_sub(width);
            }
            if south < lowest {
                dest = index + width;
            }

            if dest < area && !visited[dest] {
                sinks.push(dest);
                visited[dest] = true;
            }

            tmp[index] -= (tmp[index] - lower_bound) * FLOW_EROSION;
        }

        std::mem::swap(&mut sources, &mut sinks);
        sinks.clear();
    }
}

/// The levelling pass: every cell at or above `lower_bound` sheds its
/// excess over its tallest lower neighbour into the neighbours, either
/// flattening the whole neighbourhood (when the gaps cannot absorb the
/// excess) or spreading proportionally to each gap. Writes into `tmp`,
/// which must be zeroed; returns the mass accumulated from `heights`.
pub fn redistribute(
    heights: &HeightMap,
    tmp: &mut HeightMap,
    world: Dimension,
    lower_bound: f32,
) -> MassBuilder {
    let width = heights.width();
    let height = heights.height();
    let mut builder = MassBuilder::new();

    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) as usize;
            builder.add_point(x, y, heights[index]);
            tmp[index] += heights[index]; // Keep amounts spread here earlier.

            if heights[index] < lower_bound {
                continue;
            }
            let nb = lower_neighbours(UVec2::new(x, y), index, heights, world);
            if nb.sum() == 0.0 {
                continue;
            }

            let here = heights[index];
            let w_diff = here - nb.west;
            let e_diff = here - nb.east;
            let n_diff = here - nb.north;
            let s_diff = here - nb.south;

            // Gap to the tallest lower neighbour; missing neighbours rank
            // as height zero and so never win the minimum on their own.
            let mut min_diff = w_diff;
            min_diff = min_diff.min(e_diff);
            min_diff = min_diff.min(n_diff);
            min_diff = min_diff.min(s_diff);

            let mut diff_sum = 0.0;
            if nb.west > 0.0 {
                diff_sum += w_diff - min_diff;
            }
            if nb.east > 0.0 {
                diff_sum += e_diff - min_diff;
            }
            if nb.north > 0.0 {
                diff_sum += n_diff - min_diff;
            }
            if nb.south > 0.0 {
                diff_sum += s_diff - min_diff;
            }
            assert!(
                diff_sum >= 0.0,
                "negative redistribution sum {diff_sum} at ({x}, {y})"
            );

            if diff_sum < min_diff {
                // The gaps cannot hold the excess: level every lower
                // neighbour to the tallest one, then split the rest evenly.
                if nb.west > 0.0 {
                    tmp[nb.west_index] += w_diff - min_diff;
                }
                if nb.east > 0.0 {
                    tmp[nb.east_index] += e_diff - min_diff;
                }
                if nb.north > 0.0 {
                    tmp[nb.north_index] += n_diff - min_diff;
                }
                if nb.south > 0.0 {
                    tmp[nb.south_index] += s_diff - min_diff;
                }
                tmp[index] -= min_diff;

                let mut remainder = min_diff - diff_sum;
                let shares = 1
                    + (nb.west > 0.0) as u32
                    + (nb.east > 0.0) as u32
                    + (nb.north > 0.0) as u32
                    + (nb.south > 0.0) as u32;
                remainder /= shares as f32;

                if nb.west > 0.0 {
                    tmp[nb.west_index] += remainder;
                }
                if nb.east > 0.0 {
                    tmp[nb.east_index] += remainder;
                }
                if nb.north > 0.0 {
                    tmp[nb.north_index] += remainder;
                }
                if nb.south > 0.0 {
                    tmp[nb.south_index] += remainder;
                }
                tmp[index] += remainder;
            } else {
                // Enough room: drop to the tallest lower neighbour and
                // spread the removed crust proportionally to each gap.
                let unit = min_diff / diff_sum;
                tmp[index] -= min_diff;
                if nb.west > 0.0 {
                    tmp[nb.west_index] += unit * (w_diff - min_diff);
                }
                if nb.east > 0.0 {
                    tmp[nb.east_index] += unit * (e_diff - min_diff);
                }
                if nb.north > 0.0 {
                    tmp[nb.north_index] += unit * (n_diff - min_diff);
                }
                if nb.south > 0.0 {
                    tmp[nb.south_index] += unit * (s_diff - min_diff);
                }
            }
        }
    }
    builder
}

/// Round accumulated float error below zero back up to zero.
pub fn clamp_non_negative(values: &mut [f32]) {
    for v in values.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use approx::assert_relative_eq;

    fn heights_from(rows: &[&[f32]]) -> HeightMap {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let data: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Grid::from_vec(data, width, height)
    }

    #[test]
    fn interior_peak_is_a_river_source() {
        let heights = heights_from(&[
            &[0.5, 0.5, 0.5],
            &[0.5, 2.0, 0.5],
            &[0.5, 0.5, 0.5],
        ]);
        let mut sources = Vec::new();
        find_river_sources(&heights, Dimension::new(64, 64), 1.0, &mut sources);
        assert_eq!(sources, vec![4]);
    }

    #[test]
    fn edge_cells_never_become_sources() {
        let heights = heights_from(&[
            &[2.0, 0.5, 0.5],
            &[0.5, 0.5, 0.5],
            &[0.5, 0.5, 0.5],
        ]);
        let mut sources = Vec::new();
        find_river_sources(&heights, Dimension::new(64, 64), 1.0, &mut sources);
        assert!(sources.is_empty());
    }

    #[test]
    fn world_wide_plate_wraps_the_neighbourhood() {
        // On a plate covering the whole (tiny) world, the corner peak sees
        // wrapped neighbours and becomes a source.
        let heights = heights_from(&[
            &[2.0, 0.5, 0.5],
            &[0.5, 0.5, 0.5],
            &[0.5, 0.5, 0.5],
        ]);
        let mut sources = Vec::new();
        find_river_sources(&heights, Dimension::new(3, 3), 1.0, &mut sources);
        assert_eq!(sources, vec![0]);
    }

    #[test]
    fn flow_erodes_the_source_towards_the_floor() {
        let heights = heights_from(&[
            &[0.5, 0.5, 0.5],
            &[0.5, 2.0, 0.5],
            &[0.5, 0.5, 0.5],
        ]);
        let mut tmp = heights.clone();
        flow_rivers(&heights, &mut tmp, Dimension::new(64, 64), 1.0, vec![4]);
        assert_relative_eq!(tmp[4], 2.0 - (2.0 - 1.0) * 0.2);
    }

    #[test]
    fn redistribution_conserves_total_crust() {
        let heights = heights_from(&[
            &[0.5, 0.6, 0.5],
            &[0.7, 2.0, 0.4],
            &[0.5, 0.8, 0.5],
        ]);
        let world = Dimension::new(64, 64);
        let mut tmp = Grid::new(3, 3, 0.0);
        let builder = redistribute(&heights, &mut tmp, world, 1.0);
        let before: f32 = heights.iter().sum();
        let after: f32 = tmp.iter().sum();
        assert_relative_eq!(before, after, epsilon = 1e-5);
        assert_relative_eq!(builder.build().mass(), before, epsilon = 1e-5);
    }

    #[test]
    fn redistribution_lowers_the_peak() {
        let heights = heights_from(&[
            &[0.5, 0.6, 0.5],
            &[0.7, 2.0, 0.4],
            &[0.5, 0.8, 0.5],
        ]);
        let world = Dimension::new(64, 64);
        let mut tmp = Grid::new(3, 3, 0.0);
        redistribute(&heights, &mut tmp, world, 1.0);
        assert!(tmp[4] < heights[4]);
        // The crust went to the lower neighbours.
        assert!(tmp[1] >= heights[1]);
        assert!(tmp[3] >= heights[3]);
        assert!(tmp[5] >= heights[5]);
        assert!(tmp[7] >= heights[7]);
    }

    #[test]
    fn clamp_rounds_small_negatives_up() {
        let mut values = [0.5, -1e-7, 0.0, -3.0];
        clamp_non_negative(&mut values);
        assert_eq!(values, [0.5, 0.0, 0.0, 0.0]);
    }
}
