//! Per-plate bookkeeping of connected continental regions.
//!
//! Every plate cell carries a segment id (or the unassigned sentinel); each
//! segment records its bounding box, area and collision count. Segments are
//! discovered lazily: the first collision touching an unassigned cell
//! triggers a span-based scanline flood fill over the continental crust
//! around it. Ids are never recycled within a cycle; a segment donated to
//! another plate is only marked non-existent.

use serde::{Deserialize, Serialize};

use crate::coords::{Dimension, UVec2};
use crate::grid::HeightMap;
use crate::plates::bounds::Bounds;

pub type SegmentId = u32;

/// Sentinel id for cells not yet assigned to any segment.
pub const NO_SEGMENT: SegmentId = u32::MAX;

/// One 4-connected region of continental crust within a plate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentData {
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
    area: u32,
    coll_count: u32,
}

impl SegmentData {
    pub fn new(top_left: UVec2, bottom_right: UVec2, area: u32) -> Self {
        Self {
            left: top_left.x,
            right: bottom_right.x,
            top: top_left.y,
            bottom: bottom_right.y,
            area,
            coll_count: 0,
        }
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn right(&self) -> u32 {
        self.right
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn bottom(&self) -> u32 {
        self.bottom
    }

    pub fn area(&self) -> u32 {
        self.area
    }

    pub fn coll_count(&self) -> u32 {
        self.coll_count
    }

    /// Grow the bounding box to cover a cell added from outside it.
    pub fn enlarge_to_contain(&mut self, p: UVec2) {
        if p.y < self.top {
            self.top = p.y;
        } else if p.y > self.bottom {
            self.bottom = p.y;
        }
        if p.x < self.left {
            self.left = p.x;
        } else if p.x > self.right {
            self.right = p.x;
        }
    }

    /// Translate the bounding box after the plate's local origin moved.
    pub fn shift(&mut self, delta: UVec2) {
        self.left += delta.x;
        self.right += delta.x;
        self.top += delta.y;
        self.bottom += delta.y;
    }

    pub fn inc_coll_count(&mut self) {
        self.coll_count += 1;
    }

    pub fn inc_area(&mut self) {
        self.area += 1;
    }

    pub fn inc_area_by(&mut self, amount: u32) {
        self.area += amount;
    }

    /// A donated segment keeps its slot but stops matching any cell.
    pub fn mark_non_existent(&mut self) {
        self.area = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.area == 0
    }
}

/// The segment id grid plus all segment records of one plate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segments {
    ids: Vec<SegmentId>,
    data: Vec<SegmentData>,
}

impl Segments {
    pub fn new(plate_area: usize) -> Self {
        Self {
            ids: vec![NO_SEGMENT; plate_area],
            data: Vec::new(),
        }
    }

    /// Number of cells covered by the id grid.
    pub fn cell_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of segment records (live and donated).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop all records and mark every cell unassigned.
    pub fn reset(&mut self) {
        self.data.clear();
        self.ids.fill(NO_SEGMENT);
    }

    /// Install a resized id grid after plate growth.
    pub fn reassign(&mut self, ids: Vec<SegmentId>) {
        self.ids = ids;
    }

    /// Shift all bounding boxes after plate growth moved the local origin.
    pub fn shift(&mut self, delta: UVec2) {
        for segment in &mut self.data {
            segment.shift(delta);
        }
    }

    #[inline]
    pub fn id(&self, index: usize) -> SegmentId {
        self.ids[index]
    }

    #[inline]
    pub fn set_id(&mut self, index: usize, id: SegmentId) {
        self.ids[index] = id;
    }

    pub fn get(&self, id: SegmentId) -> &SegmentData {
        &self.data[id as usize]
    }

    pub fn get_mut(&mut self, id: SegmentId) -> &mut SegmentData {
        &mut self.data[id as usize]
    }

    fn add(&mut self, data: SegmentData) -> SegmentId {
        self.data.push(data);
        (self.data.len() - 1) as SegmentId
    }

    /// Segment id at a world point, flood-filling a new segment when the
    /// cell is still unassigned.
    pub fn continent_at(
        &mut self,
        world_point: UVec2,
        bounds: &Bounds,
        heights: &HeightMap,
        world: Dimension,
        continental_base: f32,
    ) -> SegmentId {
        let (index, local) = bounds.valid_map_index(world_point);
        let id = self.id(index);
        if id != NO_SEGMENT {
            return id;
        }
        let id = create_segment(local, heights, world, self, continental_base);
        assert!(
            (id as usize) < self.len(),
            "segment creation failed at world point ({}, {})",
            world_point.x,
            world_point.y
        );
        id
    }
}

/// Horizontal run of same-segment cells, both columns inclusive.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: u32,
    end: u32,
}

/// Flood-fill a new segment from `origin` (plate-local coordinates) across
/// 4-connected cells whose height reaches `continental_base`. The fill
/// wraps across a plate edge only where the plate spans the entire world on
/// that axis. Returns the new segment's id; an unassigned origin always
/// starts a fresh segment, even when its own height is below the base.
pub fn create_segment(
    origin: UVec2,
    heights: &HeightMap,
    world: Dimension,
    segments: &mut Segments,
    continental_base: f32,
) -> SegmentId {
    let width = heights.width();
    let height = heights.height();
    let origin_index = heights.index_of(origin);

    let existing = segments.id(origin_index);
    if existing != NO_SEGMENT {
        return existing;
    }

    let wrap_x = width == world.width();
    let wrap_y = height == world.height();

    let id = segments.add(SegmentData::new(origin, origin, 0));

    let fillable = |segments: &Segments, index: usize| {
        segments.id(index) == NO_SEGMENT && heights[index] >= continental_base
    };

    // Pending spans per row; every cell is marked before its span is queued
    // and counted exactly once when the span is popped.
    let mut todo: Vec<Vec<Span>> = vec![Vec::new(); height as usize];
    segments.set_id(origin_index, id);
    todo[origin.y as usize].push(Span {
        start: origin.x,
        end: origin.x,
    });

    let mut left = origin.x;
    let mut right = origin.x;
    let mut top = origin.y;
    let mut bottom = origin.y;
    let mut area = 0u32;

    let mut pending = 1usize;
    while pending > 0 {
        for row in 0..height {
            let Some(mut span) = todo[row as usize].pop() else {
                continue;
            };
            pending -= 1;
            let row_base = (row * width) as usize;

            // Extend to the left, wrapping once onto the far column when the
            // plate is world-wide.
            while span.start > 0 && fillable(segments, row_base + span.start as usize - 1) {
                span.start -= 1;
                segments.set_id(row_base + span.start as usize, id);
            }
            if wrap_x && span.start == 0 && fillable(segments, row_base + width as usize - 1) {
                segments.set_id(row_base + width as usize - 1, id);
                todo[row as usize].push(Span {
                    start: width - 1,
                    end: width - 1,
                });
                pending += 1;
            }

            // Extend to the right.
            while span.end < width - 1 && fillable(segments, row_base + span.end as usize + 1) {
                span.end += 1;
                segments.set_id(row_base + span.end as usize, id);
            }
            if wrap_x && span.end == width - 1 && fillable(segments, row_base) {
                segments.set_id(row_base, id);
                todo[row as usize].push(Span { start: 0, end: 0 });
                pending += 1;
            }

            area += 1 + span.end - span.start;
            top = top.min(row);
            bottom = bottom.max(row);
            left = left.min(span.start);
            right = right.max(span.end);

            // Seed spans in the adjacent rows.
            let mut neighbours = [None, None];
            if row > 0 {
                neighbours[0] = Some(row - 1);
            } else if wrap_y {
                neighbours[0] = Some(height - 1);
            }
            if row < height - 1 {
                neighbours[1] = Some(row + 1);
            } else if wrap_y {
                neighbours[1] = Some(0);
            }
            for neighbour in neighbours.into_iter().flatten() {
                let base = (neighbour * width) as usize;
                let mut x = span.start;
                while x <= span.end {
                    if fillable(segments, base + x as usize) {
                        let run_start = x;
                        segments.set_id(base + x as usize, id);
                        while x < span.end && fillable(segments, base + x as usize + 1) {
                            x += 1;
                            segments.set_id(base + x as usize, id);
                        }
                        todo[neighbour as usize].push(Span {
                            start: run_start,
                            end: x,
                        });
                        pending += 1;
                    }
                    x += 1;
                }
            }
        }
    }

    let data = segments.get_mut(id);
    data.left = left;
    data.right = right;
    data.top = top;
    data.bottom = bottom;
    data.area = area;
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    const BASE: f32 = 1.0;

    fn heights_from(rows: &[&[f32]]) -> HeightMap {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let data: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Grid::from_vec(data, width, height)
    }

    #[test]
    fn fill_covers_a_rectangular_continent() {
        let heights = heights_from(&[
            &[0.0, 0.0, 0.0, 0.0],
            &[0.0, 1.0, 1.5, 0.0],
            &[0.0, 1.2, 1.0, 0.0],
            &[0.0, 0.0, 0.0, 0.0],
        ]);
        let world = Dimension::new(16, 16);
        let mut segments = Segments::new(heights.len());
        let id = create_segment(UVec2::new(1, 1), &heights, world, &mut segments, BASE);
        let data = segments.get(id);
        assert_eq!(data.area(), 4);
        assert_eq!((data.left(), data.right()), (1, 2));
        assert_eq!((data.top(), data.bottom()), (1, 2));
        for (i, &h) in heights.iter().enumerate() {
            if h >= BASE {
                assert_eq!(segments.id(i), id);
            } else {
                assert_eq!(segments.id(i), NO_SEGMENT);
            }
        }
    }

    #[test]
    fn concave_shape_is_filled_completely() {
        let heights = heights_from(&[
            &[1.0, 1.0, 1.0, 1.0, 1.0],
            &[1.0, 0.0, 0.0, 0.0, 1.0],
            &[1.0, 1.0, 0.0, 1.0, 1.0],
            &[0.0, 1.0, 0.0, 1.0, 0.0],
        ]);
        let world = Dimension::new(16, 16);
        let mut segments = Segments::new(heights.len());
        let id = create_segment(UVec2::new(0, 0), &heights, world, &mut segments, BASE);
        let expected = heights.iter().filter(|&&h| h >= BASE).count() as u32;
        assert_eq!(segments.get(id).area(), expected);
    }

    #[test]
    fn separate_continents_get_separate_ids() {
        let heights = heights_from(&[
            &[1.0, 0.0, 1.0],
            &[1.0, 0.0, 1.0],
            &[0.0, 0.0, 1.0],
        ]);
        let world = Dimension::new(16, 16);
        let mut segments = Segments::new(heights.len());
        let a = create_segment(UVec2::new(0, 0), &heights, world, &mut segments, BASE);
        let b = create_segment(UVec2::new(2, 0), &heights, world, &mut segments, BASE);
        assert_ne!(a, b);
        assert_eq!(segments.get(a).area(), 2);
        assert_eq!(segments.get(b).area(), 3);
    }

    #[test]
    fn sub_base_origin_forms_a_single_cell_segment() {
        let heights = heights_from(&[
            &[0.0, 0.0, 0.0],
            &[0.0, 0.2, 0.0],
            &[0.0, 0.0, 0.0],
        ]);
        let world = Dimension::new(16, 16);
        let mut segments = Segments::new(heights.len());
        let id = create_segment(UVec2::new(1, 1), &heights, world, &mut segments, BASE);
        assert_eq!(segments.get(id).area(), 1);
        assert_eq!(segments.id(4), id);
    }

    #[test]
    fn unassigned_origin_starts_a_fresh_segment() {
        let heights = heights_from(&[
            &[1.0, 1.0, 0.0],
            &[1.0, 0.4, 0.0],
            &[0.0, 0.0, 0.0],
        ]);
        let world = Dimension::new(16, 16);
        let mut segments = Segments::new(heights.len());
        let id = create_segment(UVec2::new(0, 0), &heights, world, &mut segments, BASE);
        assert_eq!(segments.get(id).area(), 3);
        // A sub-base cell bordering the filled continent does not join it;
        // only the early-return on an already-assigned cell reuses an id.
        let fresh = create_segment(UVec2::new(1, 1), &heights, world, &mut segments, BASE);
        assert_ne!(fresh, id);
        assert_eq!(segments.get(fresh).area(), 1);
        assert_eq!(segments.get(id).area(), 3);
        assert_eq!(
            create_segment(UVec2::new(1, 1), &heights, world, &mut segments, BASE),
            fresh
        );
    }

    #[test]
    fn fill_wraps_only_when_plate_spans_the_world() {
        let heights = heights_from(&[
            &[1.0, 0.0, 1.0],
            &[0.0, 0.0, 0.0],
            &[0.0, 0.0, 0.0],
        ]);
        // Plate as wide as the world: the two edge cells connect.
        let mut segments = Segments::new(heights.len());
        let id = create_segment(
            UVec2::new(0, 0),
            &heights,
            Dimension::new(3, 16),
            &mut segments,
            BASE,
        );
        assert_eq!(segments.get(id).area(), 2);

        // Narrower than the world: they stay separate.
        let mut segments = Segments::new(heights.len());
        let id = create_segment(
            UVec2::new(0, 0),
            &heights,
            Dimension::new(16, 16),
            &mut segments,
            BASE,
        );
        assert_eq!(segments.get(id).area(), 1);
    }

    #[test]
    fn reset_clears_records_and_ids() {
        let heights = heights_from(&[&[1.0, 1.0], &[1.0, 1.0]]);
        let world = Dimension::new(16, 16);
        let mut segments = Segments::new(heights.len());
        create_segment(UVec2::new(0, 0), &heights, world, &mut segments, BASE);
        segments.reset();
        assert_eq!(segments.len(), 0);
        assert!((0..4).all(|i| segments.id(i) == NO_SEGMENT));
    }

    #[test]
    fn shift_moves_bounding_boxes() {
        let heights = heights_from(&[&[1.0, 1.0], &[1.0, 1.0]]);
        let world = Dimension::new(16, 16);
        let mut segments = Segments::new(heights.len());
        let id = create_segment(UVec2::new(0, 0), &heights, world, &mut segments, BASE);
        segments.shift(UVec2::new(8, 3));
        let data = segments.get(id);
        assert_eq!((data.left(), data.top()), (8, 3));
        assert_eq!((data.right(), data.bottom()), (9, 4));
    }
}
