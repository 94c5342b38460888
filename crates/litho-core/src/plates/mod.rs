//! The per-plate model: footprint, mass, kinematics, continental segments
//! and the plate itself.

pub mod bounds;
pub mod mass;
pub mod movement;
pub mod plate;
pub mod segments;

pub use bounds::Bounds;
pub use mass::{Mass, MassBuilder};
pub use movement::{CollisionTarget, Movement, DEFORMATION_WEIGHT};
pub use plate::Plate;
pub use segments::{create_segment, SegmentData, SegmentId, Segments, NO_SEGMENT};
