mod bounding_box;
mod explore;
mod is_valid;

pub use bounding_box::{Aabb, BoundingBox};
pub use explore::{ExploreSolid, SolidTopology};
pub use is_valid::IsValid;
