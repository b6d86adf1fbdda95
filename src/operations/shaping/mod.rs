mod extrude;

pub use extrude::{Extrude, ProfileSegment};
