mod sew;
mod vertex_merger;

pub use sew::{Sew, Sewn};
