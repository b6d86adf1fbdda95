//! Persistent B-rep editing core: a ref-counted shape registry, a
//! topology-preserving vertex-displacement rebuild, and snapshot undo/redo.

pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod history;
pub mod kernel;
pub mod math;
pub mod operations;
pub mod rebuild;
pub mod registry;
pub mod session;
pub mod tessellation;
pub mod topology;

pub use error::{Error, Result};
pub use kernel::GeometryKernel;
pub use registry::{ShapeHandle, ShapeRegistry};
pub use session::Session;
