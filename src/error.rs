use thiserror::Error;
use uuid::Uuid;

use crate::registry::ShapeHandle;

/// Top-level error type for the editing core.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl Error {
    /// Returns `true` for failures a caller may surface to the user and carry on from.
    ///
    /// Resource errors are bookkeeping bugs and are never recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Resource(_))
    }
}

/// Shape registry bookkeeping errors.
///
/// These indicate a bug in the caller's reference accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("shape handle {0:?} is not registered")]
    NotFound(ShapeHandle),

    #[error("shape handle {0:?} released more times than it was retained")]
    DoubleRelease(ShapeHandle),
}

/// Expected, recoverable failures of a vertex-displacement rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("face {face} has a curved boundary edge and cannot be rebuilt")]
    UnsupportedCurvedEdge { face: usize },

    #[error("degenerate move: {0}")]
    DegenerateMove(String),

    #[error("face reconstruction failed: {0}")]
    FaceReconstructionFailed(String),

    #[error("sewing failed: {0}")]
    SewingFailed(String),
}

/// The rebuilt solid is structurally unsound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rebuilt shape is invalid: {0}")]
    InvalidResultShape(String),
}

/// A document lookup named something that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("no body with id {0}")]
    BodyNotFound(Uuid),

    #[error("no sketch with id {0}")]
    SketchNotFound(Uuid),

    #[error("body {0} has no shape")]
    NoShape(Uuid),

    #[error("body has no {kind} with index {index}")]
    ElementNotFound { kind: &'static str, index: usize },
}

/// Failures raised by the native geometry kernel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("zero-length vector")]
    ZeroVector,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("wire is not closed")]
    WireNotClosed,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("operation not supported: {0}")]
    NotSupported(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("tessellation failed: {0}")]
    Tessellation(String),
}

/// Convenience type alias for results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
