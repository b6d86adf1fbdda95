//! The editable document: bodies with their display meshes, and sketches.
//!
//! A document is plain data. It clones deeply and compares structurally,
//! which is what undo snapshots rely on. Shape handles are registry keys
//! rather than portable data, so they are skipped when serializing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{KernelError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::operations::shaping::ProfileSegment;
use crate::registry::ShapeHandle;
use crate::tessellation::Mesh;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub bodies: Vec<Body>,
    pub sketches: Vec<Sketch>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn body(&self, id: Uuid) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_mut(&mut self, id: Uuid) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    #[must_use]
    pub fn sketch(&self, id: Uuid) -> Option<&Sketch> {
        self.sketches.iter().find(|s| s.id == id)
    }

    /// Removes a body, handing it back.
    pub fn remove_body(&mut self, id: Uuid) -> Option<Body> {
        let index = self.bodies.iter().position(|b| b.id == id)?;
        Some(self.bodies.remove(index))
    }

    /// Every shape handle the document references, once per reference.
    #[must_use]
    pub fn shape_handles(&self) -> Vec<ShapeHandle> {
        self.bodies.iter().filter_map(|b| b.shape).collect()
    }
}

/// A solid body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: Uuid,
    pub name: String,
    /// The registered solid; absent after deserialization.
    #[serde(skip)]
    pub shape: Option<ShapeHandle>,
    /// The display mesh, kept in step with `shape`.
    pub mesh: Mesh,
    pub visible: bool,
}

impl Body {
    #[must_use]
    pub fn new(name: impl Into<String>, shape: ShapeHandle, mesh: Mesh) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            shape: Some(shape),
            mesh,
            visible: true,
        }
    }
}

/// A closed profile drawn on a plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sketch {
    pub id: Uuid,
    pub name: String,
    pub plane: SketchPlane,
    pub profile: Profile,
}

impl Sketch {
    #[must_use]
    pub fn new(name: impl Into<String>, plane: SketchPlane, profile: Profile) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            plane,
            profile,
        }
    }

    /// The profile in world coordinates, and the extrusion vector along the
    /// plane normal for `distance`.
    ///
    /// A negative distance extrudes below the plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the plane is degenerate or the distance is zero.
    pub fn extrusion(&self, distance: f64) -> Result<(Vec<ProfileSegment>, Vector3)> {
        if !distance.is_finite() || distance.abs() < TOLERANCE {
            return Err(
                KernelError::InvalidInput("extrusion distance must be non-zero".into()).into(),
            );
        }
        let frame = self.plane.frame()?;
        let segments = self
            .profile
            .segments
            .iter()
            .map(|segment| match *segment {
                SketchSegment::Line { start } => ProfileSegment::Line {
                    start: frame.to_world(start),
                },
                SketchSegment::Arc {
                    start,
                    center,
                    clockwise,
                } => ProfileSegment::Arc {
                    start: frame.to_world(start),
                    center: frame.to_world(center),
                    normal: if clockwise { -frame.normal } else { frame.normal },
                },
            })
            .collect();
        Ok((segments, frame.normal * distance))
    }
}

/// A sketch plane: origin, in-plane x axis and normal.
///
/// The in-plane y axis is `normal × x_axis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchPlane {
    pub origin: [f64; 3],
    pub x_axis: [f64; 3],
    pub normal: [f64; 3],
}

impl SketchPlane {
    /// The world XY plane.
    #[must_use]
    pub fn xy() -> Self {
        Self {
            origin: [0.0; 3],
            x_axis: [1.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
        }
    }

    /// An orthonormal frame for the plane.
    fn frame(&self) -> Result<Frame> {
        let normal = Vector3::from(self.normal);
        let x_axis = Vector3::from(self.x_axis);
        if normal.norm() < TOLERANCE {
            return Err(KernelError::ZeroVector.into());
        }
        let normal = normal.normalize();
        let x = x_axis - normal * normal.dot(&x_axis);
        if x.norm() < TOLERANCE {
            return Err(
                KernelError::InvalidInput("sketch x axis must not be parallel to the normal".into())
                    .into(),
            );
        }
        let x = x.normalize();
        Ok(Frame {
            origin: Point3::from(self.origin),
            x,
            y: normal.cross(&x),
            normal,
        })
    }
}

struct Frame {
    origin: Point3,
    x: Vector3,
    y: Vector3,
    normal: Vector3,
}

impl Frame {
    fn to_world(&self, [u, v]: [f64; 2]) -> Point3 {
        self.origin + self.x * u + self.y * v
    }
}

/// A closed loop of segments in plane coordinates.
///
/// Each segment runs from its start to the next segment's start; the last one
/// closes back to the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub segments: Vec<SketchSegment>,
}

impl Profile {
    /// A closed polygon through `corners`.
    #[must_use]
    pub fn polygon(corners: &[[f64; 2]]) -> Self {
        Self {
            segments: corners
                .iter()
                .map(|&start| SketchSegment::Line { start })
                .collect(),
        }
    }

    /// An axis-aligned rectangle.
    #[must_use]
    pub fn rectangle(min: [f64; 2], max: [f64; 2]) -> Self {
        Self::polygon(&[min, [max[0], min[1]], max, [min[0], max[1]]])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SketchSegment {
    Line {
        start: [f64; 2],
    },
    /// A circular arc about `center`, counter-clockwise in the plane unless `clockwise`.
    Arc {
        start: [f64; 2],
        center: [f64; 2],
        clockwise: bool,
    },
}
