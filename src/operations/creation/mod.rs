mod make_box;
mod make_face;
mod make_polyhedron;
mod make_shell;
mod make_solid;
mod make_wire;

pub use make_box::MakeBox;
pub use make_face::MakeFace;
pub use make_polyhedron::MakePolyhedron;
pub use make_shell::{edge_uses, MakeShell};
pub use make_solid::MakeSolid;
pub use make_wire::{make_arc_edge, make_line_edge, MakeWire};
