//! Boolean operations on closed shells.
//!
//! Every operation runs the same sweep over private copies of its inputs:
//! coincident faces are detected, edges are cut where they cross the other
//! shell, faces are trimmed along the intersection curves, and the pieces
//! lying on the requested side are sewn into new shells.

mod assemble;
mod classify;
mod clip;
mod engine;
mod intersect_op;
mod merge;
mod new_edges;
mod options;
mod overlap;
mod partition;
mod scratch;
mod split;
mod split_plane;
mod subtract;
mod test_intersection;
mod trim;
mod union;
mod vertex_finder;

pub use clip::Clip;
pub use intersect_op::Intersect;
pub use options::{BooleanOptions, Precision};
pub use split_plane::SplitByPlane;
pub use subtract::Subtract;
pub use test_intersection::TestIntersection;
pub use union::Union;
