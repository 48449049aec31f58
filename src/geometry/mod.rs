pub mod curve;
pub mod pcurve;
pub mod surface;

pub use curve::{Circle, Curve, Line};
pub use pcurve::Pcurve;
pub use surface::{Cone, Cylinder, Plane, Sphere, Surface, SurfaceDomain, Torus};
