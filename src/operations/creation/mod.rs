pub(crate) mod builder;
mod make_box;
mod make_cone;
mod make_cylinder;
mod make_polygon;
mod make_solid;
mod make_sphere;

pub use make_box::MakeBox;
pub use make_cone::MakeCone;
pub use make_cylinder::MakeCylinder;
pub use make_polygon::MakePolygon;
pub use make_solid::MakeSolid;
pub use make_sphere::MakeSphere;
