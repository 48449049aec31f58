use tracing::warn;

use crate::error::Result;
use crate::geometry::curve::Line;
use crate::math::{Point3, Vector3};
use crate::operations::intersect::CurveSurfaceIntersect;
use crate::topology::{EdgeCurve, PointPosition, ShellId, TopologyStore};

/// Ray directions tried in turn; a ray grazing an edge or a surface is
/// discarded and the next one cast.
const RAY_DIRECTIONS: [[f64; 3]; 6] = [
    [0.5773, 0.5921, 0.5622],
    [-0.3719, 0.8127, 0.4487],
    [0.7071, -0.1137, -0.6980],
    [-0.2357, -0.4561, 0.8580],
    [0.9125, 0.2744, -0.3032],
    [-0.6202, -0.6663, -0.4139],
];

/// Classifies a point against the region bounded by a closed shell.
///
/// Casts a ray and counts crossings with the shell's faces (even-odd rule).
/// Points within the tolerance of a face are on the border. The
/// classification is purely geometric: an inside-out shell still reports
/// its enclosed points as inside.
pub struct ClassifyPoint {
    shell: ShellId,
    point: Point3,
    tolerance: f64,
}

enum Cast {
    Crossings(usize),
    Degenerate,
}

impl ClassifyPoint {
    /// Creates a new `ClassifyPoint` query.
    #[must_use]
    pub fn new(shell: ShellId, point: Point3) -> Self {
        Self {
            shell,
            point,
            tolerance: 1e-6,
        }
    }

    /// Distance below which the point counts as on the shell.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell references a missing entity.
    pub fn execute(&self, store: &TopologyStore) -> Result<PointPosition> {
        let faces = &store.shell(self.shell)?.faces;
        for &face in faces {
            let data = store.face(face)?;
            if data.surface.as_surface().signed_distance(&self.point).abs() < self.tolerance
                && store.locate_on_face(face, &self.point, self.tolerance)?.1 != PointPosition::Outside
            {
                return Ok(PointPosition::Border);
            }
        }

        let bbox = store.shell_bounds(self.shell)?;
        if !bbox.expanded(self.tolerance).contains(&self.point) {
            return Ok(PointPosition::Outside);
        }
        let reach = (bbox.center() - self.point).norm() + bbox.size() + 1.0;

        let mut last = 0;
        for dir in RAY_DIRECTIONS {
            match self.cast(store, Vector3::from(dir), reach)? {
                Cast::Crossings(n) => {
                    return Ok(if n % 2 == 1 {
                        PointPosition::Inside
                    } else {
                        PointPosition::Outside
                    });
                }
                Cast::Degenerate => last += 1,
            }
        }
        warn!(rays = last, "every ray grazed the shell, assuming outside");
        Ok(PointPosition::Outside)
    }

    fn cast(&self, store: &TopologyStore, dir: Vector3, reach: f64) -> Result<Cast> {
        let ray = EdgeCurve::Line(Line::new(self.point, dir)?);
        let dir = dir.normalize();
        let mut crossings = 0;
        for &face in &store.shell(self.shell)?.faces {
            let data = store.face(face)?;
            let hits = CurveSurfaceIntersect::new(&ray, 0.0, reach)
                .with_tolerance(self.tolerance)
                .execute(&data.surface);
            for hit in hits {
                if hit.t < self.tolerance {
                    continue;
                }
                let (uv, position) = store.locate_on_face(face, &hit.point, self.tolerance)?;
                match position {
                    PointPosition::Outside => {}
                    PointPosition::Border => return Ok(Cast::Degenerate),
                    PointPosition::Inside => {
                        let grazing = data
                            .normal_at(&uv)
                            .map_or(true, |n| n.dot(&dir).abs() < 1e-6);
                        if grazing {
                            return Ok(Cast::Degenerate);
                        }
                        crossings += 1;
                    }
                }
            }
        }
        Ok(Cast::Crossings(crossings))
    }
}
