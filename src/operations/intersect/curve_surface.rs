use crate::geometry::curve::{wrap_angle, Circle, Line};
use crate::geometry::surface::{Cone, Cylinder, Plane, Sphere, Surface};
use crate::math::{Point3, TOLERANCE};
use crate::topology::{EdgeCurve, FaceSurface};

/// Sign-change search resolution for surfaces without a closed form.
const SAMPLES: usize = 64;
const BISECTIONS: usize = 60;

/// A single intersection point between a curve and a surface.
#[derive(Debug, Clone, Copy)]
pub struct CurveSurfaceHit {
    /// Parameter on the curve.
    pub t: f64,
    /// 3D intersection point.
    pub point: Point3,
}

/// Computes intersection points between a bounded edge curve and a surface.
///
/// Lines are solved analytically against planes, cylinders, spheres and
/// cones, circles against planes; every other pair is found by sampling the
/// signed distance along the curve and bisecting sign changes. A curve lying
/// inside the surface reports no hits.
pub struct CurveSurfaceIntersect<'a> {
    curve: &'a EdgeCurve,
    t_min: f64,
    t_max: f64,
    tolerance: f64,
}

impl<'a> CurveSurfaceIntersect<'a> {
    /// Creates a new intersection query over `[t_min, t_max]`.
    #[must_use]
    pub fn new(curve: &'a EdgeCurve, t_min: f64, t_max: f64) -> Self {
        Self {
            curve,
            t_min,
            t_max,
            tolerance: TOLERANCE,
        }
    }

    /// Distance within which a root just outside the range is kept.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Intersects the curve with `surface`, returning hits sorted by `t`.
    #[must_use]
    pub fn execute(&self, surface: &FaceSurface) -> Vec<CurveSurfaceHit> {
        let roots = match (self.curve, surface) {
            (EdgeCurve::Pole(_), _) => Vec::new(),
            (EdgeCurve::Line(line), FaceSurface::Plane(plane)) => line_plane(line, plane),
            (EdgeCurve::Line(line), FaceSurface::Cylinder(cyl)) => line_cylinder(line, cyl),
            (EdgeCurve::Line(line), FaceSurface::Sphere(sph)) => line_sphere(line, sph),
            (EdgeCurve::Line(line), FaceSurface::Cone(cone)) => line_cone(line, cone),
            (EdgeCurve::Circle(circle), FaceSurface::Plane(plane)) => {
                return self.finish(self.circle_roots(circle_plane(circle, plane, self.tolerance)));
            }
            _ => self.sampled(surface.as_surface()),
        };
        self.finish(roots)
    }

    /// Parameter slack matching the distance tolerance.
    fn param_slack(&self) -> f64 {
        match self.curve {
            EdgeCurve::Circle(c) => self.tolerance / c.radius(),
            _ => self.tolerance,
        }
    }

    fn circle_roots(&self, roots: Vec<f64>) -> Vec<f64> {
        let slack = self.param_slack();
        roots
            .into_iter()
            .map(|t| wrap_angle(t, self.t_min - slack))
            .collect()
    }

    fn finish(&self, roots: Vec<f64>) -> Vec<CurveSurfaceHit> {
        let slack = self.param_slack();
        let mut ts: Vec<f64> = roots
            .into_iter()
            .filter(|t| *t >= self.t_min - slack && *t <= self.t_max + slack)
            .map(|t| t.clamp(self.t_min, self.t_max))
            .collect();
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|a, b| (*a - *b).abs() < slack.max(TOLERANCE));
        ts.into_iter()
            .map(|t| CurveSurfaceHit {
                t,
                point: self.curve.point_at(t),
            })
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn sampled(&self, surface: &dyn Surface) -> Vec<f64> {
        let f = |t: f64| surface.signed_distance(&self.curve.point_at(t));
        let step = (self.t_max - self.t_min) / SAMPLES as f64;
        let mut roots = Vec::new();
        let mut prev = (self.t_min, f(self.t_min));
        if prev.1.abs() < self.tolerance * 1e-3 {
            roots.push(prev.0);
        }
        for i in 1..=SAMPLES {
            let t = self.t_min + step * i as f64;
            let cur = (t, f(t));
            if cur.1.abs() < self.tolerance * 1e-3 {
                roots.push(t);
            } else if prev.1 * cur.1 < 0.0 {
                let (mut lo, mut hi) = (prev, cur);
                for _ in 0..BISECTIONS {
                    let mid_t = 0.5 * (lo.0 + hi.0);
                    let mid = (mid_t, f(mid_t));
                    if mid.1 * lo.1 <= 0.0 {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                roots.push(0.5 * (lo.0 + hi.0));
            }
            prev = cur;
        }
        roots
    }
}

/// Line-Plane intersection: solve `(O + t*D - P0) . N = 0`.
fn line_plane(line: &Line, plane: &Plane) -> Vec<f64> {
    let normal = plane.plane_normal();
    let denom = line.direction().dot(normal);
    if denom.abs() < 1e-12 {
        // parallel, or lying in the plane
        return vec![];
    }
    vec![(plane.origin() - line.origin()).dot(normal) / denom]
}

/// Line-Cylinder intersection: reduce to a 2D circle-line problem in the
/// plane perpendicular to the axis.
fn line_cylinder(line: &Line, cyl: &Cylinder) -> Vec<f64> {
    let axis = cyl.axis();
    let dp = line.origin() - cyl.center();
    let dp_perp = dp - *axis * dp.dot(axis);
    let dir = line.direction();
    let dir_perp = dir - *axis * dir.dot(axis);

    let a = dir_perp.dot(&dir_perp);
    let b = 2.0 * dp_perp.dot(&dir_perp);
    let c = dp_perp.dot(&dp_perp) - cyl.radius() * cyl.radius();
    solve_quadratic(a, b, c)
}

/// Line-Sphere intersection: solve `|O + t*D - C|^2 = r^2`.
fn line_sphere(line: &Line, sph: &Sphere) -> Vec<f64> {
    let dp = line.origin() - sph.center();
    let dir = line.direction();
    let a = dir.dot(dir);
    let b = 2.0 * dp.dot(dir);
    let c = dp.dot(&dp) - sph.radius() * sph.radius();
    solve_quadratic(a, b, c)
}

/// Line-Cone intersection, keeping the nappe the cone is defined on.
fn line_cone(line: &Line, cone: &Cone) -> Vec<f64> {
    let axis = cone.axis();
    let ca = cone.half_angle().cos();
    let cos2 = ca * ca;
    let dp = line.origin() - cone.apex();
    let dir = line.direction();

    // |P - apex|^2 cos^2 = ((P - apex) . axis)^2 with P = O + t D
    let d_dot_a = dir.dot(axis);
    let dp_dot_a = dp.dot(axis);
    let a = d_dot_a * d_dot_a - dir.dot(dir) * cos2;
    let b = 2.0 * (d_dot_a * dp_dot_a - dp.dot(dir) * cos2);
    let c = dp_dot_a * dp_dot_a - dp.dot(&dp) * cos2;

    solve_quadratic(a, b, c)
        .into_iter()
        .filter(|t| (line.point_at(*t) - cone.apex()).dot(axis) > -TOLERANCE)
        .collect()
}

/// Circle-Plane intersection: `d0 + A cos t + B sin t = 0`.
fn circle_plane(circle: &Circle, plane: &Plane, tol: f64) -> Vec<f64> {
    let n = plane.plane_normal();
    let binormal = circle.normal().cross(circle.ref_dir());
    let d0 = (circle.center() - plane.origin()).dot(n);
    let a = circle.radius() * circle.ref_dir().dot(n);
    let b = circle.radius() * binormal.dot(n);
    let amplitude = a.hypot(b);
    if amplitude < tol {
        // circle parallel to the plane
        return vec![];
    }
    let cos = -d0 / amplitude;
    if cos.abs() > 1.0 {
        return vec![];
    }
    let phase = b.atan2(a);
    let delta = cos.acos();
    if delta < 1e-12 {
        vec![phase]
    } else {
        vec![phase - delta, phase + delta]
    }
}

/// Real roots of `a*t^2 + b*t + c = 0`; a double root is reported once.
fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < TOLERANCE {
        if b.abs() < TOLERANCE {
            return vec![];
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < -TOLERANCE {
        return vec![];
    }
    let disc = disc.max(0.0).sqrt();
    let t1 = (-b - disc) / (2.0 * a);
    let t2 = (-b + disc) / (2.0 * a);
    if (t1 - t2).abs() < TOLERANCE {
        vec![t1]
    } else {
        vec![t1, t2]
    }
}
