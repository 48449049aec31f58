use crate::math::{Point2, Vector2};

/// A curve in a face's parameter space, stored as a polyline.
///
/// The polyline always runs in the direction of the owning edge's 3D curve
/// (start vertex to end vertex); traversal direction lives on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Pcurve {
    points: Vec<Point2>,
}

impl Pcurve {
    /// Wraps a polyline. Fewer than two points are padded by repetition.
    #[must_use]
    pub fn new(mut points: Vec<Point2>) -> Self {
        match points.len() {
            0 => points.extend([Point2::origin(), Point2::origin()]),
            1 => points.push(points[0]),
            _ => {}
        }
        Self { points }
    }

    /// Straight segment from `a` to `b`.
    #[must_use]
    pub fn segment(a: Point2, b: Point2) -> Self {
        Self { points: vec![a, b] }
    }

    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[must_use]
    pub fn start(&self) -> Point2 {
        self.points[0]
    }

    #[must_use]
    pub fn end(&self) -> Point2 {
        self.points[self.points.len() - 1]
    }

    /// Polyline length in parameter units.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Point at a fraction of the polyline's vertex sequence.
    ///
    /// Pcurves are sampled uniformly in the 3D curve parameter, so the
    /// fraction corresponds to a fraction of that parameter range.
    #[must_use]
    pub fn at_fraction(&self, fraction: f64) -> Point2 {
        let segments = self.points.len() - 1;
        #[allow(clippy::cast_precision_loss)]
        let s = fraction.clamp(0.0, 1.0) * segments as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let i = (s.floor() as usize).min(segments - 1);
        #[allow(clippy::cast_precision_loss)]
        let local = s - i as f64;
        self.points[i] + (self.points[i + 1] - self.points[i]) * local
    }

    /// Direction of travel at the midpoint, not normalized.
    #[must_use]
    pub fn mid_direction(&self) -> Vector2 {
        let n = self.points.len();
        let i = (n - 1) / 2;
        self.points[i + 1] - self.points[i]
    }

    /// The same curve with its direction of travel reversed.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            points: self.points.iter().rev().copied().collect(),
        }
    }

    /// Mirrors the curve across the `u` axis, `(u, v) -> (u, -v)`.
    #[must_use]
    pub fn mirrored_v(&self) -> Self {
        Self {
            points: self.points.iter().map(|p| Point2::new(p.x, -p.y)).collect(),
        }
    }

    /// Shifts the curve along `u` by `du`.
    #[must_use]
    pub fn shifted_u(&self, du: f64) -> Self {
        Self {
            points: self.points.iter().map(|p| Point2::new(p.x + du, p.y)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_interpolates_along_vertices() {
        let c = Pcurve::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ]);
        assert_eq!(c.at_fraction(0.0), Point2::new(0.0, 0.0));
        assert_eq!(c.at_fraction(0.5), Point2::new(1.0, 0.0));
        assert_eq!(c.at_fraction(0.75), Point2::new(1.0, 0.5));
        assert_eq!(c.at_fraction(1.0), Point2::new(1.0, 1.0));
        assert!((c.length() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn reverse_and_mirror() {
        let c = Pcurve::segment(Point2::new(0.0, 1.0), Point2::new(2.0, 3.0));
        let r = c.reversed();
        assert_eq!(r.start(), Point2::new(2.0, 3.0));
        let m = c.mirrored_v();
        assert_eq!(m.end(), Point2::new(2.0, -3.0));
    }

    #[test]
    fn short_input_is_padded() {
        let c = Pcurve::new(vec![Point2::new(1.0, 1.0)]);
        assert_eq!(c.points().len(), 2);
        assert_eq!(c.start(), c.end());
    }
}
