use super::{Point2, TOLERANCE};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Winding number of a closed polygon around `p`.
#[must_use]
pub fn winding_number(p: &Point2, polygon: &[Point2]) -> i32 {
    let n = polygon.len();
    let mut winding = 0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let side = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Returns `true` if `p` is enclosed by the polygon, whatever its orientation.
#[must_use]
pub fn point_in_polygon(p: &Point2, polygon: &[Point2]) -> bool {
    winding_number(p, polygon) != 0
}

/// Distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn segment_distance(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < TOLERANCE * TOLERANCE {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Distance from `p` to the boundary of a closed polygon.
#[must_use]
pub fn boundary_distance(p: &Point2, polygon: &[Point2]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| segment_distance(p, &polygon[i], &polygon[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Axis-aligned bounds of a point set as `(min, max)`.
#[must_use]
pub fn bounds(points: &[Point2]) -> (Point2, Point2) {
    let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

/// Sorted x coordinates where the horizontal line at `y` crosses the loops.
///
/// Consecutive pairs bound the inside spans of the region (even-odd rule).
#[must_use]
pub fn scanline_crossings(loops: &[&[Point2]], y: f64) -> Vec<f64> {
    let mut xs = Vec::new();
    for lp in loops {
        let n = lp.len();
        for i in 0..n {
            let a = lp[i];
            let b = lp[(i + 1) % n];
            if (a.y > y) != (b.y > y) {
                xs.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
            }
        }
    }
    xs.sort_by(f64::total_cmp);
    xs
}

fn spans(loops: &[&[Point2]], y: f64) -> Vec<(f64, f64)> {
    scanline_crossings(loops, y)
        .chunks_exact(2)
        .map(|s| (s[0], s[1]))
        .collect()
}

/// Finds a point well inside the region bounded by `outline` minus `holes`.
///
/// Casts a few horizontal scanlines and returns the middle of the widest
/// inside span (even-odd rule), or `None` if the region has no area.
#[must_use]
pub fn interior_point(outline: &[Point2], holes: &[Vec<Point2>]) -> Option<Point2> {
    const FRACTIONS: [f64; 7] = [0.5, 0.371, 0.629, 0.213, 0.787, 0.113, 0.887];

    let (min, max) = bounds(outline);
    if max.y - min.y <= TOLERANCE {
        return None;
    }
    let loops: Vec<&[Point2]> = std::iter::once(outline)
        .chain(holes.iter().map(Vec::as_slice))
        .collect();

    let mut best: Option<(f64, Point2)> = None;
    for f in FRACTIONS {
        let y = min.y + (max.y - min.y) * f;
        for (x0, x1) in spans(&loops, y) {
            let width = x1 - x0;
            if best.as_ref().is_none_or(|(w, _)| width > *w) {
                best = Some((width, Point2::new((x0 + x1) * 0.5, y)));
            }
        }
    }
    best.filter(|(w, _)| *w > TOLERANCE).map(|(_, p)| p)
}

/// The point deepest inside both regions, each given as its loops
/// (even-odd rule), or `None` when they share no area.
///
/// Every vertex height of either region starts a slab in which both are
/// trapezoid strips, so scanning the middle line of each slab finds any
/// common area, however thin. A candidate scores by the smaller of its
/// half span and half slab height.
#[must_use]
pub fn common_interior_point(a: &[&[Point2]], b: &[&[Point2]]) -> Option<Point2> {
    let heights = |loops: &[&[Point2]]| {
        let ys: Vec<f64> = loops.iter().flat_map(|l| l.iter().map(|p| p.y)).collect();
        let lo = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (ys, lo, hi)
    };
    let (mut ys, lo_a, hi_a) = heights(a);
    let (ys_b, lo_b, hi_b) = heights(b);
    let (lo, hi) = (lo_a.max(lo_b), hi_a.min(hi_b));
    if hi - lo <= TOLERANCE {
        return None;
    }
    ys.extend(ys_b);
    ys.retain(|y| (lo..=hi).contains(y));
    ys.push(lo);
    ys.push(hi);
    ys.sort_by(f64::total_cmp);
    ys.dedup_by(|y, prev| *y - *prev <= TOLERANCE);

    let mut best: Option<(f64, Point2)> = None;
    for w in ys.windows(2) {
        let y = 0.5 * (w[0] + w[1]);
        let half_height = 0.5 * (w[1] - w[0]);
        let (sa, sb) = (spans(a, y), spans(b, y));
        for &(a0, a1) in &sa {
            for &(b0, b1) in &sb {
                let (x0, x1) = (a0.max(b0), a1.min(b1));
                let score = (0.5 * (x1 - x0)).min(half_height);
                if best.as_ref().is_none_or(|(s, _)| score > *s) {
                    best = Some((score, Point2::new(0.5 * (x0 + x1), y)));
                }
            }
        }
    }
    best.filter(|(s, _)| *s > TOLERANCE).map(|(_, p)| p)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, s: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + s, y0),
            Point2::new(x0 + s, y0 + s),
            Point2::new(x0, y0 + s),
        ]
    }

    #[test]
    fn ccw_square_has_positive_area() {
        let sq = square(0.0, 0.0, 2.0);
        assert!((signed_area(&sq) - 4.0).abs() < 1e-12);
        let rev: Vec<_> = sq.iter().rev().copied().collect();
        assert!((signed_area(&rev) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn winding_ignores_orientation_for_containment() {
        let sq = square(0.0, 0.0, 1.0);
        let rev: Vec<_> = sq.iter().rev().copied().collect();
        let inside = Point2::new(0.5, 0.5);
        let outside = Point2::new(1.5, 0.5);
        assert_eq!(winding_number(&inside, &sq), 1);
        assert_eq!(winding_number(&inside, &rev), -1);
        assert!(!point_in_polygon(&outside, &sq));
    }

    #[test]
    fn boundary_distance_of_square() {
        let sq = square(0.0, 0.0, 1.0);
        assert!((boundary_distance(&Point2::new(0.5, 0.25), &sq) - 0.25).abs() < 1e-12);
        assert!((boundary_distance(&Point2::new(2.0, 0.5), &sq) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn interior_point_avoids_holes() {
        let outer = square(0.0, 0.0, 4.0);
        let hole: Vec<_> = square(1.0, 0.5, 2.0).into_iter().rev().collect();
        let p = interior_point(&outer, &[hole.clone()]).unwrap();
        assert!(point_in_polygon(&p, &outer));
        assert!(!point_in_polygon(&p, &hole));
    }

    #[test]
    fn interior_point_of_flat_polygon_is_none() {
        let flat = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        assert!(interior_point(&flat, &[]).is_none());
    }

    #[test]
    fn common_point_of_a_thin_overlap() {
        let a = square(0.0, 0.0, 1.0);
        let b: Vec<_> = [(0.95, 0.0), (2.0, 0.0), (2.0, 1.0), (0.95, 1.0)]
            .iter()
            .map(|&(x, y)| Point2::new(x, y))
            .collect();
        let p = common_interior_point(&[a.as_slice()], &[b.as_slice()]).unwrap();
        assert!(p.x > 0.95 && p.x < 1.0);
        assert!(p.y > 0.0 && p.y < 1.0);
    }

    #[test]
    fn common_point_skips_the_hole() {
        let outer = square(0.0, 0.0, 4.0);
        let hole: Vec<_> = square(1.0, 1.0, 2.0).into_iter().rev().collect();
        let inside_hole = square(1.5, 1.5, 1.0);
        let region = [outer.as_slice(), hole.as_slice()];
        assert!(common_interior_point(&region, &[inside_hole.as_slice()]).is_none());
        let straddling = square(2.5, 2.5, 1.0);
        let p = common_interior_point(&region, &[straddling.as_slice()]).unwrap();
        assert!(point_in_polygon(&p, &straddling));
        assert!(!point_in_polygon(&p, &hole));
    }

    #[test]
    fn edge_sharing_squares_have_no_common_point() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(1.0, 0.0, 1.0);
        assert!(common_interior_point(&[a.as_slice()], &[b.as_slice()]).is_none());
    }
}
