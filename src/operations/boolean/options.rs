use crate::math::bbox::Aabb;
use crate::math::{Point3, TOLERANCE};

/// Tuning knobs for a boolean run.
#[derive(Debug, Clone)]
pub struct BooleanOptions {
    pub(crate) max_attempts: usize,
    pub(crate) seed: u64,
    pub(crate) allow_open: bool,
    pub(crate) tangent_edges: Vec<(Point3, Point3)>,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            seed: 0x5eed_b001,
            allow_open: false,
            tangent_edges: Vec::new(),
        }
    }
}

impl BooleanOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many jittered partitions are tried before giving up.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Seed of the partition jitter.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Accept result shells that still have open edges.
    #[must_use]
    pub fn with_allow_open(mut self, allow: bool) -> Self {
        self.allow_open = allow;
        self
    }

    /// Known tangential intersection segments. Intersection points found
    /// near one of them are snapped to its closest endpoint.
    #[must_use]
    pub fn with_tangent_edges(mut self, edges: Vec<(Point3, Point3)>) -> Self {
        self.tangent_edges = edges;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    #[must_use]
    pub fn allow_open(&self) -> bool {
        self.allow_open
    }
}

/// Tolerances of one run, scaled to the size of the inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precision {
    /// Cell boundary test of the spatial partition.
    pub linear: f64,
    /// Coincidence of points, neighbour search and stitching.
    pub search: f64,
}

impl Precision {
    #[must_use]
    pub fn from_bounds(bounds: &Aabb) -> Self {
        let size = if bounds.is_empty() {
            1.0
        } else {
            bounds.max_extent().max(TOLERANCE)
        };
        Self {
            linear: size * 1e-6,
            search: size * 1e-3,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn precision_scales_with_extent() {
        let bounds = Aabb::new(Point3::origin(), Point3::new(10.0, 2.0, 1.0));
        let p = Precision::from_bounds(&bounds);
        approx::assert_relative_eq!(p.linear, 1e-5);
        approx::assert_relative_eq!(p.search, 1e-2);
    }

    #[test]
    fn attempts_never_drop_to_zero() {
        let o = BooleanOptions::new().with_max_attempts(0).with_allow_open(true);
        assert_eq!(o.max_attempts(), 1);
        assert!(o.allow_open());
    }
}
