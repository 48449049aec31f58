use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument, warn};

use crate::error::{BooleanError, OperationError, Result, ShellboolError};
use crate::math::Point3;
use crate::operations::intersect::IntersectionOracle;
use crate::operations::query::{ClassifyPoint, Volume};
use crate::topology::{PointPosition, ShellId, TopologyStore};

use super::assemble::assemble;
use super::classify::{classify_pieces, Selection};
use super::merge::merge_shell_vertices;
use super::new_edges::build_new_edges;
use super::options::BooleanOptions;
use super::overlap::{find_overlaps, shared_sample, Overlaps};
use super::partition::Partition;
use super::scratch::{Scratch, Side};
use super::split::split_edges;
use super::trim::{trim_faces, Piece};
use super::vertex_finder::{find_intersection_vertices, Intersections};

/// The operation a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Union,
    Intersect,
    Subtract,
    /// Shell A trimmed to the inside of shell B.
    Clip,
}

impl Mode {
    /// Shells turned inside out before the sweep. Union and difference
    /// become intersections of the (complemented) inputs.
    fn reversed(self) -> [bool; 2] {
        match self {
            Mode::Union => [true, true],
            Mode::Subtract => [false, true],
            Mode::Intersect | Mode::Clip => [false, false],
        }
    }

    fn selection(self) -> Selection {
        match self {
            Mode::Clip => Selection::FirstOnly,
            _ => Selection::Both,
        }
    }
}

/// Runs a boolean operation, writing the result shells into `store`.
///
/// The spatial partition is jittered randomly; whenever it comes out
/// degenerate the whole run restarts on a fresh copy of the inputs, up to
/// the configured number of attempts.
///
/// # Errors
///
/// Returns [`BooleanError::RetryBudgetExhausted`] when every attempt hit a
/// degenerate partition, or the first non-retryable failure. Nothing is
/// written to `store` on error.
#[instrument(skip(store, options, oracle))]
pub(crate) fn run<O: IntersectionOracle + ?Sized>(
    store: &mut TopologyStore,
    a: ShellId,
    b: ShellId,
    mode: Mode,
    options: &BooleanOptions,
    oracle: &O,
) -> Result<Vec<ShellId>> {
    check_input(store, a)?;
    check_input(store, b)?;
    let mut rng = StdRng::seed_from_u64(options.seed);
    for attempt in 1..=options.max_attempts() {
        match attempt_once(store, a, b, mode, options, oracle, &mut rng) {
            Err(ShellboolError::Boolean(BooleanError::DegeneratePartition)) => {
                debug!(attempt, "degenerate partition, retrying");
            }
            Ok(shells) => {
                info!(attempt, shells = shells.len(), "boolean finished");
                return Ok(shells);
            }
            Err(e) => return Err(e),
        }
    }
    warn!(attempts = options.max_attempts(), "retry budget exhausted");
    Err(BooleanError::RetryBudgetExhausted {
        attempts: options.max_attempts(),
    }
    .into())
}

fn attempt_once<O: IntersectionOracle + ?Sized>(
    store: &mut TopologyStore,
    a: ShellId,
    b: ShellId,
    mode: Mode,
    options: &BooleanOptions,
    oracle: &O,
    rng: &mut StdRng,
) -> Result<Vec<ShellId>> {
    let mut scratch = Scratch::new(store, a, b, mode.reversed())?;
    let tol = scratch.precision.search;

    let disjoint = !store
        .shell_bounds(a)?
        .expanded(tol)
        .overlaps(&store.shell_bounds(b)?);

    let (pieces, overlaps, found) = if disjoint {
        debug!("bounds are disjoint");
        let mut pieces = whole_faces(&scratch, Side::A)?;
        pieces.extend(whole_faces(&scratch, Side::B)?);
        (pieces, Overlaps::default(), Intersections::default())
    } else {
        // Step 1: partition both shells
        let mut partition = Partition::build(&scratch, rng)?;
        let face_pairs = partition.face_pairs();
        // Step 2: coincident faces
        let overlaps = find_overlaps(&scratch, &face_pairs, oracle)?;
        // Step 3: shared vertices
        let mut buckets = merge_shell_vertices(&mut scratch)?;
        // Step 4: edges crossing faces
        let found = find_intersection_vertices(
            &mut scratch,
            &partition.edge_face_pairs(),
            &overlaps,
            &mut buckets,
            oracle,
            &options.tangent_edges,
        )?;
        partition.insert_crossings(&scratch.store, &found)?;
        split_edges(&mut scratch, &found.splits)?;
        // Step 5: trimming edges along face/face curves
        let cuts = build_new_edges(&mut scratch, &found, &overlaps, &face_pairs, oracle)?;
        // Step 6: rebuild the loops of cut faces
        let pieces = trim_faces(&mut scratch, &cuts)?;
        (pieces, overlaps, found)
    };

    // Step 7: keep the pieces the operation selects
    let classes = classify_pieces(&scratch, &pieces, &overlaps, &found)?;
    let selection = mode.selection();
    let kept: Vec<&Piece> = pieces
        .iter()
        .zip(&classes)
        .filter(|(p, c)| selection.keeps(p.side, **c))
        .map(|(p, _)| p)
        .collect();
    debug!(pieces = pieces.len(), kept = kept.len(), "selected pieces");

    // Step 8: sew the result
    let allow_open = options.allow_open() || mode == Mode::Clip;
    let shells = assemble(&scratch, &kept, store, allow_open, mode == Mode::Union)?;
    nest_cavities(store, shells, tol)
}

fn check_input(store: &TopologyStore, shell: ShellId) -> Result<()> {
    if store.shell(shell)?.faces.is_empty() {
        return Err(OperationError::InvalidInput("shell has no faces".into()).into());
    }
    Ok(())
}

fn whole_faces(scratch: &Scratch, side: Side) -> Result<Vec<Piece>> {
    scratch
        .faces_of(side)?
        .into_iter()
        .map(|face| {
            Ok(Piece {
                face,
                side,
                loops: scratch.store.face_loops(face)?,
                trimmed: false,
            })
        })
        .collect()
}

/// Folds every inside-out shell into the smallest outward shell enclosing
/// it, so a cavity travels with its outer boundary.
fn nest_cavities(store: &mut TopologyStore, shells: Vec<ShellId>, tol: f64) -> Result<Vec<ShellId>> {
    if shells.len() < 2 {
        return Ok(shells);
    }
    let mut volumes = Vec::with_capacity(shells.len());
    for &s in &shells {
        volumes.push(Volume::new(s).execute(store)?);
    }
    let hosts: Vec<ShellId> = shells
        .iter()
        .zip(&volumes)
        .filter(|(_, v)| **v > 0.0)
        .map(|(s, _)| *s)
        .collect();
    let mut removed = HashSet::new();
    for (i, &cavity) in shells.iter().enumerate() {
        if volumes[i] >= 0.0 {
            continue;
        }
        let Some(sample) = cavity_sample(store, cavity, &hosts, tol)? else {
            continue;
        };
        let mut host: Option<(ShellId, f64)> = None;
        for (j, &outer) in shells.iter().enumerate() {
            if volumes[j] <= 0.0 || host.is_some_and(|(_, hv)| hv <= volumes[j]) {
                continue;
            }
            let position = ClassifyPoint::new(outer, sample)
                .with_tolerance(tol)
                .execute(store)?;
            if position == PointPosition::Inside {
                host = Some((outer, volumes[j]));
            }
        }
        if let Some((outer, _)) = host {
            let data = store.remove_shell(cavity)?;
            let shell = store.shell_mut(outer)?;
            shell.faces.extend(data.faces);
            shell.is_closed &= data.is_closed;
            removed.insert(cavity);
        }
    }
    Ok(shells.into_iter().filter(|s| !removed.contains(s)).collect())
}

/// A point inside a face of `cavity` lying on none of the `hosts`. A cavity
/// may touch its host, so its vertices and some of its faces can sit on the
/// host's boundary.
fn cavity_sample(
    store: &TopologyStore,
    cavity: ShellId,
    hosts: &[ShellId],
    tol: f64,
) -> Result<Option<Point3>> {
    'faces: for &face in &store.shell(cavity)?.faces {
        let Some((_, point)) = store.face_interior_point(face)? else {
            continue;
        };
        for &host in hosts {
            let position = ClassifyPoint::new(host, point)
                .with_tolerance(tol)
                .execute(store)?;
            if position == PointPosition::Border {
                continue 'faces;
            }
        }
        return Ok(Some(point));
    }
    Ok(None)
}

/// Whether two shells share any point, with a point they share.
///
/// Looks for an edge crossing a face first, then for coincident faces,
/// then for one shell enclosing a vertex of the other.
#[instrument(skip(store, options, oracle))]
pub(crate) fn find_witness<O: IntersectionOracle + ?Sized>(
    store: &TopologyStore,
    a: ShellId,
    b: ShellId,
    options: &BooleanOptions,
    oracle: &O,
) -> Result<Option<Point3>> {
    check_input(store, a)?;
    check_input(store, b)?;
    let mut rng = StdRng::seed_from_u64(options.seed);
    for attempt in 1..=options.max_attempts() {
        match witness_once(store, a, b, options, oracle, &mut rng) {
            Err(ShellboolError::Boolean(BooleanError::DegeneratePartition)) => {
                debug!(attempt, "degenerate partition, retrying");
            }
            other => return other,
        }
    }
    Err(BooleanError::RetryBudgetExhausted {
        attempts: options.max_attempts(),
    }
    .into())
}

fn witness_once<O: IntersectionOracle + ?Sized>(
    store: &TopologyStore,
    a: ShellId,
    b: ShellId,
    options: &BooleanOptions,
    oracle: &O,
    rng: &mut StdRng,
) -> Result<Option<Point3>> {
    let mut scratch = Scratch::new(store, a, b, [false, false])?;
    let tol = scratch.precision.search;
    if !store.shell_bounds(a)?.expanded(tol).overlaps(&store.shell_bounds(b)?) {
        return Ok(None);
    }
    let partition = Partition::build(&scratch, rng)?;
    let overlaps = find_overlaps(&scratch, &partition.face_pairs(), oracle)?;
    let mut buckets = merge_shell_vertices(&mut scratch)?;
    let found = find_intersection_vertices(
        &mut scratch,
        &partition.edge_face_pairs(),
        &overlaps,
        &mut buckets,
        oracle,
        &options.tangent_edges,
    )?;
    if let Some(&v) = found.vertices.iter().min() {
        return Ok(Some(scratch.store.vertex(v)?.point));
    }
    if let Some(&(fa, fb)) = overlaps.pairs().next() {
        if let Some(uv) = shared_sample(&scratch.store, fa, fb, tol)? {
            return Ok(Some(scratch.store.face(fa)?.evaluate(&uv)?));
        }
    }
    for (inner, outer) in [(b, a), (a, b)] {
        for v in store.shell_vertices(inner)? {
            let point = store.vertex(v)?.point;
            if ClassifyPoint::new(outer, point).with_tolerance(tol).execute(store)? != PointPosition::Outside {
                return Ok(Some(point));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{MakeBox, MakeCone, MakeCylinder, MakePolygon, MakeSphere};
    use crate::operations::intersect::{AnalyticOracle, EdgeFaceHit, IntersectionCurve, SurfaceMatch};
    use crate::topology::{EdgeId, FaceId, FaceSurface};
    use std::cell::Cell;
    use crate::operations::query::IsValid;
    use crate::math::Vector3;
    use std::f64::consts::PI;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn run_boxes(
        a: (Point3, Point3),
        b: (Point3, Point3),
        mode: Mode,
    ) -> (TopologyStore, Vec<ShellId>) {
        let mut store = TopologyStore::new();
        let sa = MakeBox::new(a.0, a.1).execute(&mut store).unwrap();
        let sb = MakeBox::new(b.0, b.1).execute(&mut store).unwrap();
        let shells = run(&mut store, sa, sb, mode, &BooleanOptions::default(), &AnalyticOracle).unwrap();
        (store, shells)
    }

    fn volume(store: &TopologyStore, shell: ShellId) -> f64 {
        Volume::new(shell).execute(store).unwrap()
    }

    fn unit() -> (Point3, Point3) {
        (p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
    }

    #[test]
    fn offset_cubes() {
        let shifted = (p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        for (mode, expected) in [(Mode::Union, 1.5), (Mode::Intersect, 0.5), (Mode::Subtract, 0.5)] {
            let (store, shells) = run_boxes(unit(), shifted, mode);
            assert_eq!(shells.len(), 1, "{mode:?}");
            let shell = shells[0];
            assert!(store.shell(shell).unwrap().is_closed);
            assert!(IsValid::new(shell).execute(&store), "{mode:?}");
            let v = volume(&store, shell);
            assert!((v - expected).abs() < 1e-6, "{mode:?}: {v}");
            let bounds = store.shell_bounds(shell).unwrap();
            match mode {
                Mode::Subtract => assert!(bounds.max.x < 0.5 + 1e-9),
                Mode::Intersect => assert!(bounds.min.x > 0.5 - 1e-9),
                _ => {}
            }
        }
    }

    #[test]
    fn corner_overlap_is_symmetric() {
        let other = (p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5));
        let (store, ab) = run_boxes(unit(), other, Mode::Intersect);
        let (store2, ba) = run_boxes(other, unit(), Mode::Intersect);
        assert!((volume(&store, ab[0]) - 0.125).abs() < 1e-6);
        assert!((volume(&store2, ba[0]) - 0.125).abs() < 1e-6);
        let (store, u) = run_boxes(unit(), other, Mode::Union);
        assert!((volume(&store, u[0]) - 1.875).abs() < 1e-6);
    }

    #[test]
    fn identical_cubes() {
        let (store, shells) = run_boxes(unit(), unit(), Mode::Intersect);
        assert_eq!(shells.len(), 1);
        assert_eq!(store.shell(shells[0]).unwrap().faces.len(), 6);
        assert!((volume(&store, shells[0]) - 1.0).abs() < 1e-9);

        let (store, shells) = run_boxes(unit(), unit(), Mode::Union);
        assert_eq!(shells.len(), 1);
        assert!((volume(&store, shells[0]) - 1.0).abs() < 1e-9);

        let (_, shells) = run_boxes(unit(), unit(), Mode::Subtract);
        assert!(shells.is_empty());
    }

    #[test]
    fn glued_cubes_union_into_one_shell() {
        let (store, shells) = run_boxes(unit(), (p(1.0, 0.0, 0.0), p(2.0, 1.0, 1.0)), Mode::Union);
        assert_eq!(shells.len(), 1);
        assert_eq!(store.shell(shells[0]).unwrap().faces.len(), 10);
        assert!((volume(&store, shells[0]) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_boxes() {
        let far = (p(3.0, 3.0, 3.0), p(4.0, 4.0, 4.0));
        let (_, shells) = run_boxes(unit(), far, Mode::Intersect);
        assert!(shells.is_empty());
        let (store, shells) = run_boxes(unit(), far, Mode::Union);
        assert_eq!(shells.len(), 2);
        for s in shells {
            assert!((volume(&store, s) - 1.0).abs() < 1e-9);
        }
        let (_, shells) = run_boxes(unit(), far, Mode::Subtract);
        assert_eq!(shells.len(), 1);
    }

    #[test]
    fn sphere_inside_cube() {
        let ball_volume = |store: &TopologyStore, s| volume(store, s);
        let setup = || {
            let mut store = TopologyStore::new();
            let cube = MakeBox::new(p(-2.0, -2.0, -2.0), p(2.0, 2.0, 2.0))
                .execute(&mut store)
                .unwrap();
            let ball = MakeSphere::new(p(0.0, 0.0, 0.0), 1.0).execute(&mut store).unwrap();
            (store, cube, ball)
        };
        let opts = BooleanOptions::default();

        let (mut store, cube, ball) = setup();
        let sphere_v = ball_volume(&store, ball);
        let shells = run(&mut store, cube, ball, Mode::Union, &opts, &AnalyticOracle).unwrap();
        assert_eq!(shells.len(), 1);
        assert_eq!(store.shell(shells[0]).unwrap().faces.len(), 6);
        assert!((volume(&store, shells[0]) - 64.0).abs() < 1e-6);

        let (mut store, cube, ball) = setup();
        let shells = run(&mut store, cube, ball, Mode::Intersect, &opts, &AnalyticOracle).unwrap();
        assert_eq!(shells.len(), 1);
        assert!((volume(&store, shells[0]) - sphere_v).abs() < 1e-6);

        let (mut store, cube, ball) = setup();
        let shells = run(&mut store, cube, ball, Mode::Subtract, &opts, &AnalyticOracle).unwrap();
        assert_eq!(shells.len(), 1);
        let shell = store.shell(shells[0]).unwrap();
        assert!(shell.is_closed);
        assert_eq!(shell.faces.len(), 8);
        assert!((volume(&store, shells[0]) - (64.0 - sphere_v)).abs() < 1e-6);
    }

    #[test]
    fn box_minus_cylinder() {
        let mut store = TopologyStore::new();
        let cube = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let rod = MakeCylinder::new(p(0.5, 0.5, -1.0), 0.3, Vector3::z(), 3.0)
            .execute(&mut store)
            .unwrap();
        let shells = run(&mut store, cube, rod, Mode::Subtract, &BooleanOptions::default(), &AnalyticOracle)
            .unwrap();
        assert_eq!(shells.len(), 1);
        assert!(store.shell(shells[0]).unwrap().is_closed);
        let v = volume(&store, shells[0]);
        assert!((v - (1.0 - 0.09 * PI)).abs() < 5e-3, "{v}");
    }

    #[test]
    fn box_minus_frustum() {
        let mut store = TopologyStore::new();
        let slab = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let plug = MakeCone::new(p(1.0, 1.0, -0.5), 0.6, 0.3, Vector3::z(), 2.0)
            .execute(&mut store)
            .unwrap();
        let shells = run(&mut store, slab, plug, Mode::Subtract, &BooleanOptions::default(), &AnalyticOracle)
            .unwrap();
        assert_eq!(shells.len(), 1);
        assert!(store.shell(shells[0]).unwrap().is_closed);
        // the hole narrows from r = 0.525 at z = 0 to r = 0.375 at z = 1
        let hole = PI / 3.0 * (0.525 * 0.525 + 0.525 * 0.375 + 0.375 * 0.375);
        let v = volume(&store, shells[0]);
        assert!((v - (4.0 - hole)).abs() < 1e-2, "{v}");
    }

    #[test]
    fn tip_of_a_cone() {
        let mut store = TopologyStore::new();
        let cone = MakeCone::new(p(0.0, 0.0, 0.0), 1.0, 0.0, Vector3::z(), 1.0)
            .execute(&mut store)
            .unwrap();
        let lid = MakeBox::new(p(-2.0, -2.0, 0.5), p(2.0, 2.0, 3.0))
            .execute(&mut store)
            .unwrap();
        let shells = run(&mut store, cone, lid, Mode::Intersect, &BooleanOptions::default(), &AnalyticOracle)
            .unwrap();
        assert_eq!(shells.len(), 1);
        assert!(store.shell(shells[0]).unwrap().is_closed);
        let expected = PI / 24.0;
        let v = volume(&store, shells[0]);
        assert!((v - expected).abs() < expected * 0.02, "{v}");
    }

    #[test]
    fn coincident_squares_keep_one_face() {
        let mut store = TopologyStore::new();
        let square = || vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)];
        let a = MakePolygon::new(square()).execute(&mut store).unwrap();
        let b = MakePolygon::new(square()).execute(&mut store).unwrap();
        let opts = BooleanOptions::default().with_allow_open(true);
        let shells = run(&mut store, a, b, Mode::Intersect, &opts, &AnalyticOracle).unwrap();
        assert_eq!(shells.len(), 1);
        let shell = store.shell(shells[0]).unwrap();
        assert_eq!(shell.faces.len(), 1);
        assert!(!shell.is_closed);
    }

    #[test]
    fn failed_runs_leave_the_store_untouched() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let empty = store.add_shell(crate::topology::ShellData::new(vec![], true));
        let before = store.edge_count();
        let err = run(&mut store, a, empty, Mode::Union, &BooleanOptions::default(), &AnalyticOracle);
        assert!(matches!(err, Err(ShellboolError::Operation(OperationError::InvalidInput(_)))));
        assert_eq!(store.edge_count(), before);
    }

    #[test]
    fn witness_points() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let crossing = MakeBox::new(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5)).execute(&mut store).unwrap();
        let inner = MakeBox::new(p(0.25, 0.25, 0.25), p(0.75, 0.75, 0.75)).execute(&mut store).unwrap();
        let far = MakeBox::new(p(5.0, 5.0, 5.0), p(6.0, 6.0, 6.0)).execute(&mut store).unwrap();
        let opts = BooleanOptions::default();

        let w = find_witness(&store, a, crossing, &opts, &AnalyticOracle).unwrap().unwrap();
        assert!(w.coords.iter().all(|c| (0.5 - 1e-9..=1.0 + 1e-9).contains(c)));
        let w = find_witness(&store, a, inner, &opts, &AnalyticOracle).unwrap().unwrap();
        assert!(w.coords.iter().all(|c| (0.25..=0.75).contains(c)));
        assert!(find_witness(&store, a, far, &opts, &AnalyticOracle).unwrap().is_none());
    }

    /// Answers like the analytic oracle, but reports a degenerate partition
    /// from its first `failures` edge queries.
    struct Flaky {
        failures: Cell<usize>,
        raised: Cell<usize>,
    }

    impl Flaky {
        fn new(failures: usize) -> Self {
            Self {
                failures: Cell::new(failures),
                raised: Cell::new(0),
            }
        }
    }

    impl IntersectionOracle for Flaky {
        fn edge_face(
            &self,
            store: &TopologyStore,
            edge: EdgeId,
            face: FaceId,
            tol: f64,
        ) -> Result<Vec<EdgeFaceHit>> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                self.raised.set(self.raised.get() + 1);
                return Err(BooleanError::DegeneratePartition.into());
            }
            AnalyticOracle.edge_face(store, edge, face, tol)
        }

        fn face_face(
            &self,
            store: &TopologyStore,
            a: FaceId,
            b: FaceId,
            seeds: &[Point3],
            tol: f64,
        ) -> Result<Vec<IntersectionCurve>> {
            AnalyticOracle.face_face(store, a, b, seeds, tol)
        }

        fn same_geometry(&self, a: &FaceSurface, b: &FaceSurface, tol: f64) -> Option<SurfaceMatch> {
            AnalyticOracle.same_geometry(a, b, tol)
        }
    }

    #[test]
    fn degenerate_partitions_restart_the_run() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let b = MakeBox::new(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5)).execute(&mut store).unwrap();
        let oracle = Flaky::new(2);
        let shells = run(&mut store, a, b, Mode::Intersect, &BooleanOptions::default(), &oracle).unwrap();
        assert_eq!(oracle.raised.get(), 2);
        assert_eq!(shells.len(), 1);
        assert!((volume(&store, shells[0]) - 0.125).abs() < 1e-6);
    }

    #[test]
    fn retry_budget_runs_out() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let b = MakeBox::new(p(0.5, 0.5, 0.5), p(1.5, 1.5, 1.5)).execute(&mut store).unwrap();
        let before = (store.edge_count(), store.vertex_count());
        let oracle = Flaky::new(usize::MAX);
        let opts = BooleanOptions::default().with_max_attempts(3);
        let err = run(&mut store, a, b, Mode::Union, &opts, &oracle).unwrap_err();
        assert!(matches!(
            err,
            ShellboolError::Boolean(BooleanError::RetryBudgetExhausted { attempts: 3 })
        ));
        assert_eq!(oracle.raised.get(), 3);
        assert_eq!((store.edge_count(), store.vertex_count()), before);
    }

    #[test]
    fn thin_overlap_of_two_boxes() {
        let thin = (p(0.95, 0.0, 0.0), p(2.0, 1.0, 1.0));
        for (mode, expected) in [(Mode::Union, 2.0), (Mode::Intersect, 0.05), (Mode::Subtract, 0.95)] {
            let (store, shells) = run_boxes(unit(), thin, mode);
            assert_eq!(shells.len(), 1, "{mode:?}");
            assert!(store.shell(shells[0]).unwrap().is_closed);
            let v = volume(&store, shells[0]);
            assert!((v - expected).abs() < 1e-6, "{mode:?}: {v}");
        }
    }

    #[test]
    fn crossing_spheres() {
        let setup = || {
            let mut store = TopologyStore::new();
            let a = MakeSphere::new(p(0.0, 0.0, 0.0), 1.0).execute(&mut store).unwrap();
            let b = MakeSphere::new(p(1.0, 0.0, 0.0), 1.0).execute(&mut store).unwrap();
            (store, a, b)
        };
        let lens = 5.0 * PI / 12.0;
        let ball = 4.0 * PI / 3.0;
        for (mode, expected) in [
            (Mode::Intersect, lens),
            (Mode::Union, 2.0 * ball - lens),
            (Mode::Subtract, ball - lens),
        ] {
            let (mut store, a, b) = setup();
            let shells = run(&mut store, a, b, mode, &BooleanOptions::default(), &AnalyticOracle).unwrap();
            assert_eq!(shells.len(), 1, "{mode:?}");
            assert!(store.shell(shells[0]).unwrap().is_closed, "{mode:?}");
            let v = volume(&store, shells[0]);
            assert!((v - expected).abs() < expected * 0.02, "{mode:?}: {v}");
        }
    }

    #[test]
    fn cavity_touching_its_host_is_nested() {
        let mut store = TopologyStore::new();
        let host = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0)).execute(&mut store).unwrap();
        let pocket = MakeBox::new(p(0.0, 0.5, 0.5), p(1.0, 1.5, 1.5)).execute(&mut store).unwrap();
        store.reverse_shell(pocket).unwrap();
        let shells = nest_cavities(&mut store, vec![host, pocket], 1e-6).unwrap();
        assert_eq!(shells, vec![host]);
        assert_eq!(store.shell(host).unwrap().faces.len(), 12);
        assert!(store.shell(pocket).is_err());
    }
}
