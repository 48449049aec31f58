//! Rebuilding the loops of every cut face.
//!
//! The original boundary of a face is walked in its own direction only,
//! cuts in both directions. Leaving every vertex by the sharpest clockwise
//! turn traces each region of the subdivided face exactly once with the
//! region on its left, so counter-clockwise loops are outlines and
//! clockwise loops are holes. A vertex offering the walk more than one cut
//! besides the way back has no single continuation and fails the face.

use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

use tracing::{debug, instrument, warn};

use crate::error::{BooleanError, Result};
use crate::math::polygon_2d::{bounds, point_in_polygon, signed_area};
use crate::math::{Point2, Vector2};
use crate::topology::{
    EdgeCurve, EdgeData, FaceId, OrientedEdge, TopologyStore, VertexId,
};

use super::new_edges::{Cut, Cuts};
use super::scratch::{Scratch, Side};

/// Angles closer than this leave a vertex along the same direction.
const ANGLE_TIE: f64 = 1e-9;

/// A face region to be emitted: its source face and its loops, outline
/// first.
#[derive(Debug, Clone)]
pub(crate) struct Piece {
    pub face: FaceId,
    pub side: Side,
    pub loops: Vec<Vec<OrientedEdge>>,
    pub trimmed: bool,
}

impl Piece {
    pub fn edges(&self) -> impl Iterator<Item = OrientedEdge> + '_ {
        self.loops.iter().flatten().copied()
    }
}

/// Outcome of tracing from one half-edge.
enum Walk {
    Closed(Vec<usize>),
    DeadEnd,
}

struct HalfEdge {
    oe: OrientedEdge,
    from: VertexId,
    to: VertexId,
    points: Vec<Point2>,
    cut: bool,
}

impl HalfEdge {
    fn start(&self) -> Point2 {
        self.points[0]
    }

    fn end(&self) -> Point2 {
        self.points[self.points.len() - 1]
    }

    fn out_direction(&self, eps: f64) -> Vector2 {
        let p0 = self.start();
        self.points
            .iter()
            .skip(1)
            .map(|p| p - p0)
            .find(|d| d.norm() > eps)
            .unwrap_or_else(Vector2::zeros)
    }

    fn in_direction(&self, eps: f64) -> Vector2 {
        let p1 = self.end();
        self.points
            .iter()
            .rev()
            .skip(1)
            .map(|p| p1 - p)
            .find(|d| d.norm() > eps)
            .unwrap_or_else(Vector2::zeros)
    }
}

/// Half-edges of one face plus the adjacency used to walk them.
struct Arrangement<'a> {
    store: &'a TopologyStore,
    face: FaceId,
    halves: Vec<HalfEdge>,
    outgoing: HashMap<VertexId, Vec<usize>>,
    poles: HashSet<VertexId>,
    eps: f64,
}

impl<'a> Arrangement<'a> {
    fn new(store: &'a TopologyStore, face: FaceId, cuts: &[Cut]) -> Result<Self> {
        let (outer, _) = store.face_polygons(face)?;
        let (min, max) = bounds(&outer);
        let eps = 1e-7 * (max - min).norm().max(1.0);
        let mut arrangement = Self {
            store,
            face,
            halves: Vec::new(),
            outgoing: HashMap::new(),
            poles: HashSet::new(),
            eps,
        };
        for l in store.face_loops(face)? {
            for oe in l {
                let data = store.edge(oe.edge)?;
                if data.is_pole() {
                    arrangement.poles.insert(data.start);
                }
                arrangement.push(oe, false)?;
            }
        }
        for c in cuts {
            arrangement.push(OrientedEdge::new(c.edge, true), true)?;
            arrangement.push(OrientedEdge::new(c.edge, false), true)?;
        }
        Ok(arrangement)
    }

    fn push(&mut self, oe: OrientedEdge, cut: bool) -> Result<()> {
        let data = self.store.edge(oe.edge)?;
        let Some(pcurve) = data.pcurve_for(self.face) else {
            return Err(BooleanError::Inconsistent("edge has no curve on its face".into()).into());
        };
        let mut points = pcurve.points().to_vec();
        let (from, to) = if oe.forward {
            (data.start, data.end)
        } else {
            points.reverse();
            (data.end, data.start)
        };
        self.outgoing.entry(from).or_default().push(self.halves.len());
        self.halves.push(HalfEdge {
            oe,
            from,
            to,
            points,
            cut,
        });
        Ok(())
    }

    /// Whether half-edge `b` continues where `a` ends. Away from poles the
    /// shared vertex is enough; at a pole the parameter points must agree
    /// too, since the pole is a whole segment in parameter space.
    fn continues(&self, a: usize, b: usize) -> bool {
        let (ha, hb) = (&self.halves[a], &self.halves[b]);
        ha.to == hb.from && (!self.poles.contains(&ha.to) || (ha.end() - hb.start()).norm() < self.eps)
    }

    fn is_twin(&self, a: usize, b: usize) -> bool {
        self.halves[a].oe == self.halves[b].oe.flipped()
    }

    fn next(&self, current: usize) -> Result<Option<usize>> {
        let h = &self.halves[current];
        let back = -h.in_direction(self.eps);
        let candidates: Vec<usize> = self
            .outgoing
            .get(&h.to)
            .map(|list| {
                list.iter()
                    .copied()
                    .filter(|c| self.continues(current, *c))
                    .collect()
            })
            .unwrap_or_default();
        let rivals = candidates
            .iter()
            .filter(|c| self.halves[**c].cut && !self.is_twin(current, **c))
            .count();

        let mut best: Option<(f64, usize)> = None;
        let mut tied = false;
        for c in candidates {
            let d = self.halves[c].out_direction(self.eps);
            let ccw = (back.x * d.y - back.y * d.x).atan2(back.dot(&d));
            let mut cw = (-ccw).rem_euclid(TAU);
            if cw < ANGLE_TIE || self.is_twin(current, c) {
                cw = TAU;
            }
            match best {
                Some((b, _)) if (cw - b).abs() < ANGLE_TIE => tied = true,
                Some((b, _)) if cw > b => {}
                _ => {
                    best = Some((cw, c));
                    tied = false;
                }
            }
        }
        if tied || rivals > 1 {
            let p = self.store.vertex(h.to)?.point;
            return Err(BooleanError::AmbiguousLoop {
                x: p.x,
                y: p.y,
                z: p.z,
            }
            .into());
        }
        Ok(best.map(|(_, c)| c))
    }

    fn walk(&self, start: usize, used: &mut [bool]) -> Result<Walk> {
        let mut path = vec![start];
        used[start] = true;
        let mut current = start;
        loop {
            let Some(next) = self.next(current)? else {
                return Ok(Walk::DeadEnd);
            };
            if next == start {
                return Ok(Walk::Closed(path));
            }
            if used[next] || path.len() > self.halves.len() {
                return Ok(Walk::DeadEnd);
            }
            used[next] = true;
            path.push(next);
            current = next;
        }
    }

    /// Drops half-edges immediately followed by their twin: a cut hanging
    /// into a region is walked out and back.
    fn remove_spikes(&self, path: &mut Vec<usize>) {
        let mut changed = true;
        while changed && path.len() >= 2 {
            changed = false;
            for i in 0..path.len() {
                let j = (i + 1) % path.len();
                if self.is_twin(path[i], path[j]) {
                    let (hi, lo) = if i > j { (i, j) } else { (j, i) };
                    path.remove(hi);
                    path.remove(lo);
                    changed = true;
                    break;
                }
            }
        }
    }

    /// Splits a closed walk touching itself into simple loops.
    fn split_simple(&self, path: &[usize]) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = Vec::new();
        for &h in path {
            stack.push(h);
            if let Some(pos) = (0..stack.len()).find(|&i| self.continues(h, stack[i])) {
                out.push(stack.split_off(pos));
            }
        }
        if !stack.is_empty() {
            out.push(stack);
        }
        out
    }

    fn loops(&self) -> Result<Vec<Vec<OrientedEdge>>> {
        let mut used = vec![false; self.halves.len()];
        let mut out = Vec::new();
        for start in 0..self.halves.len() {
            if used[start] {
                continue;
            }
            match self.walk(start, &mut used)? {
                Walk::Closed(mut path) => {
                    self.remove_spikes(&mut path);
                    for simple in self.split_simple(&path) {
                        out.push(simple.into_iter().map(|h| self.halves[h].oe).collect());
                    }
                }
                Walk::DeadEnd => debug!("open walk dropped"),
            }
        }
        Ok(out)
    }
}

/// Produces the pieces of every face of both shells: untouched faces as
/// they are, cut faces rebuilt from their boundary and cuts.
#[instrument(skip_all)]
pub(crate) fn trim_faces(scratch: &mut Scratch, cuts: &Cuts) -> Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    for side in [Side::A, Side::B] {
        for face in scratch.faces_of(side)? {
            let list = cuts.on(face);
            if list.is_empty() {
                pieces.push(Piece {
                    face,
                    side,
                    loops: scratch.store.face_loops(face)?,
                    trimmed: false,
                });
                continue;
            }
            split_poles(scratch, face, side, list)?;
            let before = pieces.len();
            for loops in trim_face(&scratch.store, face, list)? {
                pieces.push(Piece {
                    face,
                    side,
                    loops,
                    trimmed: true,
                });
            }
            debug!(pieces = pieces.len() - before, "face trimmed");
        }
    }
    Ok(pieces)
}

/// Loops of the regions a face is cut into, each outline followed by its
/// holes.
fn trim_face(store: &TopologyStore, face: FaceId, cuts: &[Cut]) -> Result<Vec<Vec<Vec<OrientedEdge>>>> {
    let arrangement = Arrangement::new(store, face, cuts)?;
    let eps = arrangement.eps;

    let mut outlines: Vec<(Vec<OrientedEdge>, Vec<Point2>, f64)> = Vec::new();
    let mut holes: Vec<(Vec<OrientedEdge>, Vec<Point2>)> = Vec::new();
    for l in arrangement.loops()? {
        let polygon = store.loop_polygon(face, &l)?;
        let area = signed_area(&polygon);
        if area > eps * eps {
            outlines.push((l, polygon, area));
        } else if area < -eps * eps {
            holes.push((l, polygon));
        }
    }

    let mut assigned: Vec<Vec<usize>> = vec![Vec::new(); outlines.len()];
    for (i, (_, polygon)) in holes.iter().enumerate() {
        let Some(inside) = left_point(polygon, eps * 10.0) else {
            continue;
        };
        let owner = outlines
            .iter()
            .enumerate()
            .filter(|(_, (_, outline, _))| point_in_polygon(&inside, outline))
            .min_by(|a, b| a.1 .2.total_cmp(&b.1 .2))
            .map(|(j, _)| j);
        match owner {
            Some(j) => assigned[j].push(i),
            None => warn!("hole without an enclosing outline dropped"),
        }
    }

    let mut out = Vec::with_capacity(outlines.len());
    for (j, (outline, _, _)) in outlines.into_iter().enumerate() {
        let mut loops = vec![outline];
        for &i in &assigned[j] {
            let inside = left_point(&holes[i].1, eps * 10.0);
            let nested = assigned[j].iter().any(|&k| {
                k != i && inside.is_some_and(|p| point_in_polygon(&p, &holes[k].1))
            });
            if nested {
                debug!("hole inside another hole skipped");
                continue;
            }
            loops.push(holes[i].0.clone());
        }
        out.push(loops);
    }
    Ok(out)
}

/// A point just left of the first usable segment of a loop, inside the
/// region the loop bounds.
fn left_point(polygon: &[Point2], offset: f64) -> Option<Point2> {
    let n = polygon.len();
    (0..n).find_map(|i| {
        let (a, b) = (polygon[i], polygon[(i + 1) % n]);
        let d = b - a;
        let len = d.norm();
        (len > offset).then(|| nalgebra::center(&a, &b) + Vector2::new(-d.y, d.x) * (offset / len))
    })
}

/// Cuts ending at a pole split the pole edge at their parameter, so each
/// region gets only its own stretch of the pole.
fn split_poles(scratch: &mut Scratch, face: FaceId, side: Side, cuts: &[Cut]) -> Result<()> {
    let eps = 1e-9;
    for e in scratch.store.face_edges(face)? {
        let data = scratch.store.edge(e)?;
        let EdgeCurve::Pole(point) = data.curve else {
            continue;
        };
        let pole = data.start;
        let Some(pcurve) = data.pcurve_for(face) else {
            continue;
        };
        let (a, b) = (pcurve.start(), pcurve.end());
        let shared = data.uses.len() > 1;
        let (lo, hi) = (a.x.min(b.x), a.x.max(b.x));

        let mut us = Vec::new();
        for c in cuts {
            let cut = scratch.store.edge(c.edge)?;
            let Some(pc) = cut.pcurve_for(face) else {
                continue;
            };
            for (v, uv) in [(cut.start, pc.start()), (cut.end, pc.end())] {
                if v == pole && uv.x > lo + eps && uv.x < hi - eps {
                    us.push(uv.x);
                }
            }
        }
        if us.is_empty() || shared {
            continue;
        }
        us.sort_by(f64::total_cmp);
        us.dedup_by(|x, y| (*x - *y).abs() < eps);
        if b.x < a.x {
            us.reverse();
        }

        let stops: Vec<f64> = std::iter::once(a.x)
            .chain(us)
            .chain(std::iter::once(b.x))
            .collect();
        let mut parts = Vec::with_capacity(stops.len() - 1);
        for w in stops.windows(2) {
            let part = scratch
                .store
                .add_edge(EdgeData::new(pole, pole, EdgeCurve::Pole(point), 0.0, 1.0));
            scratch.store.set_pcurve(
                part,
                face,
                crate::geometry::pcurve::Pcurve::segment(Point2::new(w[0], a.y), Point2::new(w[1], a.y)),
            )?;
            scratch.adopt_edge(part, side);
            parts.push(part);
        }
        scratch.store.replace_edge(face, e, &parts)?;
        scratch.store.remove_edge(e)?;
    }
    Ok(())
}
