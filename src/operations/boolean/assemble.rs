//! Sewing the selected pieces into output shells.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::geometry::pcurve::Pcurve;
use crate::math::Point3;
use crate::topology::{
    EdgeData, EdgeId, FaceData, FaceId, OrientedEdge, ShellData, ShellId, TopologyStore,
    VertexData, VertexId, WireData,
};

use super::merge::VertexBuckets;
use super::scratch::Scratch;
use super::trim::Piece;

/// One oriented use of a scratch edge by a selected piece.
struct Traversal {
    piece: usize,
    edge: EdgeId,
    forward: bool,
    /// Deduplicated start and end, in traversal order.
    from: VertexId,
    to: VertexId,
    mid: Point3,
    pole: bool,
}

/// The output edge a traversal maps to and the direction it runs it.
#[derive(Clone, Copy)]
struct Binding {
    slot: usize,
    forward: bool,
}

/// Builds the output shells in `out`, one per connected group of pieces.
///
/// Edges shared by two pieces are matched up, first by identity in the
/// scratch store, then by position for coincident edges coming from the
/// two inputs. A group with unmatched edges is open and kept only when
/// `allow_open` is set.
#[instrument(skip_all, fields(pieces = pieces.len()))]
pub(crate) fn assemble(
    scratch: &Scratch,
    pieces: &[&Piece],
    out: &mut TopologyStore,
    allow_open: bool,
    reverse: bool,
) -> Result<Vec<ShellId>> {
    let tol = scratch.precision.search;
    let store = &scratch.store;

    // positions are deduplicated into a throwaway store first, so that
    // rejected groups leave nothing behind in `out`
    let mut points = TopologyStore::new();
    let mut buckets = VertexBuckets::new(tol);
    let mut dedup: HashMap<VertexId, VertexId> = HashMap::new();
    let mut unique = |v: VertexId, points: &mut TopologyStore| -> Result<VertexId> {
        if let Some(u) = dedup.get(&v) {
            return Ok(*u);
        }
        let u = buckets.find_or_create(points, store.vertex(v)?.point);
        dedup.insert(v, u);
        Ok(u)
    };

    let mut travs = Vec::new();
    let mut ends: HashMap<EdgeId, (VertexId, VertexId)> = HashMap::new();
    for (pi, piece) in pieces.iter().enumerate() {
        for oe in piece.edges() {
            let data = store.edge(oe.edge)?;
            let s = unique(data.start, &mut points)?;
            let e = unique(data.end, &mut points)?;
            ends.insert(oe.edge, (s, e));
            let (from, to) = if oe.forward { (s, e) } else { (e, s) };
            travs.push(Traversal {
                piece: pi,
                edge: oe.edge,
                forward: oe.forward,
                from,
                to,
                mid: data.midpoint(),
                pole: data.is_pole(),
            });
        }
    }

    let partner = match_traversals(&travs, tol);
    let mut parent: Vec<usize> = (0..pieces.len()).collect();
    for (i, p) in partner.iter().enumerate() {
        if let Some(j) = p {
            let (a, b) = (root(&mut parent, travs[i].piece), root(&mut parent, travs[*j].piece));
            parent[a] = b;
        }
    }
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for pi in 0..pieces.len() {
        let r = root(&mut parent, pi);
        match groups.iter_mut().find(|(g, _)| *g == r) {
            Some((_, list)) => list.push(pi),
            None => groups.push((r, vec![pi])),
        }
    }

    let mut by_piece: Vec<Vec<usize>> = vec![Vec::new(); pieces.len()];
    for (i, t) in travs.iter().enumerate() {
        by_piece[t.piece].push(i);
    }

    let mut shells = Vec::new();
    let mut real: HashMap<VertexId, VertexId> = HashMap::new();
    for (_, members) in groups {
        let open = members
            .iter()
            .flat_map(|&pi| &by_piece[pi])
            .filter(|&&i| !travs[i].pole && partner[i].is_none())
            .count();
        if open > 0 && !allow_open {
            warn!(faces = members.len(), open, "open result shell discarded");
            continue;
        }

        // one output edge per matched pair, unmatched edge, or pole use
        let mut bindings: HashMap<usize, Binding> = HashMap::new();
        let mut edges: Vec<EdgeId> = Vec::new();
        for &pi in &members {
            for &i in &by_piece[pi] {
                if bindings.contains_key(&i) {
                    continue;
                }
                let t = &travs[i];
                let data = store.edge(t.edge)?;
                let (s, e) = ends[&t.edge];
                let s = materialize(s, &points, &mut real, out)?;
                let e = materialize(e, &points, &mut real, out)?;
                let edge = out.add_edge(EdgeData::new(s, e, data.curve.clone(), data.t_start, data.t_end));
                let slot = edges.len();
                edges.push(edge);
                bindings.insert(i, Binding { slot, forward: t.forward });
                if let Some(j) = partner[i].filter(|_| !t.pole) {
                    bindings.insert(j, Binding { slot, forward: !t.forward });
                }
            }
        }

        let mut faces = Vec::with_capacity(members.len());
        for &pi in &members {
            let piece = pieces[pi];
            let source = store.face(piece.face)?;
            let mut cursor = by_piece[pi].iter();
            let mut wires = Vec::with_capacity(piece.loops.len());
            let mut pcurves: Vec<(EdgeId, Pcurve)> = Vec::new();
            for l in &piece.loops {
                let mut oriented = Vec::with_capacity(l.len());
                for _ in l {
                    let Some(&i) = cursor.next() else {
                        continue;
                    };
                    let b = bindings[&i];
                    let edge = edges[b.slot];
                    oriented.push(OrientedEdge::new(edge, b.forward));
                    let pcurve = source_pcurve(store, piece.face, travs[i].edge)?;
                    let aligned = travs[i].forward == b.forward;
                    pcurves.push((edge, if aligned { pcurve } else { pcurve.reversed() }));
                }
                wires.push(out.add_wire(WireData::closed(oriented)));
            }
            let Some((&outer, inner)) = wires.split_first() else {
                continue;
            };
            let mut data = FaceData::new(source.surface.clone(), outer, inner.to_vec(), source.same_sense);
            data.attributes = source.attributes.clone();
            let face = out.add_face(data);
            for (edge, pcurve) in pcurves {
                out.set_pcurve(edge, face, pcurve)?;
            }
            faces.push(face);
        }

        let shell = out.add_shell(ShellData::new(faces, open == 0));
        if reverse {
            out.reverse_shell(shell)?;
        }
        shells.push(shell);
    }
    debug!(shells = shells.len(), "assembled");
    Ok(shells)
}

/// For every traversal, the index of the traversal running the same edge
/// the other way, if any.
fn match_traversals(travs: &[Traversal], tol: f64) -> Vec<Option<usize>> {
    let mut partner = vec![None; travs.len()];

    let mut by_edge: HashMap<EdgeId, Vec<usize>> = HashMap::new();
    for (i, t) in travs.iter().enumerate() {
        if !t.pole {
            by_edge.entry(t.edge).or_default().push(i);
        }
    }
    for list in by_edge.values() {
        for (k, &i) in list.iter().enumerate() {
            if partner[i].is_some() {
                continue;
            }
            if let Some(&j) = list[k + 1..]
                .iter()
                .find(|&&j| partner[j].is_none() && travs[j].forward != travs[i].forward)
            {
                partner[i] = Some(j);
                partner[j] = Some(i);
            }
        }
    }

    let mut by_ends: HashMap<(VertexId, VertexId), Vec<usize>> = HashMap::new();
    for (i, t) in travs.iter().enumerate() {
        if !t.pole && partner[i].is_none() {
            by_ends.entry(unordered(t.from, t.to)).or_default().push(i);
        }
    }
    for list in by_ends.values() {
        for (k, &i) in list.iter().enumerate() {
            if partner[i].is_some() {
                continue;
            }
            let t = &travs[i];
            let found = list[k + 1..].iter().copied().find(|&j| {
                let o = &travs[j];
                partner[j].is_none()
                    && (o.from == t.to && o.to == t.from)
                    && (o.mid - t.mid).norm() < tol
            });
            if let Some(j) = found {
                partner[i] = Some(j);
                partner[j] = Some(i);
            }
        }
    }
    partner
}

fn unordered(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn materialize(
    v: VertexId,
    points: &TopologyStore,
    real: &mut HashMap<VertexId, VertexId>,
    out: &mut TopologyStore,
) -> Result<VertexId> {
    if let Some(r) = real.get(&v) {
        return Ok(*r);
    }
    let r = out.add_vertex(VertexData::new(points.vertex(v)?.point));
    real.insert(v, r);
    Ok(r)
}

/// The piece face's curve for `edge`, projected if the scratch store has
/// none recorded.
fn source_pcurve(store: &TopologyStore, face: FaceId, edge: EdgeId) -> Result<Pcurve> {
    let data = store.edge(edge)?;
    if let Some(p) = data.pcurve_for(face) {
        return Ok(p.clone());
    }
    let anchor = store.face_u_anchor(face)?;
    store.pcurve_on_face(face, &data.curve, data.t_start, data.t_end, anchor)
}
