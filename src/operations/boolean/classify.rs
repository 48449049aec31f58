//! Deciding which side of the other shell each piece lies on, and which
//! pieces the requested operation keeps.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::error::Result;
use crate::math::polygon_2d::interior_point;
use crate::math::Point3;
use crate::operations::query::ClassifyPoint;
use crate::topology::{EdgeId, PointPosition};

use super::overlap::{Orientation, Overlaps};
use super::scratch::{Scratch, Side};
use super::trim::Piece;
use super::vertex_finder::Intersections;

/// Position of a piece relative to the other shell, taking that shell's
/// orientation into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PieceClass {
    Inside,
    Outside,
    /// On a coincident face of the other shell facing the same way.
    OnSame,
    /// On a coincident face of the other shell facing the other way.
    OnOpposite,
    /// Too thin to sample.
    Degenerate,
}

/// Which pieces an operation keeps, all of them reduced to an
/// intersection of the (possibly reversed) scratch shells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selection {
    /// Pieces of both shells inside the other.
    Both,
    /// Pieces of shell A inside shell B only.
    FirstOnly,
}

impl Selection {
    #[allow(clippy::match_same_arms)]
    pub fn keeps(self, side: Side, class: PieceClass) -> bool {
        match (self, side, class) {
            (Selection::FirstOnly, Side::B, _) => false,
            (_, _, PieceClass::Inside) => true,
            (_, Side::A, PieceClass::OnSame) => true,
            _ => false,
        }
    }
}

/// Classifies every piece.
///
/// Untouched faces connected through edges that never met the other shell
/// lie on the same side of it, so only one face per such group is ray cast.
/// Cut pieces and coincident faces are classified one by one.
pub(crate) fn classify_pieces(
    scratch: &Scratch,
    pieces: &[Piece],
    overlaps: &Overlaps,
    found: &Intersections,
) -> Result<Vec<PieceClass>> {
    let mut classes: Vec<Option<PieceClass>> = vec![None; pieces.len()];

    let propagates = |p: &Piece| !p.trimmed && !overlaps.has_any(p.face);
    let mut by_edge: HashMap<EdgeId, Vec<usize>> = HashMap::new();
    for (i, piece) in pieces.iter().enumerate() {
        if !propagates(piece) {
            continue;
        }
        for oe in piece.edges() {
            let e = scratch.store.edge(oe.edge)?;
            if !found.vertices.contains(&e.start) && !found.vertices.contains(&e.end) {
                by_edge.entry(oe.edge).or_default().push(i);
            }
        }
    }

    let mut groups = 0usize;
    for start in 0..pieces.len() {
        if classes[start].is_some() {
            continue;
        }
        let class = classify_piece(scratch, &pieces[start], overlaps)?;
        classes[start] = Some(class);
        if !propagates(&pieces[start]) {
            continue;
        }
        groups += 1;
        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::from([start]);
        while let Some(i) = queue.pop_front() {
            for oe in pieces[i].edges() {
                for &j in by_edge.get(&oe.edge).map_or(&[][..], Vec::as_slice) {
                    if seen.insert(j) && pieces[j].side == pieces[start].side {
                        classes[j] = Some(class);
                        queue.push_back(j);
                    }
                }
            }
        }
    }
    debug!(pieces = pieces.len(), groups, "pieces classified");
    Ok(classes
        .into_iter()
        .map(|c| c.unwrap_or(PieceClass::Degenerate))
        .collect())
}

fn classify_piece(scratch: &Scratch, piece: &Piece, overlaps: &Overlaps) -> Result<PieceClass> {
    let store = &scratch.store;
    let tol = scratch.precision.search;
    let mut polygons = piece
        .loops
        .iter()
        .map(|l| store.loop_polygon(piece.face, l))
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    let Some(outer) = polygons.next() else {
        return Ok(PieceClass::Degenerate);
    };
    let holes: Vec<_> = polygons.collect();
    let Some(uv) = interior_point(&outer, &holes) else {
        return Ok(PieceClass::Degenerate);
    };
    let face = store.face(piece.face)?;
    let point = face.evaluate(&uv)?;

    let other = piece.side.other();
    let shell = scratch.shell(other);
    let locate = |p: Point3| {
        ClassifyPoint::new(shell, p)
            .with_tolerance(tol)
            .execute(&scratch.reference)
    };
    let position = match locate(point)? {
        PointPosition::Border => {
            for &(partner, orientation) in overlaps.partners(piece.face) {
                if scratch.reference.locate_on_face(partner, &point, tol)?.1 != PointPosition::Outside {
                    return Ok(match orientation {
                        Orientation::Same => PieceClass::OnSame,
                        Orientation::Opposite => PieceClass::OnOpposite,
                    });
                }
            }
            let nudged = point - face.normal_at(&uv)?.normalize() * (4.0 * tol);
            match locate(nudged)? {
                PointPosition::Border => {
                    warn!("piece stays on the other shell after nudging, taken as outside");
                    PointPosition::Outside
                }
                other => other,
            }
        }
        other => other,
    };
    let inside = (position == PointPosition::Inside) != scratch.reversed[other.index()];
    Ok(if inside {
        PieceClass::Inside
    } else {
        PieceClass::Outside
    })
}
