//! Cutting edges at the intersection vertices found on them.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::topology::{EdgeData, EdgeId, VertexId};

use super::scratch::Scratch;

/// Relative parameter gap below which two cut points are the same.
const PARAM_GAP: f64 = 1e-9;

/// Replaces every scheduled edge by its ordered pieces on all faces using
/// it. The original edge is removed from the store, so it can no longer be
/// reached from its vertices.
pub(crate) fn split_edges(
    scratch: &mut Scratch,
    splits: &BTreeMap<EdgeId, Vec<(f64, VertexId)>>,
) -> Result<usize> {
    let mut count = 0;
    for (&edge, cuts) in splits {
        let data = scratch.store.edge(edge)?.clone();
        let chain = cut_chain(&data, cuts);
        if chain.len() < 3 {
            continue;
        }
        let side = scratch.edge_side(edge);

        let mut anchors = Vec::with_capacity(data.uses.len());
        for u in &data.uses {
            anchors.push((u.face, scratch.store.face_u_anchor(u.face)?));
        }

        let mut parts = Vec::with_capacity(chain.len() - 1);
        for w in chain.windows(2) {
            let ((ta, va), (tb, vb)) = (w[0], w[1]);
            let part = scratch
                .store
                .add_edge(EdgeData::new(va, vb, data.curve.clone(), ta, tb));
            if let Some(side) = side {
                scratch.adopt_edge(part, side);
            }
            for &(face, anchor) in &anchors {
                let pcurve = scratch
                    .store
                    .pcurve_on_face(face, &data.curve, ta, tb, anchor)?;
                scratch.store.set_pcurve(part, face, pcurve)?;
            }
            parts.push(part);
        }
        for &(face, _) in &anchors {
            scratch.store.replace_edge(face, edge, &parts)?;
        }
        scratch.store.remove_edge(edge)?;
        count += 1;
    }
    debug!(edges = count, "split edges");
    Ok(count)
}

/// Start vertex, sorted interior cuts, end vertex. Cuts at the ends or
/// repeating a previous cut are dropped.
fn cut_chain(data: &EdgeData, cuts: &[(f64, VertexId)]) -> Vec<(f64, VertexId)> {
    let span = (data.t_end - data.t_start).abs();
    let gap = PARAM_GAP * span.max(1.0);
    let mut sorted: Vec<(f64, VertexId)> = cuts
        .iter()
        .copied()
        .filter(|(t, v)| {
            *v != data.start
                && *v != data.end
                && *t > data.t_start + gap
                && *t < data.t_end - gap
        })
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut chain = vec![(data.t_start, data.start)];
    for (t, v) in sorted {
        let (last_t, last_v) = chain[chain.len() - 1];
        if v == last_v || t - last_t < gap || chain.iter().any(|(_, u)| *u == v) {
            continue;
        }
        chain.push((t, v));
    }
    chain.push((data.t_end, data.end));
    chain
}
