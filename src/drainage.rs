//! # Drainage
//!
//! Greedy inventory reduction. A vertex gives up inventory rows one at a
//! time, each time checking that every maximal coface still reaches full
//! rank from the other neighbors' inventories plus what the vertex keeps.
//!
//! Each nonzero row `i` is tried against partners `j = i, i+1, ..`: the
//! row is eliminated, folded into row `j` when `j != i` and simply dropped
//! when `j == i`. The first partner that keeps every coface at full rank
//! is accepted. Otherwise both rows are restored. The result depends on
//! row order and is not a minimum-size inventory.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::gf2::{BitMatrix, Subspace};
use crate::model::VertexId;
use crate::network::Network;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainageOptions {
    /// Most rows to drain from one vertex; 0 means up to the dimension.
    pub max_vectors: usize,
    /// Replace the inventory with the standard basis first when some
    /// coface already misses full rank.
    pub fill: bool,
}

impl DrainageOptions {
    pub fn with_max_vectors(mut self, max_vectors: usize) -> Self {
        self.max_vectors = max_vectors;
        self
    }

    pub fn with_fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }
}

/// Final state of one inventory row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOutcome {
    /// Zero when its turn came.
    Skipped,
    /// Not reached before the budget ran out.
    Untested,
    /// Eliminated. `partner == row` means it was dropped outright.
    Merged { partner: usize },
    /// Every candidate failed; restored.
    Kept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainOutcome {
    pub vertex: VertexId,
    pub drained: usize,
    pub filled: bool,
    pub rows: Vec<RowOutcome>,
    pub inventory_before: usize,
    pub inventory_after: usize,
}

impl DrainOutcome {
    fn untouched(vertex: VertexId, size: usize) -> Self {
        Self {
            vertex,
            drained: 0,
            filled: false,
            rows: vec![RowOutcome::Untested; size],
            inventory_before: size,
            inventory_after: size,
        }
    }
}

/// One sweep over every vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub drained: usize,
    /// Total inventory size after the pass.
    pub inventory_size: usize,
    pub per_vertex: Vec<(VertexId, usize)>,
}

/// `true` when every exclusive span plus the rows of `b` is the whole space.
fn supports_all(exclusives: &[Subspace], b: &BitMatrix) -> Result<bool> {
    for ex in exclusives {
        let mut s = ex.clone();
        for row in b.rows() {
            if s.is_full() {
                break;
            }
            s.insert(row)?;
        }
        if !s.is_full() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Drain vertex `id` in place.
///
/// Needs the maximal faces of a prior proximity build. A vertex without
/// neighbors is left alone.
pub fn drain_vertex(net: &mut Network, id: VertexId, options: &DrainageOptions) -> Result<DrainOutcome> {
    let d = net.dimension().get();
    let vertex = net.vertex(id)?;
    let before = vertex.inventory().len();
    if vertex.neighbors().is_empty() {
        trace!(vertex = %id, "no neighbors; nothing to drain");
        return Ok(DrainOutcome::untouched(id, before));
    }

    let cofaces = net.cofaces(id)?;
    if cofaces.is_empty() {
        return Err(Error::ComplexNotBuilt(format!(
            "vertex {id} has neighbors but no maximal cofaces"
        )));
    }
    let exclusives = cofaces
        .iter()
        .map(|f| f.exclusive_basis(net, &[id]))
        .collect::<Result<Vec<Subspace>>>()?;

    let mut b = vertex.inventory_matrix();
    let mut filled = false;
    if options.fill && !supports_all(&exclusives, &b)? {
        warn!(vertex = %id, "coface lacks full rank; filling with the standard basis");
        b = BitMatrix::identity(d);
        filled = true;
    }

    let budget = if options.max_vectors == 0 { d } else { options.max_vectors };
    let n = b.nrows();
    let mut rows = vec![RowOutcome::Untested; n];
    let mut drained = 0;

    for i in 0..n {
        if drained >= budget {
            break;
        }
        if b.row(i).is_zero() {
            rows[i] = RowOutcome::Skipped;
            continue;
        }
        let saved_i = b.row(i).clone();
        rows[i] = RowOutcome::Kept;
        for j in i..n {
            if j != i && b.row(j).is_zero() {
                continue;
            }
            let saved_j = b.row(j).clone();
            if j != i {
                b.row_add(i, j);
            }
            b.clear_row(i);

            if supports_all(&exclusives, &b)? {
                trace!(vertex = %id, row = i, partner = j, "row drained");
                rows[i] = RowOutcome::Merged { partner: j };
                drained += 1;
                break;
            }
            b.set_row(i, saved_i.clone())?;
            b.set_row(j, saved_j)?;
        }
        if rows[i] == RowOutcome::Kept {
            trace!(vertex = %id, row = i, "row kept");
        }
    }

    net.set_inventory(id, &b)?;
    let after = net.vertex(id)?.inventory().len();
    debug!(vertex = %id, drained, filled, before, after, "vertex drained");
    Ok(DrainOutcome {
        vertex: id,
        drained,
        filled,
        rows,
        inventory_before: before,
        inventory_after: after,
    })
}

/// Drain every vertex once, in id order.
pub fn drain_pass(net: &mut Network, options: &DrainageOptions) -> Result<PassReport> {
    let mut per_vertex = Vec::with_capacity(net.len());
    let mut drained = 0;
    for id in net.vertex_ids() {
        let outcome = drain_vertex(net, id, options)?;
        drained += outcome.drained;
        per_vertex.push((id, outcome.drained));
    }
    let inventory_size = net.total_inventory_size();
    info!(drained, inventory_size, "drainage pass complete");
    Ok(PassReport { drained, inventory_size, per_vertex })
}

/// Repeat passes until one drains nothing, or `max_passes` passes have
/// run (0 means no limit). Returns one report per pass.
pub fn drain_until_stable(
    net: &mut Network,
    options: &DrainageOptions,
    max_passes: usize,
) -> Result<Vec<PassReport>> {
    let mut reports = Vec::new();
    loop {
        let report = drain_pass(net, options)?;
        let done = report.drained == 0;
        reports.push(report);
        if done || (max_passes != 0 && reports.len() >= max_passes) {
            break;
        }
    }
    info!(passes = reports.len(), inventory_size = net.total_inventory_size(), "drainage stable");
    Ok(reports)
}
