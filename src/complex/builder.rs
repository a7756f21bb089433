//! Coverage-complex construction.
//!
//! Faces of dimension 0 through 3 are enumerated from the network's
//! above-sets, so each vertex set is visited once, in increasing id
//! order. For every face the common neighborhood (the intersection of the
//! members' neighbor sets) is maintained incrementally during the descent.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Complex, FilteredComplex, Filtration};
use crate::gf2::{BitMatrix, Subspace};
use crate::model::{FaceId, FaceKey, VertexId, VertexSource};
use crate::network::Network;
use crate::Result;

/// Decide whether `target` lies in the span of the inventories over
/// `vertices ∪ neighbors`.
///
/// With `r1` the rank of that combined span and `r2` the rank after
/// appending the rows of `target`, the face is covered iff `r1 == r2`.
/// Only the row space of `target` matters.
pub fn is_covered<S: VertexSource + ?Sized>(
    source: &S,
    target: &BitMatrix,
    vertices: &[VertexId],
    neighbors: &HashSet<VertexId>,
) -> Result<bool> {
    let dimension = source.dimension();
    dimension.check(target.ncols(), "coverage target")?;
    let mut span = Subspace::zero(dimension.get());
    for &id in vertices.iter().chain(neighbors.iter()) {
        if span.is_full() {
            break;
        }
        for v in source.vertex(id)?.inventory() {
            span.insert(v)?;
        }
    }
    let r1 = span.rank();
    for u in target.rows() {
        if span.insert(u)? {
            return Ok(false);
        }
    }
    debug_assert_eq!(span.rank(), r1);
    Ok(true)
}

/// Everything one enumeration pass produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplexBundle {
    pub proximity: Complex,
    pub coverage: Complex,
    pub filtered: FilteredComplex,
    /// Maximal faces registered in the network, in discovery order.
    pub maximal: Vec<FaceId>,
}

/// Builder for the proximity, coverage and filtered complexes.
///
/// With `exclude_coverage_chords` set, covered 1-faces are kept out of
/// the coverage complex and sit at [`Filtration::ProximityOnly`] in the
/// filtered stream. They come back only as edges of covered 2- and
/// 3-faces when the complexes are closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageBuilder {
    pub exclude_coverage_chords: bool,
}

struct Survey {
    proximity: Complex,
    coverage: Complex,
    filtered: FilteredComplex,
    maximal: Vec<FaceKey>,
}

impl CoverageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclude_coverage_chords(mut self, exclude: bool) -> Self {
        self.exclude_coverage_chords = exclude;
        self
    }

    /// Proximity complex of the network. Re-records the network's maximal
    /// faces and the vertices' coface back-references.
    pub fn build_proximity(&self, net: &mut Network) -> Result<Complex> {
        let survey = self.survey(net, None)?;
        record_maximal(net, &survey.maximal)?;
        Ok(survey.proximity)
    }

    /// Closed coverage complex for `target`.
    pub fn build_coverage(&self, net: &Network, target: &BitMatrix) -> Result<Complex> {
        Ok(self.survey(net, Some(target))?.coverage)
    }

    /// Two-stage filtered stream: covered faces at level 0, the rest of
    /// the proximity complex at level 1.
    pub fn build_filtered(&self, net: &Network, target: &BitMatrix) -> Result<FilteredComplex> {
        Ok(self.survey(net, Some(target))?.filtered)
    }

    /// All three complexes plus the maximal faces, in one pass.
    pub fn build_all(&self, net: &mut Network, target: &BitMatrix) -> Result<ComplexBundle> {
        let survey = self.survey(net, Some(target))?;
        let maximal = record_maximal(net, &survey.maximal)?;
        Ok(ComplexBundle {
            proximity: survey.proximity,
            coverage: survey.coverage,
            filtered: survey.filtered,
            maximal,
        })
    }

    fn survey(&self, net: &Network, target: Option<&BitMatrix>) -> Result<Survey> {
        if let Some(u) = target {
            net.dimension().check(u.ncols(), "coverage target")?;
        }
        let mut survey = Survey {
            proximity: Complex::new(),
            coverage: Complex::new(),
            filtered: FilteredComplex::new(),
            maximal: Vec::new(),
        };

        for_each_proximity_face(net, |vertices, common| {
            let key = FaceKey::new(vertices.iter().copied());
            let dim = vertices.len() - 1;

            if dim >= 2 || common.is_empty() {
                survey.maximal.push(key.clone());
            }

            if let Some(u) = target {
                let covered = is_covered(net, u, vertices, common)?;
                let in_coverage = covered && !(dim == 1 && self.exclude_coverage_chords);
                if in_coverage {
                    survey.coverage.insert(key.clone());
                }
                survey.filtered.insert(key.clone(), Filtration::from_covered(in_coverage));
            }
            survey.proximity.insert(key);
            Ok(())
        })?;

        survey.proximity.close();
        survey.coverage.close();
        survey.filtered.close();

        debug!(
            proximity = survey.proximity.len(),
            coverage = survey.coverage.len(),
            maximal = survey.maximal.len(),
            exclude_coverage_chords = self.exclude_coverage_chords,
            "complexes built"
        );
        Ok(survey)
    }
}

fn record_maximal(net: &mut Network, keys: &[FaceKey]) -> Result<Vec<FaceId>> {
    let previous = net.reset_maximal_faces();
    let ids = keys.iter().map(|key| net.mark_maximal(key)).collect::<Result<Vec<FaceId>>>()?;
    net.retire_stale_maximal(&previous)?;
    Ok(ids)
}

fn sorted(ids: &HashSet<VertexId>) -> Vec<VertexId> {
    let mut out: Vec<VertexId> = ids.iter().copied().collect();
    out.sort_unstable();
    out
}

/// Visit every clique of 1 to 4 vertices with its common neighborhood.
///
/// Members come in increasing id order. The common neighborhood never
/// contains a member, since no vertex neighbors itself.
fn for_each_proximity_face<F>(net: &Network, mut visit: F) -> Result<()>
where
    F: FnMut(&[VertexId], &HashSet<VertexId>) -> Result<()>,
{
    for p1 in net.vertices() {
        let id1 = p1.id();
        let common1 = p1.neighbors().clone();
        visit(&[id1], &common1)?;

        let above1 = p1.neighbors_above();
        for id2 in sorted(above1) {
            let p2 = net.vertex(id2)?;
            let common2: HashSet<VertexId> = common1.intersection(p2.neighbors()).copied().collect();
            visit(&[id1, id2], &common2)?;

            let above2: HashSet<VertexId> = above1.intersection(p2.neighbors_above()).copied().collect();
            for id3 in sorted(&above2) {
                let p3 = net.vertex(id3)?;
                let common3: HashSet<VertexId> = common2.intersection(p3.neighbors()).copied().collect();
                visit(&[id1, id2, id3], &common3)?;

                let above3: HashSet<VertexId> = above2.intersection(p3.neighbors_above()).copied().collect();
                for id4 in sorted(&above3) {
                    let p4 = net.vertex(id4)?;
                    let common4: HashSet<VertexId> =
                        common3.intersection(p4.neighbors()).copied().collect();
                    visit(&[id1, id2, id3, id4], &common4)?;
                }
            }
        }
    }
    Ok(())
}
