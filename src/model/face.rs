//! Faces: finite vertex sets with cached neighborhoods and spans.

use std::fmt;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use super::{VertexId, VertexSource};
use crate::gf2::{Dimension, Subspace};
use crate::{Error, Result};

/// Registry identifier of a face held by a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceId(pub u32);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// FaceKey
// ============================================================================

/// Sorted, duplicate-free vertex set identifying a face.
///
/// Two faces are the same face exactly when their keys are equal. Keys
/// order lexicographically by vertex id, which gives complexes a stable
/// iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "SmallVec<[VertexId; 4]>")]
pub struct FaceKey(SmallVec<[VertexId; 4]>);

impl TryFrom<SmallVec<[VertexId; 4]>> for FaceKey {
    type Error = Error;

    /// Ids must already be strictly increasing.
    fn try_from(ids: SmallVec<[VertexId; 4]>) -> Result<Self> {
        if ids.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvariantViolation(format!(
                "face key {ids:?} is not sorted and duplicate-free"
            )));
        }
        Ok(Self(ids))
    }
}

impl FaceKey {
    pub fn new(vertices: impl IntoIterator<Item = VertexId>) -> Self {
        let mut ids: SmallVec<[VertexId; 4]> = vertices.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Simplicial dimension, `len - 1`. `None` for the empty face.
    pub fn dim(&self) -> Option<usize> {
        self.0.len().checked_sub(1)
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Every nonempty proper subset.
    ///
    /// # Panics
    /// Panics on keys of 64 or more vertices.
    pub fn subfaces(&self) -> impl Iterator<Item = FaceKey> + '_ {
        let n = self.0.len();
        assert!(n < 64, "face of {n} vertices is too large to enumerate");
        let full = (1u64 << n) - 1;
        (1..full).map(move |mask| {
            FaceKey(
                self.0
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, &id)| id)
                    .collect(),
            )
        })
    }
}

impl fmt::Display for FaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("]")
    }
}

impl<const N: usize> From<[u32; N]> for FaceKey {
    fn from(ids: [u32; N]) -> Self {
        Self::new(ids.into_iter().map(VertexId))
    }
}

// ============================================================================
// Face
// ============================================================================

/// A face together with its common neighborhood and the spans over it.
///
/// * inclusive neighbors: vertices adjacent to every member, plus the members
/// * exclusive neighbors: the inclusive set minus the members
///
/// `span` and `exclusive_span` are the spans of the inventories over the
/// inclusive and exclusive sets. Both are recomputed from the vertex
/// source whenever the vertex set changes, or on `refresh`.
#[derive(Debug, Clone)]
pub struct Face {
    key: FaceKey,
    dimension: Dimension,
    neighbors: HashSet<VertexId>,
    exclusive_neighbors: HashSet<VertexId>,
    span: Subspace,
    exclusive_span: Subspace,
}

struct Derived {
    neighbors: HashSet<VertexId>,
    exclusive_neighbors: HashSet<VertexId>,
    span: Subspace,
    exclusive_span: Subspace,
}

impl Face {
    /// Build a face over `vertices`, all of which must exist in `source`.
    pub fn new<S: VertexSource + ?Sized>(
        source: &S,
        vertices: impl IntoIterator<Item = VertexId>,
    ) -> Result<Self> {
        let key = FaceKey::new(vertices);
        let dimension = source.dimension();
        let derived = derive(source, dimension, &key)?;
        let mut face = Self::empty(dimension);
        face.key = key;
        face.apply(derived);
        Ok(face)
    }

    /// The face with no vertices. Its spans are `{0}`.
    pub fn empty(dimension: Dimension) -> Self {
        Self {
            key: FaceKey::default(),
            dimension,
            neighbors: HashSet::new(),
            exclusive_neighbors: HashSet::new(),
            span: Subspace::zero(dimension.get()),
            exclusive_span: Subspace::zero(dimension.get()),
        }
    }

    pub fn key(&self) -> &FaceKey {
        &self.key
    }

    pub fn vertices(&self) -> &[VertexId] {
        self.key.vertices()
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Common neighbors together with the members.
    pub fn neighbors(&self) -> &HashSet<VertexId> {
        &self.neighbors
    }

    pub fn exclusive_neighbors(&self) -> &HashSet<VertexId> {
        &self.exclusive_neighbors
    }

    pub fn span(&self) -> &Subspace {
        &self.span
    }

    pub fn exclusive_span(&self) -> &Subspace {
        &self.exclusive_span
    }

    pub fn rank(&self) -> usize {
        self.span.rank()
    }

    pub fn exclusive_rank(&self) -> usize {
        self.exclusive_span.rank()
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.key.contains(id)
    }

    /// Grow the vertex set and recompute. On error the face is unchanged.
    pub fn add_vertices<S: VertexSource + ?Sized>(
        &mut self,
        source: &S,
        vertices: impl IntoIterator<Item = VertexId>,
    ) -> Result<()> {
        let key = FaceKey::new(self.key.vertices().iter().copied().chain(vertices));
        let derived = derive(source, self.dimension, &key)?;
        self.key = key;
        self.apply(derived);
        Ok(())
    }

    /// Shrink the vertex set and recompute. Ids not in the face are ignored.
    pub fn del_vertices<S: VertexSource + ?Sized>(
        &mut self,
        source: &S,
        vertices: impl IntoIterator<Item = VertexId>,
    ) -> Result<()> {
        let drop: HashSet<VertexId> = vertices.into_iter().collect();
        let key = FaceKey::new(self.key.vertices().iter().copied().filter(|id| !drop.contains(id)));
        let derived = derive(source, self.dimension, &key)?;
        self.key = key;
        self.apply(derived);
        Ok(())
    }

    /// Recompute neighborhoods and spans from the current vertex state.
    pub fn refresh<S: VertexSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        let derived = derive(source, self.dimension, &self.key)?;
        self.apply(derived);
        Ok(())
    }

    /// Span of the inventories of the inclusive neighbors not in `excluded`.
    ///
    /// An empty exclusion list yields the inclusive span.
    pub fn exclusive_basis<S: VertexSource + ?Sized>(
        &self,
        source: &S,
        excluded: &[VertexId],
    ) -> Result<Subspace> {
        if excluded.is_empty() {
            warn!(face = %self.key, "exclusive basis requested with nothing excluded");
            return Ok(self.span.clone());
        }
        span_of(
            source,
            self.dimension,
            self.neighbors.iter().filter(|id| !excluded.contains(id)),
        )
    }

    fn apply(&mut self, d: Derived) {
        self.neighbors = d.neighbors;
        self.exclusive_neighbors = d.exclusive_neighbors;
        self.span = d.span;
        self.exclusive_span = d.exclusive_span;
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rank={} exclusive={}", self.key, self.rank(), self.exclusive_rank())
    }
}

fn derive<S: VertexSource + ?Sized>(source: &S, dimension: Dimension, key: &FaceKey) -> Result<Derived> {
    let mut members = Vec::with_capacity(key.len());
    for &id in key.vertices() {
        let v = source.vertex(id)?;
        dimension.check(v.dimension().get(), format!("face {key} member {id}"))?;
        members.push(v);
    }

    let mut common = members.first().map(|v| v.neighbors().clone()).unwrap_or_default();
    for v in members.iter().skip(1) {
        if common.is_empty() {
            break;
        }
        common.retain(|n| v.is_neighbor(*n));
    }
    common.retain(|n| !key.contains(*n));

    let mut neighbors = common.clone();
    neighbors.extend(key.vertices().iter().copied());

    Ok(Derived {
        span: span_of(source, dimension, neighbors.iter())?,
        exclusive_span: span_of(source, dimension, common.iter())?,
        neighbors,
        exclusive_neighbors: common,
    })
}

fn span_of<'a, S: VertexSource + ?Sized>(
    source: &S,
    dimension: Dimension,
    ids: impl IntoIterator<Item = &'a VertexId>,
) -> Result<Subspace> {
    let mut span = Subspace::zero(dimension.get());
    'outer: for &id in ids {
        for v in source.vertex(id)?.inventory() {
            if span.is_full() {
                break 'outer;
            }
            span.insert(v)?;
        }
    }
    Ok(span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf2::BitVector;
    use crate::model::{Position, Vertex};
    use pretty_assertions::assert_eq;

    struct Pool {
        dim: Dimension,
        vertices: Vec<Vertex>,
    }

    impl Pool {
        fn new(dim: usize, n: u32) -> Self {
            let dim = Dimension::new(dim).unwrap();
            let vertices = (0..n).map(|i| Vertex::new(VertexId(i), Position::default(), dim)).collect();
            Self { dim, vertices }
        }

        fn link(&mut self, a: u32, b: u32) {
            self.vertices[a as usize].insert_neighbor(VertexId(b));
            self.vertices[b as usize].insert_neighbor(VertexId(a));
        }

        fn give(&mut self, v: u32, bit: usize) {
            let d = self.dim.get();
            self.vertices[v as usize].add_vector(BitVector::unit(d, bit)).unwrap();
        }
    }

    impl VertexSource for Pool {
        fn dimension(&self) -> Dimension {
            self.dim
        }

        fn vertex(&self, id: VertexId) -> Result<&Vertex> {
            self.vertices
                .get(id.0 as usize)
                .ok_or_else(|| Error::NotFound(format!("vertex {id}")))
        }
    }

    /// Clique on `0..k`, vertex `i` holding `e_i`.
    fn clique(dim: usize, k: u32, extra: u32) -> Pool {
        let mut pool = Pool::new(dim, k + extra);
        for i in 0..k {
            pool.give(i, i as usize);
            for j in (i + 1)..k {
                pool.link(i, j);
            }
        }
        pool
    }

    fn ids(range: std::ops::Range<u32>) -> impl Iterator<Item = VertexId> {
        range.map(VertexId)
    }

    #[test]
    fn key_is_sorted_and_deduplicated() {
        let key = FaceKey::new([VertexId(3), VertexId(1), VertexId(3)]);
        assert_eq!(key.vertices(), &[VertexId(1), VertexId(3)]);
        assert_eq!(key.dim(), Some(1));
        assert_eq!(FaceKey::default().dim(), None);
        assert_eq!(key.to_string(), "[1 3]");
    }

    #[test]
    fn subfaces_of_a_tetrahedron() {
        let key = FaceKey::from([0, 1, 2, 3]);
        let subs: Vec<FaceKey> = key.subfaces().collect();
        assert_eq!(subs.len(), 14);
        assert!(subs.contains(&FaceKey::from([1, 3])));
        assert!(!subs.contains(&key));
    }

    #[test]
    fn empty_face_has_rank_zero() {
        let face = Face::empty(Dimension::new(5).unwrap());
        assert_eq!(face.rank(), 0);
        assert_eq!(face.exclusive_rank(), 0);
        assert!(face.neighbors().is_empty());
    }

    #[test]
    fn face_with_outside_neighbor() {
        let mut pool = clique(10, 5, 1);
        pool.give(5, 5);
        for i in 0..5 {
            pool.link(i, 5);
        }
        let face = Face::new(&pool, ids(0..5)).unwrap();
        assert_eq!(face.rank(), 6);
        assert_eq!(face.exclusive_rank(), 1);
        assert_eq!(face.exclusive_neighbors().len(), 1);
        assert!(face.exclusive_neighbors().contains(&VertexId(5)));
        assert_eq!(face.neighbors().len(), 6);
    }

    #[test]
    fn maximal_clique_has_no_exclusive_span() {
        let pool = clique(10, 5, 0);
        let face = Face::new(&pool, ids(0..5)).unwrap();
        assert_eq!(face.rank(), 5);
        assert_eq!(face.exclusive_rank(), 0);
        assert!(face.exclusive_neighbors().is_empty());
    }

    #[test]
    fn add_and_remove_vertices() {
        let pool = clique(6, 4, 0);
        let mut face = Face::new(&pool, [VertexId(0)]).unwrap();
        // a lone clique vertex sees the whole clique
        assert_eq!(face.rank(), 4);
        assert_eq!(face.exclusive_rank(), 3);

        face.add_vertices(&pool, ids(1..4)).unwrap();
        assert_eq!(face.vertices().len(), 4);
        assert_eq!(face.exclusive_rank(), 0);

        face.del_vertices(&pool, [VertexId(3), VertexId(9)]).unwrap();
        assert_eq!(face.key(), &FaceKey::from([0, 1, 2]));
        assert_eq!(face.exclusive_rank(), 1);
    }

    #[test]
    fn unknown_vertex_leaves_face_untouched() {
        let pool = clique(4, 3, 0);
        let mut face = Face::new(&pool, ids(0..2)).unwrap();
        let before = face.key().clone();
        assert!(matches!(face.add_vertices(&pool, [VertexId(42)]), Err(Error::NotFound(_))));
        assert_eq!(face.key(), &before);
        assert_eq!(face.rank(), 3);
    }

    #[test]
    fn exclusive_basis_drops_the_excluded() {
        let pool = clique(4, 3, 0);
        let face = Face::new(&pool, [VertexId(0)]).unwrap();
        let rest = face.exclusive_basis(&pool, &[VertexId(0)]).unwrap();
        assert_eq!(rest.rank(), 2);
        assert_eq!(face.exclusive_basis(&pool, &[]).unwrap(), *face.span());
    }

    #[test]
    fn refresh_sees_new_inventory() {
        let mut pool = clique(4, 2, 0);
        let mut face = Face::new(&pool, ids(0..2)).unwrap();
        assert_eq!(face.rank(), 2);
        pool.give(1, 3);
        face.refresh(&pool).unwrap();
        assert_eq!(face.rank(), 3);
    }

    #[test]
    fn face_key_deserialization_rejects_unsorted_ids() {
        let key: FaceKey = serde_json::from_str("[1,3,7]").unwrap();
        assert_eq!(key, FaceKey::from([7, 3, 1]));
        assert_eq!(serde_json::to_string(&key).unwrap(), "[1,3,7]");
        assert!(serde_json::from_str::<FaceKey>("[3,1]").is_err());
        assert!(serde_json::from_str::<FaceKey>("[2,2]").is_err());
    }
}
