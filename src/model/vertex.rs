//! Vertex of the proximity graph and its vector inventory.

use hashbrown::HashSet;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::FaceId;
use crate::gf2::{BitMatrix, BitVector, Dimension, Subspace};
use crate::Result;

/// Opaque vertex identifier; the index of the vertex in its network arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Planar location. Only the proximity-radius utility looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// A vertex holding an inventory of GF(2) vectors.
///
/// The reduced basis of the inventory is cached and rebuilt on every
/// inventory change. Neighbor sets and coface back-references are owned
/// by the vertex but only mutated through the network, which keeps them
/// symmetric and refreshes the faces that depend on them.
#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    position: Position,
    dimension: Dimension,
    neighbors: HashSet<VertexId>,
    /// Neighbors with a larger id; each edge is enumerated once from its lower end.
    neighbors_above: HashSet<VertexId>,
    inventory: Vec<BitVector>,
    basis: Subspace,
    /// Maximal faces of the proximity complex containing this vertex.
    cofaces: HashSet<FaceId>,
}

impl Vertex {
    pub fn new(id: VertexId, position: Position, dimension: Dimension) -> Self {
        Self {
            id,
            position,
            dimension,
            neighbors: HashSet::new(),
            neighbors_above: HashSet::new(),
            inventory: Vec::new(),
            basis: Subspace::zero(dimension.get()),
            cofaces: HashSet::new(),
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn neighbors(&self) -> &HashSet<VertexId> {
        &self.neighbors
    }

    pub fn neighbors_above(&self) -> &HashSet<VertexId> {
        &self.neighbors_above
    }

    pub fn is_neighbor(&self, other: VertexId) -> bool {
        self.neighbors.contains(&other)
    }

    pub fn inventory(&self) -> &[BitVector] {
        &self.inventory
    }

    /// Inventory as an `n x D` matrix, one vector per row.
    pub fn inventory_matrix(&self) -> BitMatrix {
        BitMatrix::from_rows_unchecked(self.dimension.get(), self.inventory.clone())
    }

    /// Reduced basis of the inventory's span.
    pub fn basis(&self) -> &Subspace {
        &self.basis
    }

    pub fn rank(&self) -> usize {
        self.basis.rank()
    }

    pub fn cofaces(&self) -> &HashSet<FaceId> {
        &self.cofaces
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Append `v` to the inventory. Returns 1 if the rank grew, else 0.
    pub fn add_vector(&mut self, v: BitVector) -> Result<usize> {
        self.dimension.check(v.len(), format!("vertex {} add_vector", self.id))?;
        let grew = if self.basis.is_full() { false } else { self.basis.insert(&v)? };
        self.inventory.push(v);
        Ok(usize::from(grew))
    }

    /// Append several vectors; returns the total rank increase.
    ///
    /// All lengths are checked before anything is appended.
    pub fn add_vectors(&mut self, vs: &[BitVector]) -> Result<usize> {
        for v in vs {
            self.dimension.check(v.len(), format!("vertex {} add_vectors", self.id))?;
        }
        let mut delta = 0;
        for v in vs {
            delta += self.add_vector(v.clone())?;
        }
        Ok(delta)
    }

    /// Append a uniformly random nonzero vector.
    pub fn add_random_vector<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize> {
        let v = BitVector::random_nonzero(self.dimension.get(), rng);
        self.add_vector(v)
    }

    /// Append every standard basis vector.
    pub fn add_standard_basis(&mut self) -> Result<usize> {
        let basis = self.dimension.standard_basis();
        self.add_vectors(&basis)
    }

    /// Replace the inventory with the nonzero rows of `m`.
    pub fn set_inventory(&mut self, m: &BitMatrix) -> Result<()> {
        self.dimension.check(m.ncols(), format!("vertex {} set_inventory", self.id))?;
        self.clear_inventory();
        for row in m.rows() {
            if row.is_zero() {
                continue;
            }
            if !self.basis.is_full() {
                self.basis.insert(row)?;
            }
            self.inventory.push(row.clone());
        }
        Ok(())
    }

    pub fn clear_inventory(&mut self) {
        self.inventory.clear();
        self.basis = Subspace::zero(self.dimension.get());
    }

    // ========================================================================
    // Adjacency (network-maintained)
    // ========================================================================

    pub(crate) fn insert_neighbor(&mut self, other: VertexId) {
        self.neighbors.insert(other);
        if other > self.id {
            self.neighbors_above.insert(other);
        }
    }

    pub(crate) fn remove_neighbor(&mut self, other: VertexId) -> bool {
        self.neighbors_above.remove(&other);
        self.neighbors.remove(&other)
    }

    pub(crate) fn take_neighbors(&mut self) -> HashSet<VertexId> {
        self.neighbors_above.clear();
        std::mem::take(&mut self.neighbors)
    }

    pub(crate) fn insert_coface(&mut self, face: FaceId) {
        self.cofaces.insert(face);
    }

    pub(crate) fn remove_coface(&mut self, face: FaceId) {
        self.cofaces.remove(&face);
    }

    pub(crate) fn clear_cofaces(&mut self) {
        self.cofaces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn vertex(dim: usize) -> Vertex {
        Vertex::new(VertexId(0), Position::new(2.1, 3.4), Dimension::new(dim).unwrap())
    }

    #[test]
    fn new_vertex_is_empty() {
        let p = vertex(100);
        assert!(p.neighbors().is_empty());
        assert!(p.neighbors_above().is_empty());
        assert!(p.cofaces().is_empty());
        assert!(p.inventory().is_empty());
        assert_eq!(p.rank(), 0);
        assert_eq!(p.dimension().get(), 100);
    }

    #[test]
    fn add_single_unit_vector() {
        let mut p = vertex(10);
        assert_eq!(p.add_vector(BitVector::unit(10, 0)).unwrap(), 1);
        assert_eq!(p.rank(), 1);
        assert_eq!(p.basis().basis(), &[BitVector::unit(10, 0)]);
    }

    #[test]
    fn add_unit_vectors_one_at_a_time() {
        let mut p = vertex(10);
        for i in 0..5 {
            p.add_vector(BitVector::unit(10, i)).unwrap();
        }
        assert_eq!(p.rank(), 5);
        let expected: Vec<BitVector> = (0..5).map(|i| BitVector::unit(10, i)).collect();
        assert_eq!(p.basis().basis(), expected.as_slice());
    }

    #[test]
    fn add_vectors_sums_rank_deltas() {
        let mut p = vertex(10);
        let vs: Vec<BitVector> = (0..5).map(|i| BitVector::unit(10, i)).collect();
        assert_eq!(p.add_vectors(&vs).unwrap(), 5);
        assert_eq!(p.add_vectors(&vs).unwrap(), 0);
        assert_eq!(p.inventory().len(), 10);
        assert_eq!(p.rank(), 5);
    }

    #[test]
    fn wrong_length_is_a_dimension_mismatch() {
        let mut p = vertex(4);
        assert!(matches!(
            p.add_vector(BitVector::unit(5, 0)),
            Err(Error::DimensionMismatch { expected: 4, got: 5, .. })
        ));
        // nothing appended on a failed batch
        let vs = vec![BitVector::unit(4, 0), BitVector::unit(3, 0)];
        assert!(p.add_vectors(&vs).is_err());
        assert!(p.inventory().is_empty());
    }

    #[test]
    fn rank_is_monotonic_and_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut p = vertex(6);
        let mut last = 0;
        for _ in 0..50 {
            p.add_random_vector(&mut rng).unwrap();
            assert!(p.rank() >= last);
            assert!(p.rank() <= 6);
            last = p.rank();
        }
        assert_eq!(p.inventory().len(), 50);
    }

    #[test]
    fn single_random_vector_has_rank_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = vertex(10);
        assert_eq!(p.add_random_vector(&mut rng).unwrap(), 1);
        assert_eq!(p.rank(), 1);
    }

    #[test]
    fn random_growth_at_corank_one_is_a_coin_flip() {
        // At rank D-1 a random nonzero vector lands inside the span with
        // probability (2^(D-1) - 1) / (2^D - 1), just under 1/2.
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let dim = 10;
        let trials = 40_000;
        let mut stuck = 0usize;
        for _ in 0..trials {
            let mut p = vertex(dim);
            while p.rank() < dim - 1 {
                p.add_random_vector(&mut rng).unwrap();
            }
            p.add_random_vector(&mut rng).unwrap();
            stuck += dim - p.rank();
        }
        let mean = stuck as f64 / trials as f64;
        assert!((mean - 0.5).abs() < 0.01, "mean {mean}");
    }

    #[test]
    fn set_inventory_drops_zero_rows() {
        let mut p = vertex(3);
        p.add_standard_basis().unwrap();
        let m = BitMatrix::from_rows(
            3,
            [BitVector::zeros(3), BitVector::unit(3, 2), BitVector::zeros(3), BitVector::unit(3, 2)],
        )
        .unwrap();
        p.set_inventory(&m).unwrap();
        assert_eq!(p.inventory(), &[BitVector::unit(3, 2), BitVector::unit(3, 2)]);
        assert_eq!(p.rank(), 1);
    }

    #[test]
    fn set_inventory_checks_columns_before_clearing() {
        let mut p = vertex(3);
        p.add_standard_basis().unwrap();
        assert!(p.set_inventory(&BitMatrix::identity(4)).is_err());
        assert_eq!(p.rank(), 3);
    }

    #[test]
    fn clear_inventory_resets_rank() {
        let mut p = vertex(3);
        p.add_standard_basis().unwrap();
        p.clear_inventory();
        assert_eq!(p.rank(), 0);
        assert!(p.inventory().is_empty());
    }

    #[test]
    fn neighbors_above_tracks_larger_ids() {
        let mut p = Vertex::new(VertexId(5), Position::default(), Dimension::new(2).unwrap());
        p.insert_neighbor(VertexId(3));
        p.insert_neighbor(VertexId(8));
        assert_eq!(p.neighbors().len(), 2);
        assert!(p.neighbors_above().contains(&VertexId(8)));
        assert!(!p.neighbors_above().contains(&VertexId(3)));
        assert!(p.remove_neighbor(VertexId(8)));
        assert!(p.neighbors_above().is_empty());
    }
}
