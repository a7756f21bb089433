//! # Proximity Network
//!
//! Owns every vertex and registered face of one experiment. All neighbor
//! and inventory mutation goes through here so that:
//!
//! - adjacency stays symmetric and the above-sets stay in step,
//! - every registered face that reads a mutated vertex is recomputed,
//! - vertex removal retires faces over the removed vertex and the
//!   coface back-references pointing at them.

pub mod arena;

use hashbrown::HashSet;
use rand::Rng;
use tracing::{debug, trace};

use crate::gf2::{BitMatrix, BitVector, Dimension};
use crate::model::{Face, FaceId, FaceKey, Position, Vertex, VertexId, VertexSource};
use crate::Result;

pub use arena::{FaceRegistry, VertexArena};

#[derive(Debug, Clone)]
pub struct Network {
    vertices: VertexArena,
    faces: FaceRegistry,
    /// Maximal faces recorded by the last proximity build, in discovery order.
    maximal: Vec<FaceId>,
}

impl Network {
    pub fn new(dimension: Dimension) -> Self {
        Self {
            vertices: VertexArena::new(dimension),
            faces: FaceRegistry::new(),
            maximal: Vec::new(),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.vertices.dimension()
    }

    // ========================================================================
    // Vertices
    // ========================================================================

    pub fn add_vertex(&mut self, position: Position) -> Result<VertexId> {
        self.vertices.insert(position)
    }

    /// Network with one vertex per coordinate pair, ids in input order.
    pub fn with_points(dimension: Dimension, points: &[(f64, f64)]) -> Result<Self> {
        let mut net = Self::new(dimension);
        for &(x, y) in points {
            net.add_vertex(Position::new(x, y))?;
        }
        Ok(net)
    }

    /// Remove a vertex, unlinking it from its neighbors and retiring every
    /// registered face over it.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<()> {
        let dependents = self.faces.dependents(id);
        let neighbors = self.vertices.get_mut(id)?.take_neighbors();
        for &n in &neighbors {
            self.vertices.get_mut(n)?.remove_neighbor(id);
        }

        let retired = self.faces.containing(id);
        for &fid in &retired {
            self.retire_face(fid)?;
        }
        self.vertices.remove(id)?;

        let touched: Vec<FaceId> = dependents.into_iter().filter(|fid| !retired.contains(fid)).collect();
        self.refresh_faces(&touched)?;
        debug!(vertex = %id, retired = retired.len(), refreshed = touched.len(), "vertex removed");
        Ok(())
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices.vertex(id)
    }

    /// Live vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.iter().map(Vertex::id).collect()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Sum of inventory sizes over all vertices.
    pub fn total_inventory_size(&self) -> usize {
        self.vertices.iter().map(|v| v.inventory().len()).sum()
    }

    // ========================================================================
    // Adjacency
    // ========================================================================

    /// Make `a` and `b` neighbors. A vertex is never its own neighbor, so
    /// `a == b` is ignored.
    pub fn add_neighbor(&mut self, a: VertexId, b: VertexId) -> Result<()> {
        if a == b {
            trace!(vertex = %a, "ignoring self-adjacency");
            return Ok(());
        }
        self.vertices.vertex(b)?;
        self.vertices.get_mut(a)?.insert_neighbor(b);
        self.vertices.get_mut(b)?.insert_neighbor(a);
        self.refresh_dependents(&[a, b])
    }

    pub fn remove_neighbor(&mut self, a: VertexId, b: VertexId) -> Result<()> {
        self.vertices.vertex(b)?;
        self.vertices.get_mut(a)?.remove_neighbor(b);
        self.vertices.get_mut(b)?.remove_neighbor(a);
        self.refresh_dependents(&[a, b])
    }

    pub fn clear_neighbors(&mut self, id: VertexId) -> Result<()> {
        let former = self.vertices.get_mut(id)?.take_neighbors();
        for &n in &former {
            self.vertices.get_mut(n)?.remove_neighbor(id);
        }
        let mut ids: Vec<VertexId> = former.into_iter().collect();
        ids.push(id);
        self.refresh_dependents(&ids)
    }

    /// Rebuild adjacency from positions: `a` and `b` are neighbors when
    /// their distance is at most `radius`. Returns the number of edges.
    pub fn compute_neighbors(&mut self, radius: f64) -> Result<usize> {
        let r2 = radius * radius;
        for v in self.vertices.iter_mut() {
            v.take_neighbors();
        }
        let points: Vec<(VertexId, Position)> =
            self.vertices.iter().map(|v| (v.id(), v.position())).collect();
        let mut edges = 0;
        for (i, &(a, pa)) in points.iter().enumerate() {
            for &(b, pb) in &points[i + 1..] {
                if pa.distance_squared(&pb) <= r2 {
                    self.vertices.get_mut(a)?.insert_neighbor(b);
                    self.vertices.get_mut(b)?.insert_neighbor(a);
                    edges += 1;
                }
            }
        }
        let all: Vec<FaceId> = self.faces.iter().map(|(fid, _)| fid).collect();
        self.refresh_faces(&all)?;
        debug!(vertices = points.len(), edges, radius, "neighbors computed");
        Ok(edges)
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    pub fn add_vector(&mut self, id: VertexId, v: BitVector) -> Result<usize> {
        let delta = self.vertices.get_mut(id)?.add_vector(v)?;
        self.refresh_dependents(&[id])?;
        Ok(delta)
    }

    pub fn add_vectors(&mut self, id: VertexId, vs: &[BitVector]) -> Result<usize> {
        let delta = self.vertices.get_mut(id)?.add_vectors(vs)?;
        self.refresh_dependents(&[id])?;
        Ok(delta)
    }

    pub fn add_random_vector<R: Rng + ?Sized>(&mut self, id: VertexId, rng: &mut R) -> Result<usize> {
        let delta = self.vertices.get_mut(id)?.add_random_vector(rng)?;
        self.refresh_dependents(&[id])?;
        Ok(delta)
    }

    pub fn add_standard_basis(&mut self, id: VertexId) -> Result<usize> {
        let delta = self.vertices.get_mut(id)?.add_standard_basis()?;
        self.refresh_dependents(&[id])?;
        Ok(delta)
    }

    pub fn set_inventory(&mut self, id: VertexId, m: &BitMatrix) -> Result<()> {
        self.vertices.get_mut(id)?.set_inventory(m)?;
        self.refresh_dependents(&[id])
    }

    pub fn clear_inventory(&mut self, id: VertexId) -> Result<()> {
        self.vertices.get_mut(id)?.clear_inventory();
        self.refresh_dependents(&[id])
    }

    /// Seed every vertex with the full standard basis.
    pub fn seed_standard_basis(&mut self) -> Result<()> {
        for id in self.vertex_ids() {
            self.add_standard_basis(id)?;
        }
        Ok(())
    }

    // ========================================================================
    // Faces
    // ========================================================================

    /// Build a face against the current vertex state without registering it.
    pub fn compose_face(&self, vertices: impl IntoIterator<Item = VertexId>) -> Result<Face> {
        Face::new(&self.vertices, vertices)
    }

    /// Register the face over `vertices`, or return the existing one.
    pub fn register_face(&mut self, vertices: impl IntoIterator<Item = VertexId>) -> Result<FaceId> {
        let key = FaceKey::new(vertices);
        if let Some(id) = self.faces.lookup(&key) {
            return Ok(id);
        }
        let face = Face::new(&self.vertices, key.vertices().iter().copied())?;
        let (id, _) = self.faces.insert(face)?;
        Ok(id)
    }

    pub fn face(&self, id: FaceId) -> Result<&Face> {
        self.faces.get(id)
    }

    pub fn face_by_vertices(&self, key: &FaceKey) -> Option<FaceId> {
        self.faces.lookup(key)
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.faces.iter()
    }

    pub fn maximal_face_ids(&self) -> &[FaceId] {
        &self.maximal
    }

    /// Maximal faces recorded by the last proximity build.
    pub fn maximal_faces(&self) -> Result<Vec<&Face>> {
        self.maximal.iter().map(|&id| self.faces.get(id)).collect()
    }

    /// Maximal faces containing `id`, in face-id order.
    pub fn cofaces(&self, id: VertexId) -> Result<Vec<&Face>> {
        let mut ids: Vec<FaceId> = self.vertices.vertex(id)?.cofaces().iter().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(|fid| self.faces.get(fid)).collect()
    }

    /// Forget the recorded maximal faces and every coface back-reference.
    /// Returns the previously recorded ids.
    pub(crate) fn reset_maximal_faces(&mut self) -> Vec<FaceId> {
        for v in self.vertices.iter_mut() {
            v.clear_cofaces();
        }
        std::mem::take(&mut self.maximal)
    }

    /// Retire the faces of `previous` that the current build did not mark
    /// maximal again. Faces registered outside a build are kept unless
    /// they were maximal before.
    pub(crate) fn retire_stale_maximal(&mut self, previous: &[FaceId]) -> Result<usize> {
        let stale: Vec<FaceId> = previous.iter().copied().filter(|id| !self.maximal.contains(id)).collect();
        for &id in &stale {
            self.retire_face(id)?;
        }
        if !stale.is_empty() {
            debug!(retired = stale.len(), "stale maximal faces retired");
        }
        Ok(stale.len())
    }

    /// Register the face over `key` as maximal and link it from its vertices.
    pub(crate) fn mark_maximal(&mut self, key: &FaceKey) -> Result<FaceId> {
        let id = self.register_face(key.vertices().iter().copied())?;
        if !self.maximal.contains(&id) {
            self.maximal.push(id);
        }
        for &v in key.vertices() {
            self.vertices.get_mut(v)?.insert_coface(id);
        }
        Ok(id)
    }

    fn retire_face(&mut self, id: FaceId) -> Result<()> {
        let Some(face) = self.faces.remove(id) else {
            return Ok(());
        };
        self.maximal.retain(|&m| m != id);
        for &v in face.vertices() {
            if self.vertices.contains(v) {
                self.vertices.get_mut(v)?.remove_coface(id);
            }
        }
        Ok(())
    }

    fn refresh_dependents(&mut self, ids: &[VertexId]) -> Result<()> {
        let mut touched: HashSet<FaceId> = HashSet::new();
        for &v in ids {
            touched.extend(self.faces.dependents(v));
        }
        let mut touched: Vec<FaceId> = touched.into_iter().collect();
        touched.sort_unstable();
        self.refresh_faces(&touched)
    }

    fn refresh_faces(&mut self, ids: &[FaceId]) -> Result<()> {
        let Self { vertices, faces, .. } = self;
        for &fid in ids {
            faces.get_mut(fid)?.refresh(vertices)?;
        }
        if !ids.is_empty() {
            trace!(faces = ids.len(), "faces refreshed");
        }
        Ok(())
    }
}

impl VertexSource for Network {
    fn dimension(&self) -> Dimension {
        self.vertices.dimension()
    }

    fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices.vertex(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn dim(d: usize) -> Dimension {
        Dimension::new(d).unwrap()
    }

    fn line(n: usize) -> Network {
        let points: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, 0.0)).collect();
        Network::with_points(dim(3), &points).unwrap()
    }

    #[test]
    fn neighbors_are_symmetric_with_above_sets() {
        let mut net = line(3);
        let edges = net.compute_neighbors(1.0).unwrap();
        assert_eq!(edges, 2);
        let v1 = net.vertex(VertexId(1)).unwrap();
        assert!(v1.is_neighbor(VertexId(0)) && v1.is_neighbor(VertexId(2)));
        assert_eq!(v1.neighbors_above().len(), 1);
        assert!(net.vertex(VertexId(0)).unwrap().is_neighbor(VertexId(1)));
        assert!(!net.vertex(VertexId(0)).unwrap().is_neighbor(VertexId(2)));
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let mut net = line(2);
        assert_eq!(net.compute_neighbors(1.0).unwrap(), 1);
        assert_eq!(net.compute_neighbors(0.999).unwrap(), 0);
        assert!(net.vertex(VertexId(0)).unwrap().neighbors().is_empty());
    }

    #[test]
    fn self_adjacency_is_ignored() {
        let mut net = line(1);
        net.add_neighbor(VertexId(0), VertexId(0)).unwrap();
        assert!(net.vertex(VertexId(0)).unwrap().neighbors().is_empty());
    }

    #[test]
    fn unknown_neighbor_is_not_found() {
        let mut net = line(1);
        assert!(matches!(net.add_neighbor(VertexId(0), VertexId(7)), Err(Error::NotFound(_))));
        assert!(net.vertex(VertexId(0)).unwrap().neighbors().is_empty());
    }

    #[test]
    fn inventory_change_refreshes_registered_faces() {
        let mut net = line(2);
        net.add_neighbor(VertexId(0), VertexId(1)).unwrap();
        let fid = net.register_face([VertexId(0)]).unwrap();
        assert_eq!(net.face(fid).unwrap().rank(), 0);

        net.add_vector(VertexId(1), BitVector::unit(3, 2)).unwrap();
        assert_eq!(net.face(fid).unwrap().rank(), 1);
        assert_eq!(net.face(fid).unwrap().exclusive_rank(), 1);

        net.clear_inventory(VertexId(1)).unwrap();
        assert_eq!(net.face(fid).unwrap().rank(), 0);
    }

    #[test]
    fn neighbor_change_refreshes_registered_faces() {
        let mut net = line(3);
        net.seed_standard_basis().unwrap();
        net.add_neighbor(VertexId(0), VertexId(1)).unwrap();
        net.add_neighbor(VertexId(0), VertexId(2)).unwrap();
        net.add_neighbor(VertexId(1), VertexId(2)).unwrap();
        let fid = net.register_face([VertexId(0), VertexId(1)]).unwrap();
        assert_eq!(net.face(fid).unwrap().exclusive_neighbors().len(), 1);

        net.remove_neighbor(VertexId(1), VertexId(2)).unwrap();
        assert!(net.face(fid).unwrap().exclusive_neighbors().is_empty());
        assert_eq!(net.face(fid).unwrap().exclusive_rank(), 0);
    }

    #[test]
    fn register_face_is_idempotent() {
        let mut net = line(3);
        let a = net.register_face([VertexId(2), VertexId(0)]).unwrap();
        let b = net.register_face([VertexId(0), VertexId(2)]).unwrap();
        assert_eq!(a, b);
        assert_eq!(net.face_by_vertices(&FaceKey::from([0, 2])), Some(a));
        assert_eq!(net.faces().count(), 1);
    }

    #[test]
    fn remove_vertex_retires_faces_and_back_references() {
        let mut net = line(3);
        net.compute_neighbors(1.0).unwrap();
        net.add_vector(VertexId(0), BitVector::unit(3, 0)).unwrap();
        net.add_vector(VertexId(2), BitVector::unit(3, 1)).unwrap();
        let edge = net.mark_maximal(&FaceKey::from([0, 1])).unwrap();
        let other = net.mark_maximal(&FaceKey::from([1, 2])).unwrap();
        let star = net.register_face([VertexId(1)]).unwrap();
        assert_eq!(net.vertex(VertexId(1)).unwrap().cofaces().len(), 2);
        assert_eq!(net.face(star).unwrap().rank(), 2);

        net.remove_vertex(VertexId(0)).unwrap();
        assert!(net.face(edge).is_err());
        assert_eq!(net.maximal_face_ids(), &[other]);
        let v1 = net.vertex(VertexId(1)).unwrap();
        assert!(!v1.is_neighbor(VertexId(0)));
        assert_eq!(v1.cofaces().len(), 1);
        assert_eq!(net.len(), 2);
        assert!(net.vertex(VertexId(0)).is_err());

        // {1} survives but loses vertex 0 from its neighborhood and span
        let star = net.face(star).unwrap();
        assert!(!star.exclusive_neighbors().contains(&VertexId(0)));
        assert_eq!(star.rank(), 1);
    }

    #[test]
    fn total_inventory_size_counts_vectors() {
        let mut net = line(2);
        net.seed_standard_basis().unwrap();
        net.add_vector(VertexId(0), BitVector::unit(3, 0)).unwrap();
        assert_eq!(net.total_inventory_size(), 7);
    }
}
